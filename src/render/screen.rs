//! Raster back-end.
//!
//! Draws into a [`Pixmap`], Y down, with pan and zoom taken from a
//! [`ScreenView`]. An interactive shell changes the view and calls
//! [`ScreenRenderer::frame`] again; the DrawList is never touched. As a file
//! output the frame is encoded as PNG.

use glam::{DVec2, dvec2};
use tiny_skia::{Color, Paint, PathBuilder, Pixmap, Stroke, Transform};

use super::style::{aci_rgb, item_style};
use super::{OutputFormat, RenderReport, Rendered, Renderer, Tally, check_drawable};
use crate::drawlist::{DrawItem, DrawList, Primitive};
use crate::errors::RenderError;
use crate::log::debug;
use crate::projection::{Projection, YAxis};

pub const ZOOM_MIN: f64 = 0.1;
pub const ZOOM_MAX: f64 = 5.0;
/// Clear border around the fitted drawing, pixels
const FIT_MARGIN: f64 = 20.0;

/// Window size, scale, zoom and pan of the raster view
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenView {
    pub width: u32,
    pub height: u32,
    /// Fixed scale; `None` fits the drawing to the window
    pub pixels_per_metre: Option<f64>,
    zoom: f64,
    pub pan: DVec2,
}

impl Default for ScreenView {
    fn default() -> Self {
        Self::new(1600, 1000)
    }
}

impl ScreenView {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels_per_metre: None,
            zoom: 1.0,
            pan: DVec2::ZERO,
        }
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    /// Set the zoom, clamped to `ZOOM_MIN..=ZOOM_MAX`.
    pub fn set_zoom(&mut self, zoom: f64) {
        self.zoom = if zoom.is_nan() {
            1.0
        } else {
            zoom.clamp(ZOOM_MIN, ZOOM_MAX)
        };
    }

    pub fn zoom_by(&mut self, factor: f64) {
        self.set_zoom(self.zoom * factor);
    }

    pub fn pan_by(&mut self, delta: DVec2) {
        self.pan += delta;
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
    }

    fn size(&self) -> DVec2 {
        dvec2(f64::from(self.width), f64::from(self.height))
    }
}

/// Rasterises a DrawList
#[derive(Debug, Clone, Default)]
pub struct ScreenRenderer {
    view: ScreenView,
}

impl ScreenRenderer {
    pub fn new(view: ScreenView) -> Self {
        Self { view }
    }

    pub fn view(&self) -> &ScreenView {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut ScreenView {
        &mut self.view
    }

    /// Pixels per metre before zoom
    fn base_scale(&self, list: &DrawList) -> Option<f64> {
        if let Some(ppm) = self.view.pixels_per_metre {
            return (ppm.is_finite() && ppm > 0.0).then_some(ppm);
        }
        let bbox = list.bbox();
        if bbox.is_empty() {
            return None;
        }
        let room = self.view.size() - DVec2::splat(2.0 * FIT_MARGIN);
        let s = (room.x / bbox.width()).min(room.y / bbox.height());
        (s.is_finite() && s > 0.0).then_some(s)
    }

    /// Draw the current view of `list`.
    pub fn frame(&self, list: &DrawList) -> Result<(Pixmap, RenderReport), RenderError> {
        check_drawable(list)?;
        if self.base_scale(list).is_none() {
            return Err(RenderError::InvalidBounds);
        }
        let proj = self.projection(list);
        let mut pixmap =
            Pixmap::new(self.view.width, self.view.height).ok_or(RenderError::RasterSize {
                width: self.view.width,
                height: self.view.height,
            })?;
        pixmap.fill(Color::WHITE);

        // pixels per paper millimetre, for line weights
        let px_per_mm = proj.hh() * list.frame().paper();
        let mut tally = Tally::new(&proj);
        for item in list {
            let outline = tally.place(item);
            match &item.primitive {
                Primitive::Text { .. } => tally.fallback(item.layer, "TEXT", "box outline"),
                Primitive::Hatch { .. } => tally.fallback(item.layer, "HATCH", "outline"),
                _ => {}
            }
            let vertices = paint(&mut pixmap, item, &outline, px_per_mm);
            if vertices > 0 {
                tally.emitted(item.layer, vertices);
            }
        }
        Ok((pixmap, tally.finish(OutputFormat::Png, None)))
    }
}

impl Renderer for ScreenRenderer {
    fn format(&self) -> OutputFormat {
        OutputFormat::Png
    }

    fn projection(&self, list: &DrawList) -> Projection {
        let frame = list.frame();
        let hh = self.base_scale(list).unwrap_or(1.0) * self.view.zoom;
        let centre = list.bbox().center();
        let centre = if centre.is_finite() { centre } else { DVec2::ZERO };
        let origin = self.view.size() / 2.0 - dvec2(centre.x, -centre.y) * hh;
        Projection::new(frame, hh, hh, origin, YAxis::Down).with_pan(self.view.pan)
    }

    fn render(&mut self, list: &DrawList) -> Result<Rendered, RenderError> {
        let (pixmap, report) = self.frame(list)?;
        let bytes = pixmap.encode_png().map_err(|e| RenderError::Encode {
            backend: "png",
            message: e.to_string(),
        })?;
        debug!(width = pixmap.width(), height = pixmap.height(), bytes = bytes.len(), "png encoded");
        Ok(Rendered { bytes, report })
    }
}

/// Stroke one item's outline; returns the number of points fed to the path.
fn paint(pixmap: &mut Pixmap, item: &DrawItem, outline: &[DVec2], px_per_mm: f64) -> usize {
    let Some((first, rest)) = outline.split_first() else {
        return 0;
    };
    let mut pb = PathBuilder::new();
    pb.move_to(first.x as f32, first.y as f32);
    for p in rest {
        pb.line_to(p.x as f32, p.y as f32);
    }
    if item.primitive.is_closed() {
        pb.close();
    }
    // a zero-length path leaves no pixels
    let Some(path) = pb.finish() else {
        return outline.len();
    };

    let style = item_style(item);
    let [r, g, b] = aci_rgb(style.aci);
    let mut paint = Paint::default();
    paint.set_color_rgba8(r, g, b, 255);
    paint.anti_alias = true;
    let stroke = Stroke {
        width: (style.lineweight * px_per_mm).max(1.0) as f32,
        ..Stroke::default()
    };
    pixmap.stroke_path(&path, &paint, &stroke, Transform::identity(), None);
    outline.len()
}
