//! PDF back-end.
//!
//! One landscape page. The drawing's extent is fitted inside the page margin
//! and centred; coordinates are points from the lower-left corner, Y up.
//! Text is set in the standard-14 Helvetica, so nothing is embedded.

use glam::{DVec2, dvec2};
use pdf_writer::{Content, Finish, Name, Pdf, Rect, Ref, Str, TextStr};

use super::style::{aci_rgb, item_style};
use super::{OutputFormat, Rendered, Renderer, Tally, check_drawable, device_hatch};
use crate::drawlist::{ARC_SEGMENTS, DrawItem, DrawList, Primitive, arc_points};
use crate::errors::RenderError;
use crate::log::debug;
use crate::projection::{Projection, YAxis};
use crate::text;

/// PostScript points per millimetre
pub const PT_PER_MM: f64 = 72.0 / 25.4;

const FONT: Name<'static> = Name(b"F1");

/// Landscape paper sizes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum PageSize {
    #[default]
    A3,
    A4,
}

impl PageSize {
    /// Width and height in millimetres, landscape
    pub fn size_mm(self) -> DVec2 {
        match self {
            PageSize::A3 => dvec2(420.0, 297.0),
            PageSize::A4 => dvec2(297.0, 210.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PdfOptions {
    pub page: PageSize,
    /// Clear border on every side, mm
    pub margin_mm: f64,
}

impl Default for PdfOptions {
    fn default() -> Self {
        Self {
            page: PageSize::A3,
            margin_mm: 20.0,
        }
    }
}

/// Writes a DrawList as a one-page PDF
#[derive(Debug, Clone, Default)]
pub struct PdfRenderer {
    options: PdfOptions,
}

impl PdfRenderer {
    pub fn new(options: PdfOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &PdfOptions {
        &self.options
    }

    /// Paper millimetres per model metre that fit `list` on the page
    fn fit(&self, list: &DrawList) -> Option<f64> {
        let bbox = list.bbox();
        if bbox.is_empty() {
            return None;
        }
        let room = self.options.page.size_mm() - DVec2::splat(2.0 * self.options.margin_mm);
        let s = (room.x / bbox.width()).min(room.y / bbox.height());
        (s.is_finite() && s > 0.0).then_some(s)
    }
}

impl Renderer for PdfRenderer {
    fn format(&self) -> OutputFormat {
        OutputFormat::Pdf
    }

    fn projection(&self, list: &DrawList) -> Projection {
        let frame = list.frame();
        let page = self.options.page.size_mm() * PT_PER_MM;
        match self.fit(list) {
            Some(s) => {
                let hh = s * PT_PER_MM;
                let origin = page / 2.0 - list.bbox().center() * hh;
                Projection::new(frame, hh, hh, origin, YAxis::Up)
            }
            // nothing to fit: plot at SCALE1 from the margin corner
            None => {
                let hh = 1000.0 / frame.scale1 * PT_PER_MM;
                let origin = DVec2::splat(self.options.margin_mm * PT_PER_MM);
                Projection::new(frame, hh, hh, origin, YAxis::Up)
            }
        }
    }

    fn render(&mut self, list: &DrawList) -> Result<Rendered, RenderError> {
        check_drawable(list)?;
        if self.fit(list).is_none() {
            return Err(RenderError::InvalidBounds);
        }
        let proj = self.projection(list);
        let mut tally = Tally::new(&proj);
        let mut content = Content::new();

        for item in list {
            let outline = tally.place(item);
            for vertices in paint(&mut content, &proj, item, &outline) {
                tally.emitted(item.layer, vertices);
            }
        }

        let bytes = assemble(self.options.page, content.finish());
        debug!(items = list.len(), bytes = bytes.len(), "pdf encoded");
        Ok(Rendered {
            bytes,
            report: tally.finish(OutputFormat::Pdf, None),
        })
    }
}

fn assemble(page_size: PageSize, content: Vec<u8>) -> Vec<u8> {
    let catalog_id = Ref::new(1);
    let tree_id = Ref::new(2);
    let page_id = Ref::new(3);
    let font_id = Ref::new(4);
    let content_id = Ref::new(5);
    let info_id = Ref::new(6);

    let mut pdf = Pdf::new();
    pdf.catalog(catalog_id).pages(tree_id);
    pdf.pages(tree_id).kids([page_id]).count(1);

    let size = page_size.size_mm() * PT_PER_MM;
    let mut page = pdf.page(page_id);
    page.media_box(Rect::new(0.0, 0.0, size.x as f32, size.y as f32));
    page.parent(tree_id);
    page.contents(content_id);
    page.resources().fonts().pair(FONT, font_id);
    page.finish();

    pdf.type1_font(font_id)
        .base_font(Name(b"Helvetica"))
        .encoding_predefined(Name(b"WinAnsiEncoding"));
    pdf.stream(content_id, &content);
    pdf.document_info(info_id)
        .title(TextStr("General arrangement drawing"))
        .creator(TextStr("bridge-gad"));
    pdf.finish()
}

/// Stroke one path; returns the number of points written.
fn stroke_path(content: &mut Content, points: &[DVec2], closed: bool) -> usize {
    let Some((first, rest)) = points.split_first() else {
        return 0;
    };
    content.move_to(first.x as f32, first.y as f32);
    for p in rest {
        content.line_to(p.x as f32, p.y as f32);
    }
    if closed {
        content.close_path();
    }
    content.stroke();
    points.len()
}

/// Append one item in device coordinates; returns the vertex count of each
/// path or text object written.
fn paint(content: &mut Content, proj: &Projection, item: &DrawItem, outline: &[DVec2]) -> Vec<usize> {
    let style = item_style(item);
    let [r, g, b] = aci_rgb(style.aci).map(|c| f32::from(c) / 255.0);
    content.set_line_width((style.lineweight * PT_PER_MM) as f32);
    content.set_stroke_rgb(r, g, b);

    let mut written = Vec::new();
    match &item.primitive {
        Primitive::Line { .. } | Primitive::Polyline { .. } | Primitive::Rect { .. } => {
            written.push(stroke_path(content, outline, item.primitive.is_closed()));
        }
        Primitive::Arc {
            centre,
            radius,
            start_deg,
            end_deg,
        } => {
            let points: Vec<DVec2> = arc_points(*centre, *radius, *start_deg, *end_deg, ARC_SEGMENTS)
                .into_iter()
                .map(|p| proj.from_model(p))
                .collect();
            written.push(stroke_path(content, &points, false));
        }
        Primitive::Hatch { .. } => {
            written.push(stroke_path(content, outline, true));
            for (a, b) in device_hatch(proj, &item.primitive) {
                written.push(stroke_path(content, &[a, b], false));
            }
        }
        Primitive::Text {
            at,
            value,
            height,
            rotation_deg,
            anchor,
        } => {
            let size = proj.length(*height);
            let start = text::baseline_start(proj.from_model(*at), value, size, *rotation_deg, *anchor);
            let (sin, cos) = rotation_deg.to_radians().sin_cos();
            let encoded = win_ansi(value);
            content.set_fill_rgb(r, g, b);
            content.begin_text();
            content.set_font(FONT, size as f32);
            content.set_text_matrix([
                cos as f32,
                sin as f32,
                -sin as f32,
                cos as f32,
                start.x as f32,
                start.y as f32,
            ]);
            content.show(Str(&encoded));
            content.end_text();
            written.push(1);
        }
    }
    written.retain(|&n| n > 0);
    written
}

/// Encode for the predefined WinAnsi encoding; anything outside Latin-1
/// becomes `?`.
fn win_ansi(s: &str) -> Vec<u8> {
    s.chars()
        .map(|c| match u8::try_from(u32::from(c)) {
            Ok(b) if b >= 0x20 => b,
            _ => b'?',
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::tests::{scenario_a_list, small_list};

    #[test]
    fn writes_one_page() {
        let rendered = PdfRenderer::default().render(&small_list()).unwrap();
        assert!(rendered.bytes.starts_with(b"%PDF-"));
        let text = String::from_utf8_lossy(&rendered.bytes);
        assert!(text.contains("/Helvetica"));
        assert!(text.contains("/Count 1"));
        assert!(rendered.report.warnings.is_empty());
    }

    #[test]
    fn drawing_fits_inside_margin() {
        let list = scenario_a_list();
        for page in [PageSize::A3, PageSize::A4] {
            let options = PdfOptions {
                page,
                ..PdfOptions::default()
            };
            let report = PdfRenderer::new(options).render(&list).unwrap().report;
            let size = page.size_mm() * PT_PER_MM;
            let margin = 20.0 * PT_PER_MM - 1e-6;
            assert!(report.device_bbox.min.x >= margin && report.device_bbox.min.y >= margin);
            assert!(report.device_bbox.max.x <= size.x - margin);
            assert!(report.device_bbox.max.y <= size.y - margin);
        }
    }

    #[test]
    fn bridge_width_fills_the_page() {
        let list = scenario_a_list();
        let report = PdfRenderer::default().render(&list).unwrap().report;
        let room = (PageSize::A3.size_mm() - DVec2::splat(40.0)) * PT_PER_MM;
        let used = report.device_bbox.size();
        assert!((used.x - room.x).abs() < 1e-6 || (used.y - room.y).abs() < 1e-6);
    }

    #[test]
    fn origin_follows_the_fit() {
        let list = small_list();
        let renderer = PdfRenderer::default();
        let proj = renderer.projection(&list);
        let centre = proj.from_model(list.bbox().center());
        let page = PageSize::A3.size_mm() * PT_PER_MM / 2.0;
        assert!((centre - page).length() < 1e-9);
        assert_eq!(renderer.world_origin(&list), proj.from_model(DVec2::ZERO));
    }

    #[test]
    fn text_outside_latin1_is_replaced() {
        assert_eq!(win_ansi("RL 100.0"), b"RL 100.0");
        assert_eq!(win_ansi("\u{e9}\u{2192}"), [0xe9, b'?']);
    }
}
