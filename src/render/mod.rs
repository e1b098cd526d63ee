//! Back-ends turning a finalised [`DrawList`] into a file.
//!
//! Each renderer owns a [`Projection`] from model metres onto its device and
//! translates primitives one by one, in insertion order. A primitive a
//! back-end cannot express is drawn as its fallback and counted in the
//! report's warnings; rendering never aborts over it.
//!
//! Report statistics count what a back-end wrote: DXF entities read back
//! from the encoded file, PDF and raster paths as they are stroked.

pub mod dxf;
pub mod output;
pub mod pdf;
pub mod screen;
pub mod style;

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use enum_dispatch::enum_dispatch;
use glam::DVec2;

use crate::drawlist::{DrawItem, DrawList, Layer, LayerStats, Primitive, record};
use crate::errors::{GadError, RenderError};
use crate::geometry::shapes::hatch_strokes;
use crate::log::info;
#[cfg(feature = "tracing")]
use crate::log::warn;
use crate::projection::Projection;
use crate::types::BBox;

pub use self::dxf::DxfRenderer;
pub use self::pdf::{PageSize, PdfOptions, PdfRenderer};
pub use self::screen::{ScreenRenderer, ScreenView};

/// Output artefact kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum OutputFormat {
    Dxf,
    Pdf,
    /// Raster snapshot of the screen renderer
    Png,
}

impl OutputFormat {
    /// Guess the format from a file extension, case-insensitively.
    pub fn from_extension(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "dxf" => Some(OutputFormat::Dxf),
            "pdf" => Some(OutputFormat::Pdf),
            "png" => Some(OutputFormat::Png),
            _ => None,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Dxf => "dxf",
            OutputFormat::Pdf => "pdf",
            OutputFormat::Png => "png",
        }
    }

    /// How far two back-ends may disagree, in device units
    pub fn device_tolerance(self) -> f64 {
        match self {
            // drawing units (mm)
            OutputFormat::Dxf => 0.5,
            // 0.1 mm on paper, in points
            OutputFormat::Pdf => 0.1 * pdf::PT_PER_MM,
            // pixels
            OutputFormat::Png => 0.5,
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Primitives one back-end had to approximate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderWarning {
    pub kind: &'static str,
    pub layer: Layer,
    pub fallback: &'static str,
    pub count: usize,
}

impl fmt::Display for RenderWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} on {} drawn as {}",
            self.count, self.kind, self.layer, self.fallback
        )
    }
}

/// What a back-end drew
#[derive(Debug, Clone, PartialEq)]
pub struct RenderReport {
    pub format: OutputFormat,
    /// Elements written and their vertices, per layer
    pub stats: LayerStats,
    /// Extent of everything placed, in device units
    pub device_bbox: BBox,
    /// The same extent mapped back to model metres
    pub bbox: BBox,
    /// Device units per model metre
    pub units_per_metre: f64,
    pub warnings: Vec<RenderWarning>,
}

impl RenderReport {
    /// Agreement tolerance in model metres
    pub fn tolerance(&self) -> f64 {
        self.format.device_tolerance() / self.units_per_metre
    }
}

/// Encoded output plus its report
#[derive(Debug, Clone)]
pub struct Rendered {
    pub bytes: Vec<u8>,
    pub report: RenderReport,
}

#[enum_dispatch]
pub trait Renderer {
    fn format(&self) -> OutputFormat;

    /// The device projection this renderer uses for `list`
    fn projection(&self, list: &DrawList) -> Projection;

    /// Where `(LEFT, DATUM)` lands on the device
    fn world_origin(&self, list: &DrawList) -> DVec2 {
        self.projection(list).world_origin()
    }

    fn render(&mut self, list: &DrawList) -> Result<Rendered, RenderError>;

    /// Render and write to `path`; nothing is left at `path` on failure.
    fn emit(&mut self, list: &DrawList, path: &Path) -> Result<RenderReport, GadError> {
        let rendered = self.render(list)?;
        output::write_guarded(path, &rendered.bytes)?;
        let report = rendered.report;
        #[cfg(feature = "tracing")]
        for w in &report.warnings {
            warn!(%w, "render fallback");
        }
        info!(format = %report.format, path = %path.display(), bytes = rendered.bytes.len(), "drawing written");
        Ok(report)
    }
}

/// The three back-ends
#[enum_dispatch(Renderer)]
#[derive(Debug, Clone)]
pub enum Backend {
    DxfRenderer,
    PdfRenderer,
    ScreenRenderer,
}

/// Settings for whichever back-end a format selects
#[derive(Debug, Clone, Default)]
pub struct RenderOptions {
    pub pdf: PdfOptions,
    pub view: ScreenView,
}

impl Backend {
    pub fn for_format(format: OutputFormat, options: &RenderOptions) -> Self {
        match format {
            OutputFormat::Dxf => DxfRenderer::default().into(),
            OutputFormat::Pdf => PdfRenderer::new(options.pdf).into(),
            OutputFormat::Png => ScreenRenderer::new(options.view).into(),
        }
    }
}

// ============================================================================
// Shared bookkeeping
// ============================================================================

/// Counts, extent and fallbacks of one rendering pass
pub(crate) struct Tally<'a> {
    proj: &'a Projection,
    stats: LayerStats,
    device_bbox: BBox,
    fallbacks: BTreeMap<(Layer, &'static str, &'static str), usize>,
}

impl<'a> Tally<'a> {
    pub(crate) fn new(proj: &'a Projection) -> Self {
        Self {
            proj,
            stats: LayerStats::new(),
            device_bbox: BBox::new(),
            fallbacks: BTreeMap::new(),
        }
    }

    /// Extend the drawn extent by `item` and return its outline on the device.
    pub(crate) fn place(&mut self, item: &DrawItem) -> Vec<DVec2> {
        let outline: Vec<DVec2> = item
            .primitive
            .outline()
            .into_iter()
            .map(|p| self.proj.from_model(p))
            .collect();
        for &p in &outline {
            self.device_bbox.expand_point(p);
        }
        outline
    }

    /// Count one element written to the device on `layer`.
    pub(crate) fn emitted(&mut self, layer: Layer, vertices: usize) {
        record(&mut self.stats, layer, vertices);
    }

    pub(crate) fn fallback(&mut self, layer: Layer, kind: &'static str, drawn_as: &'static str) {
        *self.fallbacks.entry((layer, kind, drawn_as)).or_default() += 1;
    }

    /// Close the pass; `written` replaces the counted stats when the
    /// back-end measured its output another way.
    pub(crate) fn finish(self, format: OutputFormat, written: Option<LayerStats>) -> RenderReport {
        let bbox = if self.device_bbox.is_empty() {
            BBox::new()
        } else {
            BBox::from_corners(
                self.proj.to_model(self.device_bbox.min),
                self.proj.to_model(self.device_bbox.max),
            )
        };
        RenderReport {
            format,
            stats: written.unwrap_or(self.stats),
            device_bbox: self.device_bbox,
            bbox,
            units_per_metre: self.proj.hh(),
            warnings: self
                .fallbacks
                .into_iter()
                .map(|((layer, kind, fallback), count)| RenderWarning {
                    kind,
                    layer,
                    fallback,
                    count,
                })
                .collect(),
        }
    }
}

/// Device-space strokes filling a hatch boundary given in model metres
pub(crate) fn device_hatch(proj: &Projection, primitive: &Primitive) -> Vec<(DVec2, DVec2)> {
    match primitive {
        Primitive::Hatch {
            boundary,
            pattern: crate::drawlist::HatchPattern::Lines { angle_deg, spacing },
        } => hatch_strokes(boundary, *angle_deg, *spacing)
            .into_iter()
            .map(|(a, b)| (proj.from_model(a), proj.from_model(b)))
            .collect(),
        _ => Vec::new(),
    }
}

/// Reject lists no back-end can place.
pub(crate) fn check_drawable(list: &DrawList) -> Result<BBox, RenderError> {
    if list.is_empty() {
        return Err(RenderError::EmptyDrawing);
    }
    let bbox = list.bbox();
    if !(bbox.min.is_finite() && bbox.max.is_finite()) || bbox.is_empty() {
        return Err(RenderError::InvalidBounds);
    }
    Ok(bbox)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::drawlist::{ARC_SEGMENTS, Component, DrawSink, HatchPattern, View};
    use crate::geometry::GeometryBuilder;
    use crate::params::ParameterStore;
    use crate::params::tests::{GROUND_A, scenario_a};
    use crate::projection::DrawingFrame;
    use crate::types::Angle;
    use glam::dvec2;

    pub(crate) fn scenario_a_list() -> DrawList {
        let store = ParameterStore::from_mapping(scenario_a(), &GROUND_A).unwrap();
        GeometryBuilder::new(&store).build().unwrap()
    }

    pub(crate) fn small_list() -> DrawList {
        let frame = DrawingFrame {
            left: 0.0,
            datum: 100.0,
            scale1: 100.0,
            scale2: 50.0,
            skew: Angle::ZERO,
        };
        let mut sink = DrawSink::new(frame);
        sink.pen(Layer::Structure, View::Elevation, Component::Deck(1))
            .rect(dvec2(0.0, 0.0), dvec2(10.0, 2.0))
            .arc(dvec2(5.0, 1.0), 0.5, 0.0, 180.0);
        sink.pen(Layer::Structure, View::Plan, Component::Abutment(crate::params::Side::Left))
            .hatch(
                vec![dvec2(0.0, -5.0), dvec2(2.0, -5.0), dvec2(2.0, -3.0), dvec2(0.0, -3.0)],
                HatchPattern::Lines {
                    angle_deg: 45.0,
                    spacing: 0.25,
                },
            );
        sink.pen(Layer::Annotations, View::Plan, Component::Grid).text(
            dvec2(1.0, -2.0),
            "A1",
            0.25,
            0.0,
            crate::text::Anchor::BOTTOM_CENTRE,
        );
        sink.finalise()
    }

    #[test]
    fn formats_from_extension() {
        assert_eq!(OutputFormat::from_extension(Path::new("a/b.DXF")), Some(OutputFormat::Dxf));
        assert_eq!(OutputFormat::from_extension(Path::new("gad.pdf")), Some(OutputFormat::Pdf));
        assert_eq!(OutputFormat::from_extension(Path::new("gad.png")), Some(OutputFormat::Png));
        assert_eq!(OutputFormat::from_extension(Path::new("gad")), None);
        assert_eq!(OutputFormat::from_extension(Path::new("gad.svg")), None);
    }

    #[test]
    fn backends_dispatch_by_format() {
        let options = RenderOptions::default();
        for format in [OutputFormat::Dxf, OutputFormat::Pdf, OutputFormat::Png] {
            assert_eq!(Backend::for_format(format, &options).format(), format);
        }
    }

    #[test]
    fn stats_count_written_elements() {
        let list = small_list();
        let options = RenderOptions::default();
        let stats = |format| {
            Backend::for_format(format, &options)
                .render(&list)
                .unwrap()
                .report
                .stats
        };
        let strokes = match &list.items()[2].primitive {
            Primitive::Hatch {
                boundary,
                pattern: crate::drawlist::HatchPattern::Lines { angle_deg, spacing },
            } => hatch_strokes(boundary, *angle_deg, *spacing).len(),
            _ => unreachable!(),
        };
        assert!(strokes > 0);

        // rect + arc + hatch boundary + one LINE per stroke
        let dxf = stats(OutputFormat::Dxf)[&Layer::Structure];
        assert_eq!(dxf.primitives, 3 + strokes);
        assert_eq!(dxf.vertices, 4 + 1 + 4 + 2 * strokes);

        // the arc is stroked as a flattened path
        let pdf = stats(OutputFormat::Pdf)[&Layer::Structure];
        assert_eq!(pdf.primitives, 3 + strokes);
        assert_eq!(pdf.vertices, 4 + (ARC_SEGMENTS + 1) + 4 + 2 * strokes);

        // the raster draws the hatch outline only, and text as its box
        let png = stats(OutputFormat::Png);
        assert_eq!(png[&Layer::Structure].primitives, 3);
        assert_eq!(png[&Layer::Structure].vertices, 4 + (ARC_SEGMENTS + 1) + 4);
        assert_eq!(png[&Layer::Annotations], crate::drawlist::LayerCount { primitives: 1, vertices: 4 });
    }

    #[test]
    fn extents_agree_across_backends() {
        let list = small_list();
        let options = RenderOptions::default();
        let reports: Vec<RenderReport> = [OutputFormat::Dxf, OutputFormat::Pdf, OutputFormat::Png]
            .into_iter()
            .map(|f| Backend::for_format(f, &options).render(&list).unwrap().report)
            .collect();
        for r in &reports[1..] {
            let tol = r.tolerance().max(reports[0].tolerance());
            assert!(r.bbox.max_deviation(&reports[0].bbox) <= tol, "{}", r.format);
        }
    }

    #[test]
    fn empty_list_is_rejected() {
        let frame = *small_list().frame();
        let list = DrawSink::new(frame).finalise();
        let mut backend = Backend::for_format(OutputFormat::Dxf, &RenderOptions::default());
        assert!(matches!(backend.render(&list), Err(RenderError::EmptyDrawing)));
    }

    #[test]
    fn warnings_display_counts() {
        let w = RenderWarning {
            kind: "HATCH",
            layer: Layer::Structure,
            fallback: "outline",
            count: 2,
        };
        assert_eq!(w.to_string(), "2 HATCH on STRUCTURE drawn as outline");
    }
}
