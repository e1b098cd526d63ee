//! The back-end-neutral drawing description.
//!
//! Builders append to a [`DrawSink`]; [`DrawSink::finalise`] closes it into an
//! immutable [`DrawList`] that renderers iterate in insertion order. All
//! coordinates are model metres (see [`crate::projection::Projection::model`]).

use std::collections::BTreeMap;
use std::fmt;

use glam::{DVec2, dvec2};

use crate::params::Side;
use crate::projection::DrawingFrame;
use crate::text::{self, Anchor};
use crate::types::BBox;

// ============================================================================
// Tags
// ============================================================================

/// The fixed drawing layers
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Layer {
    Grid,
    Structure,
    Foundation,
    Dimensions,
    Annotations,
    TitleBlock,
    CrossSection,
}

impl Layer {
    pub const ALL: [Layer; 7] = [
        Layer::Grid,
        Layer::Structure,
        Layer::Foundation,
        Layer::Dimensions,
        Layer::Annotations,
        Layer::TitleBlock,
        Layer::CrossSection,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Layer::Grid => "GRID",
            Layer::Structure => "STRUCTURE",
            Layer::Foundation => "FOUNDATION",
            Layer::Dimensions => "DIMENSIONS",
            Layer::Annotations => "ANNOTATIONS",
            Layer::TitleBlock => "TITLE_BLOCK",
            Layer::CrossSection => "CROSS_SECTION",
        }
    }

    pub fn from_name(name: &str) -> Option<Layer> {
        Layer::ALL
            .into_iter()
            .find(|l| l.name().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Which view of the sheet an item belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum View {
    Elevation,
    Plan,
    Section,
    Sheet,
}

/// Which part of the bridge an item draws
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Component {
    Grid,
    CrossSection,
    /// Deck of span `n`, counted from 1
    Deck(usize),
    WearingCourse,
    /// Interior pier `n`, counted from 1
    Pier(usize),
    Abutment(Side),
    ApproachSlab(Side),
    Section,
    Dimension,
    TitleBlock,
    /// Read back from a file, origin unknown
    Imported,
}

/// Fill pattern of a hatch
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HatchPattern {
    /// Parallel strokes at `angle_deg`, `spacing` metres apart
    Lines { angle_deg: f64, spacing: f64 },
}

/// Optional drawing hints; renderers fall back to per-layer defaults
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Style {
    /// Line weight in millimetres on paper
    pub lineweight: Option<f64>,
    /// AutoCAD colour index
    pub colour: Option<u8>,
}

// ============================================================================
// Primitives
// ============================================================================

/// The primitive alphabet
#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    Line {
        a: DVec2,
        b: DVec2,
    },
    Polyline {
        points: Vec<DVec2>,
        closed: bool,
    },
    /// Axis-aligned rectangle between two opposite corners
    Rect {
        a: DVec2,
        b: DVec2,
    },
    /// Counter-clockwise arc from `start_deg` to `end_deg`
    Arc {
        centre: DVec2,
        radius: f64,
        start_deg: f64,
        end_deg: f64,
    },
    Text {
        at: DVec2,
        value: String,
        height: f64,
        rotation_deg: f64,
        anchor: Anchor,
    },
    Hatch {
        boundary: Vec<DVec2>,
        pattern: HatchPattern,
    },
}

impl Primitive {
    pub fn kind(&self) -> &'static str {
        match self {
            Primitive::Line { .. } => "LINE",
            Primitive::Polyline { .. } => "POLYLINE",
            Primitive::Rect { .. } => "RECT",
            Primitive::Arc { .. } => "ARC",
            Primitive::Text { .. } => "TEXT",
            Primitive::Hatch { .. } => "HATCH",
        }
    }

    /// Number of defining vertices: the points a back-end must place.
    pub fn vertex_count(&self) -> usize {
        match self {
            Primitive::Line { .. } => 2,
            Primitive::Polyline { points, .. } => points.len(),
            Primitive::Rect { .. } => 4,
            Primitive::Arc { .. } => 1,
            Primitive::Text { .. } => 1,
            Primitive::Hatch { boundary, .. } => boundary.len(),
        }
    }

    /// The points an outline of this primitive passes through
    pub fn outline(&self) -> Vec<DVec2> {
        match self {
            Primitive::Line { a, b } => vec![*a, *b],
            Primitive::Polyline { points, .. } => points.clone(),
            Primitive::Rect { a, b } => BBox::from_corners(*a, *b).corners().to_vec(),
            Primitive::Arc {
                centre,
                radius,
                start_deg,
                end_deg,
            } => arc_points(*centre, *radius, *start_deg, *end_deg, ARC_SEGMENTS),
            Primitive::Text {
                at,
                value,
                height,
                rotation_deg,
                anchor,
            } => text::text_box(*at, value, *height, *rotation_deg, *anchor).to_vec(),
            Primitive::Hatch { boundary, .. } => boundary.clone(),
        }
    }

    /// Whether the outline returns to its first point
    pub fn is_closed(&self) -> bool {
        match self {
            Primitive::Polyline { closed, .. } => *closed,
            Primitive::Rect { .. } | Primitive::Text { .. } | Primitive::Hatch { .. } => true,
            Primitive::Line { .. } | Primitive::Arc { .. } => false,
        }
    }

    /// Extend `bbox` by the extent of this primitive
    pub fn extend_bbox(&self, bbox: &mut BBox) {
        for p in self.outline() {
            bbox.expand_point(p);
        }
    }
}

/// Chords per arc wherever an arc is flattened
pub const ARC_SEGMENTS: usize = 32;

/// Points along a counter-clockwise arc, both ends included.
pub fn arc_points(centre: DVec2, radius: f64, start_deg: f64, end_deg: f64, segments: usize) -> Vec<DVec2> {
    let mut sweep = end_deg - start_deg;
    if sweep <= 0.0 {
        sweep += 360.0;
    }
    let n = segments.max(1);
    (0..=n)
        .map(|i| {
            let a = (start_deg + sweep * i as f64 / n as f64).to_radians();
            centre + dvec2(a.cos(), a.sin()) * radius
        })
        .collect()
}

/// One tagged primitive
#[derive(Debug, Clone, PartialEq)]
pub struct DrawItem {
    pub layer: Layer,
    pub view: View,
    pub component: Component,
    pub primitive: Primitive,
    pub style: Style,
}

/// A non-fatal observation about the geometry
#[derive(Debug, Clone, PartialEq)]
pub struct GeometryWarning {
    pub component: Component,
    pub message: String,
}

impl fmt::Display for GeometryWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.component, self.message)
    }
}

// ============================================================================
// Statistics
// ============================================================================

/// Primitive and vertex counts of one layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LayerCount {
    pub primitives: usize,
    pub vertices: usize,
}

/// Per-layer counts, ordered by layer
pub type LayerStats = BTreeMap<Layer, LayerCount>;

/// Add one primitive with `vertices` defining vertices to `stats`
pub fn record(stats: &mut LayerStats, layer: Layer, vertices: usize) {
    let entry = stats.entry(layer).or_default();
    entry.primitives += 1;
    entry.vertices += vertices;
}

// ============================================================================
// Sink and list
// ============================================================================

/// The open, append-only form of a drawing
#[derive(Debug)]
pub struct DrawSink {
    frame: DrawingFrame,
    items: Vec<DrawItem>,
    warnings: Vec<GeometryWarning>,
}

impl DrawSink {
    pub fn new(frame: DrawingFrame) -> Self {
        Self {
            frame,
            items: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn frame(&self) -> &DrawingFrame {
        &self.frame
    }

    /// A pen that tags everything it draws with `layer`, `view`, `component`.
    pub fn pen(&mut self, layer: Layer, view: View, component: Component) -> Pen<'_> {
        Pen {
            sink: self,
            layer,
            view,
            component,
            style: Style::default(),
        }
    }

    pub fn push(&mut self, item: DrawItem) {
        self.items.push(item);
    }

    pub fn warn(&mut self, component: Component, message: impl Into<String>) {
        self.warnings.push(GeometryWarning {
            component,
            message: message.into(),
        });
    }

    /// Items appended so far
    pub fn items(&self) -> &[DrawItem] {
        &self.items
    }

    /// Extent of everything appended so far
    pub fn bbox(&self) -> BBox {
        bbox_of(&self.items)
    }

    /// Close the sink. The returned list can no longer grow.
    pub fn finalise(self) -> DrawList {
        DrawList {
            frame: self.frame,
            items: self.items,
            warnings: self.warnings,
        }
    }
}

/// Appends primitives under one set of tags
pub struct Pen<'a> {
    sink: &'a mut DrawSink,
    layer: Layer,
    view: View,
    component: Component,
    style: Style,
}

impl Pen<'_> {
    pub fn with_style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    pub fn draw(&mut self, primitive: Primitive) -> &mut Self {
        self.sink.items.push(DrawItem {
            layer: self.layer,
            view: self.view,
            component: self.component,
            primitive,
            style: self.style,
        });
        self
    }

    pub fn line(&mut self, a: DVec2, b: DVec2) -> &mut Self {
        self.draw(Primitive::Line { a, b })
    }

    pub fn polyline(&mut self, points: Vec<DVec2>, closed: bool) -> &mut Self {
        self.draw(Primitive::Polyline { points, closed })
    }

    pub fn rect(&mut self, a: DVec2, b: DVec2) -> &mut Self {
        self.draw(Primitive::Rect { a, b })
    }

    pub fn arc(&mut self, centre: DVec2, radius: f64, start_deg: f64, end_deg: f64) -> &mut Self {
        self.draw(Primitive::Arc {
            centre,
            radius,
            start_deg,
            end_deg,
        })
    }

    pub fn text(
        &mut self,
        at: DVec2,
        value: impl Into<String>,
        height: f64,
        rotation_deg: f64,
        anchor: Anchor,
    ) -> &mut Self {
        self.draw(Primitive::Text {
            at,
            value: value.into(),
            height,
            rotation_deg,
            anchor,
        })
    }

    pub fn hatch(&mut self, boundary: Vec<DVec2>, pattern: HatchPattern) -> &mut Self {
        self.draw(Primitive::Hatch { boundary, pattern })
    }
}

/// A finalised, immutable drawing
#[derive(Debug, Clone, PartialEq)]
pub struct DrawList {
    frame: DrawingFrame,
    items: Vec<DrawItem>,
    warnings: Vec<GeometryWarning>,
}

impl DrawList {
    pub fn frame(&self) -> &DrawingFrame {
        &self.frame
    }

    /// Items in insertion order
    pub fn iter(&self) -> std::slice::Iter<'_, DrawItem> {
        self.items.iter()
    }

    pub fn items(&self) -> &[DrawItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn warnings(&self) -> &[GeometryWarning] {
        &self.warnings
    }

    pub fn on_layer(&self, layer: Layer) -> impl Iterator<Item = &DrawItem> {
        self.items.iter().filter(move |i| i.layer == layer)
    }

    pub fn of_component(&self, component: Component) -> impl Iterator<Item = &DrawItem> {
        self.items.iter().filter(move |i| i.component == component)
    }

    /// Extent of every primitive, text boxes included
    pub fn bbox(&self) -> BBox {
        bbox_of(&self.items)
    }

    /// Expected per-layer counts for any faithful back-end
    pub fn stats(&self) -> LayerStats {
        let mut stats = LayerStats::new();
        for item in &self.items {
            record(&mut stats, item.layer, item.primitive.vertex_count());
        }
        stats
    }
}

impl<'a> IntoIterator for &'a DrawList {
    type Item = &'a DrawItem;
    type IntoIter = std::slice::Iter<'a, DrawItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

fn bbox_of(items: &[DrawItem]) -> BBox {
    let mut bbox = BBox::new();
    for item in items {
        item.primitive.extend_bbox(&mut bbox);
    }
    bbox
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Angle;

    fn frame() -> DrawingFrame {
        DrawingFrame {
            left: 0.0,
            datum: 100.0,
            scale1: 100.0,
            scale2: 50.0,
            skew: Angle::ZERO,
        }
    }

    #[test]
    fn insertion_order_is_kept() {
        let mut sink = DrawSink::new(frame());
        sink.pen(Layer::Grid, View::Elevation, Component::Grid)
            .line(DVec2::ZERO, dvec2(1.0, 0.0));
        sink.pen(Layer::Structure, View::Elevation, Component::Deck(1))
            .rect(dvec2(0.0, 0.0), dvec2(2.0, 1.0));
        let list = sink.finalise();
        let kinds: Vec<_> = list.iter().map(|i| i.primitive.kind()).collect();
        assert_eq!(kinds, ["LINE", "RECT"]);
        assert_eq!(list.of_component(Component::Deck(1)).count(), 1);
    }

    #[test]
    fn stats_count_vertices() {
        let mut sink = DrawSink::new(frame());
        sink.pen(Layer::Structure, View::Elevation, Component::Pier(1))
            .rect(dvec2(0.0, 0.0), dvec2(1.0, 1.0))
            .polyline(vec![DVec2::ZERO, dvec2(1.0, 0.0), dvec2(1.0, 1.0)], true);
        sink.pen(Layer::Annotations, View::Plan, Component::Pier(1))
            .text(DVec2::ZERO, "P1", 0.25, 0.0, Anchor::BOTTOM_CENTRE);
        let stats = sink.finalise().stats();
        assert_eq!(
            stats[&Layer::Structure],
            LayerCount {
                primitives: 2,
                vertices: 7
            }
        );
        assert_eq!(stats[&Layer::Annotations].vertices, 1);
        assert!(!stats.contains_key(&Layer::Grid));
    }

    #[test]
    fn bbox_covers_text() {
        let mut sink = DrawSink::new(frame());
        sink.pen(Layer::Annotations, View::Sheet, Component::TitleBlock)
            .text(DVec2::ZERO, "WIDE TITLE", 1.0, 0.0, Anchor::BASELINE_LEFT);
        let bbox = sink.finalise().bbox();
        assert!(bbox.max.x > 5.0);
        assert!(bbox.min.y < 0.0);
    }

    #[test]
    fn layer_names_round_trip() {
        for layer in Layer::ALL {
            assert_eq!(Layer::from_name(layer.name()), Some(layer));
        }
        assert_eq!(Layer::from_name("title_block"), Some(Layer::TitleBlock));
        assert_eq!(Layer::from_name("0"), None);
    }

    #[test]
    fn arc_points_sweep_ccw() {
        let pts = arc_points(DVec2::ZERO, 2.0, 0.0, 90.0, 4);
        assert_eq!(pts.len(), 5);
        assert!((pts[0] - dvec2(2.0, 0.0)).length() < 1e-12);
        assert!((pts[4] - dvec2(0.0, 2.0)).length() < 1e-12);
        let wrap = arc_points(DVec2::ZERO, 1.0, 270.0, 90.0, 2);
        assert!((wrap[1] - dvec2(1.0, 0.0)).length() < 1e-12);
    }

    #[test]
    fn warnings_survive_finalise() {
        let mut sink = DrawSink::new(frame());
        sink.warn(Component::Pier(2), "cap wider than span");
        let list = sink.finalise();
        assert_eq!(list.warnings().len(), 1);
        assert_eq!(list.warnings()[0].to_string(), "Pier(2): cap wider than span");
    }
}
