//! Back-end agreement checks.
//!
//! Shared by the integration tests and the batch tool: what each back-end
//! should write for a [`DrawList`], per-layer statistics of a written DXF,
//! a DXF read-back into a DrawList, and the comparison of
//! [`RenderReport`]s against the list they were rendered from.

use std::fmt;
use std::iter;

use dxf::entities::EntityType;
use dxf::enums::{HorizontalTextJustification, VerticalTextJustification};
use glam::{DVec2, dvec2};

use crate::drawlist::{
    ARC_SEGMENTS, Component, DrawList, DrawSink, HatchPattern, Layer, LayerCount, LayerStats, Primitive, View,
    record,
};
use crate::errors::RenderError;
use crate::geometry::shapes::hatch_strokes;
use crate::projection::{DrawingFrame, Projection};
use crate::render::dxf::{layer_stats, read_back};
use crate::render::{OutputFormat, RenderReport};
use crate::text::{Anchor, HAlign, VAlign};

/// Coordinates read back from a DXF may drift this far from the model, in
/// metres. DXF stores doubles as text; this only absorbs the formatting.
pub const IMPORT_TOLERANCE: f64 = 1e-6;

/// One way a back-end strayed from its DrawList
#[derive(Debug, Clone, PartialEq)]
pub enum Disagreement {
    /// A back-end wrote a different number of elements or vertices on a
    /// layer than its translation of the list calls for
    Stats {
        format: OutputFormat,
        layer: Layer,
        expected: LayerCount,
        found: LayerCount,
    },
    /// The drawn extent moved by more than the back-end's tolerance
    Extent {
        format: OutputFormat,
        deviation: f64,
        tolerance: f64,
    },
}

impl fmt::Display for Disagreement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Disagreement::Stats {
                format,
                layer,
                expected,
                found,
            } => write!(
                f,
                "{format}: {layer} has {}/{} elements/vertices, expected {}/{}",
                found.primitives, found.vertices, expected.primitives, expected.vertices
            ),
            Disagreement::Extent {
                format,
                deviation,
                tolerance,
            } => write!(f, "{format}: extent off by {deviation:.6} m (tolerance {tolerance:.6} m)"),
        }
    }
}

/// Compare every report against `list`.
///
/// The back-ends agree when each one wrote exactly its translation of the
/// list, layer by layer ([`expected_stats`]), and its drawn extent maps back
/// onto the list's within that back-end's tolerance.
pub fn check_agreement(list: &DrawList, reports: &[RenderReport]) -> Vec<Disagreement> {
    let expected_bbox = list.bbox();
    let mut out = Vec::new();

    for report in reports {
        let expected_stats = expected_stats(list, report.format);
        for layer in Layer::ALL {
            let expected = expected_stats.get(&layer).copied().unwrap_or_default();
            let found = report.stats.get(&layer).copied().unwrap_or_default();
            if expected != found {
                out.push(Disagreement::Stats {
                    format: report.format,
                    layer,
                    expected,
                    found,
                });
            }
        }
        let deviation = report.bbox.max_deviation(&expected_bbox);
        let tolerance = report.tolerance();
        if !(deviation <= tolerance) {
            out.push(Disagreement::Extent {
                format: report.format,
                deviation,
                tolerance,
            });
        }
    }
    out
}

/// Vertex counts of the elements `primitive` becomes on `format`.
///
/// DXF writes arcs as ARC entities and hatches as a boundary plus one LINE
/// per stroke. PDF flattens arcs and strokes hatches itself. The raster
/// flattens arcs, outlines hatches and draws text as its box.
fn elements(primitive: &Primitive, format: OutputFormat) -> Vec<usize> {
    let strokes = match primitive {
        Primitive::Hatch {
            boundary,
            pattern: HatchPattern::Lines { angle_deg, spacing },
        } => hatch_strokes(boundary, *angle_deg, *spacing).len(),
        _ => 0,
    };
    match (primitive, format) {
        (Primitive::Arc { .. }, OutputFormat::Pdf | OutputFormat::Png) => vec![ARC_SEGMENTS + 1],
        (Primitive::Text { .. }, OutputFormat::Png) => vec![4],
        (Primitive::Hatch { boundary, .. }, OutputFormat::Png) => vec![boundary.len()],
        (Primitive::Hatch { boundary, .. }, _) => {
            iter::once(boundary.len()).chain(iter::repeat_n(2, strokes)).collect()
        }
        (p, _) => vec![p.vertex_count()],
    }
}

/// What a faithful `format` back-end writes for `list`, per layer.
pub fn expected_stats(list: &DrawList, format: OutputFormat) -> LayerStats {
    let mut stats = LayerStats::new();
    for item in list {
        for vertices in elements(&item.primitive, format) {
            if vertices > 0 {
                record(&mut stats, item.layer, vertices);
            }
        }
    }
    stats
}

/// Entity and vertex counts per known layer of a DXF file.
///
/// Entities on layers outside the fixed set are ignored.
pub fn dxf_layer_stats(bytes: &[u8]) -> Result<LayerStats, RenderError> {
    Ok(layer_stats(&read_back(bytes)?))
}

fn anchor_of(h: HorizontalTextJustification, v: VerticalTextJustification) -> Anchor {
    let h = match h {
        HorizontalTextJustification::Center | HorizontalTextJustification::Middle => HAlign::Centre,
        HorizontalTextJustification::Right => HAlign::Right,
        _ => HAlign::Left,
    };
    let v = match v {
        VerticalTextJustification::Bottom => VAlign::Bottom,
        VerticalTextJustification::Middle => VAlign::Middle,
        VerticalTextJustification::Top => VAlign::Top,
        _ => VAlign::Baseline,
    };
    Anchor::new(h, v)
}

/// Read a DXF back into model coordinates.
///
/// Items come back on their layer with [`Component::Imported`] and
/// [`View::Sheet`]; closed LWPOLYLINEs stay polylines, so a round trip
/// preserves the DXF [`expected_stats`] rather than the original primitives.
pub fn import_dxf(bytes: &[u8], frame: &DrawingFrame) -> Result<DrawList, RenderError> {
    let drawing = read_back(bytes)?;
    let proj = Projection::dxf(frame);
    let model = |x: f64, y: f64| proj.to_model(dvec2(x, y));
    let metres = |mm: f64| mm / proj.hh();

    let mut sink = DrawSink::new(*frame);
    for entity in drawing.entities() {
        let Some(layer) = Layer::from_name(&entity.common.layer) else {
            continue;
        };
        let primitive = match &entity.specific {
            EntityType::Line(l) => Primitive::Line {
                a: model(l.p1.x, l.p1.y),
                b: model(l.p2.x, l.p2.y),
            },
            EntityType::LwPolyline(p) => Primitive::Polyline {
                points: p.vertices.iter().map(|v| model(v.x, v.y)).collect(),
                closed: p.is_closed(),
            },
            EntityType::Arc(a) => Primitive::Arc {
                centre: model(a.center.x, a.center.y),
                radius: metres(a.radius),
                start_deg: a.start_angle,
                end_deg: a.end_angle,
            },
            EntityType::Text(t) => {
                let anchor = anchor_of(t.horizontal_text_justification, t.vertical_text_justification);
                let at = if anchor == Anchor::BASELINE_LEFT {
                    &t.location
                } else {
                    &t.second_alignment_point
                };
                Primitive::Text {
                    at: model(at.x, at.y),
                    value: t.value.clone(),
                    height: metres(t.text_height),
                    rotation_deg: t.rotation,
                    anchor,
                }
            }
            _ => continue,
        };
        sink.pen(layer, View::Sheet, Component::Imported).draw(primitive);
    }
    Ok(sink.finalise())
}

/// Largest distance between matching outline points of two lists with the
/// same primitive sequence, or `None` when the sequences differ.
pub fn max_point_deviation(a: &DrawList, b: &DrawList) -> Option<f64> {
    if a.len() != b.len() {
        return None;
    }
    let mut worst = 0.0_f64;
    for (x, y) in a.iter().zip(b) {
        let (px, py) = (x.primitive.outline(), y.primitive.outline());
        if x.layer != y.layer || px.len() != py.len() {
            return None;
        }
        for (p, q) in px.iter().zip(&py) {
            worst = worst.max(DVec2::distance(*p, *q));
        }
    }
    Some(worst)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::tests::{scenario_a_list, small_list};
    use crate::render::{Backend, RenderOptions, Renderer};

    fn render_all(list: &DrawList) -> Vec<(Vec<u8>, RenderReport)> {
        [OutputFormat::Dxf, OutputFormat::Pdf, OutputFormat::Png]
            .into_iter()
            .map(|f| {
                let r = Backend::for_format(f, &RenderOptions::default()).render(list).unwrap();
                (r.bytes, r.report)
            })
            .collect()
    }

    #[test]
    fn scenario_a_backends_agree() {
        let list = scenario_a_list();
        let reports: Vec<RenderReport> = render_all(&list).into_iter().map(|(_, r)| r).collect();
        let disagreements = check_agreement(&list, &reports);
        assert!(disagreements.is_empty(), "{disagreements:?}");
    }

    #[test]
    fn tampered_stats_are_reported() {
        let list = small_list();
        let mut report = render_all(&list).remove(0).1;
        report.stats.remove(&Layer::Annotations);
        let found = check_agreement(&list, &[report]);
        assert_eq!(found.len(), 1);
        assert!(found[0].to_string().starts_with("dxf: ANNOTATIONS has 0/0"));
    }

    #[test]
    fn missing_output_is_caught() {
        let list = scenario_a_list();
        // a back-end that silently skipped the first structure primitive
        let mut sink = DrawSink::new(*list.frame());
        let skip = list.iter().position(|i| i.layer == Layer::Structure).unwrap();
        for (n, item) in list.iter().enumerate() {
            if n != skip {
                sink.push(item.clone());
            }
        }
        let short = sink.finalise();
        for (_, report) in render_all(&short) {
            let found = check_agreement(&list, &[report]);
            assert!(
                found
                    .iter()
                    .any(|d| matches!(d, Disagreement::Stats { layer: Layer::Structure, .. })),
                "{found:?}"
            );
        }
    }

    #[test]
    fn dxf_stats_include_hatch_strokes() {
        let list = scenario_a_list();
        let (bytes, _) = render_all(&list).remove(0);
        assert_eq!(dxf_layer_stats(&bytes).unwrap(), expected_stats(&list, OutputFormat::Dxf));
    }

    #[test]
    fn import_recovers_model_coordinates() {
        let list = small_list();
        let (bytes, _) = render_all(&list).remove(0);
        let back = import_dxf(&bytes, list.frame()).unwrap();
        assert_eq!(back.stats(), expected_stats(&list, OutputFormat::Dxf));

        let text = back
            .iter()
            .find_map(|i| match &i.primitive {
                Primitive::Text { at, anchor, .. } => Some((*at, *anchor)),
                _ => None,
            })
            .unwrap();
        assert!((text.0 - dvec2(1.0, -2.0)).length() < IMPORT_TOLERANCE);
        assert_eq!(text.1, Anchor::BOTTOM_CENTRE);

        let arc = back
            .iter()
            .find(|i| i.primitive.kind() == "ARC")
            .unwrap();
        assert!(arc.primitive.outline()[0].distance(dvec2(5.5, 1.0)) < IMPORT_TOLERANCE);
    }
}
