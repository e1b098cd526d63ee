//! Dimension lines: span lengths over the deck and the carriageway width in
//! the cross section.

use glam::DVec2;

use super::sheet::{GRID_TEXT, Sheet, TICK};
use crate::drawlist::{Component, DrawSink, Layer, Pen, View};
use crate::errors::GadError;
use crate::params::ParameterStore;
use crate::projection::Projection;
use crate::text::Anchor;

/// A dimension from `a` to `b` with end ticks and a label above its middle.
///
/// `tick` and `text_height` are output lengths.
pub fn linear(pen: &mut Pen<'_>, a: DVec2, b: DVec2, tick: f64, text_height: f64, label: String) {
    let dir = (b - a).normalize_or_zero();
    let normal = dir.perp();
    pen.line(a, b);
    for end in [a, b] {
        pen.line(end - normal * tick, end + normal * tick);
    }
    let rotation = dir.y.atan2(dir.x).to_degrees();
    pen.text(
        (a + b) / 2.0 + normal * (tick / 2.0),
        label,
        text_height,
        rotation,
        Anchor::BOTTOM_CENTRE,
    );
}

/// Level the span dimensions sit at, above the kerb
pub fn span_dimension_rl(store: &ParameterStore) -> Result<f64, GadError> {
    let deck = store.deck()?;
    Ok(deck.rtl + deck.kerbd + 6.0 * store.derived().paper)
}

pub fn build(store: &ParameterStore, proj: &Projection, sink: &mut DrawSink) -> Result<(), GadError> {
    let d = store.derived();
    let k = Sheet::new(store)?.k;
    let tick = proj.length(TICK * k / 2.0);
    let text = proj.length(GRID_TEXT * k);
    let level = span_dimension_rl(store)?;

    let mut pen = sink.pen(Layer::Dimensions, View::Elevation, Component::Dimension);
    for (j, span) in d.spans.iter().enumerate() {
        linear(
            &mut pen,
            proj.pt(d.spane[j], level),
            proj.pt(d.spane[j + 1], level),
            tick,
            text,
            format!("{span:.3}"),
        );
    }
    if d.spans.len() > 1 {
        let overall = level + 6.0 * k;
        linear(
            &mut pen,
            proj.pt(d.spane[0], overall),
            proj.pt(d.bridge_end(), overall),
            tick,
            text,
            format!("{:.3}", d.total_length()),
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::dvec2;
    use crate::drawlist::{DrawList, Primitive};
    use crate::params::tests::{GROUND_A, scenario_a};
    use crate::projection::DrawingFrame;

    fn run(changes: &[(&'static str, f64)]) -> DrawList {
        let mut map = scenario_a();
        map.extend_from_slice(changes);
        let store = ParameterStore::from_mapping(map, &GROUND_A).unwrap();
        let frame = DrawingFrame::from_store(&store).unwrap();
        let proj = Projection::model(&frame);
        let mut sink = DrawSink::new(frame);
        build(&store, &proj, &mut sink).unwrap();
        sink.finalise()
    }

    #[test]
    fn single_span_has_one_dimension() {
        let list = run(&[]);
        assert_eq!(list.len(), 4);
        let labels: Vec<_> = list
            .iter()
            .filter_map(|i| match &i.primitive {
                Primitive::Text { value, rotation_deg, .. } => Some((value.clone(), *rotation_deg)),
                _ => None,
            })
            .collect();
        assert_eq!(labels, [("20.000".to_string(), 0.0)]);
    }

    #[test]
    fn overall_dimension_over_several_spans() {
        let list = run(&[("NSPAN", 2.0), ("SPAN1", 10.0)]);
        assert_eq!(list.len(), 3 * 4);
        assert!(list.iter().any(|i| matches!(
            &i.primitive,
            Primitive::Text { value, .. } if value == "20.000"
        )));
    }

    #[test]
    fn ticks_are_square_to_the_line() {
        let frame = DrawingFrame {
            left: 0.0,
            datum: 0.0,
            scale1: 100.0,
            scale2: 100.0,
            skew: crate::types::Angle::ZERO,
        };
        let mut sink = DrawSink::new(frame);
        let mut pen = sink.pen(Layer::Dimensions, View::Section, Component::Dimension);
        linear(&mut pen, dvec2(0.0, 0.0), dvec2(0.0, 4.0), 0.5, 0.2, "4".into());
        let list = sink.finalise();
        assert_eq!(
            list.items()[1].primitive,
            Primitive::Line {
                a: dvec2(0.5, 0.0),
                b: dvec2(-0.5, 0.0)
            }
        );
        let Primitive::Text { rotation_deg, .. } = list.items()[3].primitive else {
            panic!("label last");
        };
        assert!((rotation_deg - 90.0).abs() < 1e-9);
    }
}
