//! Deck slabs, kerbs and the wearing course.

use glam::{DVec2, dvec2};

use super::abutment::face;
use super::sheet::Sheet;
use crate::drawlist::{Component, DrawSink, Layer, View};
use crate::errors::GadError;
use crate::params::{ParameterStore, Side};
use crate::projection::Projection;

/// Chainage extent of the slab over span `j` (0-based), joint gaps removed
pub fn slab_extent(spane: &[f64], j: usize, joint_gap: f64) -> (f64, f64) {
    (spane[j] + joint_gap / 2.0, spane[j + 1] - joint_gap / 2.0)
}

/// Plan outline of a deck strip between two skewed faces.
///
/// The faces pass through `(x0, yc)` and `(x1, yc)`; edges lie `half` either
/// side of the centreline.
pub fn skewed_strip(x0: f64, x1: f64, yc: f64, half: f64, tan: f64) -> Vec<DVec2> {
    let shift = half * tan;
    vec![
        dvec2(x0 + shift, yc - half),
        dvec2(x1 + shift, yc - half),
        dvec2(x1 - shift, yc + half),
        dvec2(x0 - shift, yc + half),
    ]
}

pub fn build(store: &ParameterStore, proj: &Projection, sink: &mut DrawSink) -> Result<(), GadError> {
    let deck = store.deck()?;
    let d = store.derived();
    let sheet = Sheet::new(store)?;
    let half = (deck.ccbr + 2.0 * deck.kerbw) / 2.0;
    let kerb_top = deck.rtl + deck.kerbd;

    for j in 0..d.spans.len() {
        let (x0, x1) = slab_extent(&d.spane, j, deck.joint_gap);
        let component = Component::Deck(j + 1);
        sink.pen(Layer::Structure, View::Elevation, component)
            .rect(proj.pt(x0, deck.rtl), proj.pt(x1, deck.sofl))
            .line(proj.pt(x0, kerb_top), proj.pt(x1, kerb_top));

        let outline = skewed_strip(x0, x1, sheet.plan_rl, half, d.tan);
        let mut pen = sink.pen(Layer::Structure, View::Plan, component);
        pen.polyline(outline.iter().map(|p| proj.pt(p.x, p.y)).collect(), true);
        for edge in [half - deck.kerbw, -(half - deck.kerbw)] {
            let y = sheet.plan_rl + edge;
            let shift = edge * d.tan;
            pen.line(proj.pt(x0 - shift, y), proj.pt(x1 - shift, y));
        }
    }

    if deck.wcth > 0.0 {
        let behind = store.approach()?.laslab + store.get("DWTH")?;
        let wc = deck.rtl + deck.wcth;
        let reach = |side| {
            let (x_face, dir) = face(store, side);
            x_face - dir * behind
        };
        sink.pen(Layer::Structure, View::Elevation, Component::WearingCourse)
            .line(proj.pt(reach(Side::Left), wc), proj.pt(reach(Side::Right), wc));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drawlist::Primitive;
    use crate::params::tests::{GROUND_A, scenario_a};
    use crate::projection::DrawingFrame;

    fn build_with(changes: &[(&'static str, f64)]) -> crate::drawlist::DrawList {
        let mut map = scenario_a();
        map.extend_from_slice(changes);
        let store = ParameterStore::from_mapping(map, &GROUND_A).unwrap();
        let frame = DrawingFrame::from_store(&store).unwrap();
        let proj = Projection::model(&frame);
        let mut sink = DrawSink::new(frame);
        build(&store, &proj, &mut sink).unwrap();
        sink.finalise()
    }

    fn elevation_rects(list: &crate::drawlist::DrawList) -> Vec<(DVec2, DVec2)> {
        list.iter()
            .filter_map(|i| match i.primitive {
                Primitive::Rect { a, b } if i.view == View::Elevation => Some((a, b)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn one_slab_per_span() {
        let list = build_with(&[]);
        let rects = elevation_rects(&list);
        assert_eq!(rects.len(), 1);
        let (a, b) = rects[0];
        assert!((a.x - 5.0125).abs() < 1e-9);
        assert!((b.x - 24.9875).abs() < 1e-9);
        assert!((a.y - 8.0).abs() < 1e-9);
        assert!((b.y - 6.5).abs() < 1e-9);
    }

    #[test]
    fn three_spans_leave_joint_gaps() {
        let list = build_with(&[("NSPAN", 3.0), ("SPAN1", 20.0 / 3.0)]);
        let rects = elevation_rects(&list);
        assert_eq!(rects.len(), 3);
        for pair in rects.windows(2) {
            assert!((pair[1].0.x - pair[0].1.x - 0.025).abs() < 1e-9);
        }
    }

    #[test]
    fn wearing_course_spans_approach_slabs() {
        let list = build_with(&[]);
        let wc: Vec<_> = list.of_component(Component::WearingCourse).collect();
        assert_eq!(wc.len(), 1);
        let Primitive::Line { a, b } = wc[0].primitive else {
            panic!("wearing course is a line");
        };
        // 5 - 0.3 - 3.5 on the left, mirrored on the right
        assert!((a.x - 1.2).abs() < 1e-9);
        assert!((b.x - 28.8).abs() < 1e-9);
        assert!((a.y - 8.08).abs() < 1e-9);
        assert!(build_with(&[("WCTH", 0.0)])
            .of_component(Component::WearingCourse)
            .next()
            .is_none());
    }

    #[test]
    fn skewed_ends_follow_the_face() {
        let pts = skewed_strip(0.0, 10.0, 0.0, 2.0, 0.5);
        assert_eq!(pts[0], dvec2(1.0, -2.0));
        assert_eq!(pts[3], dvec2(-1.0, 2.0));
        assert_eq!(skewed_strip(0.0, 10.0, 0.0, 2.0, 0.0)[0], dvec2(0.0, -2.0));
    }
}
