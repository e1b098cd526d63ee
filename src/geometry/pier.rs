//! Interior piers: cap, battered shaft and footing in elevation, the skewed
//! body and footing in plan.

use glam::{DVec2, dvec2};

use super::cross_section::ground_level_at;
use super::sheet::{LABEL_TEXT, Sheet};
use super::shapes::{centred_rect, plan_points, project};
use crate::drawlist::{Component, DrawSink, Layer, View};
use crate::errors::GadError;
use crate::log::debug;
use crate::params::{ParameterStore, Pier};
use crate::projection::Projection;
use crate::text::Anchor;

/// Plan length of the pier body along the face, skew elongation included
pub fn plan_length(pier: &Pier, cos: f64, tan: f64) -> f64 {
    pier.pierst / cos + (pier.piertw * tan).abs()
}

/// Elevation outline of the battered shaft, top left first
pub fn shaft_outline(pier: &Pier, xc: f64, cos: f64) -> Vec<DVec2> {
    let top = pier.piertw / (2.0 * cos);
    let bottom = top + pier.batter_offset();
    let ft = pier.footing_top();
    vec![
        dvec2(xc - top, pier.capb),
        dvec2(xc + top, pier.capb),
        dvec2(xc + bottom, ft),
        dvec2(xc - bottom, ft),
    ]
}

pub fn build(store: &ParameterStore, proj: &Projection, sink: &mut DrawSink) -> Result<(), GadError> {
    let pier = store.pier()?;
    let frame = store.frame()?;
    let d = store.derived();
    let sheet = Sheet::new(store)?;
    let yc = sheet.plan_rl;
    let ft = pier.footing_top();
    let length = plan_length(&pier, d.cos, d.tan);

    for i in 1..d.spans.len() {
        let xc = d.spane[i];
        let component = Component::Pier(i);

        // Elevation
        let cap_half = pier.capw / (2.0 * d.cos);
        let footing_half = pier.futw / (2.0 * d.cos);
        sink.pen(Layer::Structure, View::Elevation, component)
            .rect(proj.pt(xc - cap_half, pier.capt), proj.pt(xc + cap_half, pier.capb))
            .polyline(project(proj, &shaft_outline(&pier, xc, d.cos)), true);
        sink.pen(Layer::Foundation, View::Elevation, component).rect(
            proj.pt(xc - footing_half, ft),
            proj.pt(xc + footing_half, pier.futrl),
        );

        // Plan
        let centre = dvec2(xc, yc);
        let body = centred_rect(centre, dvec2(pier.piertw / 2.0, length / 2.0));
        let spread = pier.piertw / 2.0 + pier.batter_offset();
        let mut pen = sink.pen(Layer::Structure, View::Plan, component);
        pen.polyline(plan_points(proj, &body, centre), true);
        for dx in [-spread, spread] {
            let ends = [dvec2(xc + dx, yc - length / 2.0), dvec2(xc + dx, yc + length / 2.0)];
            let ends = plan_points(proj, &ends, centre);
            pen.line(ends[0], ends[1]);
        }
        let footing = centred_rect(centre, dvec2(pier.futw / 2.0, pier.futl / 2.0));
        sink.pen(Layer::Foundation, View::Plan, component)
            .polyline(plan_points(proj, &footing, centre), true);
        sink.pen(Layer::Annotations, View::Plan, component).text(
            proj.pt(xc, sheet.plan_label_rl()),
            format!("P{i}"),
            proj.length(LABEL_TEXT * sheet.k),
            0.0,
            Anchor::BOTTOM_CENTRE,
        );

        // Sanity checks
        let shortest = d.spans[i - 1].min(d.spans[i]);
        if 2.0 * cap_half > shortest {
            sink.warn(
                component,
                format!(
                    "cap width {:.3} exceeds the adjacent span {shortest:.3}",
                    2.0 * cap_half
                ),
            );
        }
        if pier.futrl < frame.datum {
            sink.warn(
                component,
                format!(
                    "footing bottom {:.3} lies below the datum {:.3}",
                    pier.futrl, frame.datum
                ),
            );
        }
        if let Some(ground) = ground_level_at(store.cs_points(), xc).filter(|&g| ft > g) {
            sink.warn(
                component,
                format!("footing top {ft:.3} stands above ground level {ground:.3}"),
            );
        }
        debug!(pier = i, xc, "pier drawn");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
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
    fn single_span_has_no_piers() {
        assert!(run(&[]).is_empty());
    }

    #[test]
    fn two_piers_for_three_spans() {
        let list = run(&[("NSPAN", 3.0), ("SPAN1", 20.0 / 3.0)]);
        assert_eq!(list.of_component(Component::Pier(1)).count(), 8);
        assert_eq!(list.of_component(Component::Pier(2)).count(), 8);
        assert_eq!(list.of_component(Component::Pier(3)).count(), 0);
    }

    #[test]
    fn shaft_widens_by_the_batter() {
        let store = ParameterStore::from_mapping(scenario_a(), &GROUND_A).unwrap();
        let pier = store.pier().unwrap();
        // CAPB 105.9, footing top 101, 1 in 10
        let pts = shaft_outline(&pier, 10.0, 1.0);
        assert!((pts[1].x - 10.6).abs() < 1e-9);
        assert!((pts[2].x - (10.6 + 0.49)).abs() < 1e-9);
        assert!((pts[2].y - 101.0).abs() < 1e-9);
    }

    #[test]
    fn skewed_plan_body_is_elongated() {
        let list = run(&[("NSPAN", 2.0), ("SPAN1", 10.0), ("SKEW", 30.0)]);
        let body = list
            .of_component(Component::Pier(1))
            .find_map(|i| match &i.primitive {
                Primitive::Polyline { points, .. } if i.view == View::Plan => Some(points.clone()),
                _ => None,
            })
            .unwrap();
        let t = 30f64.to_radians();
        let pierst = 7.5 + 2.0 * 0.23;
        let expected = pierst / t.cos() + (1.2 * t.tan()).abs();
        assert!(((body[3] - body[0]).length() - expected).abs() < 1e-3);
        // the long side leans by the skew
        let dir = (body[3] - body[0]).normalize();
        assert!((dir.x + t.sin()).abs() < 1e-9);
    }

    #[test]
    fn wide_cap_warns() {
        let list = run(&[("NSPAN", 2.0), ("SPAN1", 10.0), ("CAPW", 12.0)]);
        assert!(list
            .warnings()
            .iter()
            .any(|w| w.message.starts_with("cap width 12.000 exceeds")));
    }
}
