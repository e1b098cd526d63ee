//! Abutments in elevation and plan.
//!
//! Both abutments share one profile computed in a local frame where `u`
//! runs from the bearing face into the span. The left abutment maps
//! `u` to `ABTL + u`; the right one is its mirror about the bridge
//! centreline, `ABTL + L − u`.

use glam::{DVec2, dvec2};

use super::sheet::{HATCH_SPACING, LABEL_TEXT, Sheet};
use super::shapes::{plan_points, project, rect_points};
use crate::drawlist::{Component, DrawSink, HatchPattern, Layer, View};
use crate::errors::GadError;
use crate::log::debug;
use crate::params::{Abutment, ParameterStore, Side};
use crate::projection::Projection;
use crate::text::Anchor;

/// Chainage offsets of the profile vertices, relative to the face
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Profile {
    /// Front of the cap
    pub u_cap: f64,
    /// Foot of the front batter
    pub u_front: f64,
    /// Foot of the toe batter
    pub u_toe_batter: f64,
    /// Front edge of the footing
    pub u_toe: f64,
    /// Back of the dirt wall
    pub u_dirt: f64,
    /// Foot of the back batter
    pub u_back: f64,
    /// Rear edge of the footing
    pub u_heel: f64,
    pub cap_bottom: f64,
    pub footing_bottom: f64,
}

impl Profile {
    pub fn new(ab: &Abutment) -> Self {
        let cap_bottom = ab.cap_bottom();
        let u_cap = ab.cap_width;
        let u_front = u_cap + (cap_bottom - ab.front_batter_rl) / ab.front_batter;
        let u_toe_batter = u_front + (ab.front_batter_rl - ab.toe_batter_rl) / ab.toe_batter;
        let u_toe = u_toe_batter + ab.footing_offset;
        let u_dirt = -ab.dwth;
        let u_back = u_dirt - (cap_bottom - ab.back_batter_rl) / ab.back_batter;
        let u_heel = u_back - ab.footing_offset;
        Self {
            u_cap,
            u_front,
            u_toe_batter,
            u_toe,
            u_dirt,
            u_back,
            u_heel,
            cap_bottom,
            footing_bottom: ab.footing_bottom(),
        }
    }

    /// The closed elevation outline as `(u, level)` pairs, road top first.
    pub fn outline(&self, ab: &Abutment, rtl: f64) -> Vec<DVec2> {
        vec![
            dvec2(0.0, rtl),
            dvec2(0.0, ab.capt),
            dvec2(self.u_cap, ab.capt),
            dvec2(self.u_cap, self.cap_bottom),
            dvec2(self.u_front, ab.front_batter_rl),
            dvec2(self.u_toe_batter, ab.toe_batter_rl),
            dvec2(self.u_toe, ab.toe_batter_rl),
            dvec2(self.u_toe, self.footing_bottom),
            dvec2(self.u_heel, self.footing_bottom),
            dvec2(self.u_heel, ab.toe_batter_rl),
            dvec2(self.u_back, ab.toe_batter_rl),
            dvec2(self.u_back, ab.back_batter_rl),
            dvec2(self.u_dirt, self.cap_bottom),
            dvec2(self.u_dirt, rtl),
        ]
    }
}

/// Bearing face chainage and the direction of `+u` for one side
pub fn face(store: &ParameterStore, side: Side) -> (f64, f64) {
    let d = store.derived();
    match side {
        Side::Left => (d.spane[0], 1.0),
        Side::Right => (2.0 * d.centreline() - d.spane[0], -1.0),
    }
}

pub fn build(store: &ParameterStore, proj: &Projection, sink: &mut DrawSink) -> Result<(), GadError> {
    for side in [Side::Left, Side::Right] {
        draw(store, proj, sink, side)?;
    }
    Ok(())
}

fn draw(
    store: &ParameterStore,
    proj: &Projection,
    sink: &mut DrawSink,
    side: Side,
) -> Result<(), GadError> {
    let ab = store.abutment(side)?;
    let deck = store.deck()?;
    let frame = store.frame()?;
    let sheet = Sheet::new(store)?;
    let profile = Profile::new(&ab);
    let (x_face, dir) = face(store, side);
    let at = |u: f64, level: f64| dvec2(x_face + dir * u, level);
    let component = Component::Abutment(side);

    // Elevation
    let outline: Vec<DVec2> = profile
        .outline(&ab, deck.rtl)
        .into_iter()
        .map(|p| at(p.x, p.y))
        .collect();
    sink.pen(Layer::Structure, View::Elevation, component)
        .polyline(project(proj, &outline), true)
        .line(
            proj.pt(x_face + dir * profile.u_dirt, profile.cap_bottom),
            proj.pt(x_face + dir * profile.u_cap, profile.cap_bottom),
        );
    sink.pen(Layer::Foundation, View::Elevation, component).line(
        proj.pt(x_face + dir * profile.u_heel, ab.toe_batter_rl),
        proj.pt(x_face + dir * profile.u_toe, ab.toe_batter_rl),
    );

    // Plan
    let yc = sheet.plan_rl;
    let centre = dvec2(x_face, yc);
    let half = ab.length / 2.0;
    let stem = rect_points(at(profile.u_dirt, yc - half), at(profile.u_cap, yc + half));
    let footing = rect_points(at(profile.u_heel, yc - half), at(profile.u_toe, yc + half));
    sink.pen(Layer::Structure, View::Plan, component)
        .polyline(plan_points(proj, &stem, centre), true);
    sink.pen(Layer::Foundation, View::Plan, component)
        .polyline(plan_points(proj, &footing, centre), true);

    // Earth hatching at both ends of the stem
    let depth = (ab.length / 4.0).min(1.0);
    let pattern = HatchPattern::Lines {
        angle_deg: 45.0,
        spacing: proj.length(HATCH_SPACING * sheet.k),
    };
    for (lo, hi) in [(yc - half, yc - half + depth), (yc + half - depth, yc + half)] {
        let patch = rect_points(at(profile.u_dirt, lo), at(profile.u_cap, hi));
        sink.pen(Layer::Structure, View::Plan, component)
            .hatch(plan_points(proj, &patch, centre), pattern);
    }

    sink.pen(Layer::Annotations, View::Plan, component).text(
        proj.pt(x_face, sheet.plan_label_rl()),
        side.label(),
        proj.length(LABEL_TEXT * sheet.k),
        0.0,
        Anchor::BOTTOM_CENTRE,
    );

    if profile.footing_bottom < frame.datum {
        sink.warn(
            component,
            format!(
                "footing bottom {:.3} lies below the datum {:.3}",
                profile.footing_bottom, frame.datum
            ),
        );
    }
    let reach = x_face + dir * profile.u_heel;
    if reach < frame.left || reach > frame.right {
        sink.warn(
            component,
            format!("footing heel at chainage {reach:.3} lies outside the frame"),
        );
    }
    debug!(?side, x_face, "abutment drawn");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::tests::{GROUND_A, scenario_a};
    use crate::projection::DrawingFrame;

    fn store() -> ParameterStore {
        ParameterStore::from_mapping(scenario_a(), &GROUND_A).unwrap()
    }

    #[test]
    fn default_profile() {
        let s = store();
        let p = Profile::new(&s.abutment(Side::Left).unwrap());
        // CAPT 106.5, ALCD 1.2 -> cap bottom 105.3; ALFBL 101.5 at 1 in 10
        assert!((p.cap_bottom - 105.3).abs() < 1e-9);
        assert!((p.u_front - (0.75 + 0.38)).abs() < 1e-9);
        assert!((p.u_toe_batter - (1.13 + 0.05)).abs() < 1e-9);
        assert!((p.u_toe - 2.68).abs() < 1e-9);
        assert!((p.u_dirt + 0.3).abs() < 1e-12);
        // back batter 1 in 3 from 105.3 down to 101.5
        assert!((p.u_back - (-0.3 - 3.8 / 3.0)).abs() < 1e-9);
        assert!((p.u_heel - (p.u_back - 1.5)).abs() < 1e-12);
        assert!((p.footing_bottom - 100.0).abs() < 1e-9);
    }

    #[test]
    fn outline_has_fourteen_vertices() {
        let s = store();
        let ab = s.abutment(Side::Left).unwrap();
        let pts = Profile::new(&ab).outline(&ab, 108.0);
        assert_eq!(pts.len(), 14);
        assert_eq!(pts[0], dvec2(0.0, 108.0));
        assert_eq!(pts[13].y, 108.0);
    }

    #[test]
    fn right_face_mirrors_left() {
        let s = store();
        assert_eq!(face(&s, Side::Left), (5.0, 1.0));
        assert_eq!(face(&s, Side::Right), (25.0, -1.0));
    }

    #[test]
    fn emits_outline_plan_hatch_and_label() {
        let s = store();
        let frame = DrawingFrame::from_store(&s).unwrap();
        let proj = Projection::model(&frame);
        let mut sink = DrawSink::new(frame);
        build(&s, &proj, &mut sink).unwrap();
        let list = sink.finalise();
        let left: Vec<_> = list.of_component(Component::Abutment(Side::Left)).collect();
        let kinds: Vec<_> = left.iter().map(|i| i.primitive.kind()).collect();
        assert_eq!(
            kinds,
            ["POLYLINE", "LINE", "LINE", "POLYLINE", "POLYLINE", "HATCH", "HATCH", "TEXT"]
        );
        assert_eq!(list.of_component(Component::Abutment(Side::Right)).count(), 8);
        assert!(list.warnings().is_empty());
    }

    #[test]
    fn plan_stem_follows_the_skewed_deck_width() {
        let mut map = scenario_a();
        map.push(("ABTLEN", 20.0));
        let s = ParameterStore::from_mapping(map, &GROUND_A).unwrap();
        let frame = DrawingFrame::from_store(&s).unwrap();
        let proj = Projection::model(&frame);
        let mut sink = DrawSink::new(frame);
        build(&s, &proj, &mut sink).unwrap();
        let list = sink.finalise();

        let stem = list
            .of_component(Component::Abutment(Side::Left))
            .find(|i| i.view == View::Plan && i.layer == Layer::Structure && i.primitive.kind() == "POLYLINE")
            .unwrap()
            .primitive
            .outline();
        let (lo, hi) = stem
            .iter()
            .fold((f64::MAX, f64::MIN), |(lo, hi), p| (lo.min(p.y), hi.max(p.y)));
        // CCBR 7.5 plus two 0.23 kerbs at zero skew
        assert!((hi - lo - 7.96).abs() < 1e-9, "{}", hi - lo);
        assert_eq!(s.abutment(Side::Right).unwrap().length, s.derived().abtlen_eff);
    }
}
