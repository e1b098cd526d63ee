//! Approach slabs behind both abutments.

use glam::dvec2;

use super::abutment::face;
use super::sheet::Sheet;
use super::shapes::{plan_points, rect_points};
use crate::drawlist::{Component, DrawSink, Layer, View};
use crate::errors::GadError;
use crate::params::{ParameterStore, Side};
use crate::projection::Projection;

pub fn build(store: &ParameterStore, proj: &Projection, sink: &mut DrawSink) -> Result<(), GadError> {
    let approach = store.approach()?;
    let deck = store.deck()?;
    let frame = store.frame()?;
    let sheet = Sheet::new(store)?;
    let dwth = store.get("DWTH")?;

    for side in [Side::Left, Side::Right] {
        let (x_face, dir) = face(store, side);
        let component = Component::ApproachSlab(side);
        let inner = x_face - dir * dwth;
        let outer = inner - dir * approach.laslab;

        sink.pen(Layer::Structure, View::Elevation, component).rect(
            proj.pt(outer, deck.rtl),
            proj.pt(inner, deck.rtl - approach.apthk),
        );

        let yc = sheet.plan_rl;
        let half = approach.apwth / 2.0;
        let slab = rect_points(dvec2(outer, yc - half), dvec2(inner, yc + half));
        sink.pen(Layer::Structure, View::Plan, component)
            .polyline(plan_points(proj, &slab, dvec2(x_face, yc)), true);

        if outer < frame.left || outer > frame.right {
            sink.warn(
                component,
                format!("approach slab end at chainage {outer:.3} lies outside the frame"),
            );
        }
    }
    Ok(())
}
