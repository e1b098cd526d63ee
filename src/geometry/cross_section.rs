//! The ground profile overlaid on the elevation.

use glam::DVec2;

use super::sheet::{BAND, GRID_TEXT, STUB, Sheet, TICK};
use crate::drawlist::{Component, DrawSink, Layer, View};
use crate::errors::GadError;
use crate::log::debug;
use crate::params::{CsPoint, ParameterStore};
use crate::projection::Projection;
use crate::text::Anchor;

/// Whether `x` falls on a grid tick, within `XINCR / 100`.
pub fn on_grid_tick(x: f64, left: f64, right: f64, xincr: f64) -> bool {
    if !(xincr > 0.0) {
        return false;
    }
    let n = ((x - left) / xincr).round();
    let tick = left + n * xincr;
    tick <= right + xincr / 100.0 && (x - tick).abs() <= xincr / 100.0
}

/// Ground level at chainage `x`, interpolated between samples.
///
/// `None` outside the sampled range.
pub fn ground_level_at(points: &[CsPoint], x: f64) -> Option<f64> {
    points.windows(2).find_map(|w| {
        let (a, b) = (w[0], w[1]);
        (a.chainage <= x && x <= b.chainage).then(|| {
            let t = (x - a.chainage) / (b.chainage - a.chainage);
            a.rl + t * (b.rl - a.rl)
        })
    })
}

pub fn build(store: &ParameterStore, proj: &Projection, sink: &mut DrawSink) -> Result<(), GadError> {
    let f = store.frame()?;
    let k = Sheet::new(store)?.k;
    let points = store.cs_points();
    let text = proj.length(GRID_TEXT * k);
    let level_row = f.datum - (BAND - 2.0) * k;
    let chainage_row = f.datum - 2.0 * BAND * k + (TICK + 1.5) * k;

    let mut pen = sink.pen(Layer::CrossSection, View::Elevation, Component::CrossSection);
    for p in points {
        pen.line(proj.pt(p.chainage, f.datum), proj.pt(p.chainage, f.datum - STUB * k))
            .text(
                proj.pt(p.chainage, level_row),
                format!("{:.3}", p.rl),
                text,
                90.0,
                Anchor::MIDDLE_LEFT,
            );
        if !on_grid_tick(p.chainage, f.left, f.right, f.xincr) {
            pen.text(
                proj.pt(p.chainage, chainage_row),
                format!("{:.3}", p.chainage),
                text,
                90.0,
                Anchor::MIDDLE_LEFT,
            );
        }
    }
    let ground: Vec<DVec2> = points.iter().map(|p| proj.pt(p.chainage, p.rl)).collect();
    pen.polyline(ground, false);

    debug!(
        points = points.len(),
        suppressed = points
            .iter()
            .filter(|p| on_grid_tick(p.chainage, f.left, f.right, f.xincr))
            .count(),
        "ground profile drawn"
    );
    Ok(())
}
