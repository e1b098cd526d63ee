//! The elevation frame: datum rules, level and chainage ticks, band and
//! view titles.

use glam::dvec2;

use super::sheet::{BAND, GRID_TEXT, LABEL_TEXT, MARGIN_LABEL, Sheet, TICK, VIEW_TITLE};
use crate::drawlist::{Component, DrawSink, Layer, View};
use crate::errors::GadError;
use crate::params::ParameterStore;
use crate::projection::Projection;
use crate::text::Anchor;

/// Number of whole increments of `step` that fit in `range`
pub fn tick_count(range: f64, step: f64) -> usize {
    if !(step > 0.0) || !(range >= 0.0) {
        return 0;
    }
    (range / step + 1e-9).floor() as usize
}

/// Chainages of the grid ticks, `LEFT` included
pub fn chainage_ticks(left: f64, right: f64, xincr: f64) -> impl Iterator<Item = f64> {
    (0..=tick_count(right - left, xincr)).map(move |i| left + i as f64 * xincr)
}

/// Reduced levels of the grid ticks, `DATUM` included
pub fn level_ticks(datum: f64, toprl: f64, yincr: f64) -> impl Iterator<Item = f64> {
    (0..=tick_count(toprl - datum, yincr)).map(move |i| datum + i as f64 * yincr)
}

pub fn build(store: &ParameterStore, proj: &Projection, sink: &mut DrawSink) -> Result<(), GadError> {
    let f = store.frame()?;
    let sheet = Sheet::new(store)?;
    let k = sheet.k;
    let bed = f.datum - BAND * k;
    let chainage = f.datum - 2.0 * BAND * k;

    let mut pen = sink.pen(Layer::Grid, View::Elevation, Component::Grid);
    for level in [f.datum, bed, chainage] {
        pen.line(proj.pt(f.left, level), proj.pt(f.right, level));
    }
    pen.line(proj.pt(f.left, chainage), proj.pt(f.left, f.toprl));

    for level in level_ticks(f.datum, f.toprl, f.yincr) {
        pen.line(proj.pt(f.left - TICK * k, level), proj.pt(f.left + TICK * k, level))
            .text(
                proj.pt(f.left - (TICK + 1.0) * k, level),
                format!("{level:.3}"),
                proj.length(GRID_TEXT * k),
                0.0,
                Anchor::MIDDLE_RIGHT,
            );
    }

    for x in chainage_ticks(f.left, f.right, f.xincr) {
        pen.line(proj.pt(x, chainage), proj.pt(x, chainage + TICK * k))
            .text(
                proj.pt(x, chainage + (TICK + 1.5) * k),
                format!("{x:.3}"),
                proj.length(GRID_TEXT * k),
                90.0,
                Anchor::MIDDLE_LEFT,
            );
    }

    let margin = f.left - MARGIN_LABEL * k;
    for (label, level) in [("BED LEVEL", f.datum - BAND * k / 2.0), ("CHAINAGE", bed - BAND * k / 2.0)] {
        pen.text(
            dvec2(proj.hpos(margin), proj.vpos(level)),
            label,
            proj.length(LABEL_TEXT * k),
            0.0,
            Anchor::MIDDLE_LEFT,
        );
    }

    let title = proj.length(VIEW_TITLE * k);
    sink.pen(Layer::Annotations, View::Elevation, Component::Grid).text(
        proj.pt(f.left, f.toprl + 4.0 * k),
        "ELEVATION",
        title,
        0.0,
        Anchor::BASELINE_LEFT,
    );
    sink.pen(Layer::Annotations, View::Plan, Component::Grid).text(
        proj.pt(f.left, sheet.plan_label_rl() + 5.0 * k),
        "PLAN",
        title,
        0.0,
        Anchor::BASELINE_LEFT,
    );
    Ok(())
}
