//! Cross section through the deck and a typical pier, drawn at `SCALE2`
//! to the right of the elevation.

use glam::{DVec2, dvec2};

use super::dims;
use super::sheet::{GRID_TEXT, LABEL_TEXT, Sheet, TICK, VIEW_TITLE};
use crate::drawlist::{Component, DrawSink, Layer, View};
use crate::errors::GadError;
use crate::params::{Deck, ParameterStore};
use crate::projection::Projection;
use crate::text::Anchor;
use crate::types::format_plain;

/// Deck slab outline across the width as `(offset, level)`, top left first
pub fn slab_outline(deck: &Deck) -> Vec<DVec2> {
    let half = deck.ccbr / 2.0 + deck.kerbw;
    let edge = deck.ccbr / 2.0;
    vec![
        dvec2(-half, deck.rtl),
        dvec2(half, deck.rtl),
        dvec2(half, deck.rtl - deck.slbtht),
        dvec2(edge, deck.rtl - deck.slbthe),
        dvec2(0.0, deck.rtl - deck.slbthc),
        dvec2(-edge, deck.rtl - deck.slbthe),
        dvec2(-half, deck.rtl - deck.slbtht),
    ]
}

pub fn build(store: &ParameterStore, proj: &Projection, sink: &mut DrawSink) -> Result<(), GadError> {
    let deck = store.deck()?;
    let frame = store.frame()?;
    let sheet = Sheet::new(store)?;
    let k = sheet.k;
    let at = |u: f64, level: f64| proj.p2t(sheet.section_centre + u, level);
    let half = deck.ccbr / 2.0 + deck.kerbw;

    let mut pen = sink.pen(Layer::Structure, View::Section, Component::Section);
    let slab: Vec<DVec2> = slab_outline(&deck).into_iter().map(|p| at(p.x, p.y)).collect();
    pen.polyline(slab, true);
    for (a, b) in [(-half, -half + deck.kerbw), (half - deck.kerbw, half)] {
        pen.rect(at(a, deck.rtl), at(b, deck.rtl + deck.kerbd));
    }
    if deck.wcth > 0.0 {
        let wc = deck.rtl + deck.wcth;
        pen.line(at(-deck.ccbr / 2.0, wc), at(deck.ccbr / 2.0, wc));
    }

    if store.derived().spans.len() > 1 {
        let pier = store.pier()?;
        let long = pier.pierst / 2.0;
        pen.rect(at(-long, pier.capt), at(long, pier.capb))
            .rect(at(-long, pier.capb), at(long, pier.footing_top()));
        let futl = pier.futl / 2.0;
        sink.pen(Layer::Foundation, View::Section, Component::Section)
            .rect(at(-futl, pier.footing_top()), at(futl, pier.futrl));
    }

    let top = at(0.0, deck.rtl + deck.kerbd);
    let offset = |mm: f64| top + dvec2(0.0, proj.length(mm * k));
    let mut pen = sink.pen(Layer::Dimensions, View::Section, Component::Section);
    let y = offset(5.0).y;
    dims::linear(
        &mut pen,
        dvec2(at(-deck.ccbr / 2.0, 0.0).x, y),
        dvec2(at(deck.ccbr / 2.0, 0.0).x, y),
        proj.length(TICK * k / 2.0),
        proj.length(GRID_TEXT * k),
        format!("{:.3}", deck.ccbr),
    );

    sink.pen(Layer::Annotations, View::Section, Component::Section)
        .text(
            offset(14.0),
            "CROSS SECTION",
            proj.length(VIEW_TITLE * k),
            0.0,
            Anchor::BOTTOM_CENTRE,
        )
        .text(
            offset(10.0),
            format!("SCALE 1:{}", format_plain(frame.scale2)),
            proj.length(LABEL_TEXT * k),
            0.0,
            Anchor::BOTTOM_CENTRE,
        );
    Ok(())
}
