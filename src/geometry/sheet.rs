//! Where each view sits on the sheet.
//!
//! The elevation is drawn at its true position. The plan hangs below the
//! chainage band and the cross section stands to the right of the
//! elevation. Offsets are given in paper millimetres and converted with the
//! `SCALE1` paper factor, so the layout looks the same at any scale.

use crate::errors::GadError;
use crate::params::{ParameterStore, Side};

use super::abutment::Profile;
use super::shapes::rotated_half_height;

/// Height of each annotation band under the datum
pub const BAND: f64 = 20.0;
/// West-margin offset of the band titles
pub const MARGIN_LABEL: f64 = 25.0;
/// Half-length of a grid tick
pub const TICK: f64 = 2.5;
/// Length of a ground sample stub below the datum
pub const STUB: f64 = 2.0;
/// Grid and profile label height
pub const GRID_TEXT: f64 = 2.0;
/// Band title and plan label height
pub const LABEL_TEXT: f64 = 2.5;
/// View title height
pub const VIEW_TITLE: f64 = 3.5;
/// Gap between the chainage band and the top of the plan
pub const PLAN_GAP: f64 = 25.0;
/// Gap between the right end of the elevation and the cross section
pub const SECTION_GAP: f64 = 30.0;
/// Hatch stroke spacing
pub const HATCH_SPACING: f64 = 1.5;

/// Resolved view placement for one drawing
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sheet {
    /// Model metres per paper millimetre
    pub k: f64,
    /// Reduced level the plan centreline is drawn at
    pub plan_rl: f64,
    /// Half the height of the tallest plan body
    pub plan_half: f64,
    /// Chainage the cross-section centreline maps from
    pub section_centre: f64,
    /// Overall width of the cross section, in world metres
    pub section_width: f64,
}

impl Sheet {
    pub fn new(store: &ParameterStore) -> Result<Self, GadError> {
        let frame = store.frame()?;
        let d = store.derived();
        let deck = store.deck()?;
        let pier = store.pier()?;
        let approach = store.approach()?;
        let k = d.paper;
        let half = |width: f64, length: f64| rotated_half_height(width, length, d.sin, d.cos);

        let mut plan_half = half(0.0, d.abtlen_eff).max(half(approach.laslab, approach.apwth));
        for side in [Side::Left, Side::Right] {
            let ab = store.abutment(side)?;
            let p = Profile::new(&ab);
            plan_half = plan_half.max(half(p.u_toe - p.u_heel, ab.length));
        }
        let has_piers = d.spans.len() > 1;
        if has_piers {
            let body = pier.pierst / d.cos + (pier.piertw * d.tan).abs();
            plan_half = plan_half
                .max(half(pier.piertw, body))
                .max(half(pier.futw, pier.futl));
        }

        let plan_rl = frame.datum - (2.0 * BAND + PLAN_GAP) * k - plan_half;

        let deck_width = deck.ccbr + 2.0 * deck.kerbw;
        let section_width = if has_piers {
            deck_width.max(pier.pierst).max(pier.futl)
        } else {
            deck_width
        };
        let section_centre =
            frame.left + (frame.right - frame.left + SECTION_GAP * k) / d.sc + section_width / 2.0;

        Ok(Self {
            k,
            plan_rl,
            plan_half,
            section_centre,
            section_width,
        })
    }

    /// Reduced level just above the plan bodies, where plan labels go
    pub fn plan_label_rl(&self) -> f64 {
        self.plan_rl + self.plan_half + 2.0 * self.k
    }
}
