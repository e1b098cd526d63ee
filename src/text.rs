//! Text metrics for the standard Helvetica face.
//!
//! Every back-end places text from the same numbers: the PDF renderer sets
//! glyphs with the standard-14 Helvetica, the DXF renderer hands the anchor
//! to the viewer, and the raster renderer draws the measured box. Page fitting
//! and the title block also need extents before anything is rendered.

use glam::{DVec2, dvec2};

/// Cap height of Helvetica as a fraction of the font size
pub const CAP_HEIGHT: f64 = 0.718;
/// Descender depth of Helvetica as a fraction of the font size
pub const DESCENT: f64 = 0.207;

/// Advance widths of printable ASCII (0x20..=0x7e), in 1/1000 em.
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 222, 333, 333, 389, 584, 278, 333, 278, 278, // ' '../
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // 0-9
    278, 278, 584, 584, 584, 556, 1015, // :..@
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, // A-M
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // N-Z
    278, 278, 278, 469, 556, 333, // [..`
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, // a-m
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, // n-z
    334, 260, 334, 584, // {..~
];

/// Width used for anything outside printable ASCII
const FALLBACK_WIDTH: u16 = 556;

/// Horizontal text alignment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HAlign {
    Left,
    Centre,
    Right,
}

/// Vertical text alignment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VAlign {
    Baseline,
    Bottom,
    Middle,
    Top,
}

/// Which point of the text box sits on the insertion point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Anchor {
    pub h: HAlign,
    pub v: VAlign,
}

impl Anchor {
    pub const BASELINE_LEFT: Anchor = Anchor::new(HAlign::Left, VAlign::Baseline);
    pub const BASELINE_CENTRE: Anchor = Anchor::new(HAlign::Centre, VAlign::Baseline);
    pub const MIDDLE_LEFT: Anchor = Anchor::new(HAlign::Left, VAlign::Middle);
    pub const MIDDLE_CENTRE: Anchor = Anchor::new(HAlign::Centre, VAlign::Middle);
    pub const MIDDLE_RIGHT: Anchor = Anchor::new(HAlign::Right, VAlign::Middle);
    pub const BOTTOM_CENTRE: Anchor = Anchor::new(HAlign::Centre, VAlign::Bottom);
    pub const TOP_LEFT: Anchor = Anchor::new(HAlign::Left, VAlign::Top);

    pub const fn new(h: HAlign, v: VAlign) -> Self {
        Self { h, v }
    }
}

impl Default for Anchor {
    fn default() -> Self {
        Anchor::BASELINE_LEFT
    }
}

/// Advance width of `s` in em units
pub fn advance(s: &str) -> f64 {
    s.chars()
        .map(|c| {
            let code = c as u32;
            let w = if (0x20..=0x7e).contains(&code) {
                HELVETICA_WIDTHS[(code - 0x20) as usize]
            } else {
                FALLBACK_WIDTH
            };
            f64::from(w) / 1000.0
        })
        .sum()
}

/// Width of `s` set at `height`
pub fn width(s: &str, height: f64) -> f64 {
    advance(s) * height
}

/// Offset from the insertion point to the start of the baseline, before
/// rotation.
pub fn baseline_offset(anchor: Anchor, width: f64, height: f64) -> DVec2 {
    let dx = match anchor.h {
        HAlign::Left => 0.0,
        HAlign::Centre => -width / 2.0,
        HAlign::Right => -width,
    };
    let dy = match anchor.v {
        VAlign::Baseline => 0.0,
        VAlign::Bottom => DESCENT * height,
        VAlign::Middle => -CAP_HEIGHT * height / 2.0,
        VAlign::Top => -CAP_HEIGHT * height,
    };
    dvec2(dx, dy)
}

/// Start of the baseline after anchoring and rotating about `at`
pub fn baseline_start(at: DVec2, value: &str, height: f64, rotation_deg: f64, anchor: Anchor) -> DVec2 {
    let offset = baseline_offset(anchor, width(value, height), height);
    at + DVec2::from_angle(rotation_deg.to_radians()).rotate(offset)
}

/// Corners of the box a string occupies, from descender to cap height.
pub fn text_box(at: DVec2, value: &str, height: f64, rotation_deg: f64, anchor: Anchor) -> [DVec2; 4] {
    let w = width(value, height);
    let o = baseline_offset(anchor, w, height);
    let rot = DVec2::from_angle(rotation_deg.to_radians());
    let lo = -DESCENT * height;
    let hi = CAP_HEIGHT * height;
    [
        dvec2(o.x, o.y + lo),
        dvec2(o.x + w, o.y + lo),
        dvec2(o.x + w, o.y + hi),
        dvec2(o.x, o.y + hi),
    ]
    .map(|p| at + rot.rotate(p))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digits_are_uniform() {
        assert!((advance("0123456789") - 5.56).abs() < 1e-9);
    }

    #[test]
    fn narrow_and_wide_letters() {
        assert!(advance("i") < advance("W"));
        assert!((advance("A1") - 1.223).abs() < 1e-9);
    }

    #[test]
    fn non_ascii_uses_fallback() {
        assert_eq!(advance("é"), 0.556);
    }

    #[test]
    fn centred_anchor_shifts_half_width() {
        let o = baseline_offset(Anchor::BASELINE_CENTRE, 10.0, 2.0);
        assert_eq!(o, dvec2(-5.0, 0.0));
    }

    #[test]
    fn rotated_box_runs_upward() {
        let b = text_box(DVec2::ZERO, "100.000", 2.0, 90.0, Anchor::BASELINE_LEFT);
        // descenders face +x once the string reads bottom to top
        assert!((b[1].x - 2.0 * DESCENT).abs() < 1e-9);
        assert!((b[1].y - width("100.000", 2.0)).abs() < 1e-9);
        let start = baseline_start(DVec2::ZERO, "100.000", 2.0, 90.0, Anchor::BASELINE_LEFT);
        assert!(start.length() < 1e-12);
    }

    #[test]
    fn middle_anchor_centres_caps() {
        let b = text_box(DVec2::ZERO, "P1", 1.0, 0.0, Anchor::MIDDLE_LEFT);
        assert!((b[3].y - CAP_HEIGHT / 2.0).abs() < 1e-12);
    }
}
