//! World-to-output coordinate mapping.
//!
//! World coordinates are `(chainage, reduced level)` in metres. A
//! [`Projection`] maps them through two independent scale factors, `HH`
//! horizontally and `VV` vertically, onto one output frame. The geometry
//! builders use [`Projection::model`] (metres from `(LEFT, DATUM)`, Y up);
//! every renderer builds its own projection for its device and maps the
//! DrawList's model coordinates with [`Projection::from_model`].
//!
//! Section details use the same maps with both factors multiplied by
//! `SC = SCALE1 / SCALE2` (see [`Projection::p2t`]).

use glam::{DVec2, dvec2};

use crate::errors::GadError;
use crate::params::ParameterStore;
use crate::types::Angle;

/// Which way positive levels point on the output device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum YAxis {
    /// DXF model space, PDF pages, the model frame
    Up,
    /// Pixel rasters
    Down,
}

/// The part of the parameters every stage after geometry needs.
///
/// A finalised DrawList carries one, so renderers never see the store.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawingFrame {
    pub left: f64,
    pub datum: f64,
    pub scale1: f64,
    pub scale2: f64,
    pub skew: Angle,
}

impl DrawingFrame {
    pub fn from_store(store: &ParameterStore) -> Result<Self, GadError> {
        let frame = store.frame()?;
        Ok(Self {
            left: frame.left,
            datum: frame.datum,
            scale1: frame.scale1,
            scale2: frame.scale2,
            skew: store.derived().skew,
        })
    }

    /// Model metres per paper millimetre at `SCALE1`
    pub fn paper(&self) -> f64 {
        self.scale1 / 1000.0
    }

    /// `SCALE1 / SCALE2`
    pub fn sc(&self) -> f64 {
        self.scale1 / self.scale2
    }
}

/// Two-scale mapping from world metres onto one output frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    left: f64,
    datum: f64,
    hh: f64,
    vv: f64,
    sc: f64,
    origin: DVec2,
    y_axis: YAxis,
    pan: DVec2,
    skew: Angle,
}

impl Projection {
    /// A projection placing `(LEFT, DATUM)` at `origin`.
    pub fn new(frame: &DrawingFrame, hh: f64, vv: f64, origin: DVec2, y_axis: YAxis) -> Self {
        Self {
            left: frame.left,
            datum: frame.datum,
            hh,
            vv,
            sc: frame.sc(),
            origin,
            y_axis,
            pan: DVec2::ZERO,
            skew: frame.skew,
        }
    }

    /// The frame the geometry builders draw in: metres, Y up, origin at
    /// `(LEFT, DATUM)`.
    pub fn model(frame: &DrawingFrame) -> Self {
        Self::new(frame, 1.0, 1.0, DVec2::ZERO, YAxis::Up)
    }

    /// DXF model space: millimetres, Y up, origin at `(LEFT, DATUM)`.
    pub fn dxf(frame: &DrawingFrame) -> Self {
        Self::new(frame, 1000.0, 1000.0, DVec2::ZERO, YAxis::Up)
    }

    /// Shift every output point by `pan` (screen only).
    pub fn with_pan(mut self, pan: DVec2) -> Self {
        self.pan = pan;
        self
    }

    pub fn hh(&self) -> f64 {
        self.hh
    }

    pub fn vv(&self) -> f64 {
        self.vv
    }

    pub fn y_axis(&self) -> YAxis {
        self.y_axis
    }

    /// Where `(LEFT, DATUM)` lands on the output
    pub fn world_origin(&self) -> DVec2 {
        self.origin + self.pan
    }

    // ========================================================================
    // Core maps
    // ========================================================================

    pub fn hpos(&self, x: f64) -> f64 {
        self.origin.x + (x - self.left) * self.hh + self.pan.x
    }

    pub fn vpos(&self, y: f64) -> f64 {
        let d = (y - self.datum) * self.vv;
        match self.y_axis {
            YAxis::Up => self.origin.y + d + self.pan.y,
            YAxis::Down => self.origin.y - d + self.pan.y,
        }
    }

    pub fn pt(&self, x: f64, y: f64) -> DVec2 {
        dvec2(self.hpos(x), self.vpos(y))
    }

    /// Section-scale horizontal map: `HH · SC`
    pub fn h2pos(&self, x: f64) -> f64 {
        self.origin.x + (x - self.left) * self.hh * self.sc + self.pan.x
    }

    /// Section-scale vertical map: `VV · SC`
    pub fn v2pos(&self, y: f64) -> f64 {
        let d = (y - self.datum) * self.vv * self.sc;
        match self.y_axis {
            YAxis::Up => self.origin.y + d + self.pan.y,
            YAxis::Down => self.origin.y - d + self.pan.y,
        }
    }

    /// Section-scale point
    pub fn p2t(&self, x: f64, y: f64) -> DVec2 {
        dvec2(self.h2pos(x), self.v2pos(y))
    }

    /// Output length of `metres` measured horizontally
    pub fn length(&self, metres: f64) -> f64 {
        metres * self.hh
    }

    // ========================================================================
    // Model space
    // ========================================================================

    /// Map a model point (metres from `(LEFT, DATUM)`, Y up) to the output.
    pub fn from_model(&self, m: DVec2) -> DVec2 {
        self.pt(self.left + m.x, self.datum + m.y)
    }

    /// Inverse of [`Projection::from_model`].
    pub fn to_model(&self, p: DVec2) -> DVec2 {
        let x = (p.x - self.pan.x - self.origin.x) / self.hh;
        let d = p.y - self.pan.y - self.origin.y;
        let y = match self.y_axis {
            YAxis::Up => d / self.vv,
            YAxis::Down => -d / self.vv,
        };
        dvec2(x, y)
    }

    // ========================================================================
    // Skew
    // ========================================================================

    /// Rotate a plan point about `centre` by the bridge skew.
    pub fn rotate(&self, p: DVec2, centre: DVec2) -> DVec2 {
        rotate(p, centre, self.skew)
    }

    pub fn skew(&self) -> Angle {
        self.skew
    }
}

/// `centre + R(θ)·(p − centre)`
pub fn rotate(p: DVec2, centre: DVec2, theta: Angle) -> DVec2 {
    centre + theta.unit().rotate(p - centre)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame() -> DrawingFrame {
        DrawingFrame {
            left: 10.0,
            datum: 100.0,
            scale1: 100.0,
            scale2: 50.0,
            skew: Angle::from_degrees(15.0),
        }
    }

    #[test]
    fn model_origin_is_left_datum() {
        let p = Projection::model(&frame());
        assert_eq!(p.pt(10.0, 100.0), DVec2::ZERO);
        assert_eq!(p.pt(15.0, 102.0), dvec2(5.0, 2.0));
    }

    #[test]
    fn dxf_is_millimetres() {
        let p = Projection::dxf(&frame());
        assert_eq!(p.pt(11.0, 99.5), dvec2(1000.0, -500.0));
    }

    #[test]
    fn pixel_frames_point_down() {
        let p = Projection::new(&frame(), 4.0, 4.0, dvec2(20.0, 500.0), YAxis::Down);
        assert_eq!(p.pt(10.0, 100.0), dvec2(20.0, 500.0));
        assert_eq!(p.vpos(101.0), 496.0);
    }

    #[test]
    fn section_scale_enlarges() {
        let p = Projection::model(&frame());
        assert_eq!(p.h2pos(12.0), 4.0);
        assert_eq!(p.v2pos(101.0), 2.0);
        assert_eq!(p.p2t(10.0, 100.0), DVec2::ZERO);
    }

    #[test]
    fn pan_moves_world_origin() {
        let p = Projection::new(&frame(), 2.0, 2.0, dvec2(5.0, 5.0), YAxis::Down)
            .with_pan(dvec2(3.0, -1.0));
        assert_eq!(p.world_origin(), dvec2(8.0, 4.0));
        assert_eq!(p.pt(10.0, 100.0), p.world_origin());
    }

    #[test]
    fn model_round_trip() {
        let p = Projection::new(&frame(), 3.0, 3.0, dvec2(7.0, 900.0), YAxis::Down)
            .with_pan(dvec2(1.0, 2.0));
        let m = dvec2(12.5, -4.25);
        let back = p.to_model(p.from_model(m));
        assert!((back - m).length() < 1e-9);
    }

    #[test]
    fn zero_skew_is_identity() {
        let p = dvec2(3.0, 4.0);
        assert_eq!(rotate(p, dvec2(1.0, 1.0), Angle::ZERO), p);
    }

    #[test]
    fn quarter_turn_about_centre() {
        let r = rotate(dvec2(2.0, 1.0), dvec2(1.0, 1.0), Angle::from_degrees(90.0));
        assert!((r - dvec2(1.0, 2.0)).length() < 1e-12);
    }
}
