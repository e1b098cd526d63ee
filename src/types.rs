//! Strongly-typed numeric primitives shared by every stage.
//!
//! World coordinates are metres (chainage, reduced level). Model coordinates
//! are metres relative to the `(LEFT, DATUM)` origin. Both use [`DVec2`].

use glam::{DVec2, dvec2};
use std::fmt;

/// Error type for invalid numeric values
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NumericError {
    /// Value is NaN
    NaN,
    /// Value is infinite
    Infinite,
    /// Value is zero when non-zero required
    Zero,
    /// Value is negative when positive required
    Negative,
}

impl fmt::Display for NumericError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NumericError::NaN => write!(f, "value is NaN"),
            NumericError::Infinite => write!(f, "value is infinite"),
            NumericError::Zero => write!(f, "value is zero"),
            NumericError::Negative => write!(f, "value is negative"),
        }
    }
}

impl std::error::Error for NumericError {}

/// Reject NaN and infinities.
#[inline]
pub fn finite(val: f64) -> Result<f64, NumericError> {
    if val.is_nan() {
        Err(NumericError::NaN)
    } else if val.is_infinite() {
        Err(NumericError::Infinite)
    } else {
        Ok(val)
    }
}

/// Reject NaN, infinities, zero and negatives.
#[inline]
pub fn positive(val: f64) -> Result<f64, NumericError> {
    let val = finite(val)?;
    if val == 0.0 {
        Err(NumericError::Zero)
    } else if val < 0.0 {
        Err(NumericError::Negative)
    } else {
        Ok(val)
    }
}

// ============================================================================
// Angle
// ============================================================================

/// An angle stored in degrees, the unit parameter files use.
///
/// All trigonometry goes through this type so that degrees and radians never
/// get mixed up in the builders.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, Default)]
#[repr(transparent)]
pub struct Angle(f64);

impl Angle {
    pub const ZERO: Angle = Angle(0.0);

    #[inline]
    pub const fn from_degrees(deg: f64) -> Angle {
        Angle(deg)
    }

    #[inline]
    pub fn degrees(self) -> f64 {
        self.0
    }

    #[inline]
    pub fn radians(self) -> f64 {
        self.0.to_radians()
    }

    #[inline]
    pub fn sin(self) -> f64 {
        self.radians().sin()
    }

    #[inline]
    pub fn cos(self) -> f64 {
        self.radians().cos()
    }

    #[inline]
    pub fn tan(self) -> f64 {
        self.radians().tan()
    }

    /// Unit vector pointing along this angle, usable with [`DVec2::rotate`].
    #[inline]
    pub fn unit(self) -> DVec2 {
        DVec2::from_angle(self.radians())
    }
}

impl fmt::Display for Angle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}°", self.0)
    }
}

// ============================================================================
// Bounding box
// ============================================================================

/// Axis-aligned bounding box over [`DVec2`] points
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BBox {
    pub min: DVec2,
    pub max: DVec2,
}

impl Default for BBox {
    fn default() -> Self {
        Self::new()
    }
}

impl BBox {
    /// Create an empty bounding box (will expand on first point)
    pub fn new() -> Self {
        BBox {
            min: DVec2::splat(f64::MAX),
            max: DVec2::splat(f64::MIN),
        }
    }

    /// Bounding box of two opposite corners, in any order
    pub fn from_corners(a: DVec2, b: DVec2) -> Self {
        BBox {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Check if the bbox is empty (never expanded)
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y
    }

    /// Expand to include a point
    pub fn expand_point(&mut self, p: DVec2) {
        self.min = self.min.min(p);
        self.max = self.max.max(p);
    }

    /// Expand to include another box
    pub fn expand_box(&mut self, other: &BBox) {
        if !other.is_empty() {
            self.expand_point(other.min);
            self.expand_point(other.max);
        }
    }

    /// Grow every side by `margin`
    pub fn inflate(&self, margin: f64) -> BBox {
        BBox {
            min: self.min - DVec2::splat(margin),
            max: self.max + DVec2::splat(margin),
        }
    }

    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    pub fn size(&self) -> DVec2 {
        self.max - self.min
    }

    pub fn center(&self) -> DVec2 {
        (self.min + self.max) / 2.0
    }

    /// The four corners, counter-clockwise from `min`
    pub fn corners(&self) -> [DVec2; 4] {
        [
            self.min,
            dvec2(self.max.x, self.min.y),
            self.max,
            dvec2(self.min.x, self.max.y),
        ]
    }

    /// Largest absolute corner difference against `other`
    pub fn max_deviation(&self, other: &BBox) -> f64 {
        let d_min = (self.min - other.min).abs();
        let d_max = (self.max - other.max).abs();
        d_min.max(d_max).max_element()
    }
}

/// Format a number without a trailing `.0` when it is integral.
///
/// Used for scale strings such as `1:100`.
pub fn format_plain(val: f64) -> String {
    if val.fract() == 0.0 && val.abs() < 1e15 {
        format!("{}", val as i64)
    } else {
        format!("{val}")
    }
}
