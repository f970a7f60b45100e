//! Unit types for physical quantities.
//!
//! Drawing coordinates, speeds and step counts get their own newtypes so a
//! step count never ends up where millimeters are expected.

use core::ops::{Add, Mul, Neg, Sub};

use serde::Deserialize;

/// Linear distance in drawing units (millimeters).
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Deserialize)]
#[serde(transparent)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Millimeters(pub f32);

impl Millimeters {
    /// Zero distance.
    pub const ZERO: Self = Self(0.0);

    /// Create a new Millimeters value.
    #[inline]
    pub const fn new(value: f32) -> Self {
        Self(value)
    }

    /// Get the raw value.
    #[inline]
    pub const fn value(self) -> f32 {
        self.0
    }

    /// Absolute value.
    #[inline]
    pub fn abs(self) -> Self {
        Self(libm::fabsf(self.0))
    }

    /// Sign of the distance: -1, 0 or +1.
    #[inline]
    pub fn signum(self) -> i8 {
        if self.0 > 0.0 {
            1
        } else if self.0 < 0.0 {
            -1
        } else {
            0
        }
    }

    /// Whether the value is neither NaN nor infinite.
    #[inline]
    pub fn is_finite(self) -> bool {
        self.0.is_finite()
    }
}

impl Add for Millimeters {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Millimeters {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl Neg for Millimeters {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self(-self.0)
    }
}

/// Linear speed in millimeters per second.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Deserialize)]
#[serde(transparent)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MillimetersPerSec(pub f32);

impl MillimetersPerSec {
    /// Create a new MillimetersPerSec value.
    #[inline]
    pub const fn new(value: f32) -> Self {
        Self(value)
    }

    /// Get the raw value.
    #[inline]
    pub const fn value(self) -> f32 {
        self.0
    }

    /// Whether this speed can drive a move (finite and > 0).
    #[inline]
    pub fn is_valid(self) -> bool {
        self.0.is_finite() && self.0 > 0.0
    }
}

impl Mul<f32> for MillimetersPerSec {
    type Output = Self;

    fn mul(self, rhs: f32) -> Self::Output {
        Self(self.0 * rhs)
    }
}

/// Axis position in steps (absolute from the homed origin).
///
/// Uses i64 for unlimited range in either direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Steps(pub i64);

impl Steps {
    /// Create a new Steps value.
    #[inline]
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    /// Get the raw value.
    #[inline]
    pub const fn value(self) -> i64 {
        self.0
    }

    /// Get absolute value as u64.
    #[inline]
    pub fn abs(self) -> u64 {
        self.0.unsigned_abs()
    }

    /// Convert to millimeters using the axis resolution.
    #[inline]
    pub fn to_millimeters(self, steps_per_mm: f32) -> Millimeters {
        Millimeters(self.0 as f32 / steps_per_mm)
    }

    /// Whole steps covered by a distance, truncated toward zero.
    #[inline]
    pub fn from_millimeters(distance: Millimeters, steps_per_mm: f32) -> Self {
        Self(libm::truncf(distance.0 * steps_per_mm) as i64)
    }
}

impl Add for Steps {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Steps {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

/// Extension trait for creating unit types from primitives.
pub trait UnitExt {
    /// Convert to Millimeters.
    fn mm(self) -> Millimeters;
    /// Convert to MillimetersPerSec.
    fn mm_per_sec(self) -> MillimetersPerSec;
}

impl UnitExt for f32 {
    #[inline]
    fn mm(self) -> Millimeters {
        Millimeters(self)
    }

    #[inline]
    fn mm_per_sec(self) -> MillimetersPerSec {
        MillimetersPerSec(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signum() {
        assert_eq!(Millimeters(3.5).signum(), 1);
        assert_eq!(Millimeters(-0.1).signum(), -1);
        assert_eq!(Millimeters(0.0).signum(), 0);
        assert_eq!(Millimeters(-0.0).signum(), 0);
    }

    #[test]
    fn test_steps_truncate_toward_zero() {
        assert_eq!(Steps::from_millimeters(Millimeters(1.29), 10.0), Steps(12));
        assert_eq!(Steps::from_millimeters(Millimeters(-1.29), 10.0), Steps(-12));
    }

    #[test]
    fn test_steps_to_millimeters() {
        let distance = Steps::new(500).to_millimeters(10.0);
        assert!((distance.value() - 50.0).abs() < 1e-4);
    }

    #[test]
    fn test_speed_validity() {
        assert!(20.0_f32.mm_per_sec().is_valid());
        assert!(!0.0_f32.mm_per_sec().is_valid());
        assert!(!(-5.0_f32).mm_per_sec().is_valid());
        assert!(!f32::NAN.mm_per_sec().is_valid());
    }
}
