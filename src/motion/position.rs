//! Position tracking.
//!
//! [`LogicalPosition`] is where the path executor believes the head is, in
//! drawing units. [`AxisPosition`] counts the steps actually issued to one
//! axis since it was last homed.

use crate::config::units::{Millimeters, Steps};
use crate::hardware::Axis;

/// Head position in drawing units.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LogicalPosition {
    /// X coordinate.
    pub x: Millimeters,
    /// Y coordinate.
    pub y: Millimeters,
}

impl LogicalPosition {
    /// The homed origin.
    pub const ORIGIN: Self = Self {
        x: Millimeters::ZERO,
        y: Millimeters::ZERO,
    };

    /// Create a position from raw coordinates.
    #[inline]
    pub const fn new(x: f32, y: f32) -> Self {
        Self {
            x: Millimeters(x),
            y: Millimeters(y),
        }
    }

    /// Get one coordinate.
    #[inline]
    pub fn get(&self, axis: Axis) -> Millimeters {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
        }
    }

    /// Set one coordinate.
    #[inline]
    pub fn set(&mut self, axis: Axis, value: Millimeters) {
        match axis {
            Axis::X => self.x = value,
            Axis::Y => self.y = value,
        }
    }

    /// Displacement from `self` to `target`.
    #[inline]
    pub fn delta_to(&self, target: LogicalPosition) -> (Millimeters, Millimeters) {
        (target.x - self.x, target.y - self.y)
    }

    /// Shift by a displacement.
    #[inline]
    pub fn offset(&mut self, dx: Millimeters, dy: Millimeters) {
        self.x = self.x + dx;
        self.y = self.y + dy;
    }
}

/// Step counter for one axis.
///
/// Maintains absolute position in steps and provides unit conversions.
#[derive(Debug, Clone, Copy, Default)]
pub struct AxisPosition {
    /// Current position in steps (from origin)
    steps: Steps,
    /// Steps per millimeter for conversions
    steps_per_mm: f32,
}

impl AxisPosition {
    /// Create a new position tracker at the origin.
    #[inline]
    pub fn new(steps_per_mm: f32) -> Self {
        Self {
            steps: Steps::default(),
            steps_per_mm,
        }
    }

    /// Get current position in steps.
    #[inline]
    pub fn steps(&self) -> Steps {
        self.steps
    }

    /// Get current position in millimeters.
    #[inline]
    pub fn millimeters(&self) -> Millimeters {
        self.steps.to_millimeters(self.steps_per_mm)
    }

    /// Move by a number of steps.
    #[inline]
    pub fn move_steps(&mut self, delta: i64) {
        self.steps = Steps(self.steps.0 + delta);
    }

    /// Set current position as the new origin.
    #[inline]
    pub fn set_origin(&mut self) {
        self.steps = Steps::default();
    }

    /// Get steps per millimeter conversion factor.
    #[inline]
    pub fn steps_per_mm(&self) -> f32 {
        self.steps_per_mm
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_axis_position_tracking() {
        let mut pos = AxisPosition::new(10.0);
        assert_eq!(pos.steps().value(), 0);

        pos.move_steps(125);
        assert!((pos.millimeters().value() - 12.5).abs() < 1e-5);

        pos.move_steps(-200);
        assert!((pos.millimeters().value() + 7.5).abs() < 1e-5);

        pos.set_origin();
        assert_eq!(pos.steps(), Steps(0));
    }

    #[test]
    fn test_logical_delta() {
        let here = LogicalPosition::new(10.0, 10.0);
        let (dx, dy) = here.delta_to(LogicalPosition::ORIGIN);
        assert_eq!((dx.value(), dy.value()), (-10.0, -10.0));
    }
}
