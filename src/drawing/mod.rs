//! Drawing commands.
//!
//! A drawing is an ordered list of `(x, y, extrude)` commands produced by
//! the image pipeline, one list per layer. Order defines the path and is
//! never changed.

#[cfg(feature = "std")]
mod loader;

#[cfg(any(feature = "alloc", feature = "std"))]
use alloc::vec::Vec;

use crate::config::units::Millimeters;
use crate::error::DrawingError;
use crate::motion::LogicalPosition;

#[cfg(feature = "std")]
pub use loader::{load_drawing, parse_drawing};

/// Move to `(x, y)` while the extruder runs at `extrude`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Command {
    /// Target X.
    pub x: Millimeters,
    /// Target Y.
    pub y: Millimeters,
    /// Requested extruder duty in [-1, 1]; 0 is a travel move.
    pub extrude: f32,
}

impl Command {
    /// Create a command.
    #[inline]
    pub const fn new(x: f32, y: f32, extrude: f32) -> Self {
        Self {
            x: Millimeters(x),
            y: Millimeters(y),
            extrude,
        }
    }

    /// Travel to `(x, y)` without extruding.
    #[inline]
    pub const fn travel(x: f32, y: f32) -> Self {
        Self::new(x, y, 0.0)
    }

    /// Pen-style command: down extrudes at full requested duty, up travels.
    #[inline]
    pub const fn pen(x: f32, y: f32, down: bool) -> Self {
        Self::new(x, y, if down { 1.0 } else { 0.0 })
    }

    /// Target position.
    #[inline]
    pub fn target(&self) -> LogicalPosition {
        LogicalPosition {
            x: self.x,
            y: self.y,
        }
    }

    /// Whether this command extrudes.
    #[inline]
    pub fn is_extruding(&self) -> bool {
        self.extrude != 0.0
    }

    /// Whether every field is finite.
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.extrude.is_finite()
    }
}

/// Reject commands with NaN or infinite fields.
pub fn validate_commands(commands: &[Command]) -> Result<(), DrawingError> {
    match commands.iter().position(|c| !c.is_finite()) {
        Some(index) => Err(DrawingError::NonFiniteCoordinate { index }),
        None => Ok(()),
    }
}

/// One fully materialised layer.
#[cfg(any(feature = "alloc", feature = "std"))]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Drawing {
    commands: Vec<Command>,
}

#[cfg(any(feature = "alloc", feature = "std"))]
impl Drawing {
    /// Create a drawing, rejecting non-finite commands.
    pub fn new(commands: Vec<Command>) -> Result<Self, DrawingError> {
        validate_commands(&commands)?;
        Ok(Self { commands })
    }

    /// Commands in path order.
    #[inline]
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Number of commands.
    #[inline]
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Whether there is nothing to draw.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Iterate the commands in order.
    pub fn iter(&self) -> core::slice::Iter<'_, Command> {
        self.commands.iter()
    }

    /// Bounding box `(min, max)` of all targets.
    pub fn bounds(&self) -> Option<(LogicalPosition, LogicalPosition)> {
        let first = self.commands.first()?.target();
        Some(self.commands.iter().fold((first, first), |(lo, hi), c| {
            (
                LogicalPosition::new(lo.x.0.min(c.x.0), lo.y.0.min(c.y.0)),
                LogicalPosition::new(hi.x.0.max(c.x.0), hi.y.0.max(c.y.0)),
            )
        }))
    }

    /// Path length of the extruding segments, starting from `start`.
    pub fn extruded_length(&self, start: LogicalPosition) -> Millimeters {
        let mut here = start;
        let mut total = 0.0f32;
        for c in &self.commands {
            if c.is_extruding() {
                let (dx, dy) = here.delta_to(c.target());
                total += libm::sqrtf(dx.0 * dx.0 + dy.0 * dy.0);
            }
            here = c.target();
        }
        Millimeters(total)
    }
}

#[cfg(any(feature = "alloc", feature = "std"))]
impl<'a> IntoIterator for &'a Drawing {
    type Item = &'a Command;
    type IntoIter = core::slice::Iter<'a, Command>;

    fn into_iter(self) -> Self::IntoIter {
        self.commands.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pen_commands() {
        assert_eq!(Command::pen(1.0, 2.0, true).extrude, 1.0);
        assert!(!Command::pen(1.0, 2.0, false).is_extruding());
    }

    #[test]
    fn test_non_finite_rejected_with_index() {
        let commands = vec![Command::travel(0.0, 0.0), Command::new(1.0, f32::INFINITY, 1.0)];
        assert_eq!(
            Drawing::new(commands),
            Err(DrawingError::NonFiniteCoordinate { index: 1 })
        );
    }

    #[test]
    fn test_bounds_and_extruded_length() {
        let drawing = Drawing::new(vec![
            Command::travel(0.0, 0.0),
            Command::new(10.0, 0.0, 1.0),
            Command::travel(10.0, 10.0),
            Command::new(-5.0, 10.0, 0.7),
        ])
        .unwrap();

        let (lo, hi) = drawing.bounds().unwrap();
        assert_eq!((lo.x.0, lo.y.0, hi.x.0, hi.y.0), (-5.0, 0.0, 10.0, 10.0));
        assert!((drawing.extruded_length(LogicalPosition::ORIGIN).0 - 25.0).abs() < 1e-4);
    }
}
