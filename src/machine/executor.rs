//! Path executor: runs one layer of drawing commands.

use crate::config::units::MillimetersPerSec;
use crate::config::PositionTracking;
use crate::drawing::{validate_commands, Command};
use crate::error::Result;
use crate::hardware::{AbortSignal, AxisDriver, ExtruderDriver, ExtruderId, Timebase};

use super::controller::{MotionController, MoveOutcome};

/// Summary of an executed layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExecutionReport {
    /// Commands executed.
    pub commands: usize,
    /// Segments skipped as too small to step.
    pub skipped: usize,
}

/// Drives one extruder along a command list.
///
/// For every command the extruder is set first, then the head moves by
/// `target - position`. After the last command the extruder is stopped.
#[derive(Debug, Clone, Copy)]
pub struct PathExecutor {
    extruder: ExtruderId,
    speed: MillimetersPerSec,
    tracking: PositionTracking,
}

impl PathExecutor {
    /// Executor for `extruder` at path speed `speed`, tracking the requested
    /// position.
    pub fn new(extruder: ExtruderId, speed: MillimetersPerSec) -> Self {
        Self {
            extruder,
            speed,
            tracking: PositionTracking::Requested,
        }
    }

    /// Choose how the logical position advances after each segment.
    pub fn with_tracking(mut self, tracking: PositionTracking) -> Self {
        self.tracking = tracking;
        self
    }

    /// Extruder this executor drives.
    #[inline]
    pub fn extruder(&self) -> ExtruderId {
        self.extruder
    }

    /// Run `commands` in order.
    ///
    /// The extruder is stopped afterwards even if a segment fails; the
    /// segment error takes precedence.
    ///
    /// # Errors
    ///
    /// - [`crate::error::DrawingError::NonFiniteCoordinate`] before anything moves
    /// - [`crate::error::MotionError::Aborted`] when the emergency stop is raised
    /// - Hardware errors from any driver
    pub fn execute<X, Y, W, B, T, A>(
        &self,
        ctl: &mut MotionController<X, Y, W, B, T, A>,
        commands: &[Command],
    ) -> Result<ExecutionReport>
    where
        X: AxisDriver,
        Y: AxisDriver,
        W: ExtruderDriver,
        B: ExtruderDriver,
        T: Timebase,
        A: AbortSignal,
    {
        validate_commands(commands)?;

        let result = self.run(ctl, commands);
        let stopped = ctl.stop_extruder(self.extruder);
        let report = result?;
        stopped?;
        Ok(report)
    }

    fn run<X, Y, W, B, T, A>(
        &self,
        ctl: &mut MotionController<X, Y, W, B, T, A>,
        commands: &[Command],
    ) -> Result<ExecutionReport>
    where
        X: AxisDriver,
        Y: AxisDriver,
        W: ExtruderDriver,
        B: ExtruderDriver,
        T: Timebase,
        A: AbortSignal,
    {
        let mut report = ExecutionReport::default();

        for command in commands {
            ctl.check_abort()?;
            ctl.drive_extruder(self.extruder, command.extrude)?;

            let (dx, dy) = ctl.position().delta_to(command.target());
            let outcome = ctl.move_linear(dx, dy, self.speed)?;
            if outcome == MoveOutcome::TooSmall {
                report.skipped += 1;
            }

            match self.tracking {
                PositionTracking::Requested => ctl.set_position(command.target()),
                PositionTracking::Actual => {
                    let (ax, ay) = outcome.displacement();
                    let mut position = ctl.position();
                    position.offset(ax, ay);
                    ctl.set_position(position);
                }
            }
            report.commands += 1;
        }

        debug!(
            "{:?} layer done: {} commands, {} skipped",
            self.extruder, report.commands, report.skipped
        );
        Ok(report)
    }
}
