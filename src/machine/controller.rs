//! The exclusively-owned motion controller.
//!
//! Owns both axes, both extruders, the timebase and the abort input. The
//! homing routine, path executor and job orchestrator all borrow it
//! mutably; there is no global board object.

use crate::config::units::{Millimeters, MillimetersPerSec};
use crate::config::MachineConfig;
use crate::error::{Error, MotionError, Result};
use crate::hardware::{
    AbortSignal, Axis, AxisDriver, ExtruderDriver, ExtruderId, ExtruderState, HardwareResult,
    NeverAbort, Timebase,
};
use crate::motion::{AxisPosition, LogicalPosition, SegmentPlan};

/// Result of a linear move.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MoveOutcome {
    /// Steps were issued; the displacement actually covered.
    Moved {
        /// X displacement covered.
        dx: Millimeters,
        /// Y displacement covered.
        dy: Millimeters,
    },
    /// Neither axis had a whole step to take; nothing moved.
    TooSmall,
}

impl MoveOutcome {
    /// Displacement covered (zero when skipped).
    pub fn displacement(self) -> (Millimeters, Millimeters) {
        match self {
            MoveOutcome::Moved { dx, dy } => (dx, dy),
            MoveOutcome::TooSmall => (Millimeters::ZERO, Millimeters::ZERO),
        }
    }
}

/// Two axes, two extruders and the clock that paces them.
///
/// Generic over:
/// - `X`, `Y`: axis drivers
/// - `W`, `B`: white and black extruder drivers
/// - `T`: timebase (delay + clock)
/// - `A`: emergency-stop input (defaults to [`NeverAbort`])
pub struct MotionController<X, Y, W, B, T, A = NeverAbort> {
    x: X,
    y: Y,
    white: W,
    black: B,
    timebase: T,
    abort: A,
    config: MachineConfig,
    position: LogicalPosition,
    counters: [AxisPosition; 2],
}

impl<X, Y, W, B, T> MotionController<X, Y, W, B, T, NeverAbort>
where
    X: AxisDriver,
    Y: AxisDriver,
    W: ExtruderDriver,
    B: ExtruderDriver,
    T: Timebase,
{
    /// Assemble a controller. The configuration should already be validated.
    pub fn new(config: MachineConfig, x: X, y: Y, white: W, black: B, timebase: T) -> Self {
        let counters = [
            AxisPosition::new(config.axes.x.steps_per_mm),
            AxisPosition::new(config.axes.y.steps_per_mm),
        ];
        Self {
            x,
            y,
            white,
            black,
            timebase,
            abort: NeverAbort,
            config,
            position: LogicalPosition::ORIGIN,
            counters,
        }
    }
}

impl<X, Y, W, B, T, A> MotionController<X, Y, W, B, T, A>
where
    X: AxisDriver,
    Y: AxisDriver,
    W: ExtruderDriver,
    B: ExtruderDriver,
    T: Timebase,
    A: AbortSignal,
{
    /// Attach an emergency-stop input.
    pub fn with_abort<A2: AbortSignal>(self, abort: A2) -> MotionController<X, Y, W, B, T, A2> {
        MotionController {
            x: self.x,
            y: self.y,
            white: self.white,
            black: self.black,
            timebase: self.timebase,
            abort,
            config: self.config,
            position: self.position,
            counters: self.counters,
        }
    }

    /// Put every actuator in its idle state.
    ///
    /// Every actuator is attempted; the first failure is returned and the
    /// failing driver stays non-operational.
    pub fn init(&mut self) -> Result<()> {
        let results = [
            self.x.init(),
            self.y.init(),
            self.white.init(),
            self.black.init(),
        ];
        first_error(results)?;
        info!("Motion controller ready");
        Ok(())
    }

    /// Get the configuration.
    #[inline]
    pub fn config(&self) -> &MachineConfig {
        &self.config
    }

    /// Where the path executor believes the head is.
    #[inline]
    pub fn position(&self) -> LogicalPosition {
        self.position
    }

    /// Overwrite the logical position.
    #[inline]
    pub fn set_position(&mut self, position: LogicalPosition) {
        self.position = position;
    }

    /// Zero one axis: logical coordinate and step counter.
    pub fn set_axis_origin(&mut self, axis: Axis) {
        self.position.set(axis, Millimeters::ZERO);
        self.counters[axis_index(axis)].set_origin();
    }

    /// Position implied by the steps actually issued since homing.
    pub fn actual_position(&self) -> LogicalPosition {
        LogicalPosition {
            x: self.counters[0].millimeters(),
            y: self.counters[1].millimeters(),
        }
    }

    /// Step counter of one axis.
    #[inline]
    pub fn axis_counter(&self, axis: Axis) -> AxisPosition {
        self.counters[axis_index(axis)]
    }

    /// Actual minus logical position, per axis.
    pub fn drift(&self) -> (Millimeters, Millimeters) {
        let actual = self.actual_position();
        (actual.x - self.position.x, actual.y - self.position.y)
    }

    /// Steps per millimeter of both axes.
    #[inline]
    pub fn steps_per_mm(&self) -> [f32; 2] {
        [self.config.axes.x.steps_per_mm, self.config.axes.y.steps_per_mm]
    }

    /// Whether the emergency stop is raised.
    #[inline]
    pub fn abort_requested(&self) -> bool {
        self.abort.is_raised()
    }

    /// Fail with [`MotionError::Aborted`] if the emergency stop is raised.
    #[inline]
    pub fn check_abort(&self) -> Result<()> {
        if self.abort.is_raised() {
            Err(Error::Motion(MotionError::Aborted))
        } else {
            Ok(())
        }
    }

    /// Issue one step on an axis and count it.
    pub fn step_axis(&mut self, axis: Axis, direction: i8) -> Result<()> {
        match axis {
            Axis::X => self.x.step(direction, &mut self.timebase)?,
            Axis::Y => self.y.step(direction, &mut self.timebase)?,
        }
        self.counters[axis_index(axis)].move_steps(direction.signum() as i64);
        Ok(())
    }

    /// Poll the endstop of an axis.
    pub fn endstop_triggered(&mut self, axis: Axis) -> Result<bool> {
        let triggered = match axis {
            Axis::X => self.x.endstop_triggered()?,
            Axis::Y => self.y.endstop_triggered()?,
        };
        Ok(triggered)
    }

    /// Release an axis.
    pub fn disable_axis(&mut self, axis: Axis) -> Result<()> {
        match axis {
            Axis::X => self.x.disable()?,
            Axis::Y => self.y.disable()?,
        }
        Ok(())
    }

    /// Whether an axis has its coils energised.
    pub fn axis_enabled(&self, axis: Axis) -> bool {
        match axis {
            Axis::X => self.x.is_enabled(),
            Axis::Y => self.y.is_enabled(),
        }
    }

    /// Whether an axis driver is still usable.
    pub fn axis_operational(&self, axis: Axis) -> bool {
        match axis {
            Axis::X => self.x.is_operational(),
            Axis::Y => self.y.is_operational(),
        }
    }

    /// Drive an extruder at a requested duty (scaled by its modifier).
    pub fn drive_extruder(&mut self, id: ExtruderId, duty: f32) -> Result<()> {
        match id {
            ExtruderId::White => self.white.drive(duty)?,
            ExtruderId::Black => self.black.drive(duty)?,
        }
        Ok(())
    }

    /// Brake an extruder.
    pub fn stop_extruder(&mut self, id: ExtruderId) -> Result<()> {
        match id {
            ExtruderId::White => self.white.stop()?,
            ExtruderId::Black => self.black.stop()?,
        }
        Ok(())
    }

    /// Let an extruder float.
    pub fn coast_extruder(&mut self, id: ExtruderId) -> Result<()> {
        match id {
            ExtruderId::White => self.white.coast()?,
            ExtruderId::Black => self.black.coast()?,
        }
        Ok(())
    }

    /// Last commanded state of an extruder.
    pub fn extruder_state(&self, id: ExtruderId) -> ExtruderState {
        match id {
            ExtruderId::White => self.white.state(),
            ExtruderId::Black => self.black.state(),
        }
    }

    /// Current time of the timebase in microseconds.
    #[inline]
    pub fn now_us(&mut self) -> u64 {
        self.timebase.now_us()
    }

    /// Block for the given number of nanoseconds.
    #[inline]
    pub fn sleep_ns(&mut self, ns: u64) {
        self.timebase.sleep_ns(ns);
    }

    /// Move both axes together by `(dx, dy)` at path speed `speed`.
    ///
    /// Does not touch the logical position; the returned outcome says how
    /// far the axes actually went. The abort input is polled before every
    /// tick.
    ///
    /// # Errors
    ///
    /// - [`MotionError::Aborted`] when the emergency stop is raised
    /// - Planning errors for non-finite input or an invalid speed
    /// - Hardware errors from the axis drivers
    pub fn move_linear(
        &mut self,
        dx: Millimeters,
        dy: Millimeters,
        speed: MillimetersPerSec,
    ) -> Result<MoveOutcome> {
        let steps_per_mm = self.steps_per_mm();
        let plan = SegmentPlan::new(dx, dy, speed, steps_per_mm, &self.config.planner)?;

        if plan.is_too_small() {
            debug!("Movement too small, skipped ({:?}, {:?})", dx.0, dy.0);
            return Ok(MoveOutcome::TooSmall);
        }

        trace!(
            "Segment: {} x {} steps over {} ns in {} slices",
            plan.steps_x,
            plan.steps_y,
            plan.duration_ns,
            plan.slice_count()
        );

        let sign_x = plan.direction_x.sign();
        let sign_y = plan.direction_y.sign();
        let pulse_x = self.x.step_pulse_ns() as u64;
        let pulse_y = self.y.step_pulse_ns() as u64;

        for slice in plan.slices() {
            let slice = slice?;
            for tick in slice.schedule.iter() {
                self.check_abort()?;

                let mut spent_ns = 0;
                if tick.x {
                    self.step_axis(Axis::X, sign_x)?;
                    spent_ns += pulse_x;
                }
                if tick.y {
                    self.step_axis(Axis::Y, sign_y)?;
                    spent_ns += pulse_y;
                }
                self.timebase.sleep_ns(slice.tick_delay_ns.saturating_sub(spent_ns));
            }
        }

        let (dx, dy) = plan.actual_displacement(steps_per_mm);
        Ok(MoveOutcome::Moved { dx, dy })
    }

    /// Move a single axis by `distance` at `speed`.
    pub fn move_axis(
        &mut self,
        axis: Axis,
        distance: Millimeters,
        speed: MillimetersPerSec,
    ) -> Result<MoveOutcome> {
        match axis {
            Axis::X => self.move_linear(distance, Millimeters::ZERO, speed),
            Axis::Y => self.move_linear(Millimeters::ZERO, distance, speed),
        }
    }

    /// Emergency stop: release both axes and brake both extruders.
    ///
    /// Every actuator is attempted even if an earlier one fails.
    pub fn emergency_stop(&mut self) -> Result<()> {
        warn!("Emergency stop");
        let results = [
            self.x.disable(),
            self.y.disable(),
            self.white.stop(),
            self.black.stop(),
        ];
        first_error(results)
    }

    /// End-of-job shutdown: release both axes and let both extruders coast.
    pub fn shutdown(&mut self) -> Result<()> {
        let results = [
            self.x.disable(),
            self.y.disable(),
            self.white.coast(),
            self.black.coast(),
        ];
        first_error(results)
    }

    /// Run one extruder at full requested duty for `duration_ms`, then brake.
    pub fn test_extruder(&mut self, id: ExtruderId, duration_ms: u32) -> Result<()> {
        self.run_extruder_for(id, 1.0, duration_ms)
    }

    /// Retract one extruder (full reverse) for `duration_ms`, then brake.
    pub fn reset_extruder(&mut self, id: ExtruderId, duration_ms: u32) -> Result<()> {
        self.run_extruder_for(id, -1.0, duration_ms)
    }

    fn run_extruder_for(&mut self, id: ExtruderId, duty: f32, duration_ms: u32) -> Result<()> {
        info!("Running {:?} extruder at {} for {} ms", id, duty, duration_ms);
        self.drive_extruder(id, duty)?;
        self.timebase.sleep_ns(duration_ms as u64 * 1_000_000);
        self.stop_extruder(id)
    }

    /// Take the drivers back.
    pub fn release(self) -> (X, Y, W, B, T) {
        (self.x, self.y, self.white, self.black, self.timebase)
    }
}

#[inline]
fn axis_index(axis: Axis) -> usize {
    match axis {
        Axis::X => 0,
        Axis::Y => 1,
    }
}

fn first_error<const N: usize>(results: [HardwareResult<()>; N]) -> Result<()> {
    for result in results {
        result?;
    }
    Ok(())
}
