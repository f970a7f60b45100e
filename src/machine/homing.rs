//! Axis homing state machine.
//!
//! ```text
//! Seeking ──endstop──▶ BackingOff ──backoff move──▶ Homed
//!    │
//!    └──timeout──▶ TimedOut
//! ```
//!
//! Each seek iteration polls the endstop, checks the timeout and the
//! emergency stop, issues one step toward the endstop, then sleeps
//! `1 / (default_speed × steps_per_mm)` seconds. That sleep is the rated
//! step-rate throttle.

use crate::error::{Error, HomingError, Result};
use crate::hardware::{AbortSignal, Axis, AxisDriver, ExtruderDriver, Timebase};

use super::controller::MotionController;

/// Homing progress of one axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HomingState {
    /// Stepping toward the endstop.
    Seeking,
    /// Endstop hit; settling then backing off.
    BackingOff,
    /// Backed off and zeroed.
    Homed,
    /// Endstop never triggered; axis released.
    TimedOut,
}

impl HomingState {
    /// Whether no further progress is possible.
    #[inline]
    pub fn is_terminal(self) -> bool {
        matches!(self, HomingState::Homed | HomingState::TimedOut)
    }
}

/// Homing run for a single axis.
#[derive(Debug, Clone)]
pub struct AxisHoming {
    axis: Axis,
    state: HomingState,
    seek_steps: u64,
    started_us: Option<u64>,
    elapsed_ms: u64,
}

impl AxisHoming {
    /// Start homing `axis`.
    pub fn new(axis: Axis) -> Self {
        Self {
            axis,
            state: HomingState::Seeking,
            seek_steps: 0,
            started_us: None,
            elapsed_ms: 0,
        }
    }

    /// Axis being homed.
    #[inline]
    pub fn axis(&self) -> Axis {
        self.axis
    }

    /// Current state.
    #[inline]
    pub fn state(&self) -> HomingState {
        self.state
    }

    /// Steps issued while seeking.
    #[inline]
    pub fn seek_steps(&self) -> u64 {
        self.seek_steps
    }

    /// Time spent seeking, in milliseconds.
    #[inline]
    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed_ms
    }

    /// Advance the state machine by one iteration.
    ///
    /// # Errors
    ///
    /// - [`HomingError::TimedOut`] when the seek exceeds the axis timeout
    /// - [`crate::error::MotionError::Aborted`] when the emergency stop is raised
    /// - Hardware errors from the axis driver
    pub fn poll<X, Y, W, B, T, A>(
        &mut self,
        ctl: &mut MotionController<X, Y, W, B, T, A>,
    ) -> Result<HomingState>
    where
        X: AxisDriver,
        Y: AxisDriver,
        W: ExtruderDriver,
        B: ExtruderDriver,
        T: Timebase,
        A: AbortSignal,
    {
        match self.state {
            HomingState::Seeking => self.seek(ctl)?,
            HomingState::BackingOff => self.back_off(ctl)?,
            HomingState::Homed => {}
            HomingState::TimedOut => {
                return Err(Error::Homing(HomingError::TimedOut {
                    axis: self.axis,
                    elapsed_ms: self.elapsed_ms,
                }))
            }
        }
        Ok(self.state)
    }

    /// Run until `Homed` or failure.
    pub fn run<X, Y, W, B, T, A>(&mut self, ctl: &mut MotionController<X, Y, W, B, T, A>) -> Result<()>
    where
        X: AxisDriver,
        Y: AxisDriver,
        W: ExtruderDriver,
        B: ExtruderDriver,
        T: Timebase,
        A: AbortSignal,
    {
        while !self.poll(ctl)?.is_terminal() {}
        Ok(())
    }

    fn seek<X, Y, W, B, T, A>(&mut self, ctl: &mut MotionController<X, Y, W, B, T, A>) -> Result<()>
    where
        X: AxisDriver,
        Y: AxisDriver,
        W: ExtruderDriver,
        B: ExtruderDriver,
        T: Timebase,
        A: AbortSignal,
    {
        let now = ctl.now_us();
        let started = *self.started_us.get_or_insert(now);

        if ctl.endstop_triggered(self.axis)? {
            debug!("{:?} endstop triggered after {} steps", self.axis, self.seek_steps);
            self.state = HomingState::BackingOff;
            return Ok(());
        }

        let config = ctl.config().axis(self.axis);
        let timeout_us = config.homing_timeout_us();
        let direction = config.home_direction.sign();
        let step_delay_ns = config.homing_step_delay_ns();

        let elapsed_us = now.saturating_sub(started);
        self.elapsed_ms = elapsed_us / 1_000;
        if elapsed_us > timeout_us {
            warn!("{:?} home timed out after {} ms", self.axis, self.elapsed_ms);
            self.state = HomingState::TimedOut;
            ctl.disable_axis(self.axis)?;
            return Err(Error::Homing(HomingError::TimedOut {
                axis: self.axis,
                elapsed_ms: self.elapsed_ms,
            }));
        }

        ctl.check_abort()?;

        ctl.step_axis(self.axis, direction)?;
        self.seek_steps += 1;
        ctl.sleep_ns(step_delay_ns);
        Ok(())
    }

    fn back_off<X, Y, W, B, T, A>(&mut self, ctl: &mut MotionController<X, Y, W, B, T, A>) -> Result<()>
    where
        X: AxisDriver,
        Y: AxisDriver,
        W: ExtruderDriver,
        B: ExtruderDriver,
        T: Timebase,
        A: AbortSignal,
    {
        let settle_ns = ctl.config().job.settle_ms as u64 * 1_000_000;
        let backoff = ctl.config().axis(self.axis).backoff;
        let speed = ctl.config().axis(self.axis).default_speed;

        ctl.sleep_ns(settle_ns);
        ctl.move_axis(self.axis, backoff, speed)?;
        ctl.set_axis_origin(self.axis);

        info!("{:?} axis homed", self.axis);
        self.state = HomingState::Homed;
        Ok(())
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
    /// Home one axis to completion.
    pub fn home_axis(&mut self, axis: Axis) -> Result<AxisHoming> {
        let mut homing = AxisHoming::new(axis);
        homing.run(self)?;
        Ok(homing)
    }

    /// Home X, then Y. Fails on the first axis that does not home.
    pub fn home_all(&mut self) -> Result<()> {
        info!("Homing all axes...");
        for axis in Axis::ALL {
            self.home_axis(axis)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MachineConfig;
    use crate::sim::SimBoard;

    fn quick_config() -> MachineConfig {
        let mut config = MachineConfig::default();
        config.job.settle_ms = 10;
        config.axes.x.homing_timeout_ms = 500;
        config.axes.y.homing_timeout_ms = 500;
        config
    }

    #[test]
    fn test_already_triggered_homes_without_seeking() {
        let board = SimBoard::new();
        board.set_endstop_position(Axis::X, 0);
        let mut ctl = board.controller(quick_config());

        let homing = ctl.home_axis(Axis::X).unwrap();
        assert_eq!(homing.state(), HomingState::Homed);
        assert_eq!(homing.seek_steps(), 0);
        // Backed off 2 mm at 10 steps/mm, then zeroed
        assert_eq!(board.position_steps(Axis::X), 20);
        assert_eq!(ctl.position().x.value(), 0.0);
        assert_eq!(ctl.axis_counter(Axis::X).steps().value(), 0);
    }

    #[test]
    fn test_seek_then_back_off() {
        let board = SimBoard::new();
        board.set_position_steps(Axis::Y, 35);
        board.set_endstop_position(Axis::Y, 0);
        let mut ctl = board.controller(quick_config());

        let mut homing = AxisHoming::new(Axis::Y);
        assert_eq!(homing.poll(&mut ctl).unwrap(), HomingState::Seeking);
        homing.run(&mut ctl).unwrap();

        assert_eq!(homing.seek_steps(), 35);
        assert_eq!(board.position_steps(Axis::Y), 20);
    }

    #[test]
    fn test_seek_is_throttled_to_rated_step_rate() {
        let board = SimBoard::new();
        board.set_position_steps(Axis::X, 10);
        board.set_endstop_position(Axis::X, 0);
        let mut config = quick_config();
        config.job.settle_ms = 0;
        let mut ctl = board.controller(config);

        let mut homing = AxisHoming::new(Axis::X);
        let start = board.now_us();
        while homing.poll(&mut ctl).unwrap() == HomingState::Seeking {}
        // 10 seek steps at 5 ms each
        assert!(board.now_us() - start >= 50_000);
    }

    #[test]
    fn test_timeout_disables_axis() {
        let board = SimBoard::new();
        let mut ctl = board.controller(quick_config());

        let result = ctl.home_axis(Axis::X);
        assert!(matches!(
            result,
            Err(Error::Homing(HomingError::TimedOut { axis: Axis::X, elapsed_ms })) if elapsed_ms >= 500
        ));
        assert!(!ctl.axis_enabled(Axis::X));
    }

    #[test]
    fn test_home_all_reports_failing_axis() {
        let board = SimBoard::new();
        board.set_endstop_position(Axis::X, 0);
        let mut ctl = board.controller(quick_config());

        let result = ctl.home_all();
        assert!(matches!(
            result,
            Err(Error::Homing(HomingError::TimedOut { axis: Axis::Y, .. }))
        ));
    }
}
