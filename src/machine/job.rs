//! Two-layer drawing job.
//!
//! ```text
//! Idle → Homing → DrawingBackground → Homing2 → Offset → DrawingForeground → Shutdown
//!          any state ──abort──▶ EmergencyStop
//!          any state ──error──▶ Failed
//! ```

use crate::config::units::Millimeters;
use crate::drawing::Command;
use crate::error::Result;
use crate::hardware::{AbortSignal, Axis, AxisDriver, ExtruderDriver, ExtruderId, Timebase};
use crate::motion::LogicalPosition;

use super::controller::MotionController;
use super::executor::{ExecutionReport, PathExecutor};

/// Phase of a drawing job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum JobState {
    /// Not started.
    Idle,
    /// First homing pass.
    Homing,
    /// White layer.
    DrawingBackground,
    /// Homing again before the second layer.
    Homing2,
    /// Moving the black nozzle onto the origin.
    Offset,
    /// Black layer.
    DrawingForeground,
    /// Axes released, extruders coasting. Job complete.
    Shutdown,
    /// Aborted: axes released, extruders braked.
    EmergencyStop,
    /// A homing or hardware failure ended the job.
    Failed,
}

impl JobState {
    /// Whether the job has ended.
    #[inline]
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            JobState::Shutdown | JobState::EmergencyStop | JobState::Failed
        )
    }
}

/// Per-layer results of a completed job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct JobReport {
    /// White layer.
    pub background: ExecutionReport,
    /// Black layer.
    pub foreground: ExecutionReport,
}

/// Sequences one job on a [`MotionController`].
#[derive(Debug, Clone)]
pub struct JobOrchestrator {
    state: JobState,
    history: heapless::Vec<JobState, 16>,
}

impl Default for JobOrchestrator {
    fn default() -> Self {
        Self::new()
    }
}

impl JobOrchestrator {
    /// A job in the `Idle` state.
    pub fn new() -> Self {
        let mut history = heapless::Vec::new();
        let _ = history.push(JobState::Idle);
        Self {
            state: JobState::Idle,
            history,
        }
    }

    /// Current state.
    #[inline]
    pub fn state(&self) -> JobState {
        self.state
    }

    /// Every state entered so far, starting with `Idle`.
    #[inline]
    pub fn history(&self) -> &[JobState] {
        &self.history
    }

    fn enter(&mut self, state: JobState) {
        debug!("Job: {:?} -> {:?}", self.state, state);
        self.state = state;
        let _ = self.history.push(state);
    }

    /// Run the whole job: background with the white extruder, foreground
    /// with the black one.
    ///
    /// Starts from `Idle` with a fresh history, so one orchestrator can run
    /// several jobs in turn.
    ///
    /// On an abort the controller is emergency-stopped and the abort error
    /// returned, even if releasing an actuator fails. On any other error the controller is shut down and the
    /// error returned; the job never draws with an unhomed axis.
    pub fn run<X, Y, W, B, T, A>(
        &mut self,
        ctl: &mut MotionController<X, Y, W, B, T, A>,
        background: &[Command],
        foreground: &[Command],
    ) -> Result<JobReport>
    where
        X: AxisDriver,
        Y: AxisDriver,
        W: ExtruderDriver,
        B: ExtruderDriver,
        T: Timebase,
        A: AbortSignal,
    {
        *self = Self::new();
        match self.sequence(ctl, background, foreground) {
            Ok(report) => Ok(report),
            Err(e) if e.is_abort() => {
                if let Err(release) = self.emergency_stop(ctl) {
                    error!("Release during emergency stop failed: {}", release);
                }
                Err(e)
            }
            Err(e) => {
                error!("Job failed in {:?}: {}", self.state, e);
                self.enter(JobState::Failed);
                if let Err(release) = ctl.shutdown() {
                    error!("Release after failure also failed: {}", release);
                }
                Err(e)
            }
        }
    }

    /// Abort from any state: release the axes and brake both extruders.
    pub fn emergency_stop<X, Y, W, B, T, A>(
        &mut self,
        ctl: &mut MotionController<X, Y, W, B, T, A>,
    ) -> Result<()>
    where
        X: AxisDriver,
        Y: AxisDriver,
        W: ExtruderDriver,
        B: ExtruderDriver,
        T: Timebase,
        A: AbortSignal,
    {
        self.enter(JobState::EmergencyStop);
        ctl.emergency_stop()
    }

    fn sequence<X, Y, W, B, T, A>(
        &mut self,
        ctl: &mut MotionController<X, Y, W, B, T, A>,
        background: &[Command],
        foreground: &[Command],
    ) -> Result<JobReport>
    where
        X: AxisDriver,
        Y: AxisDriver,
        W: ExtruderDriver,
        B: ExtruderDriver,
        T: Timebase,
        A: AbortSignal,
    {
        ctl.check_abort()?;
        let job = ctl.config().job.clone();
        let tracking = ctl.config().planner.position_tracking;
        let mut report = JobReport::default();

        info!("Starting frosting job");
        self.enter(JobState::Homing);
        ctl.home_all()?;

        info!("Drawing white background ({} commands)", background.len());
        self.enter(JobState::DrawingBackground);
        report.background = PathExecutor::new(ExtruderId::White, job.draw_speed)
            .with_tracking(tracking)
            .execute(ctl, background)?;

        self.enter(JobState::Homing2);
        ctl.home_all()?;

        info!("Switching to black");
        self.enter(JobState::Offset);
        let [dx, dy]: [Millimeters; 2] = job.foreground_offset;
        let speed = ctl.config().axes.x.default_speed;
        ctl.move_linear(dx, dy, speed)?;
        ctl.set_position(LogicalPosition::ORIGIN);
        for axis in Axis::ALL {
            ctl.set_axis_origin(axis);
        }

        info!("Drawing black image ({} commands)", foreground.len());
        self.enter(JobState::DrawingForeground);
        report.foreground = PathExecutor::new(ExtruderId::Black, job.draw_speed)
            .with_tracking(tracking)
            .execute(ctl, foreground)?;

        self.enter(JobState::Shutdown);
        ctl.shutdown()?;
        info!("Done!");

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MachineConfig;
    use crate::error::{Error, HomingError, MotionError};
    use crate::hardware::ExtruderState;
    use crate::sim::SimBoard;

    fn board() -> SimBoard {
        let board = SimBoard::new();
        board.set_endstop_position(Axis::X, 0);
        board.set_endstop_position(Axis::Y, 0);
        board
    }

    fn config() -> MachineConfig {
        let mut config = MachineConfig::default();
        config.job.settle_ms = 5;
        config.axes.x.homing_timeout_ms = 1_000;
        config.axes.y.homing_timeout_ms = 1_000;
        config
    }

    #[test]
    fn test_full_job_state_sequence() {
        let board = board();
        let mut ctl = board.controller(config());
        let square = [
            Command::travel(0.0, 0.0),
            Command::new(5.0, 0.0, 1.0),
            Command::new(5.0, 5.0, 1.0),
            Command::travel(0.0, 0.0),
        ];

        let mut job = JobOrchestrator::new();
        let report = job.run(&mut ctl, &square, &square).unwrap();

        assert_eq!(
            job.history(),
            &[
                JobState::Idle,
                JobState::Homing,
                JobState::DrawingBackground,
                JobState::Homing2,
                JobState::Offset,
                JobState::DrawingForeground,
                JobState::Shutdown,
            ]
        );
        assert_eq!(report.background.commands, 4);
        assert!(!board.is_enabled(Axis::X) && !board.is_enabled(Axis::Y));
        assert_eq!(board.extruder_output(ExtruderId::White), ExtruderState::Coasting);
        assert_eq!(board.extruder_output(ExtruderId::Black), ExtruderState::Coasting);
    }

    #[test]
    fn test_homing_failure_stops_before_drawing() {
        let board = board();
        board.clear_endstop(Axis::Y);
        let mut ctl = board.controller(config());

        let mut job = JobOrchestrator::new();
        let result = job.run(&mut ctl, &[Command::new(5.0, 5.0, 1.0)], &[]);

        assert!(matches!(
            result,
            Err(Error::Homing(HomingError::TimedOut { axis: Axis::Y, .. }))
        ));
        assert_eq!(job.state(), JobState::Failed);
        assert!(!job.history().contains(&JobState::DrawingBackground));
        assert_eq!(board.extruder_output(ExtruderId::White), ExtruderState::Coasting);
    }

    #[test]
    fn test_abort_before_start() {
        let board = board();
        board.set_abort(true);
        let mut ctl = board.controller(config()).with_abort(board.abort_signal());

        let mut job = JobOrchestrator::new();
        let result = job.run(&mut ctl, &[], &[]);

        assert!(result.as_ref().is_err_and(|e| e.is_abort()));
        assert_eq!(job.state(), JobState::EmergencyStop);
        assert_eq!(board.extruder_output(ExtruderId::Black), ExtruderState::Stopped);
    }

    #[test]
    fn test_abort_wins_over_release_failure() {
        let board = board();
        board.set_abort(true);
        board.fail(crate::hardware::Actuator::BlackExtruder);
        let mut ctl = board.controller(config()).with_abort(board.abort_signal());

        let mut job = JobOrchestrator::new();
        let result = job.run(&mut ctl, &[], &[]);

        assert!(matches!(result, Err(Error::Motion(MotionError::Aborted))));
        assert_eq!(job.state(), JobState::EmergencyStop);
        // The other actuators were still released
        assert!(!board.is_enabled(Axis::X));
        assert_eq!(board.extruder_output(ExtruderId::White), ExtruderState::Stopped);
    }

    #[test]
    fn test_second_run_starts_fresh() {
        let board = board();
        let mut config = config();
        // The second homing seeks back past the foreground offset
        config.axes.x.homing_timeout_ms = 5_000;
        let mut ctl = board.controller(config);
        let line = [Command::new(2.0, 0.0, 1.0)];

        let mut job = JobOrchestrator::new();
        job.run(&mut ctl, &line, &line).unwrap();
        job.run(&mut ctl, &line, &line).unwrap();

        assert_eq!(job.history().len(), 7);
        assert_eq!(job.history()[0], JobState::Idle);
        assert_eq!(job.state(), JobState::Shutdown);
    }
}
