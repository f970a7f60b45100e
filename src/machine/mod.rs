//! Machine module for frosting-motion.
//!
//! The [`MotionController`] owns the board. Homing, the path executor and
//! the job orchestrator all operate on a `&mut MotionController`.

mod controller;
mod executor;
mod homing;
mod job;

pub use controller::{MotionController, MoveOutcome};
pub use executor::{ExecutionReport, PathExecutor};
pub use homing::{AxisHoming, HomingState};
pub use job::{JobOrchestrator, JobReport, JobState};
