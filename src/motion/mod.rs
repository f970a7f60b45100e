//! Motion module for frosting-motion.
//!
//! Provides the two-axis interleave schedule, segment planning and
//! position tracking.

mod interleave;
mod planner;
mod position;

pub use interleave::{gcd, lcm, StepSchedule, Tick, Ticks};
pub use planner::{Direction, SegmentPlan, Slice, Slices};
pub use position::{AxisPosition, LogicalPosition};
