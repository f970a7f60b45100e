//! Linear segment planning.
//!
//! Turns a displacement and a path speed into signed step counts, a
//! wall-clock duration and one or more interleaved [`StepSchedule`]s.

use crate::config::units::{Millimeters, MillimetersPerSec, Steps};
use crate::config::PlannerConfig;
use crate::error::MotionError;
use crate::hardware::Axis;

use super::interleave::StepSchedule;

/// Direction of travel along one axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    /// Toward negative coordinates.
    Negative,
    /// No motion.
    #[default]
    Hold,
    /// Toward positive coordinates.
    Positive,
}

impl Direction {
    /// Get direction from a signed distance.
    #[inline]
    pub fn of(distance: Millimeters) -> Self {
        match distance.signum() {
            1 => Direction::Positive,
            -1 => Direction::Negative,
            _ => Direction::Hold,
        }
    }

    /// Get the sign multiplier.
    #[inline]
    pub fn sign(self) -> i8 {
        match self {
            Direction::Negative => -1,
            Direction::Hold => 0,
            Direction::Positive => 1,
        }
    }
}

/// Planned linear move of both axes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentPlan {
    /// Direction of the X axis.
    pub direction_x: Direction,
    /// Direction of the Y axis.
    pub direction_y: Direction,
    /// Unsigned X step count, `floor(|dx| × steps_per_mm)`.
    pub steps_x: u64,
    /// Unsigned Y step count, `floor(|dy| × steps_per_mm)`.
    pub steps_y: u64,
    /// Wall-clock duration, `sqrt(dx² + dy²) / speed`.
    pub duration_ns: u64,
    slices: u64,
    min_tick_delay_ns: u64,
}

impl SegmentPlan {
    /// Plan a move of `(dx, dy)` at path speed `speed`.
    ///
    /// # Errors
    ///
    /// - [`MotionError::NonFiniteDisplacement`] if either component is NaN/infinite
    /// - [`MotionError::InvalidSpeed`] if the speed is not finite and positive
    pub fn new(
        dx: Millimeters,
        dy: Millimeters,
        speed: MillimetersPerSec,
        steps_per_mm: [f32; 2],
        planner: &PlannerConfig,
    ) -> Result<Self, MotionError> {
        if !(dx.is_finite() && dy.is_finite()) {
            return Err(MotionError::NonFiniteDisplacement);
        }
        if !speed.is_valid() {
            return Err(MotionError::InvalidSpeed(speed.0));
        }

        let steps_x = Steps::from_millimeters(dx.abs(), steps_per_mm[0]).abs();
        let steps_y = Steps::from_millimeters(dy.abs(), steps_per_mm[1]).abs();

        // f64 keeps nanosecond resolution on long segments
        let (dx64, dy64) = (dx.0 as f64, dy.0 as f64);
        let distance = libm::sqrt(dx64 * dx64 + dy64 * dy64);
        let duration_ns = (distance / speed.0 as f64 * 1e9) as u64;

        let slices = if planner.slice_ms == 0 {
            1
        } else {
            let slice_ns = planner.slice_ms as u64 * 1_000_000;
            (duration_ns / slice_ns).clamp(1, steps_x.max(steps_y).max(1))
        };

        Ok(Self {
            direction_x: Direction::of(dx),
            direction_y: Direction::of(dy),
            steps_x,
            steps_y,
            duration_ns,
            slices,
            min_tick_delay_ns: planner.min_tick_delay_us as u64 * 1_000,
        })
    }

    /// No axis has a whole step to take.
    #[inline]
    pub fn is_too_small(&self) -> bool {
        self.steps_x == 0 && self.steps_y == 0
    }

    /// Number of time slices.
    #[inline]
    pub fn slice_count(&self) -> u64 {
        self.slices
    }

    /// Direction of an axis.
    #[inline]
    pub fn direction(&self, axis: Axis) -> Direction {
        match axis {
            Axis::X => self.direction_x,
            Axis::Y => self.direction_y,
        }
    }

    /// Signed step count of an axis.
    #[inline]
    pub fn signed_steps(&self, axis: Axis) -> Steps {
        let (direction, steps) = match axis {
            Axis::X => (self.direction_x, self.steps_x),
            Axis::Y => (self.direction_y, self.steps_y),
        };
        Steps(direction.sign() as i64 * steps as i64)
    }

    /// Displacement the axes will actually cover once every step is taken.
    pub fn actual_displacement(&self, steps_per_mm: [f32; 2]) -> (Millimeters, Millimeters) {
        (
            self.signed_steps(Axis::X).to_millimeters(steps_per_mm[0]),
            self.signed_steps(Axis::Y).to_millimeters(steps_per_mm[1]),
        )
    }

    /// Iterate the time slices of this segment.
    pub fn slices(&self) -> Slices<'_> {
        Slices { plan: self, k: 0 }
    }
}

/// One time slice: its own interleave schedule and tick delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slice {
    /// Interleave schedule of the slice-local step counts.
    pub schedule: StepSchedule,
    /// Delay between ticks, never below the configured minimum.
    pub tick_delay_ns: u64,
}

/// Iterator over the slices of a [`SegmentPlan`].
#[derive(Debug, Clone)]
pub struct Slices<'a> {
    plan: &'a SegmentPlan,
    k: u64,
}

/// Steps falling in slice `k` of `n` when `total` steps are spread by
/// cumulative floor.
fn share(total: u64, k: u64, n: u64) -> u64 {
    let total = total as u128;
    let (k, n) = (k as u128, n as u128);
    ((k + 1) * total / n - k * total / n) as u64
}

impl Iterator for Slices<'_> {
    type Item = Result<Slice, MotionError>;

    fn next(&mut self) -> Option<Self::Item> {
        let plan = self.plan;
        if self.k >= plan.slices {
            return None;
        }
        let k = self.k;
        self.k += 1;

        let schedule = match StepSchedule::new(
            share(plan.steps_x, k, plan.slices),
            share(plan.steps_y, k, plan.slices),
        ) {
            Ok(schedule) => schedule,
            Err(e) => return Some(Err(e)),
        };

        let slice_ns = plan.duration_ns / plan.slices;
        let tick_delay_ns = match schedule.ticks() {
            0 => 0,
            ticks => (slice_ns / ticks).max(plan.min_tick_delay_ns),
        };

        Some(Ok(Slice {
            schedule,
            tick_delay_ns,
        }))
    }
}
