//! Two-axis step interleaving.
//!
//! Both axes share one tick timeline of `L = lcm(steps_x, steps_y)` ticks.
//! Axis X fires on every tick divisible by `L / steps_x`, axis Y on every
//! tick divisible by `L / steps_y`, so both finish on tick `L` with their
//! firings spread evenly. When one axis has no steps the other fires once
//! per tick.

use crate::error::MotionError;
use crate::hardware::Axis;

/// Greatest common divisor.
pub fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a
}

/// Least common multiple, `None` on overflow. `lcm(n, 0) == 0`.
pub fn lcm(a: u64, b: u64) -> Option<u64> {
    if a == 0 || b == 0 {
        return Some(0);
    }
    (a / gcd(a, b)).checked_mul(b)
}

/// Which axes step on one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Tick {
    /// Step the X axis.
    pub x: bool,
    /// Step the Y axis.
    pub y: bool,
}

impl Tick {
    /// Whether the given axis fires.
    #[inline]
    pub fn fires(self, axis: Axis) -> bool {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
        }
    }
}

/// Interleaved step plan for one segment (or one slice of it).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepSchedule {
    steps_x: u64,
    steps_y: u64,
    ticks: u64,
    /// Tick period of X; 0 = never fires.
    mod_x: u64,
    /// Tick period of Y; 0 = never fires.
    mod_y: u64,
}

impl StepSchedule {
    /// Build the schedule for the given step counts.
    ///
    /// # Errors
    ///
    /// Returns [`MotionError::ScheduleOverflow`] if the tick count does not
    /// fit in a `u64`.
    pub fn new(steps_x: u64, steps_y: u64) -> Result<Self, MotionError> {
        let (ticks, mod_x, mod_y) = match (steps_x, steps_y) {
            (0, 0) => (0, 0, 0),
            (sx, 0) => (sx, 1, 0),
            (0, sy) => (sy, 0, 1),
            (sx, sy) => {
                let ticks = lcm(sx, sy).ok_or(MotionError::ScheduleOverflow)?;
                (ticks, ticks / sx, ticks / sy)
            }
        };

        Ok(Self {
            steps_x,
            steps_y,
            ticks,
            mod_x,
            mod_y,
        })
    }

    /// Steps the X axis receives.
    #[inline]
    pub fn steps_x(&self) -> u64 {
        self.steps_x
    }

    /// Steps the Y axis receives.
    #[inline]
    pub fn steps_y(&self) -> u64 {
        self.steps_y
    }

    /// Number of ticks in the schedule.
    #[inline]
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Tick period of an axis (0 if it never fires).
    #[inline]
    pub fn period(&self, axis: Axis) -> u64 {
        match axis {
            Axis::X => self.mod_x,
            Axis::Y => self.mod_y,
        }
    }

    /// Nothing to step.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ticks == 0
    }

    /// Decision for tick `j` (1-based).
    #[inline]
    pub fn tick(&self, j: u64) -> Tick {
        Tick {
            x: self.mod_x != 0 && j % self.mod_x == 0,
            y: self.mod_y != 0 && j % self.mod_y == 0,
        }
    }

    /// Iterate the decisions for ticks `1..=L`.
    pub fn iter(&self) -> Ticks {
        Ticks {
            schedule: *self,
            next: 1,
        }
    }
}

impl IntoIterator for &StepSchedule {
    type Item = Tick;
    type IntoIter = Ticks;

    fn into_iter(self) -> Ticks {
        self.iter()
    }
}

/// Iterator over the ticks of a [`StepSchedule`].
#[derive(Debug, Clone)]
pub struct Ticks {
    schedule: StepSchedule,
    next: u64,
}

impl Iterator for Ticks {
    type Item = Tick;

    fn next(&mut self) -> Option<Tick> {
        // `next == 0` marks exhaustion after tick `u64::MAX`
        if self.next == 0 || self.next > self.schedule.ticks {
            return None;
        }
        let tick = self.schedule.tick(self.next);
        self.next = self.next.checked_add(1).unwrap_or(0);
        Some(tick)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = match self.next {
            0 => 0,
            next => self.schedule.ticks.saturating_sub(next - 1),
        };
        let n = usize::try_from(remaining).unwrap_or(usize::MAX);
        (n, usize::try_from(remaining).ok())
    }
}
