//! Axis configuration from TOML.

use serde::Deserialize;

use super::units::{Millimeters, MillimetersPerSec};

/// Direction the axis travels while seeking its endstop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HomeDirection {
    /// Endstop sits at the low end of travel.
    #[default]
    Negative,
    /// Endstop sits at the high end of travel.
    Positive,
}

impl HomeDirection {
    /// Step sign used while seeking.
    #[inline]
    pub fn sign(self) -> i8 {
        match self {
            HomeDirection::Negative => -1,
            HomeDirection::Positive => 1,
        }
    }
}

/// Complete configuration of one linear axis.
///
/// Immutable once the machine is constructed.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AxisConfig {
    /// Steps per millimeter of carriage travel.
    #[serde(default = "default_steps_per_mm")]
    pub steps_per_mm: f32,

    /// Speed used for homing seek and backoff.
    #[serde(rename = "default_speed_mm_per_sec", default = "default_speed")]
    pub default_speed: MillimetersPerSec,

    /// Signed distance moved away from the endstop after it triggers.
    #[serde(rename = "backoff_mm", default = "default_backoff")]
    pub backoff: Millimeters,

    /// Give up seeking after this long.
    #[serde(default = "default_homing_timeout_ms")]
    pub homing_timeout_ms: u32,

    /// Which way to travel toward the endstop.
    #[serde(default)]
    pub home_direction: HomeDirection,

    /// GPIO line of the endstop, for diagnostics only.
    #[serde(default)]
    pub endstop_pin: Option<u8>,

    /// Endstop reads high when triggered.
    #[serde(default = "default_true")]
    pub endstop_active_high: bool,

    /// Invert direction pin logic.
    #[serde(default)]
    pub invert_direction: bool,

    /// STEP pulse high time in nanoseconds.
    #[serde(default = "default_step_pulse_ns")]
    pub step_pulse_ns: u32,
}

fn default_steps_per_mm() -> f32 {
    10.0
}

fn default_speed() -> MillimetersPerSec {
    MillimetersPerSec(20.0)
}

fn default_backoff() -> Millimeters {
    Millimeters(2.0)
}

fn default_homing_timeout_ms() -> u32 {
    30_000
}

fn default_true() -> bool {
    true
}

fn default_step_pulse_ns() -> u32 {
    2_000
}

impl AxisConfig {
    /// Create a config with the given resolution and default everything else.
    pub fn new(steps_per_mm: f32) -> Self {
        Self {
            steps_per_mm,
            default_speed: default_speed(),
            backoff: default_backoff(),
            homing_timeout_ms: default_homing_timeout_ms(),
            home_direction: HomeDirection::Negative,
            endstop_pin: None,
            endstop_active_high: true,
            invert_direction: false,
            step_pulse_ns: default_step_pulse_ns(),
        }
    }

    /// Seek step period: `1 / (default_speed × steps_per_mm)` seconds.
    ///
    /// This is the rated step-rate throttle while homing.
    pub fn homing_step_delay_ns(&self) -> u64 {
        let steps_per_sec = self.default_speed.0 as f64 * self.steps_per_mm as f64;
        if steps_per_sec > 0.0 {
            (1_000_000_000.0 / steps_per_sec) as u64
        } else {
            u64::MAX
        }
    }

    /// Homing timeout in microseconds.
    #[inline]
    pub fn homing_timeout_us(&self) -> u64 {
        self.homing_timeout_ms as u64 * 1_000
    }

    /// Distance covered by a single step.
    #[inline]
    pub fn step_length(&self) -> Millimeters {
        Millimeters(1.0 / self.steps_per_mm)
    }
}

impl Default for AxisConfig {
    fn default() -> Self {
        Self::new(default_steps_per_mm())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_homing_step_delay() {
        // 20 mm/s at 10 steps/mm = 200 steps/s = 5 ms per step
        let config = AxisConfig::new(10.0);
        assert_eq!(config.homing_step_delay_ns(), 5_000_000);
    }

    #[test]
    fn test_homing_step_delay_fractional_rate() {
        let mut config = AxisConfig::new(3.0);
        config.default_speed = MillimetersPerSec(1.0);
        // 1 / 3 s, truncated to whole nanoseconds
        assert_eq!(config.homing_step_delay_ns(), 333_333_333);
    }

    #[test]
    fn test_seek_sign() {
        assert_eq!(HomeDirection::Negative.sign(), -1);
        assert_eq!(HomeDirection::Positive.sign(), 1);
    }
}
