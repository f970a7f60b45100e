//! Machine configuration - root configuration structure.

use serde::Deserialize;

use crate::hardware::{Axis, ExtruderId};

use super::axis::AxisConfig;
use super::extruder::ExtruderConfig;
use super::units::{Millimeters, MillimetersPerSec};

/// The two stage axes.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct AxisPair {
    /// X axis.
    #[serde(default)]
    pub x: AxisConfig,
    /// Y axis.
    #[serde(default)]
    pub y: AxisConfig,
}

impl AxisPair {
    /// Config for one axis.
    #[inline]
    pub fn get(&self, axis: Axis) -> &AxisConfig {
        match axis {
            Axis::X => &self.x,
            Axis::Y => &self.y,
        }
    }
}

/// The two extruders.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct ExtruderPair {
    /// Background (white) frosting.
    #[serde(default)]
    pub white: ExtruderConfig,
    /// Foreground (black) frosting.
    #[serde(default)]
    pub black: ExtruderConfig,
}

impl ExtruderPair {
    /// Config for one extruder.
    #[inline]
    pub fn get(&self, id: ExtruderId) -> &ExtruderConfig {
        match id {
            ExtruderId::White => &self.white,
            ExtruderId::Black => &self.black,
        }
    }
}

/// How the path executor advances the logical position after a segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionTracking {
    /// Jump to the requested target; truncation drift accumulates until the
    /// next homing pass.
    #[default]
    Requested,
    /// Advance by the displacement actually stepped.
    Actual,
}

/// Segment planner tuning.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct PlannerConfig {
    /// Time-slice length in milliseconds; 0 runs each segment as one
    /// interleave schedule.
    #[serde(default)]
    pub slice_ms: u32,

    /// Lower bound on the delay between ticks.
    #[serde(default)]
    pub min_tick_delay_us: u32,

    /// Logical position update policy.
    #[serde(default)]
    pub position_tracking: PositionTracking,
}

/// Drawing job parameters.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct JobConfig {
    /// Path speed while drawing.
    #[serde(rename = "draw_speed_mm_per_sec", default = "default_draw_speed")]
    pub draw_speed: MillimetersPerSec,

    /// Nozzle offset of the foreground extruder relative to the background one.
    #[serde(rename = "foreground_offset_mm", default = "default_foreground_offset")]
    pub foreground_offset: [Millimeters; 2],

    /// Pause after an endstop triggers, before backing off.
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u32,
}

fn default_draw_speed() -> MillimetersPerSec {
    MillimetersPerSec(20.0)
}

fn default_foreground_offset() -> [Millimeters; 2] {
    [Millimeters(20.0), Millimeters(0.0)]
}

fn default_settle_ms() -> u32 {
    1_000
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            draw_speed: default_draw_speed(),
            foreground_offset: default_foreground_offset(),
            settle_ms: default_settle_ms(),
        }
    }
}

/// Root configuration structure from TOML.
///
/// Every table is optional; the defaults describe the stock machine
/// (10 steps/mm, 20 mm/s, 2 mm backoff, 30 s homing timeout).
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct MachineConfig {
    /// Axis configurations.
    #[serde(default)]
    pub axes: AxisPair,

    /// Extruder configurations.
    #[serde(default)]
    pub extruders: ExtruderPair,

    /// Planner tuning.
    #[serde(default)]
    pub planner: PlannerConfig,

    /// Job parameters.
    #[serde(default)]
    pub job: JobConfig,
}

impl MachineConfig {
    /// Get an axis configuration.
    #[inline]
    pub fn axis(&self, axis: Axis) -> &AxisConfig {
        self.axes.get(axis)
    }

    /// Get an extruder configuration.
    #[inline]
    pub fn extruder(&self, id: ExtruderId) -> &ExtruderConfig {
        self.extruders.get(id)
    }
}
