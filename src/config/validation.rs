//! Configuration validation.

use crate::error::{ConfigError, Error, Result};
use crate::hardware::{Axis, ExtruderId};

use super::{AxisConfig, ExtruderConfig, MachineConfig};

/// Validate a machine configuration.
///
/// Checks:
/// - Axis resolutions and speeds are finite and positive
/// - Homing timeouts are non-zero and backoff distances finite
/// - Extrude modifiers are finite and positive
/// - Draw speed is finite and positive
/// - The minimum tick delay fits inside a planner slice
pub fn validate_config(config: &MachineConfig) -> Result<()> {
    for axis in Axis::ALL {
        validate_axis(axis, config.axis(axis))?;
    }

    for id in ExtruderId::ALL {
        validate_extruder(config.extruder(id))?;
    }

    if !config.job.draw_speed.is_valid() {
        return Err(Error::Config(ConfigError::InvalidSpeed(config.job.draw_speed.0)));
    }

    let planner = &config.planner;
    if planner.slice_ms > 0 && planner.min_tick_delay_us as u64 > planner.slice_ms as u64 * 1_000 {
        return Err(Error::Config(ConfigError::InvalidSlice {
            slice_ms: planner.slice_ms,
            min_tick_delay_us: planner.min_tick_delay_us,
        }));
    }

    Ok(())
}

fn validate_axis(axis: Axis, config: &AxisConfig) -> Result<()> {
    if !(config.steps_per_mm.is_finite() && config.steps_per_mm > 0.0) {
        return Err(Error::Config(ConfigError::InvalidStepsPerUnit {
            axis,
            value: config.steps_per_mm,
        }));
    }

    if !config.default_speed.is_valid() {
        return Err(Error::Config(ConfigError::InvalidSpeed(config.default_speed.0)));
    }

    if config.homing_timeout_ms == 0 {
        return Err(Error::Config(ConfigError::InvalidTimeout(axis)));
    }

    if !config.backoff.is_finite() {
        return Err(Error::Config(ConfigError::InvalidBackoff(axis)));
    }

    Ok(())
}

fn validate_extruder(config: &ExtruderConfig) -> Result<()> {
    if !(config.extrude_modifier.is_finite() && config.extrude_modifier > 0.0) {
        return Err(Error::Config(ConfigError::InvalidExtrudeModifier(
            config.extrude_modifier,
        )));
    }

    Ok(())
}
