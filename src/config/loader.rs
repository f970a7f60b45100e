//! Configuration loading from files (std only).

use std::fs;
use std::path::Path;

use crate::error::{truncated, ConfigError, Error, Result};

use super::MachineConfig;

/// Load configuration from a TOML file.
///
/// # Errors
///
/// Returns an error if the file cannot be read, parsed or validated.
///
/// # Example
///
/// ```rust,ignore
/// use frosting_motion::load_config;
///
/// let config = load_config("machine.toml")?;
/// ```
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<MachineConfig> {
    let content = fs::read_to_string(path.as_ref()).map_err(|e| {
        let msg = truncated(&e.to_string());
        Error::Config(ConfigError::IoError(msg))
    })?;

    parse_config(&content)
}

/// Parse configuration from a TOML string.
///
/// # Errors
///
/// Returns an error if the TOML is invalid or fails validation.
pub fn parse_config(content: &str) -> Result<MachineConfig> {
    let config: MachineConfig = toml::from_str(content)
        .map_err(|e| Error::Config(ConfigError::ParseError(truncated(e.message()))))?;

    // Validate the configuration
    super::validation::validate_config(&config)?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{HomeDirection, PositionTracking};

    #[test]
    fn test_parse_empty_config_uses_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config, MachineConfig::default());
        assert!((config.axes.x.steps_per_mm - 10.0).abs() < 1e-6);
        assert_eq!(config.axes.x.homing_timeout_ms, 30_000);
    }

    #[test]
    fn test_parse_axis_overrides() {
        let toml = r#"
[axes.x]
steps_per_mm = 12.5
default_speed_mm_per_sec = 15.0
backoff_mm = -3.0
homing_timeout_ms = 10000
home_direction = "positive"
endstop_pin = 23

[axes.y]
steps_per_mm = 8.0
endstop_active_high = false

[planner]
slice_ms = 20
position_tracking = "actual"
"#;

        let config = parse_config(toml).unwrap();
        assert!((config.axes.x.steps_per_mm - 12.5).abs() < 1e-6);
        assert!((config.axes.x.backoff.0 + 3.0).abs() < 1e-6);
        assert_eq!(config.axes.x.home_direction, HomeDirection::Positive);
        assert_eq!(config.axes.x.endstop_pin, Some(23));
        assert!(!config.axes.y.endstop_active_high);
        assert_eq!(config.planner.slice_ms, 20);
        assert_eq!(config.planner.position_tracking, PositionTracking::Actual);
    }

    #[test]
    fn test_parse_rejects_invalid_values() {
        let toml = r#"
[axes.x]
steps_per_mm = -1.0
"#;
        assert!(parse_config(toml).is_err());
    }

    #[test]
    fn test_parse_error_is_reported() {
        let result = parse_config("[axes.x\nsteps_per_mm = 1");
        assert!(matches!(result, Err(Error::Config(ConfigError::ParseError(_)))));
    }
}
