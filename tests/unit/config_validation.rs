//! Unit tests for configuration validation.

use frosting_motion::config::{parse_config, validate_config, MachineConfig};
use frosting_motion::error::{ConfigError, Error};
use frosting_motion::hardware::Axis;

fn config_error(toml_str: &str) -> ConfigError {
    match parse_config(toml_str) {
        Err(Error::Config(e)) => e,
        other => panic!("expected a config error, got {:?}", other),
    }
}

/// Zero steps per millimeter is rejected with the axis named.
#[test]
fn test_zero_steps_per_mm() {
    let err = config_error(
        r#"
[axes.y]
steps_per_mm = 0.0
"#,
    );
    assert!(matches!(
        err,
        ConfigError::InvalidStepsPerUnit { axis: Axis::Y, value } if value == 0.0
    ));
}

/// Negative homing speed is rejected.
#[test]
fn test_negative_default_speed() {
    let err = config_error(
        r#"
[axes.x]
default_speed_mm_per_sec = -5.0
"#,
    );
    assert!(matches!(err, ConfigError::InvalidSpeed(v) if v == -5.0));
}

/// A homing timeout of zero would fail every homing pass.
#[test]
fn test_zero_homing_timeout() {
    let err = config_error(
        r#"
[axes.x]
homing_timeout_ms = 0
"#,
    );
    assert_eq!(err, ConfigError::InvalidTimeout(Axis::X));
}

/// Extrude modifiers must be positive.
#[test]
fn test_zero_extrude_modifier() {
    let err = config_error(
        r#"
[extruders.white]
extrude_modifier = 0.0
"#,
    );
    assert!(matches!(err, ConfigError::InvalidExtrudeModifier(_)));
}

/// The draw speed is checked like any other speed.
#[test]
fn test_zero_draw_speed() {
    let err = config_error(
        r#"
[job]
draw_speed_mm_per_sec = 0.0
"#,
    );
    assert!(matches!(err, ConfigError::InvalidSpeed(_)));
}

/// A minimum tick delay longer than a slice is contradictory.
#[test]
fn test_tick_delay_longer_than_slice() {
    let err = config_error(
        r#"
[planner]
slice_ms = 2
min_tick_delay_us = 2500
"#,
    );
    assert_eq!(
        err,
        ConfigError::InvalidSlice {
            slice_ms: 2,
            min_tick_delay_us: 2500
        }
    );
}

/// Configs built in code go through the same checks.
#[test]
fn test_validate_programmatic_config() {
    let mut config = MachineConfig::default();
    assert!(validate_config(&config).is_ok());

    config.axes.x.backoff.0 = f32::NAN;
    assert!(matches!(
        validate_config(&config),
        Err(Error::Config(ConfigError::InvalidBackoff(Axis::X)))
    ));
}
