//! Unit tests for TOML configuration parsing.

use frosting_motion::config::units::{Millimeters, MillimetersPerSec};
use frosting_motion::config::{parse_config, HomeDirection, MachineConfig, PositionTracking};
use frosting_motion::hardware::{Axis, ExtruderId};

/// An empty document describes the stock machine.
#[test]
fn test_empty_config_uses_defaults() {
    let config = parse_config("").expect("Failed to parse TOML");

    assert_eq!(config, MachineConfig::default());
    assert_eq!(config.axes.x.steps_per_mm, 10.0);
    assert_eq!(config.axes.y.default_speed, MillimetersPerSec(20.0));
    assert_eq!(config.axes.x.backoff, Millimeters(2.0));
    assert_eq!(config.axes.y.homing_timeout_ms, 30_000);
    assert_eq!(config.extruders.white.extrude_modifier, 0.6);
    assert_eq!(config.job.settle_ms, 1_000);
    assert_eq!(config.job.foreground_offset, [Millimeters(20.0), Millimeters(0.0)]);
    assert_eq!(config.planner.slice_ms, 0);
}

/// Test parsing a complete machine description.
#[test]
fn test_parse_full_machine() {
    let toml_str = r#"
[axes.x]
steps_per_mm = 80.0
default_speed_mm_per_sec = 15.0
backoff_mm = 3.5
homing_timeout_ms = 12000
endstop_pin = 17
invert_direction = true

[axes.y]
steps_per_mm = 40.0
home_direction = "positive"
backoff_mm = -2.0
endstop_active_high = false
step_pulse_ns = 5000

[extruders.white]
extrude_modifier = 0.5

[extruders.black]
extrude_modifier = 0.8
invert = true

[planner]
slice_ms = 20
min_tick_delay_us = 50
position_tracking = "actual"

[job]
draw_speed_mm_per_sec = 25.0
foreground_offset_mm = [21.5, -0.5]
settle_ms = 500
"#;

    let config = parse_config(toml_str).expect("Failed to parse TOML");

    let x = config.axis(Axis::X);
    assert_eq!(x.steps_per_mm, 80.0);
    assert_eq!(x.default_speed.0, 15.0);
    assert_eq!(x.backoff.0, 3.5);
    assert_eq!(x.homing_timeout_ms, 12_000);
    assert_eq!(x.endstop_pin, Some(17));
    assert!(x.invert_direction);
    assert_eq!(x.home_direction, HomeDirection::Negative);

    let y = config.axis(Axis::Y);
    assert_eq!(y.home_direction, HomeDirection::Positive);
    assert_eq!(y.backoff.0, -2.0);
    assert!(!y.endstop_active_high);
    assert_eq!(y.step_pulse_ns, 5_000);

    assert_eq!(config.extruder(ExtruderId::White).extrude_modifier, 0.5);
    assert!(config.extruder(ExtruderId::Black).invert);

    assert_eq!(config.planner.slice_ms, 20);
    assert_eq!(config.planner.min_tick_delay_us, 50);
    assert_eq!(config.planner.position_tracking, PositionTracking::Actual);

    assert_eq!(config.job.draw_speed.0, 25.0);
    assert_eq!(config.job.foreground_offset[0].0, 21.5);
    assert_eq!(config.job.foreground_offset[1].0, -0.5);
    assert_eq!(config.job.settle_ms, 500);
}

/// Tables may be given partially; missing keys keep their defaults.
#[test]
fn test_partial_tables() {
    let toml_str = r#"
[axes.y]
steps_per_mm = 12.5

[extruders.black]
invert = true
"#;

    let config = parse_config(toml_str).expect("Failed to parse TOML");
    assert_eq!(config.axes.x.steps_per_mm, 10.0);
    assert_eq!(config.axes.y.steps_per_mm, 12.5);
    assert_eq!(config.axes.y.default_speed.0, 20.0);
    assert_eq!(config.extruders.black.extrude_modifier, 0.6);
}

/// Unknown enum values are parse errors, not silent defaults.
#[test]
fn test_unknown_home_direction() {
    let toml_str = r#"
[axes.x]
home_direction = "sideways"
"#;

    assert!(parse_config(toml_str).is_err());
}
