//! Configuration module for frosting-motion.
//!
//! Provides types for loading and validating axis, extruder, planner and job
//! configuration from TOML files (with `std` feature) or pre-built values.

mod axis;
mod extruder;
#[cfg(feature = "std")]
mod loader;
mod machine;
pub mod units;
mod validation;

pub use axis::{AxisConfig, HomeDirection};
pub use extruder::ExtruderConfig;
pub use machine::{AxisPair, ExtruderPair, JobConfig, MachineConfig, PlannerConfig, PositionTracking};
pub use validation::validate_config;

#[cfg(feature = "std")]
pub use loader::{load_config, parse_config};

// Re-export unit types at config level
pub use units::{Millimeters, MillimetersPerSec, Steps, UnitExt};
