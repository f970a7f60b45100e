//! # frosting-motion
//!
//! Motion control for a two-axis frosting plotter with two DC extruders,
//! on embedded-hal 1.0.
//!
//! ## Features
//!
//! - **Interleaved stepping**: both axes share one tick timeline built from
//!   `lcm(steps_x, steps_y)` so they finish together
//! - **Endstop homing**: polling state machine with timeout, settle and backoff
//! - **Duty-cycle extruders**: H-bridge drivers with per-extruder modifiers
//! - **Two-layer jobs**: home, draw background, re-home, offset, draw foreground
//! - **Emergency stop**: polled between steps, always wins
//! - **no_std compatible**: Core library works without standard library
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use frosting_motion::{load_config, load_drawing, JobOrchestrator, MotionController};
//!
//! let config = load_config("machine.toml")?;
//! let mut ctl = MotionController::new(config, x_axis, y_axis, white, black, timebase)
//!     .with_abort(&ESTOP);
//! ctl.init()?;
//!
//! let background = load_drawing("bgd_coordinates.csv")?;
//! let foreground = load_drawing("img_coordinates.csv")?;
//! JobOrchestrator::new().run(&mut ctl, background.commands(), foreground.commands())?;
//! ```
//!
//! ## Feature Flags
//!
//! - `std` (default): TOML config and CSV drawing loading, `tracing` logs,
//!   host timebase and the simulated board
//! - `alloc`: Owned [`Drawing`] without std
//! - `defmt`: defmt logging for embedded targets
//! - `tracing`: tracing logging without the rest of `std`

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]
// Allow large error types - necessary for no_std with heapless strings
#![allow(clippy::result_large_err)]

#[cfg(any(feature = "alloc", feature = "std"))]
extern crate alloc;

// Logging macros; must come first
#[macro_use]
mod fmt;

// Core modules
pub mod config;
pub mod drawing;
pub mod error;
pub mod hardware;
pub mod machine;
pub mod motion;

// Simulated board (std only)
#[cfg(feature = "std")]
pub mod sim;

// Re-exports for ergonomic API
pub use config::{validate_config, MachineConfig};
pub use drawing::Command;
pub use error::{Error, Result};
pub use hardware::{
    AbortSignal, Actuator, Axis, AxisDriver, Extruder, ExtruderDriver, ExtruderId, NeverAbort,
    StepperAxis, Timebase,
};
pub use machine::{AxisHoming, HomingState, JobOrchestrator, JobState, MotionController, PathExecutor};
pub use motion::{LogicalPosition, StepSchedule};

#[cfg(any(feature = "alloc", feature = "std"))]
pub use drawing::Drawing;

// File loading (std only)
#[cfg(feature = "std")]
pub use config::{load_config, parse_config};
#[cfg(feature = "std")]
pub use drawing::{load_drawing, parse_drawing};
#[cfg(feature = "std")]
pub use hardware::StdTimebase;

// Unit types
pub use config::units::{Millimeters, MillimetersPerSec, Steps};
