//! Error types for frosting-motion.
//!
//! Provides unified error handling across configuration, actuator drivers,
//! homing, motion execution and drawing input.

use core::fmt;

use embedded_hal::{digital, pwm};

use crate::hardware::{Actuator, Axis};

/// Result type alias using the library's Error type.
pub type Result<T> = core::result::Result<T, Error>;

/// Unified error type for all frosting-motion operations.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// Configuration parsing or validation error
    Config(ConfigError),
    /// Actuator or sensor hardware error
    Hardware(HardwareError),
    /// Homing sequence failure
    Homing(HomingError),
    /// Motion planning or execution error
    Motion(MotionError),
    /// Drawing input error
    Drawing(DrawingError),
}

/// Configuration-related errors.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Failed to parse TOML configuration
    ParseError(heapless::String<128>),
    /// Steps per millimeter must be finite and > 0
    InvalidStepsPerUnit {
        /// Offending axis
        axis: Axis,
        /// Configured value
        value: f32,
    },
    /// Speed must be finite and > 0
    InvalidSpeed(f32),
    /// Homing timeout must be > 0
    InvalidTimeout(Axis),
    /// Extrude modifier must be finite and > 0
    InvalidExtrudeModifier(f32),
    /// Backoff distance must be finite
    InvalidBackoff(Axis),
    /// Minimum tick delay does not fit inside one planner slice
    InvalidSlice {
        /// Configured slice length in milliseconds
        slice_ms: u32,
        /// Configured minimum tick delay in microseconds
        min_tick_delay_us: u32,
    },
    /// Actuator identity not in the closed set of known actuators
    UnknownActuator(heapless::String<32>),
    /// Actuator identity names an axis where an extruder is required
    NotAnExtruder(Actuator),
    /// File I/O error (std only)
    #[cfg(feature = "std")]
    IoError(heapless::String<128>),
}

/// Actuator and sensor errors.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HardwareError {
    /// A digital pin (step, direction, enable or endstop) failed
    Digital {
        /// Actuator owning the pin
        actuator: Actuator,
        /// Underlying cause reported by the HAL
        kind: digital::ErrorKind,
    },
    /// A PWM channel failed
    Pwm {
        /// Actuator owning the channel
        actuator: Actuator,
        /// Underlying cause reported by the HAL
        kind: pwm::ErrorKind,
    },
    /// Driver failed earlier and no longer accepts motion commands
    Faulted(Actuator),
}

/// Homing errors.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HomingError {
    /// Endstop never triggered within the timeout; axis left disabled
    TimedOut {
        /// Axis that failed to home
        axis: Axis,
        /// Time spent seeking in milliseconds
        elapsed_ms: u64,
    },
}

/// Motion planning and execution errors.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MotionError {
    /// Commanded speed is zero, negative or not finite
    InvalidSpeed(f32),
    /// Displacement contains NaN or infinity
    NonFiniteDisplacement,
    /// Emergency stop raised; stepping halted between ticks
    Aborted,
    /// Interleave tick count does not fit in 64 bits
    ScheduleOverflow,
}

/// Drawing input errors.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DrawingError {
    /// Malformed record in a drawing file
    Parse {
        /// One-based line (record) number
        line: u64,
        /// What was wrong
        reason: heapless::String<64>,
    },
    /// Command coordinates are NaN or infinite
    NonFiniteCoordinate {
        /// Zero-based command index
        index: usize,
    },
    /// File I/O error (std only)
    #[cfg(feature = "std")]
    Io(heapless::String<128>),
}

impl Error {
    /// Whether this error is the emergency-stop short circuit.
    #[inline]
    pub fn is_abort(&self) -> bool {
        matches!(self, Error::Motion(MotionError::Aborted))
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Config(e) => write!(f, "Configuration error: {}", e),
            Error::Hardware(e) => write!(f, "Hardware error: {}", e),
            Error::Homing(e) => write!(f, "Homing error: {}", e),
            Error::Motion(e) => write!(f, "Motion error: {}", e),
            Error::Drawing(e) => write!(f, "Drawing error: {}", e),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            ConfigError::InvalidStepsPerUnit { axis, value } => {
                write!(f, "Invalid steps_per_mm for {} axis: {}. Must be > 0", axis, value)
            }
            ConfigError::InvalidSpeed(v) => write!(f, "Invalid speed: {}. Must be > 0", v),
            ConfigError::InvalidTimeout(axis) => {
                write!(f, "Invalid homing timeout for {} axis. Must be > 0", axis)
            }
            ConfigError::InvalidExtrudeModifier(v) => {
                write!(f, "Invalid extrude modifier: {}. Must be > 0", v)
            }
            ConfigError::InvalidBackoff(axis) => {
                write!(f, "Invalid backoff distance for {} axis", axis)
            }
            ConfigError::InvalidSlice { slice_ms, min_tick_delay_us } => write!(
                f,
                "Minimum tick delay {} us does not fit in a {} ms slice",
                min_tick_delay_us, slice_ms
            ),
            ConfigError::UnknownActuator(name) => write!(f, "Unknown actuator '{}'", name),
            ConfigError::NotAnExtruder(actuator) => {
                write!(f, "Actuator '{}' is not an extruder", actuator)
            }
            #[cfg(feature = "std")]
            ConfigError::IoError(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl fmt::Display for HardwareError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HardwareError::Digital { actuator, kind } => {
                write!(f, "{} pin operation failed: {}", actuator, kind)
            }
            HardwareError::Pwm { actuator, kind } => {
                write!(f, "{} PWM operation failed: {}", actuator, kind)
            }
            HardwareError::Faulted(actuator) => {
                write!(f, "{} is faulted and disabled", actuator)
            }
        }
    }
}

impl fmt::Display for HomingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HomingError::TimedOut { axis, elapsed_ms } => {
                write!(f, "{} axis did not reach its endstop after {} ms", axis, elapsed_ms)
            }
        }
    }
}

impl fmt::Display for MotionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MotionError::InvalidSpeed(v) => write!(f, "Invalid speed {}. Must be > 0", v),
            MotionError::NonFiniteDisplacement => write!(f, "Displacement is not finite"),
            MotionError::Aborted => write!(f, "Emergency stop"),
            MotionError::ScheduleOverflow => write!(f, "Step schedule too long"),
        }
    }
}

impl fmt::Display for DrawingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DrawingError::Parse { line, reason } => write!(f, "line {}: {}", line, reason),
            DrawingError::NonFiniteCoordinate { index } => {
                write!(f, "command {} has a non-finite coordinate", index)
            }
            #[cfg(feature = "std")]
            DrawingError::Io(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

// Conversion impls
impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Error::Config(e)
    }
}

impl From<HardwareError> for Error {
    fn from(e: HardwareError) -> Self {
        Error::Hardware(e)
    }
}

impl From<HomingError> for Error {
    fn from(e: HomingError) -> Self {
        Error::Homing(e)
    }
}

impl From<MotionError> for Error {
    fn from(e: MotionError) -> Self {
        Error::Motion(e)
    }
}

impl From<DrawingError> for Error {
    fn from(e: DrawingError) -> Self {
        Error::Drawing(e)
    }
}

/// Copy as much of `msg` as fits, cutting on a character boundary.
pub(crate) fn truncated<const N: usize>(msg: &str) -> heapless::String<N> {
    let mut out = heapless::String::new();
    for c in msg.chars() {
        if out.push(c).is_err() {
            break;
        }
    }
    out
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

#[cfg(feature = "std")]
impl std::error::Error for ConfigError {}

#[cfg(feature = "std")]
impl std::error::Error for HardwareError {}

#[cfg(feature = "std")]
impl std::error::Error for HomingError {}

#[cfg(feature = "std")]
impl std::error::Error for MotionError {}

#[cfg(feature = "std")]
impl std::error::Error for DrawingError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncated_cuts_on_char_boundary() {
        let short: heapless::String<8> = truncated("abc");
        assert_eq!(short.as_str(), "abc");

        // 'é' is two bytes and does not fit in the eighth byte
        let cut: heapless::String<8> = truncated("abcdefgé");
        assert_eq!(cut.as_str(), "abcdefg");
    }

    #[test]
    fn test_long_actuator_name_is_truncated() {
        let name = "a-very-long-actuator-name-that-overflows";
        let err = name.parse::<Actuator>().unwrap_err();
        match err {
            ConfigError::UnknownActuator(msg) => {
                assert_eq!(msg.len(), 32);
                assert!(name.starts_with(msg.as_str()));
            }
            other => panic!("unexpected error {:?}", other),
        }
    }
}
