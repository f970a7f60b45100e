//! Hardware boundary: actuator identities and driver traits.
//!
//! The motion code never touches pins directly. It talks to two
//! [`AxisDriver`]s, two [`ExtruderDriver`]s, a [`Timebase`] and an
//! [`AbortSignal`]; [`StepperAxis`] and [`Extruder`] implement the driver
//! traits on top of embedded-hal 1.0 pins and PWM channels.

mod extruder;
mod stepper;
#[cfg(feature = "std")]
mod timebase;

use core::fmt;
use core::str::FromStr;
use core::sync::atomic::{AtomicBool, Ordering};

use embedded_hal::delay::DelayNs;

use crate::error::{truncated, ConfigError, HardwareError};

pub use extruder::{Extruder, ExtruderState};
pub use stepper::StepperAxis;
#[cfg(feature = "std")]
pub use timebase::StdTimebase;

/// Result of a single driver operation.
pub type HardwareResult<T> = core::result::Result<T, HardwareError>;

/// One of the two stage axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Axis {
    /// X axis.
    X,
    /// Y axis.
    Y,
}

impl Axis {
    /// Both axes, in homing order.
    pub const ALL: [Axis; 2] = [Axis::X, Axis::Y];

    /// Actuator identity of this axis.
    #[inline]
    pub fn actuator(self) -> Actuator {
        match self {
            Axis::X => Actuator::XAxis,
            Axis::Y => Actuator::YAxis,
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Axis::X => f.write_str("X"),
            Axis::Y => f.write_str("Y"),
        }
    }
}

/// One of the two extruders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ExtruderId {
    /// Background frosting.
    White,
    /// Foreground frosting.
    Black,
}

impl ExtruderId {
    /// Both extruders.
    pub const ALL: [ExtruderId; 2] = [ExtruderId::White, ExtruderId::Black];

    /// Actuator identity of this extruder.
    #[inline]
    pub fn actuator(self) -> Actuator {
        match self {
            ExtruderId::White => Actuator::WhiteExtruder,
            ExtruderId::Black => Actuator::BlackExtruder,
        }
    }
}

impl fmt::Display for ExtruderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtruderId::White => f.write_str("white"),
            ExtruderId::Black => f.write_str("black"),
        }
    }
}

/// Closed set of actuators on the board.
///
/// Parsing from a name or a channel number never falls back to a default:
/// anything outside the set is [`ConfigError::UnknownActuator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Actuator {
    /// X axis stepper (channel 1).
    XAxis,
    /// Y axis stepper (channel 2).
    YAxis,
    /// White extruder (channel 3).
    WhiteExtruder,
    /// Black extruder (channel 4).
    BlackExtruder,
}

impl Actuator {
    /// Axis this actuator drives, if it is a stepper.
    #[inline]
    pub fn as_axis(self) -> Option<Axis> {
        match self {
            Actuator::XAxis => Some(Axis::X),
            Actuator::YAxis => Some(Axis::Y),
            _ => None,
        }
    }

    /// Extruder this actuator drives, if it is one.
    #[inline]
    pub fn as_extruder(self) -> Option<ExtruderId> {
        match self {
            Actuator::WhiteExtruder => Some(ExtruderId::White),
            Actuator::BlackExtruder => Some(ExtruderId::Black),
            _ => None,
        }
    }
}

impl fmt::Display for Actuator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Actuator::XAxis => f.write_str("x axis"),
            Actuator::YAxis => f.write_str("y axis"),
            Actuator::WhiteExtruder => f.write_str("white extruder"),
            Actuator::BlackExtruder => f.write_str("black extruder"),
        }
    }
}

fn unknown_actuator(name: &str) -> ConfigError {
    ConfigError::UnknownActuator(truncated(name))
}

impl TryFrom<u8> for Actuator {
    type Error = ConfigError;

    fn try_from(channel: u8) -> Result<Self, Self::Error> {
        match channel {
            1 => Ok(Actuator::XAxis),
            2 => Ok(Actuator::YAxis),
            3 => Ok(Actuator::WhiteExtruder),
            4 => Ok(Actuator::BlackExtruder),
            _ => {
                let mut buf = [0u8; 3];
                let mut n = channel;
                let mut i = buf.len();
                loop {
                    i -= 1;
                    buf[i] = b'0' + n % 10;
                    n /= 10;
                    if n == 0 {
                        break;
                    }
                }
                Err(unknown_actuator(core::str::from_utf8(&buf[i..]).unwrap_or("?")))
            }
        }
    }
}

impl FromStr for Actuator {
    type Err = ConfigError;

    /// Accepts `x`, `y`, `white`/`w`, `black`/`b` (any case) or a channel
    /// number 1-4.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        if let Ok(channel) = name.parse::<u8>() {
            return Actuator::try_from(channel);
        }

        if name.eq_ignore_ascii_case("x") {
            Ok(Actuator::XAxis)
        } else if name.eq_ignore_ascii_case("y") {
            Ok(Actuator::YAxis)
        } else if name.eq_ignore_ascii_case("white") || name.eq_ignore_ascii_case("w") {
            Ok(Actuator::WhiteExtruder)
        } else if name.eq_ignore_ascii_case("black") || name.eq_ignore_ascii_case("b") {
            Ok(Actuator::BlackExtruder)
        } else {
            Err(unknown_actuator(name))
        }
    }
}

impl TryFrom<Actuator> for ExtruderId {
    type Error = ConfigError;

    fn try_from(actuator: Actuator) -> Result<Self, Self::Error> {
        actuator
            .as_extruder()
            .ok_or(ConfigError::NotAnExtruder(actuator))
    }
}

impl FromStr for ExtruderId {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ExtruderId::try_from(s.parse::<Actuator>()?)
    }
}

/// A stepper-driven linear axis with its endstop.
pub trait AxisDriver {
    /// Which axis this driver moves.
    fn axis(&self) -> Axis;

    /// Put the outputs in a known idle state (STEP low, coils released).
    fn init(&mut self) -> HardwareResult<()> {
        self.disable()
    }

    /// Issue one step pulse in `direction` (-1, 0 or +1).
    ///
    /// Direction 0 is a no-op that returns `Ok`. A released axis is
    /// re-enabled before stepping.
    fn step<D: DelayNs>(&mut self, direction: i8, delay: &mut D) -> HardwareResult<()>;

    /// Energise the coils.
    fn enable(&mut self) -> HardwareResult<()>;

    /// Release holding torque. Always attempts the write, even when faulted.
    fn disable(&mut self) -> HardwareResult<()>;

    /// Poll the endstop.
    fn endstop_triggered(&mut self) -> HardwareResult<bool>;

    /// STEP pulse width, subtracted from the following tick delay.
    fn step_pulse_ns(&self) -> u32;

    /// Whether the coils are energised.
    fn is_enabled(&self) -> bool;

    /// False once a pin operation has failed.
    fn is_operational(&self) -> bool;
}

/// A duty-cycle-driven DC extruder.
pub trait ExtruderDriver {
    /// Which extruder this driver runs.
    fn id(&self) -> ExtruderId;

    /// Put the output in a known idle state (coasting).
    fn init(&mut self) -> HardwareResult<()> {
        self.coast()
    }

    /// Drive at a requested duty in [-1, 1], scaled by the configured
    /// modifier. Exactly zero brakes the motor.
    fn drive(&mut self, duty: f32) -> HardwareResult<()>;

    /// Brake: both bridge legs fully on.
    fn stop(&mut self) -> HardwareResult<()>;

    /// Float the output: both bridge legs off.
    fn coast(&mut self) -> HardwareResult<()>;

    /// Last commanded output state.
    fn state(&self) -> ExtruderState;

    /// False once a PWM operation has failed.
    fn is_operational(&self) -> bool;
}

/// Blocking delay plus a monotonic clock.
///
/// All pacing in the crate goes through this one primitive, so tests can
/// substitute a simulated clock.
pub trait Timebase: DelayNs {
    /// Microseconds since an arbitrary fixed origin.
    fn now_us(&mut self) -> u64;

    /// Block for a 64-bit number of nanoseconds.
    fn sleep_ns(&mut self, mut ns: u64) {
        while ns > 0 {
            let chunk = ns.min(u32::MAX as u64) as u32;
            self.delay_ns(chunk);
            ns -= chunk as u64;
        }
    }
}

impl<T: Timebase + ?Sized> Timebase for &mut T {
    fn now_us(&mut self) -> u64 {
        T::now_us(self)
    }
}

/// Emergency-stop input, polled between steps.
pub trait AbortSignal {
    /// Whether an abort has been requested.
    fn is_raised(&self) -> bool;
}

impl AbortSignal for AtomicBool {
    #[inline]
    fn is_raised(&self) -> bool {
        self.load(Ordering::Acquire)
    }
}

impl<T: AbortSignal + ?Sized> AbortSignal for &T {
    #[inline]
    fn is_raised(&self) -> bool {
        T::is_raised(self)
    }
}

/// Abort signal that is never raised.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverAbort;

impl AbortSignal for NeverAbort {
    #[inline]
    fn is_raised(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_actuator_names() {
        assert_eq!("x".parse::<Actuator>().unwrap(), Actuator::XAxis);
        assert_eq!("Y".parse::<Actuator>().unwrap(), Actuator::YAxis);
        assert_eq!("white".parse::<Actuator>().unwrap(), Actuator::WhiteExtruder);
        assert_eq!(" b ".parse::<Actuator>().unwrap(), Actuator::BlackExtruder);
        assert_eq!("3".parse::<Actuator>().unwrap(), Actuator::WhiteExtruder);
    }

    #[test]
    fn test_unknown_actuator_is_an_error() {
        assert!(matches!(
            "z".parse::<Actuator>(),
            Err(ConfigError::UnknownActuator(name)) if name.as_str() == "z"
        ));
        assert!(matches!(
            Actuator::try_from(17u8),
            Err(ConfigError::UnknownActuator(name)) if name.as_str() == "17"
        ));
        assert!(Actuator::try_from(0u8).is_err());
    }

    #[test]
    fn test_axis_is_not_an_extruder() {
        assert_eq!("black".parse::<ExtruderId>().unwrap(), ExtruderId::Black);
        assert_eq!(
            "x".parse::<ExtruderId>(),
            Err(ConfigError::NotAnExtruder(Actuator::XAxis))
        );
    }

    #[test]
    fn test_atomic_abort_signal() {
        let flag = AtomicBool::new(false);
        assert!(!flag.is_raised());
        flag.store(true, Ordering::Release);
        assert!(flag.is_raised());
        assert!(!NeverAbort.is_raised());
    }
}
