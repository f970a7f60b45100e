//! Step/direction stepper axis driver.
//!
//! Generic over embedded-hal 1.0 pin types. The enable line is active-low,
//! as on A4988/DRV8825 style drivers.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{self, InputPin, OutputPin};

use crate::config::AxisConfig;
use crate::error::HardwareError;

use super::{Axis, AxisDriver, HardwareResult};

/// Stepper axis driver.
///
/// Generic over:
/// - `STEP`: STEP pin type (must implement `OutputPin`)
/// - `DIR`: DIR pin type (must implement `OutputPin`)
/// - `EN`: active-low ENABLE pin type (must implement `OutputPin`)
/// - `END`: endstop input (must implement `InputPin`)
pub struct StepperAxis<STEP, DIR, EN, END>
where
    STEP: OutputPin,
    DIR: OutputPin,
    EN: OutputPin,
    END: InputPin,
{
    /// Axis identity.
    axis: Axis,

    /// STEP pin (pulse to move one step).
    step_pin: STEP,

    /// DIR pin (high = positive, or inverted).
    dir_pin: DIR,

    /// ENABLE pin (low = coils energised).
    enable_pin: EN,

    /// Endstop switch.
    endstop: END,

    /// Whether direction pin logic is inverted.
    invert_direction: bool,

    /// Endstop level that means "triggered".
    endstop_active_high: bool,

    /// STEP high time.
    step_pulse_ns: u32,

    /// Current direction (cached to avoid unnecessary pin writes).
    current_direction: Option<i8>,

    /// Whether the coils are energised.
    enabled: bool,

    /// Set when any pin operation fails.
    faulted: bool,
}

impl<STEP, DIR, EN, END> StepperAxis<STEP, DIR, EN, END>
where
    STEP: OutputPin,
    DIR: OutputPin,
    EN: OutputPin,
    END: InputPin,
{
    /// Create a new axis driver. Pins are not touched until [`AxisDriver::init`]
    /// or the first command.
    pub fn new(
        axis: Axis,
        step_pin: STEP,
        dir_pin: DIR,
        enable_pin: EN,
        endstop: END,
        config: &AxisConfig,
    ) -> Self {
        Self {
            axis,
            step_pin,
            dir_pin,
            enable_pin,
            endstop,
            invert_direction: config.invert_direction,
            endstop_active_high: config.endstop_active_high,
            step_pulse_ns: config.step_pulse_ns,
            current_direction: None,
            enabled: false,
            faulted: false,
        }
    }

    /// Release the pins.
    pub fn release(self) -> (STEP, DIR, EN, END) {
        (self.step_pin, self.dir_pin, self.enable_pin, self.endstop)
    }

    fn check<T, E: digital::Error>(
        &mut self,
        result: core::result::Result<T, E>,
    ) -> HardwareResult<T> {
        result.map_err(|e| {
            self.faulted = true;
            let err = HardwareError::Digital {
                actuator: self.axis.actuator(),
                kind: e.kind(),
            };
            error!("{:?} axis pin failure: {:?}", self.axis, e.kind());
            err
        })
    }

    fn ensure_operational(&self) -> HardwareResult<()> {
        if self.faulted {
            Err(HardwareError::Faulted(self.axis.actuator()))
        } else {
            Ok(())
        }
    }

    fn set_direction(&mut self, direction: i8) -> HardwareResult<()> {
        if self.current_direction == Some(direction) {
            return Ok(());
        }

        let pin_high = (direction > 0) != self.invert_direction;
        let result = if pin_high {
            self.dir_pin.set_high()
        } else {
            self.dir_pin.set_low()
        };
        self.check(result)?;

        self.current_direction = Some(direction);
        Ok(())
    }
}

impl<STEP, DIR, EN, END> AxisDriver for StepperAxis<STEP, DIR, EN, END>
where
    STEP: OutputPin,
    DIR: OutputPin,
    EN: OutputPin,
    END: InputPin,
{
    #[inline]
    fn axis(&self) -> Axis {
        self.axis
    }

    fn init(&mut self) -> HardwareResult<()> {
        let result = self.step_pin.set_low();
        let step = self.check(result);
        let released = self.disable();
        step.and(released)
    }

    fn step<D: DelayNs>(&mut self, direction: i8, delay: &mut D) -> HardwareResult<()> {
        self.ensure_operational()?;

        if direction == 0 {
            debug!("{:?} axis: step with direction 0 ignored", self.axis);
            return Ok(());
        }

        if !self.enabled {
            self.enable()?;
        }
        self.set_direction(direction.signum())?;

        // Generate step pulse
        let result = self.step_pin.set_high();
        self.check(result)?;
        delay.delay_ns(self.step_pulse_ns);
        let result = self.step_pin.set_low();
        self.check(result)
    }

    fn enable(&mut self) -> HardwareResult<()> {
        self.ensure_operational()?;
        let result = self.enable_pin.set_low();
        self.check(result)?;
        self.enabled = true;
        Ok(())
    }

    fn disable(&mut self) -> HardwareResult<()> {
        // Released even when faulted
        self.enabled = false;
        let result = self.enable_pin.set_high();
        self.check(result)
    }

    fn endstop_triggered(&mut self) -> HardwareResult<bool> {
        self.ensure_operational()?;
        let result = self.endstop.is_high();
        let high = self.check(result)?;
        Ok(high == self.endstop_active_high)
    }

    #[inline]
    fn step_pulse_ns(&self) -> u32 {
        self.step_pulse_ns
    }

    #[inline]
    fn is_enabled(&self) -> bool {
        self.enabled
    }

    #[inline]
    fn is_operational(&self) -> bool {
        !self.faulted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hardware::Actuator;
    use embedded_hal::digital::ErrorKind;
    use embedded_hal_mock::eh1::delay::NoopDelay;
    use embedded_hal_mock::eh1::digital::{Mock as PinMock, State, Transaction as PinTransaction};
    use embedded_hal_mock::eh1::MockError;

    fn axis(
        step: &[PinTransaction],
        dir: &[PinTransaction],
        en: &[PinTransaction],
        end: &[PinTransaction],
        config: &AxisConfig,
    ) -> (StepperAxis<PinMock, PinMock, PinMock, PinMock>, [PinMock; 4]) {
        let pins = [
            PinMock::new(step),
            PinMock::new(dir),
            PinMock::new(en),
            PinMock::new(end),
        ];
        let driver = StepperAxis::new(
            Axis::X,
            pins[0].clone(),
            pins[1].clone(),
            pins[2].clone(),
            pins[3].clone(),
            config,
        );
        (driver, pins)
    }

    fn done(mut pins: [PinMock; 4]) {
        for pin in pins.iter_mut() {
            pin.done();
        }
    }

    #[test]
    fn test_first_step_enables_and_sets_direction() {
        let pulse = [
            PinTransaction::set(State::High),
            PinTransaction::set(State::Low),
            PinTransaction::set(State::High),
            PinTransaction::set(State::Low),
        ];
        let dir = [PinTransaction::set(State::High)];
        let en = [PinTransaction::set(State::Low)];
        let (mut driver, pins) = axis(&pulse, &dir, &en, &[], &AxisConfig::default());

        let mut delay = NoopDelay::new();
        driver.step(1, &mut delay).unwrap();
        // Same direction: no DIR write
        driver.step(1, &mut delay).unwrap();
        assert!(driver.is_enabled());

        done(pins);
    }

    #[test]
    fn test_direction_zero_is_a_no_op() {
        let (mut driver, pins) = axis(&[], &[], &[], &[], &AxisConfig::default());

        let mut delay = NoopDelay::new();
        assert!(driver.step(0, &mut delay).is_ok());
        assert!(!driver.is_enabled());

        done(pins);
    }

    #[test]
    fn test_inverted_direction() {
        let pulse = [PinTransaction::set(State::High), PinTransaction::set(State::Low)];
        let dir = [PinTransaction::set(State::High)];
        let en = [PinTransaction::set(State::Low)];
        let mut config = AxisConfig::default();
        config.invert_direction = true;
        let (mut driver, pins) = axis(&pulse, &dir, &en, &[], &config);

        driver.step(-1, &mut NoopDelay::new()).unwrap();

        done(pins);
    }

    #[test]
    fn test_endstop_polarity() {
        let end = [PinTransaction::get(State::High), PinTransaction::get(State::Low)];
        let (mut driver, pins) = axis(&[], &[], &[], &end, &AxisConfig::default());
        assert!(driver.endstop_triggered().unwrap());
        assert!(!driver.endstop_triggered().unwrap());
        done(pins);

        let end = [PinTransaction::get(State::Low)];
        let mut config = AxisConfig::default();
        config.endstop_active_high = false;
        let (mut driver, pins) = axis(&[], &[], &[], &end, &config);
        assert!(driver.endstop_triggered().unwrap());
        done(pins);
    }

    #[test]
    fn test_init_and_disable() {
        let step = [PinTransaction::set(State::Low)];
        let en = [PinTransaction::set(State::High), PinTransaction::set(State::High)];
        let (mut driver, pins) = axis(&step, &[], &en, &[], &AxisConfig::default());

        driver.init().unwrap();
        driver.disable().unwrap();
        assert!(!driver.is_enabled());
        assert!(driver.is_operational());

        done(pins);
    }

    #[test]
    fn test_failed_init_still_releases_axis() {
        let step = [PinTransaction::set(State::Low).with_error(MockError::Io(std::io::ErrorKind::Other))];
        let en = [PinTransaction::set(State::High)];
        let (mut driver, pins) = axis(&step, &[], &en, &[], &AxisConfig::default());

        assert_eq!(
            driver.init(),
            Err(HardwareError::Digital {
                actuator: Actuator::XAxis,
                kind: ErrorKind::Other
            })
        );
        assert!(!driver.is_enabled());
        assert!(!driver.is_operational());

        done(pins);
    }
}
