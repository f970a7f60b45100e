//! H-bridge DC extruder driver.
//!
//! Each motor is driven through two PWM legs (IN1/IN2). Forward puts the
//! duty on leg A with leg B off, reverse the opposite. Both legs fully on
//! brakes the motor; both off lets it coast.

use embedded_hal::pwm::{self, SetDutyCycle};

use crate::config::ExtruderConfig;
use crate::error::HardwareError;

use super::{ExtruderDriver, ExtruderId, HardwareResult};

/// Last commanded extruder output.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ExtruderState {
    /// Both legs off (initial state).
    Coasting,
    /// Both legs on.
    Stopped,
    /// Driving at the given effective duty in [-1, 1].
    Driving(f32),
}

impl ExtruderState {
    /// Whether material is being pushed or pulled.
    #[inline]
    pub fn is_driving(self) -> bool {
        matches!(self, ExtruderState::Driving(_))
    }
}

/// DC extruder on two PWM channels.
pub struct Extruder<A, B>
where
    A: SetDutyCycle,
    B: SetDutyCycle,
{
    id: ExtruderId,
    leg_a: A,
    leg_b: B,
    config: ExtruderConfig,
    state: ExtruderState,
    faulted: bool,
}

impl<A, B> Extruder<A, B>
where
    A: SetDutyCycle,
    B: SetDutyCycle,
{
    /// Create a new extruder driver.
    pub fn new(id: ExtruderId, leg_a: A, leg_b: B, config: &ExtruderConfig) -> Self {
        Self {
            id,
            leg_a,
            leg_b,
            config: config.clone(),
            state: ExtruderState::Coasting,
            faulted: false,
        }
    }

    /// Get the configuration.
    #[inline]
    pub fn config(&self) -> &ExtruderConfig {
        &self.config
    }

    /// Release the PWM channels.
    pub fn release(self) -> (A, B) {
        (self.leg_a, self.leg_b)
    }

    fn check<E: pwm::Error>(&mut self, result: core::result::Result<(), E>) -> HardwareResult<()> {
        result.map_err(|e| {
            self.faulted = true;
            error!("{:?} extruder PWM failure: {:?}", self.id, e.kind());
            HardwareError::Pwm {
                actuator: self.id.actuator(),
                kind: e.kind(),
            }
        })
    }

    /// Set both legs, A first. Both writes are attempted; the first error wins.
    fn set_legs(&mut self, a: Leg, b: Leg) -> HardwareResult<()> {
        let (a, b) = if self.config.invert { (b, a) } else { (a, b) };
        let result_a = a.apply(&mut self.leg_a);
        let result_b = b.apply(&mut self.leg_b);
        let first = self.check(result_a);
        let second = self.check(result_b);
        first.and(second)
    }
}

#[derive(Clone, Copy)]
enum Leg {
    Off,
    On,
    Fraction(f32),
}

impl Leg {
    fn apply<P: SetDutyCycle>(self, pin: &mut P) -> core::result::Result<(), P::Error> {
        match self {
            Leg::Off => pin.set_duty_cycle_fully_off(),
            Leg::On => pin.set_duty_cycle_fully_on(),
            Leg::Fraction(fraction) => {
                let max = pin.max_duty_cycle();
                let duty = libm::roundf(fraction * max as f32) as u16;
                pin.set_duty_cycle(duty.min(max))
            }
        }
    }
}

impl<A, B> ExtruderDriver for Extruder<A, B>
where
    A: SetDutyCycle,
    B: SetDutyCycle,
{
    #[inline]
    fn id(&self) -> ExtruderId {
        self.id
    }

    fn drive(&mut self, duty: f32) -> HardwareResult<()> {
        if self.faulted {
            return Err(HardwareError::Faulted(self.id.actuator()));
        }

        if !duty.is_finite() {
            warn!("{:?} extruder: non-finite duty ignored, stopping", self.id);
            return self.stop();
        }

        let effective = self.config.effective_duty(duty);
        if effective == 0.0 {
            return self.stop();
        }

        if effective > 0.0 {
            self.set_legs(Leg::Fraction(effective), Leg::Off)?;
        } else {
            self.set_legs(Leg::Off, Leg::Fraction(-effective))?;
        }

        trace!("{:?} extruder duty {}", self.id, effective);
        self.state = ExtruderState::Driving(effective);
        Ok(())
    }

    fn stop(&mut self) -> HardwareResult<()> {
        self.state = ExtruderState::Stopped;
        self.set_legs(Leg::On, Leg::On)
    }

    fn coast(&mut self) -> HardwareResult<()> {
        self.state = ExtruderState::Coasting;
        self.set_legs(Leg::Off, Leg::Off)
    }

    #[inline]
    fn state(&self) -> ExtruderState {
        self.state
    }

    #[inline]
    fn is_operational(&self) -> bool {
        !self.faulted
    }
}
