//! Simulated frosting board (std only).
//!
//! Stands in for the real stepper and extruder boards so that paths,
//! timings and failure handling can be exercised without hardware. All pin
//! handles share one [`SimBoard`] state:
//!
//! - STEP rising edges move the axis one step in the direction given by DIR,
//!   as long as the axis is enabled
//! - an endstop reads triggered while the axis is at or below its configured
//!   position
//! - PWM legs record their duty; the extruder output is derived from both
//!   legs and sampled when leg B is written (drivers write A then B)
//! - the clock only advances when something delays on it
//!
//! Every step, enable change and duty change is logged with its simulated
//! timestamp.

use std::cell::RefCell;
use std::rc::Rc;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{self, ErrorType as DigitalErrorType, InputPin, OutputPin};
use embedded_hal::pwm::{self, ErrorType as PwmErrorType, SetDutyCycle};

use crate::config::MachineConfig;
use crate::hardware::{
    AbortSignal, Actuator, Axis, Extruder, ExtruderId, ExtruderState, NeverAbort, StepperAxis,
    Timebase,
};
use crate::machine::MotionController;

/// PWM resolution of the simulated extruder board.
pub const SIM_MAX_DUTY: u16 = 4095;

/// Something that happened on the simulated board.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SimEvent {
    /// An enabled axis moved one step.
    Step {
        /// Simulated time in microseconds.
        at_us: u64,
        /// Axis that moved.
        axis: Axis,
        /// -1 or +1.
        direction: i8,
    },
    /// An axis was energised or released.
    Enable {
        /// Simulated time in microseconds.
        at_us: u64,
        /// Axis affected.
        axis: Axis,
        /// New state.
        enabled: bool,
    },
    /// An extruder output changed.
    Output {
        /// Simulated time in microseconds.
        at_us: u64,
        /// Extruder affected.
        extruder: ExtruderId,
        /// Output after the change.
        state: ExtruderState,
    },
}

#[derive(Debug, Default)]
struct AxisSim {
    position: i64,
    step_high: bool,
    dir_high: bool,
    enabled: bool,
    endstop_at: Option<i64>,
    steps: u64,
}

#[derive(Debug)]
struct SimState {
    now_ns: u64,
    axes: [AxisSim; 2],
    legs: [[u16; 2]; 2],
    outputs: [ExtruderState; 2],
    events: Vec<SimEvent>,
    failing: Vec<Actuator>,
    abort_after_steps: Option<u64>,
    abort_raised: bool,
}

impl Default for SimState {
    fn default() -> Self {
        Self {
            now_ns: 0,
            axes: Default::default(),
            legs: [[0; 2]; 2],
            outputs: [ExtruderState::Coasting; 2],
            events: Vec::new(),
            failing: Vec::new(),
            abort_after_steps: None,
            abort_raised: false,
        }
    }
}

impl SimState {
    fn now_us(&self) -> u64 {
        self.now_ns / 1_000
    }

    fn total_steps(&self) -> u64 {
        self.axes[0].steps + self.axes[1].steps
    }

    fn output(&self, extruder: ExtruderId) -> ExtruderState {
        let [a, b] = self.legs[extruder_index(extruder)];
        match (a, b) {
            (0, 0) => ExtruderState::Coasting,
            (SIM_MAX_DUTY, SIM_MAX_DUTY) => ExtruderState::Stopped,
            (a, 0) => ExtruderState::Driving(a as f32 / SIM_MAX_DUTY as f32),
            (0, b) => ExtruderState::Driving(-(b as f32) / SIM_MAX_DUTY as f32),
            // Mid-transition: one leg written, the other not yet
            _ => ExtruderState::Stopped,
        }
    }
}

fn axis_index(axis: Axis) -> usize {
    match axis {
        Axis::X => 0,
        Axis::Y => 1,
    }
}

fn extruder_index(extruder: ExtruderId) -> usize {
    match extruder {
        ExtruderId::White => 0,
        ExtruderId::Black => 1,
    }
}

/// Error returned by pins of an actuator marked as failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimFault;

impl digital::Error for SimFault {
    fn kind(&self) -> digital::ErrorKind {
        digital::ErrorKind::Other
    }
}

impl pwm::Error for SimFault {
    fn kind(&self) -> pwm::ErrorKind {
        pwm::ErrorKind::Other
    }
}

/// Axis driver wired to the simulated board.
pub type SimAxisDriver = StepperAxis<SimPin, SimPin, SimPin, SimEndstop>;

/// Extruder driver wired to the simulated board.
pub type SimExtruderDriver = Extruder<SimPwm, SimPwm>;

/// Motion controller wired to the simulated board.
pub type SimController<A = NeverAbort> =
    MotionController<SimAxisDriver, SimAxisDriver, SimExtruderDriver, SimExtruderDriver, SimClock, A>;

/// Handle to the simulated board. Cloning shares the same state.
#[derive(Debug, Clone, Default)]
pub struct SimBoard {
    state: Rc<RefCell<SimState>>,
}

impl SimBoard {
    /// A board with both axes at 0, no endstops and both extruders coasting.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a controller whose drivers are wired to this board.
    pub fn controller(&self, config: MachineConfig) -> SimController {
        let x = self.axis_driver(Axis::X, &config);
        let y = self.axis_driver(Axis::Y, &config);
        let white = self.extruder_driver(ExtruderId::White, &config);
        let black = self.extruder_driver(ExtruderId::Black, &config);
        MotionController::new(config, x, y, white, black, self.clock())
    }

    /// Axis driver for one axis.
    pub fn axis_driver(&self, axis: Axis, config: &MachineConfig) -> SimAxisDriver {
        let pin = |role| SimPin {
            state: self.state.clone(),
            axis,
            role,
        };
        StepperAxis::new(
            axis,
            pin(PinRole::Step),
            pin(PinRole::Dir),
            pin(PinRole::Enable),
            SimEndstop {
                state: self.state.clone(),
                axis,
            },
            config.axis(axis),
        )
    }

    /// Extruder driver for one extruder.
    pub fn extruder_driver(&self, id: ExtruderId, config: &MachineConfig) -> SimExtruderDriver {
        let leg = |leg| SimPwm {
            state: self.state.clone(),
            extruder: id,
            leg,
        };
        Extruder::new(id, leg(0), leg(1), config.extruder(id))
    }

    /// Simulated clock.
    pub fn clock(&self) -> SimClock {
        SimClock {
            state: self.state.clone(),
        }
    }

    /// Emergency-stop input driven by this board.
    pub fn abort_signal(&self) -> SimAbort {
        SimAbort {
            state: self.state.clone(),
        }
    }

    /// Raise or clear the emergency stop.
    pub fn set_abort(&self, raised: bool) {
        self.state.borrow_mut().abort_raised = raised;
    }

    /// Raise the emergency stop once `steps` steps (both axes combined)
    /// have been taken from now on.
    pub fn abort_after_steps(&self, steps: u64) {
        let mut state = self.state.borrow_mut();
        let total = state.total_steps();
        state.abort_after_steps = Some(total + steps);
    }

    /// Place the endstop of an axis: triggered at or below `position` steps.
    pub fn set_endstop_position(&self, axis: Axis, position: i64) {
        self.state.borrow_mut().axes[axis_index(axis)].endstop_at = Some(position);
    }

    /// Remove the endstop of an axis (never triggers).
    pub fn clear_endstop(&self, axis: Axis) {
        self.state.borrow_mut().axes[axis_index(axis)].endstop_at = None;
    }

    /// Move an axis by hand.
    pub fn set_position_steps(&self, axis: Axis, position: i64) {
        self.state.borrow_mut().axes[axis_index(axis)].position = position;
    }

    /// Physical position of an axis in steps.
    pub fn position_steps(&self, axis: Axis) -> i64 {
        self.state.borrow().axes[axis_index(axis)].position
    }

    /// Steps taken by an axis since the board was created.
    pub fn step_count(&self, axis: Axis) -> u64 {
        self.state.borrow().axes[axis_index(axis)].steps
    }

    /// Whether an axis is energised.
    pub fn is_enabled(&self, axis: Axis) -> bool {
        self.state.borrow().axes[axis_index(axis)].enabled
    }

    /// Current output of an extruder.
    pub fn extruder_output(&self, extruder: ExtruderId) -> ExtruderState {
        self.state.borrow().output(extruder)
    }

    /// Simulated time in microseconds.
    pub fn now_us(&self) -> u64 {
        self.state.borrow().now_us()
    }

    /// Make every pin of an actuator fail from now on.
    pub fn fail(&self, actuator: Actuator) {
        self.state.borrow_mut().failing.push(actuator);
    }

    /// Everything logged so far.
    pub fn events(&self) -> Vec<SimEvent> {
        self.state.borrow().events.clone()
    }

    /// Forget logged events.
    pub fn clear_events(&self) {
        self.state.borrow_mut().events.clear();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PinRole {
    Step,
    Dir,
    Enable,
}

/// STEP, DIR or ENABLE line of a simulated axis.
#[derive(Debug, Clone)]
pub struct SimPin {
    state: Rc<RefCell<SimState>>,
    axis: Axis,
    role: PinRole,
}

impl SimPin {
    fn write(&mut self, high: bool) -> Result<(), SimFault> {
        let mut state = self.state.borrow_mut();
        if state.failing.contains(&self.axis.actuator()) {
            return Err(SimFault);
        }
        let at_us = state.now_us();
        let axis = self.axis;
        let mut event = None;

        let sim = &mut state.axes[axis_index(axis)];
        match self.role {
            PinRole::Step => {
                let rising = high && !sim.step_high;
                sim.step_high = high;
                if rising && sim.enabled {
                    let direction = if sim.dir_high { 1 } else { -1 };
                    sim.position += direction as i64;
                    sim.steps += 1;
                    event = Some(SimEvent::Step {
                        at_us,
                        axis,
                        direction,
                    });
                }
            }
            PinRole::Dir => sim.dir_high = high,
            PinRole::Enable => {
                // Active low
                let enabled = !high;
                if sim.enabled != enabled {
                    sim.enabled = enabled;
                    event = Some(SimEvent::Enable {
                        at_us,
                        axis,
                        enabled,
                    });
                }
            }
        }

        if let Some(event) = event {
            state.events.push(event);
        }
        Ok(())
    }
}

impl DigitalErrorType for SimPin {
    type Error = SimFault;
}

impl OutputPin for SimPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.write(false)
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.write(true)
    }
}

/// Endstop switch of a simulated axis (reads high when triggered).
#[derive(Debug, Clone)]
pub struct SimEndstop {
    state: Rc<RefCell<SimState>>,
    axis: Axis,
}

impl SimEndstop {
    fn level(&self) -> Result<bool, SimFault> {
        let state = self.state.borrow();
        if state.failing.contains(&self.axis.actuator()) {
            return Err(SimFault);
        }
        let sim = &state.axes[axis_index(self.axis)];
        Ok(sim.endstop_at.is_some_and(|at| sim.position <= at))
    }
}

impl DigitalErrorType for SimEndstop {
    type Error = SimFault;
}

impl InputPin for SimEndstop {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        self.level()
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        self.level().map(|high| !high)
    }
}

/// One H-bridge leg of a simulated extruder.
#[derive(Debug, Clone)]
pub struct SimPwm {
    state: Rc<RefCell<SimState>>,
    extruder: ExtruderId,
    leg: usize,
}

impl PwmErrorType for SimPwm {
    type Error = SimFault;
}

impl SetDutyCycle for SimPwm {
    fn max_duty_cycle(&self) -> u16 {
        SIM_MAX_DUTY
    }

    fn set_duty_cycle(&mut self, duty: u16) -> Result<(), Self::Error> {
        let mut state = self.state.borrow_mut();
        if state.failing.contains(&self.extruder.actuator()) {
            return Err(SimFault);
        }
        let index = extruder_index(self.extruder);
        state.legs[index][self.leg] = duty;
        if self.leg == 1 {
            let output = state.output(self.extruder);
            if state.outputs[index] != output {
                state.outputs[index] = output;
                let at_us = state.now_us();
                state.events.push(SimEvent::Output {
                    at_us,
                    extruder: self.extruder,
                    state: output,
                });
            }
        }
        Ok(())
    }
}

/// Simulated clock: delays advance time instantly.
#[derive(Debug, Clone)]
pub struct SimClock {
    state: Rc<RefCell<SimState>>,
}

impl DelayNs for SimClock {
    fn delay_ns(&mut self, ns: u32) {
        self.state.borrow_mut().now_ns += ns as u64;
    }
}

impl Timebase for SimClock {
    fn now_us(&mut self) -> u64 {
        self.state.borrow().now_us()
    }

    fn sleep_ns(&mut self, ns: u64) {
        self.state.borrow_mut().now_ns += ns;
    }
}

/// Emergency-stop input controlled through [`SimBoard`].
#[derive(Debug, Clone)]
pub struct SimAbort {
    state: Rc<RefCell<SimState>>,
}

impl AbortSignal for SimAbort {
    fn is_raised(&self) -> bool {
        let state = self.state.borrow();
        state.abort_raised
            || state
                .abort_after_steps
                .is_some_and(|limit| state.total_steps() >= limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hardware::{AxisDriver, ExtruderDriver};

    #[test]
    fn test_step_moves_only_when_enabled() {
        let board = SimBoard::new();
        let config = MachineConfig::default();
        let mut axis = board.axis_driver(Axis::X, &config);
        let mut clock = board.clock();

        axis.init().unwrap();
        axis.step(1, &mut clock).unwrap();
        axis.step(1, &mut clock).unwrap();
        axis.step(-1, &mut clock).unwrap();
        assert_eq!(board.position_steps(Axis::X), 1);
        assert_eq!(board.step_count(Axis::X), 3);

        axis.disable().unwrap();
        assert!(!board.is_enabled(Axis::X));
    }

    #[test]
    fn test_extruder_output_tracks_legs() {
        let board = SimBoard::new();
        let config = MachineConfig::default();
        let mut white = board.extruder_driver(ExtruderId::White, &config);

        assert_eq!(board.extruder_output(ExtruderId::White), ExtruderState::Coasting);
        white.drive(1.0).unwrap();
        match board.extruder_output(ExtruderId::White) {
            ExtruderState::Driving(duty) => assert!((duty - 0.6).abs() < 1e-3),
            other => panic!("unexpected output {:?}", other),
        }
        white.stop().unwrap();
        assert_eq!(board.extruder_output(ExtruderId::White), ExtruderState::Stopped);
    }

    #[test]
    fn test_failing_pins_fault_the_driver() {
        let board = SimBoard::new();
        let config = MachineConfig::default();
        let mut axis = board.axis_driver(Axis::Y, &config);
        let mut clock = board.clock();

        board.fail(Actuator::YAxis);
        assert!(axis.step(1, &mut clock).is_err());
        assert!(!axis.is_operational());
        assert_eq!(
            axis.step(1, &mut clock),
            Err(crate::error::HardwareError::Faulted(Actuator::YAxis))
        );
    }

    #[test]
    fn test_clock_advances_on_delay() {
        let board = SimBoard::new();
        let mut clock = board.clock();
        clock.delay_ms(3);
        clock.sleep_ns(500_000);
        assert_eq!(board.now_us(), 3_500);
    }
}
