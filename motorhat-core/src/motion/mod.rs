//! Motor actuation logic
//!
//! Commands, wiring tables and the stepper state machine. Nothing here
//! performs I/O: the drivers turn the values computed here into register
//! writes.

pub mod command;
pub mod stepping;
pub mod wiring;

pub use command::{Command, Direction, PinLevel, StepStyle};
pub use stepping::{Phase, StepPlan, StepperState, MICROSTEPS, MICROSTEP_CURVE, POSITIONS};
pub use wiring::{MotorIndex, PinTriple, StepperIndex, StepperWiring};
