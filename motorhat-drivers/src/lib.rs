//! Drivers for the PCA9685 motor add-on board
//!
//! This crate puts the register bus from `motorhat-hal` and the logic from
//! `motorhat-core` together:
//!
//! - [`pwm::PwmController`] - PCA9685 register sequencing
//! - [`motor::DcMotor`] - H-bridge DC motor ports M1-M4
//! - [`stepper::StepperMotor`] - two-coil steppers on M1/M2 and M3/M4
//! - [`timed::TimedRelease`] - release a motor after a run time
//! - [`hat::MotorHat`] - command surface with per-motor supersede
//!
//! # Consistency model
//!
//! A command is a sequence of independent register writes. If the bus
//! fails part way through, the writes already made stay in effect and the
//! error is returned; nothing is rolled back or retried. Treat the motor's
//! physical state as unknown after an error and send a full command again.
//!
//! # Concurrency
//!
//! Actuators share one [`pwm::SharedPwm`], an `embassy_sync` mutex around
//! the controller, so the 4-byte channel sequences of different motors
//! never interleave. Delays are `embedded_hal_async::delay::DelayNs`
//! suspension points (`embassy_time::Delay` on target).

#![no_std]
#![deny(unsafe_code)]

// This must come first so the macros are visible in the other modules
mod fmt;

pub mod cancel;
pub mod error;
pub mod hat;
pub mod motor;
pub mod pwm;
pub mod stepper;
pub mod timed;

#[cfg(test)]
pub(crate) mod testing;

pub use cancel::CancelToken;
pub use error::{CommandContext, DriverError, PinError, Target};
pub use hat::MotorHat;
pub use motor::DcMotor;
pub use pwm::{PwmController, SharedPwm};
pub use stepper::{StepOutcome, StepperMotor};
pub use timed::{Release, ReleaseOutcome, TimedRelease};
