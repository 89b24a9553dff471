//! Motor driver implementations
//!
//! - DC motors: H-bridge direction pins plus a PWM speed input

pub mod dc;

pub use dc::DcMotor;
