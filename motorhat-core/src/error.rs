//! Configuration errors
//!
//! Everything here is detected before any bus traffic and is never retried.

use core::fmt;

/// Invalid configuration or argument
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// DC motor index outside 0..=3
    MotorIndexOutOfRange(u8),
    /// Stepper index outside 0..=1
    StepperIndexOutOfRange(u8),
    /// PWM pin outside 0..=15
    PinOutOfRange(u8),
    /// Logical pin value other than 0 or 1
    InvalidPinValue(u8),
    /// Unknown motor command code
    InvalidCommand(u8),
    /// Unknown stepping style code
    InvalidStepStyle(u8),
    /// Device address outside the 7-bit range
    InvalidAddress(u8),
    /// Stepper configured with zero steps per revolution
    ZeroStepsPerRevolution,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::MotorIndexOutOfRange(i) => {
                write!(f, "motor index {} out of range (0-3)", i)
            }
            ConfigError::StepperIndexOutOfRange(i) => {
                write!(f, "stepper index {} out of range (0-1)", i)
            }
            ConfigError::PinOutOfRange(p) => write!(f, "PWM pin {} out of range (0-15)", p),
            ConfigError::InvalidPinValue(v) => write!(f, "pin value {} is not 0 or 1", v),
            ConfigError::InvalidCommand(c) => write!(f, "unknown motor command {}", c),
            ConfigError::InvalidStepStyle(s) => write!(f, "unknown step style {}", s),
            ConfigError::InvalidAddress(a) => write!(f, "device address {:#04x} is not 7-bit", a),
            ConfigError::ZeroStepsPerRevolution => f.write_str("steps per revolution is zero"),
        }
    }
}
