//! Motor commands and stepping styles
//!
//! Numeric codes follow the dispatch layer's encoding
//! (forward = 1, backward = 2, brake = 3, release = 4).

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Motor command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Command {
    /// Drive forward
    Forward,
    /// Drive backward
    Backward,
    /// Hold the current state
    ///
    /// The H-bridge pins are left as they are; no short-brake is applied.
    Brake,
    /// De-energize, motor coasts
    Release,
}

impl Command {
    /// Stepping direction, if this command moves the motor
    pub fn direction(self) -> Option<Direction> {
        match self {
            Command::Forward => Some(Direction::Forward),
            Command::Backward => Some(Direction::Backward),
            Command::Brake | Command::Release => None,
        }
    }

    /// Numeric code
    pub fn code(self) -> u8 {
        match self {
            Command::Forward => 1,
            Command::Backward => 2,
            Command::Brake => 3,
            Command::Release => 4,
        }
    }
}

impl TryFrom<u8> for Command {
    type Error = ConfigError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            1 => Ok(Command::Forward),
            2 => Ok(Command::Backward),
            3 => Ok(Command::Brake),
            4 => Ok(Command::Release),
            other => Err(ConfigError::InvalidCommand(other)),
        }
    }
}

/// Stepping direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Direction {
    /// Increasing position
    Forward,
    /// Decreasing position
    Backward,
}

impl Direction {
    /// +1 for forward, -1 for backward
    pub fn sign(self) -> i8 {
        match self {
            Direction::Forward => 1,
            Direction::Backward => -1,
        }
    }
}

/// Stepper coil sequencing style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum StepStyle {
    /// One coil energized at a time
    #[default]
    Single,
    /// Two coils energized, more torque
    Double,
    /// Alternating single and double, half steps
    Interleave,
    /// Blended duty on two coils, 1/8 steps
    Microstep,
}

impl StepStyle {
    /// Numeric code
    pub fn code(self) -> u8 {
        match self {
            StepStyle::Single => 1,
            StepStyle::Double => 2,
            StepStyle::Interleave => 3,
            StepStyle::Microstep => 4,
        }
    }
}

impl TryFrom<u8> for StepStyle {
    type Error = ConfigError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            1 => Ok(StepStyle::Single),
            2 => Ok(StepStyle::Double),
            3 => Ok(StepStyle::Interleave),
            4 => Ok(StepStyle::Microstep),
            other => Err(ConfigError::InvalidStepStyle(other)),
        }
    }
}

/// Logical level of a direction pin
///
/// Driven through PWM as full-off (low) or full-on (high).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PinLevel {
    /// Logical 0
    Low,
    /// Logical 1
    High,
}

impl PinLevel {
    /// Whether the level is high
    pub fn is_high(self) -> bool {
        self == PinLevel::High
    }
}

impl From<bool> for PinLevel {
    fn from(high: bool) -> Self {
        if high {
            PinLevel::High
        } else {
            PinLevel::Low
        }
    }
}

impl TryFrom<u8> for PinLevel {
    type Error = ConfigError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(PinLevel::Low),
            1 => Ok(PinLevel::High),
            other => Err(ConfigError::InvalidPinValue(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_codes() {
        for code in 1..=4u8 {
            let cmd = Command::try_from(code).unwrap();
            assert_eq!(cmd.code(), code);
        }
        assert_eq!(Command::try_from(0), Err(ConfigError::InvalidCommand(0)));
        assert_eq!(Command::try_from(5), Err(ConfigError::InvalidCommand(5)));
    }

    #[test]
    fn test_command_direction() {
        assert_eq!(Command::Forward.direction(), Some(Direction::Forward));
        assert_eq!(Command::Backward.direction(), Some(Direction::Backward));
        assert_eq!(Command::Brake.direction(), None);
        assert_eq!(Command::Release.direction(), None);
    }

    #[test]
    fn test_style_codes() {
        assert_eq!(StepStyle::try_from(4), Ok(StepStyle::Microstep));
        assert_eq!(StepStyle::Interleave.code(), 3);
        assert_eq!(StepStyle::try_from(9), Err(ConfigError::InvalidStepStyle(9)));
    }

    #[test]
    fn test_pin_level_values() {
        assert_eq!(PinLevel::try_from(0), Ok(PinLevel::Low));
        assert_eq!(PinLevel::try_from(1), Ok(PinLevel::High));
        assert_eq!(PinLevel::try_from(2), Err(ConfigError::InvalidPinValue(2)));
    }

    #[test]
    fn test_direction_sign() {
        assert_eq!(Direction::Forward.sign(), 1);
        assert_eq!(Direction::Backward.sign(), -1);
    }
}
