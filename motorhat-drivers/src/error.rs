//! Driver error types
//!
//! Bus failures are reported together with the command that was being
//! executed so the caller can match the failure to its intent.

use core::fmt;

use motorhat_core::motion::{Command, MotorIndex, StepStyle, StepperIndex};
use motorhat_core::ConfigError;
use motorhat_hal::BusError;

/// Failure of a single pin write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PinError {
    /// Pin or value rejected before any bus traffic
    Config(ConfigError),
    /// Register write failed
    Bus(BusError),
}

impl From<ConfigError> for PinError {
    fn from(e: ConfigError) -> Self {
        PinError::Config(e)
    }
}

impl From<BusError> for PinError {
    fn from(e: BusError) -> Self {
        PinError::Bus(e)
    }
}

impl fmt::Display for PinError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PinError::Config(e) => write!(f, "invalid pin write: {}", e),
            PinError::Bus(e) => write!(f, "pin write failed: {}", e),
        }
    }
}

/// What a command was addressed to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Target {
    /// Chip-wide operation (init, frequency, release all)
    Board,
    /// DC motor port
    Dc(MotorIndex),
    /// Stepper port
    Stepper(StepperIndex),
}

/// Command parameters attached to a bus failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CommandContext {
    /// Addressed motor
    pub target: Target,
    /// Motor command, if any
    pub command: Option<Command>,
    /// Requested speed as given by the caller (before clamping)
    pub speed: Option<i32>,
    /// Requested step count
    pub steps: Option<u32>,
    /// Requested stepping style
    pub style: Option<StepStyle>,
}

impl CommandContext {
    /// Chip-wide operation
    pub fn board() -> Self {
        Self {
            target: Target::Board,
            command: None,
            speed: None,
            steps: None,
            style: None,
        }
    }

    /// DC motor command
    pub fn dc(index: MotorIndex, command: Command, speed: i32) -> Self {
        Self {
            target: Target::Dc(index),
            command: Some(command),
            speed: Some(speed),
            steps: None,
            style: None,
        }
    }

    /// Stepper command
    pub fn stepper(
        index: StepperIndex,
        steps: u32,
        command: Command,
        speed: i32,
        style: StepStyle,
    ) -> Self {
        Self {
            target: Target::Stepper(index),
            command: Some(command),
            speed: Some(speed),
            steps: Some(steps),
            style: Some(style),
        }
    }
}

impl fmt::Display for CommandContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.target {
            Target::Board => f.write_str("board")?,
            Target::Dc(i) => write!(f, "dc motor {}", i.index())?,
            Target::Stepper(i) => write!(f, "stepper {}", i.index())?,
        }
        if let Some(command) = self.command {
            write!(f, " {:?}", command)?;
        }
        if let Some(speed) = self.speed {
            write!(f, " speed={}", speed)?;
        }
        if let Some(steps) = self.steps {
            write!(f, " steps={}", steps)?;
        }
        if let Some(style) = self.style {
            write!(f, " style={:?}", style)?;
        }
        Ok(())
    }
}

/// Error returned by the command surface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DriverError {
    /// Rejected before any bus traffic
    Config(ConfigError),
    /// Register access failed while executing a command
    ///
    /// Writes issued before the failure remain in effect.
    Bus {
        /// Underlying bus failure
        error: BusError,
        /// Command being executed
        context: CommandContext,
    },
}

impl DriverError {
    /// Attach command context to a bus failure
    pub fn bus(error: BusError, context: CommandContext) -> Self {
        DriverError::Bus { error, context }
    }
}

impl From<ConfigError> for DriverError {
    fn from(e: ConfigError) -> Self {
        DriverError::Config(e)
    }
}

impl fmt::Display for DriverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DriverError::Config(e) => write!(f, "configuration error: {}", e),
            DriverError::Bus { error, context } => {
                write!(f, "bus error during {}: {}", context, error)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use std::string::ToString;

    #[test]
    fn test_context_display() {
        let ctx = CommandContext::stepper(
            StepperIndex::S2,
            4,
            Command::Forward,
            30,
            StepStyle::Double,
        );
        assert_eq!(
            ctx.to_string(),
            "stepper 1 Forward speed=30 steps=4 style=Double"
        );
    }

    #[test]
    fn test_driver_error_display() {
        let err = DriverError::bus(
            BusError::Nack,
            CommandContext::dc(MotorIndex::M1, Command::Backward, 128),
        );
        assert_eq!(
            err.to_string(),
            "bus error during dc motor 0 Backward speed=128: no acknowledge from device"
        );

        let err = DriverError::from(ConfigError::MotorIndexOutOfRange(4));
        assert_eq!(
            err.to_string(),
            "configuration error: motor index 4 out of range (0-3)"
        );
    }
}
