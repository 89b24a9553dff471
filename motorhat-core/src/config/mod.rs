//! Configuration types
//!
//! Board configuration for one motor add-on board. With the `serde`
//! feature the types deserialize from any serde format; missing keys fall
//! back to the board defaults, including stepper ports left out of the
//! `steppers` list.
//!
//! ```toml
//! address = 0x60
//! frequency_hz = 1600.0
//!
//! [[steppers]]
//! steps_per_revolution = 200
//! rpm = 30
//! ```

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::motion::stepping::{DEFAULT_RPM, DEFAULT_STEPS_PER_REVOLUTION};
use crate::motion::StepperState;

/// Factory I2C address of the board
pub const DEFAULT_ADDRESS: u8 = 0x60;

/// Default PWM output frequency
pub const DEFAULT_FREQUENCY_HZ: f32 = 1600.0;

/// Stepper ports on one board
pub const STEPPER_PORTS: usize = 2;

/// Per-port stepper configuration
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct StepperConfig {
    /// Full steps per motor revolution (200 for 1.8 degree motors)
    pub steps_per_revolution: u16,
    /// Initial speed in RPM
    pub rpm: u16,
    /// Drop both coil duties to zero on backward microsteps
    pub coast_on_reverse_microstep: bool,
}

impl Default for StepperConfig {
    fn default() -> Self {
        Self {
            steps_per_revolution: DEFAULT_STEPS_PER_REVOLUTION,
            rpm: DEFAULT_RPM,
            coast_on_reverse_microstep: false,
        }
    }
}

impl StepperConfig {
    /// Fresh stepper state for this configuration
    pub fn state(&self) -> StepperState {
        let mut state = StepperState::new(self.steps_per_revolution);
        state.set_speed(self.rpm as i32);
        state.set_coast_on_reverse_microstep(self.coast_on_reverse_microstep);
        state
    }
}

/// Board configuration
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct HatConfig {
    /// 7-bit I2C address of the PWM chip
    pub address: u8,
    /// PWM output frequency in Hz
    pub frequency_hz: f32,
    /// Stepper ports, index 0 = M1/M2, index 1 = M3/M4
    #[cfg_attr(feature = "serde", serde(deserialize_with = "deserialize_ports"))]
    pub steppers: [StepperConfig; STEPPER_PORTS],
}

impl Default for HatConfig {
    fn default() -> Self {
        Self {
            address: DEFAULT_ADDRESS,
            frequency_hz: DEFAULT_FREQUENCY_HZ,
            steppers: [StepperConfig::default(); STEPPER_PORTS],
        }
    }
}

/// Up to [`STEPPER_PORTS`] entries, trailing ports take the defaults
#[cfg(feature = "serde")]
fn deserialize_ports<'de, D>(deserializer: D) -> Result<[StepperConfig; STEPPER_PORTS], D::Error>
where
    D: serde::Deserializer<'de>,
{
    let listed = heapless::Vec::<StepperConfig, STEPPER_PORTS>::deserialize(deserializer)?;
    let mut ports = [StepperConfig::default(); STEPPER_PORTS];
    for (port, config) in ports.iter_mut().zip(listed) {
        *port = config;
    }
    Ok(ports)
}

impl HatConfig {
    /// Configuration for a board at a non-default address
    pub fn with_address(address: u8) -> Self {
        Self {
            address,
            ..Self::default()
        }
    }

    /// Check the configuration before it is used
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.address > 0x7F {
            return Err(ConfigError::InvalidAddress(self.address));
        }
        if self.steppers.iter().any(|s| s.steps_per_revolution == 0) {
            return Err(ConfigError::ZeroStepsPerRevolution);
        }
        Ok(())
    }
}
