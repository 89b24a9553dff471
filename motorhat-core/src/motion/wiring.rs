//! Fixed motor wiring of the add-on board
//!
//! Each H-bridge is driven by three PWM outputs: one speed (PWM) input and
//! two direction inputs. A stepper uses two adjacent H-bridges.
//!
//! | Motor | PWM | IN2 | IN1 |
//! |-------|-----|-----|-----|
//! | M1 (0) | 8  | 9   | 10  |
//! | M2 (1) | 13 | 12  | 11  |
//! | M3 (2) | 2  | 3   | 4   |
//! | M4 (3) | 7  | 6   | 5   |
//!
//! Stepper 0 spans M1/M2, stepper 1 spans M3/M4.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::chip::Channel;
use crate::error::ConfigError;

/// Pins of one H-bridge channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PinTriple {
    /// Speed input
    pub pwm: Channel,
    /// Direction input 1
    pub in1: Channel,
    /// Direction input 2
    pub in2: Channel,
}

impl PinTriple {
    const fn new(pwm: u8, in1: u8, in2: u8) -> Self {
        Self {
            pwm: Channel::from_table(pwm),
            in1: Channel::from_table(in1),
            in2: Channel::from_table(in2),
        }
    }
}

/// Pins of a two-coil stepper
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StepperWiring {
    /// Coil A bridge
    pub a: PinTriple,
    /// Coil B bridge
    pub b: PinTriple,
}

impl StepperWiring {
    /// Direction pins in coil-pattern order: AIN2, BIN1, AIN1, BIN2
    pub const fn coil_pins(&self) -> [Channel; 4] {
        [self.a.in2, self.b.in1, self.a.in1, self.b.in2]
    }

    /// Speed pins: PWMA, PWMB
    pub const fn pwm_pins(&self) -> [Channel; 2] {
        [self.a.pwm, self.b.pwm]
    }
}

const DC_WIRING: [PinTriple; 4] = [
    PinTriple::new(8, 10, 9),
    PinTriple::new(13, 11, 12),
    PinTriple::new(2, 4, 3),
    PinTriple::new(7, 5, 6),
];

const STEPPER_WIRING: [StepperWiring; 2] = [
    StepperWiring {
        a: DC_WIRING[0],
        b: DC_WIRING[1],
    },
    StepperWiring {
        a: DC_WIRING[2],
        b: DC_WIRING[3],
    },
];

/// DC motor port (M1-M4 on the board silkscreen)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum MotorIndex {
    /// M1
    M1,
    /// M2
    M2,
    /// M3
    M3,
    /// M4
    M4,
}

impl MotorIndex {
    /// All ports in index order
    pub const ALL: [MotorIndex; 4] = [
        MotorIndex::M1,
        MotorIndex::M2,
        MotorIndex::M3,
        MotorIndex::M4,
    ];

    /// Zero-based index
    pub const fn index(self) -> u8 {
        self as u8
    }

    /// Pins for this port
    pub fn wiring(self) -> PinTriple {
        DC_WIRING[self as usize]
    }
}

impl TryFrom<u8> for MotorIndex {
    type Error = ConfigError;

    fn try_from(index: u8) -> Result<Self, Self::Error> {
        match index {
            0 => Ok(MotorIndex::M1),
            1 => Ok(MotorIndex::M2),
            2 => Ok(MotorIndex::M3),
            3 => Ok(MotorIndex::M4),
            other => Err(ConfigError::MotorIndexOutOfRange(other)),
        }
    }
}

/// Stepper port (M1/M2 or M3/M4)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum StepperIndex {
    /// Ports M1 and M2
    S1,
    /// Ports M3 and M4
    S2,
}

impl StepperIndex {
    /// Zero-based index
    pub const fn index(self) -> u8 {
        self as u8
    }

    /// Pins for this port
    pub fn wiring(self) -> StepperWiring {
        STEPPER_WIRING[self as usize]
    }
}

impl TryFrom<u8> for StepperIndex {
    type Error = ConfigError;

    fn try_from(index: u8) -> Result<Self, Self::Error> {
        match index {
            0 => Ok(StepperIndex::S1),
            1 => Ok(StepperIndex::S2),
            other => Err(ConfigError::StepperIndexOutOfRange(other)),
        }
    }
}
