//! DC motor driver
//!
//! Drives one H-bridge port of the board:
//! - Direction through the IN1/IN2 pins, used as digital outputs
//! - Speed through the PWM pin, 0-255 scaled onto the 12-bit counter
//!
//! # Usage
//!
//! ```ignore
//! let mut motor = DcMotor::new(&pwm, 0)?;
//! motor.run(Command::Forward).await?;
//! motor.set_speed(128).await?;
//! ```

use embassy_sync::blocking_mutex::raw::RawMutex;
use embedded_hal_async::delay::DelayNs;

use motorhat_core::chip::Channel;
use motorhat_core::motion::{Command, MotorIndex, PinLevel, PinTriple};
use motorhat_core::ConfigError;
use motorhat_hal::{BusError, RegisterBus};

use crate::pwm::SharedPwm;
use crate::timed::Release;

/// Highest accepted speed
pub const MAX_SPEED: u8 = 255;

/// DC motor on one board port
pub struct DcMotor<'a, M: RawMutex, B, D> {
    pwm: &'a SharedPwm<M, B, D>,
    index: MotorIndex,
    pins: PinTriple,
    /// Last applied speed
    speed: u8,
}

impl<'a, M: RawMutex, B: RegisterBus, D: DelayNs> DcMotor<'a, M, B, D> {
    /// Create the driver for motor port `index` (0-3)
    pub fn new(pwm: &'a SharedPwm<M, B, D>, index: u8) -> Result<Self, ConfigError> {
        Ok(Self::from_index(pwm, MotorIndex::try_from(index)?))
    }

    /// Create the driver for an already validated port
    pub fn from_index(pwm: &'a SharedPwm<M, B, D>, index: MotorIndex) -> Self {
        Self {
            pwm,
            index,
            pins: index.wiring(),
            speed: 0,
        }
    }

    /// Port this motor is on
    pub fn index(&self) -> MotorIndex {
        self.index
    }

    /// Pins of this port
    pub fn pins(&self) -> PinTriple {
        self.pins
    }

    /// Last speed sent to the PWM pin
    pub fn speed(&self) -> u8 {
        self.speed
    }

    async fn set_level(&self, channel: Channel, level: PinLevel) -> Result<(), BusError> {
        self.pwm.lock().await.set_level(channel, level)
    }

    /// Set the bridge direction
    ///
    /// Brake is accepted but changes no pins; the bridge keeps its current
    /// state.
    pub async fn run(&mut self, command: Command) -> Result<(), BusError> {
        debug!("dc {} run {}", self.index.index(), command);

        let PinTriple { in1, in2, .. } = self.pins;
        match command {
            Command::Forward => {
                self.set_level(in2, PinLevel::Low).await?;
                self.set_level(in1, PinLevel::High).await
            }
            Command::Backward => {
                self.set_level(in1, PinLevel::Low).await?;
                self.set_level(in2, PinLevel::High).await
            }
            Command::Release => {
                self.set_level(in1, PinLevel::Low).await?;
                self.set_level(in2, PinLevel::Low).await
            }
            Command::Brake => Ok(()),
        }
    }

    /// Set the speed (clamped to 0-255)
    ///
    /// Returns the applied speed.
    pub async fn set_speed(&mut self, speed: i32) -> Result<u8, BusError> {
        let speed = speed.clamp(0, MAX_SPEED as i32) as u8;
        self.pwm.lock().await.set_duty(self.pins.pwm, speed)?;
        self.speed = speed;
        Ok(speed)
    }
}

impl<M: RawMutex, B: RegisterBus, D: DelayNs> Release for DcMotor<'_, M, B, D> {
    async fn release(&mut self) -> Result<(), BusError> {
        self.run(Command::Release).await
    }
}
