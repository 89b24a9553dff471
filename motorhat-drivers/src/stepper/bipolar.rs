//! Bipolar stepper on two H-bridge ports
//!
//! The stepping state machine lives in [`motorhat_core::motion::StepperState`];
//! this driver puts each [`Phase`] it produces onto the bridge and paces the
//! steps with the delay provider.
//!
//! A phase is applied in one locked section of the shared controller: the
//! two coil duties first (PWMA, PWMB), then the four direction pins in
//! AIN2, BIN1, AIN1, BIN2 order. A bus failure part way through leaves the
//! bridge partly updated and the position already advanced.
//!
//! # Usage
//!
//! ```ignore
//! let mut stepper = StepperMotor::new(&pwm, embassy_time::Delay, 0)?;
//! stepper.set_speed(60);
//! stepper.step(200, Command::Forward, StepStyle::Double).await?;
//! ```

use core::borrow::BorrowMut;

use embassy_futures::select::{select, Either};
use embassy_sync::blocking_mutex::raw::RawMutex;
use embedded_hal_async::delay::DelayNs;

use motorhat_core::motion::{
    Command, Direction, Phase, StepStyle, StepperIndex, StepperState, StepperWiring,
};
use motorhat_core::ConfigError;
use motorhat_hal::{BusError, RegisterBus};

use crate::cancel::CancelToken;
use crate::pwm::SharedPwm;
use crate::timed::Release;

/// How a step sequence ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StepOutcome {
    /// Every requested step was issued
    Completed,
    /// A newer command cancelled the sequence
    Superseded,
}

/// Stepper motor driver
///
/// `S` holds the stepper state. It is usually owned, but a borrowed
/// `&mut StepperState` lets the position outlive the driver.
pub struct StepperMotor<'a, M: RawMutex, B, D, S = StepperState> {
    pwm: &'a SharedPwm<M, B, D>,
    delay: D,
    index: StepperIndex,
    wiring: StepperWiring,
    state: S,
}

impl<'a, M: RawMutex, B: RegisterBus, D: DelayNs> StepperMotor<'a, M, B, D, StepperState> {
    /// Create the driver for stepper port `index` (0-1) with default state
    pub fn new(pwm: &'a SharedPwm<M, B, D>, delay: D, index: u8) -> Result<Self, ConfigError> {
        let index = StepperIndex::try_from(index)?;
        Ok(Self::with_state(pwm, delay, index, StepperState::default()))
    }
}

impl<'a, M, B, D, S> StepperMotor<'a, M, B, D, S>
where
    M: RawMutex,
    B: RegisterBus,
    D: DelayNs,
    S: BorrowMut<StepperState>,
{
    /// Create the driver around existing state
    pub fn with_state(pwm: &'a SharedPwm<M, B, D>, delay: D, index: StepperIndex, state: S) -> Self {
        Self {
            pwm,
            delay,
            index,
            wiring: index.wiring(),
            state,
        }
    }

    /// Port this stepper is on
    pub fn index(&self) -> StepperIndex {
        self.index
    }

    /// Stepping state
    pub fn state(&self) -> &StepperState {
        self.state.borrow()
    }

    /// Current position (0-31)
    pub fn position(&self) -> u8 {
        self.state().position()
    }

    /// Set the speed in RPM, clamped to 1-255
    pub fn set_speed(&mut self, rpm: i32) -> u16 {
        self.state.borrow_mut().set_speed(rpm)
    }

    async fn apply(&self, phase: &Phase) -> Result<(), BusError> {
        let mut pwm = self.pwm.lock().await;
        for (channel, duty) in self.wiring.pwm_pins().into_iter().zip(phase.duty) {
            pwm.set_duty(channel, duty)?;
        }
        for (channel, level) in self.wiring.coil_pins().into_iter().zip(phase.coils) {
            pwm.set_level(channel, level)?;
        }
        Ok(())
    }

    /// Move one step unit and return the new position
    pub async fn one_step(&mut self, direction: Direction, style: StepStyle) -> Result<u8, BusError> {
        let phase = self.state.borrow_mut().advance(direction, style);
        trace!("stepper {} at {}", self.index.index(), phase.position);
        self.apply(&phase).await?;
        Ok(phase.position)
    }

    /// Sleep between steps; true if cancelled first
    async fn pause<R: RawMutex>(&mut self, us: u32, token: &CancelToken<R>) -> bool {
        matches!(
            select(token.cancelled(), self.delay.delay_us(us)).await,
            Either::First(())
        )
    }

    /// Run `steps` steps to completion
    ///
    /// Brake holds the current coils and Release de-energizes the motor;
    /// neither moves it.
    pub async fn step(&mut self, steps: u32, command: Command, style: StepStyle) -> Result<(), BusError> {
        let token = CancelToken::<M>::new();
        self.step_until_cancelled(steps, command, style, &token)
            .await
            .map(|_| ())
    }

    /// Run `steps` steps, stopping early when `token` is cancelled
    ///
    /// The token is checked before each step and raced against every
    /// pause. Microstep sequences keep stepping after the requested count
    /// until the rotor sits on a full step, unless cancelled.
    pub async fn step_until_cancelled<R: RawMutex>(
        &mut self,
        steps: u32,
        command: Command,
        style: StepStyle,
        token: &CancelToken<R>,
    ) -> Result<StepOutcome, BusError> {
        let direction = match command.direction() {
            Some(direction) => direction,
            None if command == Command::Release => {
                self.release().await?;
                return Ok(StepOutcome::Completed);
            }
            None => return Ok(StepOutcome::Completed),
        };

        let plan = self.state().plan(steps, style);
        debug!(
            "stepper {} {} x{} every {}us",
            self.index.index(),
            style,
            plan.invocations,
            plan.interval_us
        );

        for _ in 0..plan.invocations {
            if token.is_cancelled() {
                return Ok(self.superseded());
            }
            self.one_step(direction, style).await?;
            if self.pause(plan.interval_us, token).await {
                return Ok(self.superseded());
            }
        }

        if style == StepStyle::Microstep && plan.invocations > 0 {
            while !self.state().at_full_step() {
                if token.is_cancelled() {
                    return Ok(self.superseded());
                }
                self.one_step(direction, style).await?;
                if self.pause(plan.interval_us, token).await {
                    return Ok(self.superseded());
                }
            }
        }

        Ok(StepOutcome::Completed)
    }

    fn superseded(&self) -> StepOutcome {
        debug!("stepper {} superseded at {}", self.index.index(), self.position());
        StepOutcome::Superseded
    }
}

impl<M, B, D, S> Release for StepperMotor<'_, M, B, D, S>
where
    M: RawMutex,
    B: RegisterBus,
    D: DelayNs,
    S: BorrowMut<StepperState>,
{
    async fn release(&mut self) -> Result<(), BusError> {
        self.apply(&Phase::released(self.position())).await
    }
}
