//! Motor board command surface
//!
//! [`MotorHat`] owns the shared PWM controller and one slot per motor port.
//! A slot pairs a [`CancelToken`] with a mutex over that port's state:
//!
//! ```text
//!   run_stepper(0, ..)              in-flight step on stepper 0
//!        │                                   │
//!        ├── take ticket, cancel token ────► │ sees it at next pause
//!        ├── lock slot (waits) ◄──────────── │ returns Superseded
//!        ├── still the latest ticket?
//!        │     yes: reset token, run
//!        │     no:  return Superseded, nothing written
//! ```
//!
//! A new command for a port therefore supersedes whatever that port was
//! doing, including a pending timed release and any older command still
//! queued for the slot. Commands for different ports run side by side and
//! only meet at the PWM controller mutex.
//!
//! DC ports and the stepper spanning them are separate slots; driving both
//! at once is not prevented.

use core::cell::Cell;

use embassy_futures::join::join_array;
use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::blocking_mutex::Mutex as BlockingMutex;
use embassy_sync::mutex::{Mutex, MutexGuard};
use embassy_time::Duration;
use embedded_hal_async::delay::DelayNs;

use motorhat_core::config::HatConfig;
use motorhat_core::motion::{Command, MotorIndex, StepStyle, StepperIndex, StepperState};
use motorhat_core::ConfigError;
use motorhat_hal::{BusError, RegisterBus};

use crate::cancel::CancelToken;
use crate::error::{CommandContext, DriverError};
use crate::motor::DcMotor;
use crate::pwm::{PwmController, SharedPwm};
use crate::stepper::{StepOutcome, StepperMotor};
use crate::timed::{ReleaseOutcome, TimedRelease};

struct Slot<M: RawMutex, T> {
    cancel: CancelToken<M>,
    /// Ticket of the most recent claim
    latest: BlockingMutex<M, Cell<u32>>,
    state: Mutex<M, T>,
}

/// A held slot
struct Claim<'a, M: RawMutex, T> {
    guard: MutexGuard<'a, M, T>,
    /// A newer claim arrived while this one waited for the slot
    stale: bool,
}

impl<M: RawMutex, T> Slot<M, T> {
    const fn new(state: T) -> Self {
        Self {
            cancel: CancelToken::new(),
            latest: BlockingMutex::new(Cell::new(0)),
            state: Mutex::new(state),
        }
    }

    /// Cancel the in-flight operation and take the slot
    ///
    /// The token is only cleared by the latest claim, so a claim that was
    /// overtaken while queued cannot swallow the newer cancel request.
    async fn claim(&self) -> Claim<'_, M, T> {
        let ticket = self.latest.lock(|latest| {
            let ticket = latest.get().wrapping_add(1);
            latest.set(ticket);
            self.cancel.cancel();
            ticket
        });

        let guard = self.state.lock().await;

        let stale = self.latest.lock(|latest| {
            let stale = latest.get() != ticket;
            if !stale {
                self.cancel.reset();
            }
            stale
        });
        Claim { guard, stale }
    }
}

/// One motor add-on board
pub struct MotorHat<M: RawMutex, B, D> {
    pwm: SharedPwm<M, B, D>,
    config: HatConfig,
    delay: D,
    dc: [Slot<M, ()>; 4],
    steppers: [Slot<M, StepperState>; 2],
}

impl<M, B, D> MotorHat<M, B, D>
where
    M: RawMutex,
    B: RegisterBus,
    D: DelayNs + Clone,
{
    /// Create the board driver
    ///
    /// The configuration is validated here; no bus traffic happens until
    /// [`initialize`](Self::initialize).
    pub fn new(bus: B, delay: D, config: HatConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            pwm: Mutex::new(PwmController::new(bus, delay.clone(), config.address)),
            config,
            delay,
            dc: core::array::from_fn(|_| Slot::new(())),
            steppers: core::array::from_fn(|i| Slot::new(config.steppers[i].state())),
        })
    }

    /// Shared PWM controller
    pub fn pwm(&self) -> &SharedPwm<M, B, D> {
        &self.pwm
    }

    /// Board configuration
    pub fn config(&self) -> &HatConfig {
        &self.config
    }

    /// Initialize the chip and set the configured PWM frequency
    ///
    /// Returns the prescale value written.
    pub async fn initialize(&self) -> Result<u8, DriverError> {
        let board = |e: BusError| {
            warn!("board init failed: {}", e);
            DriverError::bus(e, CommandContext::board())
        };

        let mut pwm = self.pwm.lock().await;
        pwm.initialize().await.map_err(board)?;
        pwm.set_frequency(self.config.frequency_hz)
            .await
            .map_err(board)
    }

    /// Run a DC motor
    ///
    /// Sets the direction, then the speed (clamped to 0-255). With a
    /// `runtime` the motor is released once it elapses, unless a newer
    /// command for the same port arrives first.
    pub async fn run_dc_motor(
        &self,
        index: u8,
        command: Command,
        speed: i32,
        runtime: Option<Duration>,
    ) -> Result<ReleaseOutcome, DriverError> {
        let index = MotorIndex::try_from(index)?;
        let context = CommandContext::dc(index, command, speed);
        let fail = |e: BusError| {
            warn!("{}: {}", context, e);
            DriverError::bus(e, context)
        };

        let slot = &self.dc[index.index() as usize];
        let claim = slot.claim().await;
        if claim.stale {
            debug!("{} superseded while queued", context);
            return Ok(ReleaseOutcome::Superseded);
        }
        debug!("{}", context);

        let mut motor = DcMotor::from_index(&self.pwm, index);
        motor.run(command).await.map_err(fail)?;
        motor.set_speed(speed).await.map_err(fail)?;

        TimedRelease::new(self.delay.clone(), runtime)
            .hold(&mut motor, &slot.cancel)
            .await
            .map_err(fail)
    }

    /// Step a stepper motor
    ///
    /// `speed` is the RPM (clamped to 1-255) and persists for later
    /// commands. A newer command for the same stepper stops the sequence
    /// at its next step.
    pub async fn run_stepper(
        &self,
        index: u8,
        steps: u32,
        command: Command,
        speed: i32,
        style: StepStyle,
    ) -> Result<StepOutcome, DriverError> {
        let index = StepperIndex::try_from(index)?;
        let context = CommandContext::stepper(index, steps, command, speed, style);
        let fail = |e: BusError| {
            warn!("{}: {}", context, e);
            DriverError::bus(e, context)
        };

        let slot = &self.steppers[index.index() as usize];
        let mut claim = slot.claim().await;
        if claim.stale {
            debug!("{} superseded while queued", context);
            return Ok(StepOutcome::Superseded);
        }
        debug!("{}", context);

        let mut stepper =
            StepperMotor::with_state(&self.pwm, self.delay.clone(), index, &mut *claim.guard);
        stepper.set_speed(speed);
        stepper
            .step_until_cancelled(steps, command, style, &slot.cancel)
            .await
            .map_err(fail)
    }

    /// Stop everything and turn every output fully off
    ///
    /// Supersedes all in-flight and queued commands first. A command that
    /// arrives while this waits runs after the all-off write.
    pub async fn release_all(&self) -> Result<(), DriverError> {
        let _dc = join_array(self.dc.each_ref().map(|slot| slot.claim())).await;
        let _steppers = join_array(self.steppers.each_ref().map(|slot| slot.claim())).await;
        debug!("release all");

        self.pwm
            .lock()
            .await
            .set_all_channels(0, 4096)
            .map_err(|e| DriverError::bus(e, CommandContext::board()))
    }

    /// Position of a stepper (0-31)
    ///
    /// Waits for an in-flight command on that stepper to finish.
    pub async fn stepper_position(&self, index: u8) -> Result<u8, ConfigError> {
        let index = StepperIndex::try_from(index)?;
        Ok(self.steppers[index.index() as usize]
            .state
            .lock()
            .await
            .position())
    }
}
