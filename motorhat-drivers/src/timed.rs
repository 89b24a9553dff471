//! Deferred release after a run time
//!
//! [`TimedRelease`] waits out an optional run duration and then sends the
//! actuator's release. A new command for the same actuator cancels the
//! wait through its [`CancelToken`], so a late release never overrides a
//! newer command.

use embassy_futures::select::{select, Either};
use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_time::Duration;
use embedded_hal_async::delay::DelayNs;
use motorhat_hal::BusError;

use crate::cancel::CancelToken;

/// An actuator that can be de-energized
#[allow(async_fn_in_trait)]
pub trait Release {
    /// Put the outputs into their released state
    async fn release(&mut self) -> Result<(), BusError>;
}

/// How a [`TimedRelease::hold`] ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ReleaseOutcome {
    /// No run time was given, the motor keeps running
    NotScheduled,
    /// Run time elapsed and the release was sent
    Released,
    /// Cancelled before the run time elapsed, nothing was sent
    Superseded,
}

/// Release an actuator once a run time elapses
pub struct TimedRelease<D> {
    delay: D,
    runtime: Option<Duration>,
}

impl<D: DelayNs> TimedRelease<D> {
    /// Release after `runtime`, or never when `None`
    pub fn new(delay: D, runtime: Option<Duration>) -> Self {
        Self { delay, runtime }
    }

    /// Run time in seconds
    ///
    /// Zero, negative and non-finite values mean no release is scheduled.
    /// Takes `f32` to stay on the single precision FPU of the Cortex-M
    /// targets. Use [`new`](Self::new) with a `Duration` for exact times.
    pub fn from_secs(delay: D, seconds: Option<f32>) -> Self {
        let runtime = seconds
            .filter(|s| s.is_finite() && *s > 0.0)
            .map(|s| Duration::from_micros((s * 1_000_000.0) as u64));
        Self::new(delay, runtime)
    }

    /// Configured run time
    pub fn runtime(&self) -> Option<Duration> {
        self.runtime
    }

    /// Wait out the run time, then release `actuator`
    ///
    /// Returns early with [`ReleaseOutcome::Superseded`] if `token` is
    /// cancelled first.
    pub async fn hold<A: Release, M: RawMutex>(
        &mut self,
        actuator: &mut A,
        token: &CancelToken<M>,
    ) -> Result<ReleaseOutcome, BusError> {
        let Some(runtime) = self.runtime else {
            return Ok(ReleaseOutcome::NotScheduled);
        };

        // Cancellation is polled first so it wins a tie with the timer
        match select(token.cancelled(), delay_for(&mut self.delay, runtime)).await {
            Either::First(()) => {
                debug!("timed release superseded");
                Ok(ReleaseOutcome::Superseded)
            }
            Either::Second(()) => {
                actuator.release().await?;
                Ok(ReleaseOutcome::Released)
            }
        }
    }
}

/// Wait for `duration` on a `DelayNs` provider
///
/// Long durations are split so each call fits the provider's `u32`
/// microsecond argument.
pub(crate) async fn delay_for<D: DelayNs>(delay: &mut D, duration: Duration) {
    let mut remaining = duration.as_micros();
    while remaining > 0 {
        let chunk = remaining.min(u32::MAX as u64) as u32;
        delay.delay_us(chunk).await;
        remaining -= chunk as u64;
    }
}
