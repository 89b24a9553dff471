//! Per-actuator cancellation token
//!
//! A new command for a motor signals the token; the operation in flight
//! on that motor sees it at its next suspension point and returns early.

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::signal::Signal;

/// Request to abandon the in-flight operation of one actuator
pub struct CancelToken<M: RawMutex> {
    signal: Signal<M, ()>,
}

impl<M: RawMutex> CancelToken<M> {
    /// New, not cancelled
    pub const fn new() -> Self {
        Self {
            signal: Signal::new(),
        }
    }

    /// Ask the in-flight operation to stop
    pub fn cancel(&self) {
        self.signal.signal(());
    }

    /// Clear a pending request before starting a new operation
    pub fn reset(&self) {
        self.signal.reset();
    }

    /// Whether a request is pending
    pub fn is_cancelled(&self) -> bool {
        self.signal.signaled()
    }

    /// Wait until a request arrives
    ///
    /// Leaves the request pending so later checks still see it.
    pub async fn cancelled(&self) {
        self.signal.wait().await;
        self.signal.signal(());
    }
}

impl<M: RawMutex> Default for CancelToken<M> {
    fn default() -> Self {
        Self::new()
    }
}
