//! PCA9685 16-channel PWM expander
//!
//! Register map, mode bits and the on/off tick encoding of a channel.
//! The bus sequencing that uses these lives in `motorhat-drivers`.

pub mod channel;
pub mod regs;

pub use channel::{Channel, PwmChannelState, Tick, CHANNEL_COUNT};
pub use regs::{prescale_for, OSCILLATOR_HZ, PRESCALE_MAX, PRESCALE_MIN};
