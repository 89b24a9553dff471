//! motorhat Hardware Abstraction Layer
//!
//! This crate defines the byte-oriented register bus the PWM expander
//! driver talks through. Anything that implements
//! [`embedded_hal::i2c::I2c`] can be wrapped in an [`I2cRegisterBus`];
//! tests and simulators implement [`RegisterBus`] directly.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  motorhat-drivers (PWM chip + motors)   │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  motorhat-hal (this crate - traits)     │
//! └─────────────────────────────────────────┘
//!                     │
//!         ┌───────────┴───────────┐
//!         ▼                       ▼
//! ┌───────────────┐       ┌───────────────┐
//! │ embedded-hal  │       │  mock / sim   │
//! │  I2c impls    │       │    buses      │
//! └───────────────┘       └───────────────┘
//! ```
//!
//! # Traits
//!
//! - [`bus::RegisterBus`] - register read/write on a device address

#![no_std]
#![deny(unsafe_code)]

pub mod bus;
pub mod i2c;

// Re-export key items at crate root for convenience
pub use bus::{BusError, RegisterBus};
pub use i2c::{I2cRegisterBus, ScanResult};
