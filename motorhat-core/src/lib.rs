//! Board-agnostic core logic for the motor add-on board
//!
//! This crate contains everything that does not touch a bus:
//!
//! - PCA9685 register map and channel state encoding
//! - Fixed motor wiring tables
//! - Motor commands and stepping styles
//! - Stepper state machine (position, coil patterns, microstep curve)
//! - Configuration type definitions

#![no_std]
#![deny(unsafe_code)]

pub mod chip;
pub mod config;
pub mod error;
pub mod motion;

pub use error::ConfigError;
