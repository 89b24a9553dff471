//! Register bus abstractions
//!
//! The PWM expander is programmed one 8-bit register at a time. Every call
//! on [`RegisterBus`] is one independent bus transaction; nothing here
//! groups transactions or retries them.

use core::fmt;

/// Errors from a single register transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BusError {
    /// Device did not acknowledge its address or a data byte
    Nack,
    /// Another master won arbitration
    ArbitrationLost,
    /// Misplaced start/stop or other bus-level fault
    Bus,
    /// Data overrun or underrun
    Overrun,
    /// Any other failure reported by the underlying peripheral
    Other,
}

impl fmt::Display for BusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            BusError::Nack => "no acknowledge from device",
            BusError::ArbitrationLost => "bus arbitration lost",
            BusError::Bus => "bus fault",
            BusError::Overrun => "data overrun",
            BusError::Other => "bus transaction failed",
        };
        f.write_str(msg)
    }
}

/// Byte-level register access on a shared bus
///
/// Opening and closing the underlying bus handle is the implementor's
/// concern: a `RegisterBus` is always ready to transact.
pub trait RegisterBus {
    /// Write `value` into `register` of the device at `address`
    ///
    /// # Arguments
    /// * `address` - 7-bit device address
    /// * `register` - Register to write
    /// * `value` - Byte to store
    fn write_byte(&mut self, address: u8, register: u8, value: u8) -> Result<(), BusError>;

    /// Read one byte from `register` of the device at `address`
    fn read_byte(&mut self, address: u8, register: u8) -> Result<u8, BusError>;

    /// Send a single byte with no register prefix
    ///
    /// Used for broadcast commands such as the general-call software reset.
    fn send_byte(&mut self, address: u8, value: u8) -> Result<(), BusError>;
}

impl<T: RegisterBus + ?Sized> RegisterBus for &mut T {
    fn write_byte(&mut self, address: u8, register: u8, value: u8) -> Result<(), BusError> {
        (**self).write_byte(address, register, value)
    }

    fn read_byte(&mut self, address: u8, register: u8) -> Result<u8, BusError> {
        (**self).read_byte(address, register)
    }

    fn send_byte(&mut self, address: u8, value: u8) -> Result<(), BusError> {
        (**self).send_byte(address, value)
    }
}
