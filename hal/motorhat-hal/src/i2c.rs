//! I2C register bus adapter
//!
//! Wraps any blocking [`embedded_hal::i2c::I2c`] master (Linux i2cdev,
//! embassy-rp, embassy-stm32, ...) as a [`RegisterBus`].

use embedded_hal::i2c::{Error as _, ErrorKind, I2c, NoAcknowledgeSource};
use heapless::Vec;

use crate::bus::{BusError, RegisterBus};

/// First address probed by [`I2cRegisterBus::scan`] (0x00-0x07 are reserved)
pub const SCAN_FIRST: u8 = 0x08;

/// Last address probed by [`I2cRegisterBus::scan`] (0x78-0x7F are reserved)
pub const SCAN_LAST: u8 = 0x77;

/// Number of addresses a scan can report
pub const SCAN_CAPACITY: usize = (SCAN_LAST - SCAN_FIRST + 1) as usize;

/// Addresses that acknowledged a scan probe, in ascending order
pub type ScanResult = Vec<u8, SCAN_CAPACITY>;

impl From<ErrorKind> for BusError {
    fn from(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::NoAcknowledge(_) => BusError::Nack,
            ErrorKind::ArbitrationLoss => BusError::ArbitrationLost,
            ErrorKind::Bus => BusError::Bus,
            ErrorKind::Overrun => BusError::Overrun,
            _ => BusError::Other,
        }
    }
}

/// [`RegisterBus`] over an embedded-hal I2C master
///
/// The adapter takes an already opened peripheral; [`release`](Self::release)
/// hands it back so the caller can close it.
pub struct I2cRegisterBus<I> {
    i2c: I,
}

impl<I: I2c> I2cRegisterBus<I> {
    /// Wrap an I2C master
    pub fn new(i2c: I) -> Self {
        Self { i2c }
    }

    /// Give back the wrapped I2C master
    pub fn release(self) -> I {
        self.i2c
    }

    /// Probe every non-reserved 7-bit address with a one-byte read
    ///
    /// Addresses that NACK are skipped. Any other failure aborts the scan,
    /// since it means the bus itself is unusable.
    pub fn scan(&mut self) -> Result<ScanResult, BusError> {
        let mut found = ScanResult::new();
        let mut buf = [0u8; 1];

        for address in SCAN_FIRST..=SCAN_LAST {
            match self.i2c.read(address, &mut buf) {
                Ok(()) => {
                    // Capacity covers the whole probed range
                    let _ = found.push(address);
                }
                Err(e) => match e.kind() {
                    ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address)
                    | ErrorKind::NoAcknowledge(NoAcknowledgeSource::Unknown) => {}
                    kind => return Err(kind.into()),
                },
            }
        }

        Ok(found)
    }
}

impl<I: I2c> RegisterBus for I2cRegisterBus<I> {
    fn write_byte(&mut self, address: u8, register: u8, value: u8) -> Result<(), BusError> {
        self.i2c
            .write(address, &[register, value])
            .map_err(|e| e.kind().into())
    }

    fn read_byte(&mut self, address: u8, register: u8) -> Result<u8, BusError> {
        let mut buf = [0u8; 1];
        self.i2c
            .write_read(address, &[register], &mut buf)
            .map_err(|e| BusError::from(e.kind()))?;
        Ok(buf[0])
    }

    fn send_byte(&mut self, address: u8, value: u8) -> Result<(), BusError> {
        self.i2c
            .write(address, &[value])
            .map_err(|e| e.kind().into())
    }
}
