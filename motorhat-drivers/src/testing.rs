//! Test doubles: a recording register bus and a recording delay

extern crate std;

use std::cell::RefCell;
use std::rc::Rc;
use std::vec::Vec;

use embedded_hal_async::delay::DelayNs;
use motorhat_hal::{BusError, RegisterBus};

/// One bus transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusEvent {
    Write { address: u8, register: u8, value: u8 },
    Read { address: u8, register: u8 },
    Send { address: u8, value: u8 },
}

pub struct BusLog {
    pub events: Vec<BusEvent>,
    pub registers: [u8; 256],
    /// Fail every write once this many writes have succeeded
    pub fail_after_writes: Option<usize>,
    writes: usize,
}

/// Register bus that records every transaction
#[derive(Clone, Default)]
pub struct MockBus {
    pub log: Rc<RefCell<BusLog>>,
}

impl Default for BusLog {
    fn default() -> Self {
        Self {
            events: Vec::new(),
            registers: [0; 256],
            fail_after_writes: None,
            writes: 0,
        }
    }
}

impl MockBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<BusEvent> {
        self.log.borrow().events.clone()
    }

    pub fn clear(&self) {
        self.log.borrow_mut().events.clear();
    }

    pub fn set_register(&self, register: u8, value: u8) {
        self.log.borrow_mut().registers[register as usize] = value;
    }

    pub fn register(&self, register: u8) -> u8 {
        self.log.borrow().registers[register as usize]
    }

    pub fn fail_after_writes(&self, n: usize) {
        let mut log = self.log.borrow_mut();
        log.fail_after_writes = Some(log.writes + n);
    }

    /// Register writes only, as (register, value)
    pub fn writes(&self) -> Vec<(u8, u8)> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                BusEvent::Write {
                    register, value, ..
                } => Some((register, value)),
                _ => None,
            })
            .collect()
    }

    /// Channel updates decoded from groups of 4 writes, as (channel, on, off)
    pub fn channel_writes(&self) -> Vec<(u8, u16, u16)> {
        self.writes()
            .chunks(4)
            .map(|w| {
                let channel = (w[0].0 - 0x06) / 4;
                let on = w[0].1 as u16 | (w[1].1 as u16) << 8;
                let off = w[2].1 as u16 | (w[3].1 as u16) << 8;
                (channel, on, off)
            })
            .collect()
    }
}

impl RegisterBus for MockBus {
    fn write_byte(&mut self, address: u8, register: u8, value: u8) -> Result<(), BusError> {
        let mut log = self.log.borrow_mut();
        if log.fail_after_writes.is_some_and(|n| log.writes >= n) {
            return Err(BusError::Nack);
        }
        log.writes += 1;
        log.registers[register as usize] = value;
        log.events.push(BusEvent::Write {
            address,
            register,
            value,
        });
        Ok(())
    }

    fn read_byte(&mut self, address: u8, register: u8) -> Result<u8, BusError> {
        let mut log = self.log.borrow_mut();
        log.events.push(BusEvent::Read { address, register });
        Ok(log.registers[register as usize])
    }

    fn send_byte(&mut self, address: u8, value: u8) -> Result<(), BusError> {
        self.log
            .borrow_mut()
            .events
            .push(BusEvent::Send { address, value });
        Ok(())
    }
}

/// Delay that records requested durations (in ns) and yields once
#[derive(Clone, Default)]
pub struct RecordingDelay {
    pub log: Rc<RefCell<Vec<u64>>>,
}

impl RecordingDelay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn delays_us(&self) -> Vec<u64> {
        self.log.borrow().iter().map(|ns| ns / 1_000).collect()
    }

    fn record(&self, ns: u64) {
        self.log.borrow_mut().push(ns);
    }
}

impl DelayNs for RecordingDelay {
    async fn delay_ns(&mut self, ns: u32) {
        self.record(ns as u64);
        embassy_futures::yield_now().await;
    }

    async fn delay_us(&mut self, us: u32) {
        self.record(us as u64 * 1_000);
        embassy_futures::yield_now().await;
    }

    async fn delay_ms(&mut self, ms: u32) {
        self.record(ms as u64 * 1_000_000);
        embassy_futures::yield_now().await;
    }
}
