//! PWM channel state
//!
//! Each of the 16 outputs is programmed with an on-tick and an off-tick
//! inside a 4096-tick period. Writing 4096 into either one sets the
//! channel's full-on or full-off bit instead, bypassing the counter.

use crate::chip::regs;
use crate::error::ConfigError;

/// Number of PWM outputs on the chip
pub const CHANNEL_COUNT: u8 = 16;

/// Validated channel number (0-15)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Channel(u8);

impl Channel {
    /// Validate a raw pin number
    pub const fn new(pin: u8) -> Result<Self, ConfigError> {
        if pin < CHANNEL_COUNT {
            Ok(Self(pin))
        } else {
            Err(ConfigError::PinOutOfRange(pin))
        }
    }

    /// Build a channel from a wiring table entry
    ///
    /// Only used in const tables, so a bad entry fails the build.
    pub(crate) const fn from_table(pin: u8) -> Self {
        assert!(pin < CHANNEL_COUNT, "wiring table pin out of range");
        Self(pin)
    }

    /// Raw channel number
    pub const fn index(self) -> u8 {
        self.0
    }

    /// Address of this channel's ON_L register
    pub const fn base_register(self) -> u8 {
        regs::led_on_l(self.0)
    }
}

impl TryFrom<u8> for Channel {
    type Error = ConfigError;

    fn try_from(pin: u8) -> Result<Self, Self::Error> {
        Self::new(pin)
    }
}

/// Counter tick within a PWM period
///
/// Normal ticks are 0-4095. [`Tick::FULL`] (4096) is the full-on/full-off
/// override. Larger inputs clamp to [`Tick::FULL`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Tick(u16);

impl Tick {
    /// Start of the period
    pub const ZERO: Self = Self(0);

    /// Last tick the 12-bit counter reaches
    pub const MAX_COUNTER: Self = Self(4095);

    /// Full-duty override sentinel
    pub const FULL: Self = Self(4096);

    /// Clamp a raw value into 0..=4096
    pub const fn new(value: u16) -> Self {
        if value > Self::FULL.0 {
            Self::FULL
        } else {
            Self(value)
        }
    }

    /// Raw tick value
    pub const fn value(self) -> u16 {
        self.0
    }

    /// Whether this is the full-duty override
    pub const fn is_full(self) -> bool {
        self.0 == Self::FULL.0
    }

    /// Low register byte
    pub const fn low(self) -> u8 {
        (self.0 & 0xFF) as u8
    }

    /// High register byte (bit 4 is the full on/off flag)
    pub const fn high(self) -> u8 {
        (self.0 >> 8) as u8
    }

    /// Rebuild a tick from its two register bytes
    pub const fn from_bytes(low: u8, high: u8) -> Self {
        Self::new(((high as u16 & 0x1F) << 8) | low as u16)
    }
}

impl From<u16> for Tick {
    fn from(value: u16) -> Self {
        Self::new(value)
    }
}

/// On/off timing of one channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PwmChannelState {
    /// Output channel
    pub channel: Channel,
    /// Tick at which the output goes high
    pub on: Tick,
    /// Tick at which the output goes low
    pub off: Tick,
}

impl PwmChannelState {
    /// Arbitrary on/off ticks
    pub const fn new(channel: Channel, on: Tick, off: Tick) -> Self {
        Self { channel, on, off }
    }

    /// Permanently high (logical 1)
    pub const fn always_on(channel: Channel) -> Self {
        Self::new(channel, Tick::FULL, Tick::ZERO)
    }

    /// Permanently low (logical 0)
    pub const fn always_off(channel: Channel) -> Self {
        Self::new(channel, Tick::ZERO, Tick::FULL)
    }

    /// High from tick 0 until `off`
    pub const fn duty(channel: Channel, off: Tick) -> Self {
        Self::new(channel, Tick::ZERO, off)
    }

    /// Register values in write order: ON_L, ON_H, OFF_L, OFF_H
    pub const fn register_bytes(&self) -> [u8; 4] {
        [self.on.low(), self.on.high(), self.off.low(), self.off.high()]
    }

    /// Output is held high regardless of the counter
    ///
    /// The chip gives full-off priority when both flags are set.
    pub const fn is_always_on(&self) -> bool {
        self.on.is_full() && !self.off.is_full()
    }

    /// Output is held low regardless of the counter
    pub const fn is_always_off(&self) -> bool {
        self.off.is_full()
    }
}
