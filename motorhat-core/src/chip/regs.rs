//! PCA9685 register addresses and mode bits
//!
//! These values must match the datasheet exactly.

/// Mode register 1
pub const MODE1: u8 = 0x00;
/// Mode register 2
pub const MODE2: u8 = 0x01;
/// I2C sub-address 1
pub const SUBADR1: u8 = 0x02;
/// I2C sub-address 2
pub const SUBADR2: u8 = 0x03;
/// I2C sub-address 3
pub const SUBADR3: u8 = 0x04;
/// All-call I2C address
pub const ALLCALLADR: u8 = 0x05;
/// Channel 0 on-time, low byte
pub const LED0_ON_L: u8 = 0x06;
/// Channel 0 on-time, high byte
pub const LED0_ON_H: u8 = 0x07;
/// Channel 0 off-time, low byte
pub const LED0_OFF_L: u8 = 0x08;
/// Channel 0 off-time, high byte
pub const LED0_OFF_H: u8 = 0x09;
/// All channels on-time, low byte
pub const ALL_LED_ON_L: u8 = 0xFA;
/// All channels on-time, high byte
pub const ALL_LED_ON_H: u8 = 0xFB;
/// All channels off-time, low byte
pub const ALL_LED_OFF_L: u8 = 0xFC;
/// All channels off-time, high byte
pub const ALL_LED_OFF_H: u8 = 0xFD;
/// Output frequency prescaler
pub const PRESCALE: u8 = 0xFE;

/// Register stride between consecutive channels
pub const CHANNEL_STRIDE: u8 = 4;

/// MODE1 bits
pub mod mode1 {
    /// Restart enabled
    pub const RESTART: u8 = 0x80;
    /// Low power mode, oscillator off
    pub const SLEEP: u8 = 0x10;
    /// Respond to the all-call address
    pub const ALLCALL: u8 = 0x01;
}

/// MODE2 bits
pub mod mode2 {
    /// Invert output logic
    pub const INVRT: u8 = 0x10;
    /// Totem-pole outputs (open-drain when clear)
    pub const OUTDRV: u8 = 0x04;
}

/// I2C general-call address
pub const GENERAL_CALL: u8 = 0x00;

/// Software reset byte, sent to [`GENERAL_CALL`]
pub const SWRST: u8 = 0x06;

/// Internal oscillator frequency
pub const OSCILLATOR_HZ: f32 = 25_000_000.0;

/// Counter ticks per PWM period
pub const TICKS_PER_PERIOD: f32 = 4096.0;

/// Smallest prescale the chip accepts
pub const PRESCALE_MIN: u8 = 3;

/// Largest prescale the chip accepts
pub const PRESCALE_MAX: u8 = 255;

/// First register (ON_L) of a channel's 4-byte block
///
/// `channel` is not range checked; callers pass a validated
/// [`Channel`](super::Channel).
pub const fn led_on_l(channel: u8) -> u8 {
    LED0_ON_L + CHANNEL_STRIDE * channel
}

/// Prescale value for a target output frequency
///
/// `round(25 MHz / 4096 / freq - 1)`, clamped to the chip's range.
/// Non-finite or non-positive frequencies give the slowest setting.
/// Computed in `f32`, which the single precision FPU of the Cortex-M
/// targets handles in hardware.
pub fn prescale_for(freq_hz: f32) -> u8 {
    if !freq_hz.is_finite() || freq_hz <= 0.0 {
        return PRESCALE_MAX;
    }

    let prescaleval = OSCILLATOR_HZ / TICKS_PER_PERIOD / freq_hz - 1.0;
    // floor(x + 0.5); the cast saturates negatives to 0 before the clamp
    let prescale = (prescaleval + 0.5) as u32;
    prescale.clamp(PRESCALE_MIN as u32, PRESCALE_MAX as u32) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_register_layout() {
        assert_eq!(led_on_l(0), LED0_ON_L);
        assert_eq!(led_on_l(1), 0x0A);
        assert_eq!(led_on_l(15), 0x42);
        assert_eq!(ALL_LED_OFF_H, ALL_LED_ON_L + 3);
    }

    #[test]
    fn test_prescale_60hz() {
        // 25e6 / 4096 / 60 - 1 = 100.77
        assert_eq!(prescale_for(60.0), 101);
    }

    #[test]
    fn test_prescale_1600hz() {
        // 25e6 / 4096 / 1600 - 1 = 2.81 -> 3
        assert_eq!(prescale_for(1600.0), 3);
    }

    #[test]
    fn test_prescale_clamps_high_frequency() {
        assert_eq!(prescale_for(10_000.0), PRESCALE_MIN);
        assert_eq!(prescale_for(1_000_000.0), PRESCALE_MIN);
    }

    #[test]
    fn test_prescale_clamps_low_frequency() {
        assert_eq!(prescale_for(1.0), PRESCALE_MAX);
        assert_eq!(prescale_for(0.0), PRESCALE_MAX);
        assert_eq!(prescale_for(-50.0), PRESCALE_MAX);
        assert_eq!(prescale_for(f32::NAN), PRESCALE_MAX);
    }
}
