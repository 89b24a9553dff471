//! PCA9685 PWM controller
//!
//! Owns the chip's register map: channel on/off ticks, the all-channel
//! aliases, and the mode/prescale sequences for init, sleep and frequency
//! changes. Every register write is its own bus transaction and nothing is
//! retried here.
//!
//! # Usage
//!
//! ```ignore
//! let mut pwm = PwmController::new(bus, embassy_time::Delay, 0x60);
//! pwm.initialize().await?;
//! pwm.set_frequency(1600.0).await?;
//! pwm.set_channel(Channel::new(8)?, 0, 2048)?;
//! ```

use embassy_sync::mutex::Mutex;
use embedded_hal_async::delay::DelayNs;

use motorhat_core::chip::regs::{self, mode1, mode2};
use motorhat_core::chip::{prescale_for, Channel, PwmChannelState, Tick};
use motorhat_core::motion::PinLevel;
use motorhat_hal::{BusError, RegisterBus};

use crate::error::PinError;

/// Oscillator settle time after leaving sleep
pub const OSCILLATOR_SETTLE_MS: u32 = 5;

/// Controller shared by every actuator on one board
pub type SharedPwm<M, B, D> = Mutex<M, PwmController<B, D>>;

/// PCA9685 at one bus address
pub struct PwmController<B, D> {
    bus: B,
    delay: D,
    address: u8,
}

impl<B: RegisterBus, D: DelayNs> PwmController<B, D> {
    /// Create a controller for the chip at `address`
    ///
    /// No bus traffic happens until [`initialize`](Self::initialize).
    pub fn new(bus: B, delay: D, address: u8) -> Self {
        Self {
            bus,
            delay,
            address,
        }
    }

    /// 7-bit chip address
    pub fn address(&self) -> u8 {
        self.address
    }

    /// Borrow the underlying bus
    pub fn bus(&self) -> &B {
        &self.bus
    }

    /// Give back the bus and delay provider
    pub fn into_parts(self) -> (B, D) {
        (self.bus, self.delay)
    }

    fn write8(&mut self, register: u8, value: u8) -> Result<(), BusError> {
        self.bus
            .write_byte(self.address, register, value)
            .inspect_err(|e| warn!("write {=u8:#x} failed: {}", register, e))
    }

    fn read8(&mut self, register: u8) -> Result<u8, BusError> {
        self.bus
            .read_byte(self.address, register)
            .inspect_err(|e| warn!("read {=u8:#x} failed: {}", register, e))
    }

    /// Bring the chip out of reset with every output off
    ///
    /// All channels off, totem-pole outputs, respond to all-call, then clear
    /// the sleep bit. Waits for the oscillator twice.
    pub async fn initialize(&mut self) -> Result<(), BusError> {
        info!("PCA9685 init at {=u8:#x}", self.address);

        self.set_all_channels(0, 0)?;
        self.write8(regs::MODE2, mode2::OUTDRV)?;
        self.write8(regs::MODE1, mode1::ALLCALL)?;
        self.delay.delay_ms(OSCILLATOR_SETTLE_MS).await;

        let mode = self.read8(regs::MODE1)? & !mode1::SLEEP;
        self.write8(regs::MODE1, mode)?;
        self.delay.delay_ms(OSCILLATOR_SETTLE_MS).await;

        Ok(())
    }

    /// Set a channel's on and off ticks
    ///
    /// Ticks clamp to 0..=4096; 4096 sets the full on/off flag. The four
    /// bytes go out as ON_L, ON_H, OFF_L, OFF_H. On error the channel is in
    /// an unknown mix of old and new values; resend all four bytes.
    pub fn set_channel(&mut self, channel: Channel, on: u16, off: u16) -> Result<(), BusError> {
        self.set_state(PwmChannelState::new(channel, Tick::new(on), Tick::new(off)))
    }

    /// Write a full channel state
    pub fn set_state(&mut self, state: PwmChannelState) -> Result<(), BusError> {
        let base = state.channel.base_register();
        for (offset, value) in (0u8..).zip(state.register_bytes()) {
            self.write8(base + offset, value)?;
        }
        Ok(())
    }

    /// Set every channel at once through the all-call registers
    pub fn set_all_channels(&mut self, on: u16, off: u16) -> Result<(), BusError> {
        let (on, off) = (Tick::new(on), Tick::new(off));
        self.write8(regs::ALL_LED_ON_L, on.low())?;
        self.write8(regs::ALL_LED_ON_H, on.high())?;
        self.write8(regs::ALL_LED_OFF_L, off.low())?;
        self.write8(regs::ALL_LED_OFF_H, off.high())
    }

    /// Drive a channel as a digital output
    pub fn set_level(&mut self, channel: Channel, level: PinLevel) -> Result<(), BusError> {
        match level {
            PinLevel::High => self.set_state(PwmChannelState::always_on(channel)),
            PinLevel::Low => self.set_state(PwmChannelState::always_off(channel)),
        }
    }

    /// Drive a raw pin number to 0 or 1
    ///
    /// Pin and value are checked before anything is written.
    pub fn set_pin(&mut self, pin: u8, value: u8) -> Result<(), PinError> {
        let channel = Channel::new(pin)?;
        let level = PinLevel::try_from(value)?;
        self.set_level(channel, level)?;
        Ok(())
    }

    /// Set an 8-bit duty (0-255), scaled onto the counter as `duty * 16`
    pub fn set_duty(&mut self, channel: Channel, duty: u8) -> Result<(), BusError> {
        self.set_state(PwmChannelState::duty(channel, Tick::new(duty as u16 * 16)))
    }

    /// Read back a channel's registers
    pub fn channel_state(&mut self, channel: Channel) -> Result<PwmChannelState, BusError> {
        let base = channel.base_register();
        let mut bytes = [0u8; 4];
        for (offset, byte) in (0u8..).zip(bytes.iter_mut()) {
            *byte = self.read8(base + offset)?;
        }
        Ok(PwmChannelState::new(
            channel,
            Tick::from_bytes(bytes[0], bytes[1]),
            Tick::from_bytes(bytes[2], bytes[3]),
        ))
    }

    /// Change the output frequency
    ///
    /// The prescaler can only be written while the oscillator sleeps, so
    /// this sleeps the chip, writes PRESCALE, restores MODE1 and restarts
    /// the outputs. Only call while no motor is mid-transition. Returns the
    /// prescale value written.
    ///
    /// Takes `f32` since the Cortex-M targets have at most a single
    /// precision FPU; the prescaler resolution is far coarser than `f32`.
    pub async fn set_frequency(&mut self, freq_hz: f32) -> Result<u8, BusError> {
        let prescale = prescale_for(freq_hz);
        info!("PWM frequency {} Hz, prescale {}", freq_hz, prescale);

        let old_mode = self.read8(regs::MODE1)?;
        let sleep_mode = (old_mode & !mode1::RESTART) | mode1::SLEEP;
        self.write8(regs::MODE1, sleep_mode)?;
        self.write8(regs::PRESCALE, prescale)?;
        self.write8(regs::MODE1, old_mode)?;
        self.delay.delay_ms(OSCILLATOR_SETTLE_MS).await;
        self.write8(regs::MODE1, old_mode | mode1::RESTART)?;

        Ok(prescale)
    }

    /// Current prescale register value
    pub fn prescale(&mut self) -> Result<u8, BusError> {
        self.read8(regs::PRESCALE)
    }

    /// Stop the oscillator; every output turns off
    pub fn sleep(&mut self) -> Result<(), BusError> {
        let mode = self.read8(regs::MODE1)?;
        self.write8(regs::MODE1, (mode & !mode1::RESTART) | mode1::SLEEP)
    }

    /// Restart the oscillator after [`sleep`](Self::sleep)
    pub async fn wake(&mut self) -> Result<(), BusError> {
        let mode = self.read8(regs::MODE1)?;
        self.write8(regs::MODE1, mode & !(mode1::SLEEP | mode1::RESTART))?;
        self.delay.delay_ms(OSCILLATOR_SETTLE_MS).await;
        if mode & mode1::RESTART != 0 {
            // Resume the PWM outputs where they left off
            self.write8(regs::MODE1, (mode & !mode1::SLEEP) | mode1::RESTART)?;
        }
        Ok(())
    }

    /// Software reset over the general-call address
    ///
    /// Resets every PCA9685 on the bus, not just this one.
    pub fn software_reset(&mut self) -> Result<(), BusError> {
        debug!("PCA9685 software reset");
        self.bus.send_byte(regs::GENERAL_CALL, regs::SWRST)
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use crate::testing::{BusEvent, MockBus, RecordingDelay};
    use embassy_futures::block_on;
    use std::vec;

    const ADDR: u8 = 0x60;

    fn controller() -> (PwmController<MockBus, RecordingDelay>, MockBus, RecordingDelay) {
        let bus = MockBus::new();
        let delay = RecordingDelay::new();
        (
            PwmController::new(bus.clone(), delay.clone(), ADDR),
            bus,
            delay,
        )
    }

    fn ch(pin: u8) -> Channel {
        Channel::new(pin).unwrap()
    }

    #[test]
    fn test_initialize_sequence() {
        let (mut pwm, bus, delay) = controller();
        // Chip powers up asleep
        bus.set_register(regs::MODE1, mode1::SLEEP | mode1::ALLCALL);
        block_on(pwm.initialize()).unwrap();

        let w = |register, value| BusEvent::Write {
            address: ADDR,
            register,
            value,
        };
        assert_eq!(
            bus.events(),
            vec![
                w(regs::ALL_LED_ON_L, 0),
                w(regs::ALL_LED_ON_H, 0),
                w(regs::ALL_LED_OFF_L, 0),
                w(regs::ALL_LED_OFF_H, 0),
                w(regs::MODE2, mode2::OUTDRV),
                w(regs::MODE1, mode1::ALLCALL),
                BusEvent::Read {
                    address: ADDR,
                    register: regs::MODE1
                },
                w(regs::MODE1, mode1::ALLCALL),
            ]
        );
        assert_eq!(delay.delays_us(), vec![5_000, 5_000]);
    }

    #[test]
    fn test_initialize_aborts_on_first_failure() {
        let (mut pwm, bus, delay) = controller();
        bus.fail_after_writes(4);

        assert_eq!(block_on(pwm.initialize()), Err(BusError::Nack));
        // The all-channel writes went out, MODE2 did not
        assert_eq!(bus.writes().len(), 4);
        assert!(delay.delays_us().is_empty());
    }

    #[test]
    fn test_set_channel_byte_order() {
        let (mut pwm, bus, _) = controller();

        pwm.set_channel(ch(1), 0x123, 0xABC).unwrap();

        assert_eq!(
            bus.writes(),
            vec![(0x0A, 0x23), (0x0B, 0x01), (0x0C, 0xBC), (0x0D, 0x0A)]
        );
    }

    #[test]
    fn test_set_channel_clamps_ticks() {
        let (mut pwm, bus, _) = controller();

        pwm.set_channel(ch(0), 9000, 4096).unwrap();

        assert_eq!(bus.channel_writes(), vec![(0, 4096, 4096)]);
    }

    #[test]
    fn test_partial_channel_write_is_reported() {
        let (mut pwm, bus, _) = controller();
        bus.fail_after_writes(2);

        assert_eq!(pwm.set_channel(ch(5), 0, 2048), Err(BusError::Nack));
        assert_eq!(bus.writes().len(), 2);
    }

    #[test]
    fn test_set_all_channels() {
        let (mut pwm, bus, _) = controller();

        pwm.set_all_channels(0, 4096).unwrap();

        assert_eq!(
            bus.writes(),
            vec![(0xFA, 0x00), (0xFB, 0x00), (0xFC, 0x00), (0xFD, 0x10)]
        );
    }

    #[test]
    fn test_set_pin_levels() {
        let (mut pwm, bus, _) = controller();

        pwm.set_pin(9, 0).unwrap();
        pwm.set_pin(10, 1).unwrap();

        assert_eq!(bus.channel_writes(), vec![(9, 0, 4096), (10, 4096, 0)]);
    }

    #[test]
    fn test_set_pin_rejects_bad_pin_before_io() {
        let (mut pwm, bus, _) = controller();

        assert_eq!(
            pwm.set_pin(16, 1),
            Err(PinError::Config(motorhat_core::ConfigError::PinOutOfRange(16)))
        );
        assert_eq!(
            pwm.set_pin(3, 2),
            Err(PinError::Config(motorhat_core::ConfigError::InvalidPinValue(2)))
        );
        assert!(bus.events().is_empty());
    }

    #[test]
    fn test_set_duty_scales_by_16() {
        let (mut pwm, bus, _) = controller();

        pwm.set_duty(ch(8), 255).unwrap();
        pwm.set_duty(ch(8), 0).unwrap();

        assert_eq!(bus.channel_writes(), vec![(8, 0, 4080), (8, 0, 0)]);
    }

    #[test]
    fn test_set_frequency_sequence() {
        let (mut pwm, bus, delay) = controller();
        bus.set_register(regs::MODE1, mode1::ALLCALL);

        let prescale = block_on(pwm.set_frequency(60.0)).unwrap();
        assert_eq!(prescale, 101);

        assert_eq!(
            bus.events(),
            vec![
                BusEvent::Read {
                    address: ADDR,
                    register: regs::MODE1
                },
                BusEvent::Write {
                    address: ADDR,
                    register: regs::MODE1,
                    value: mode1::ALLCALL | mode1::SLEEP
                },
                BusEvent::Write {
                    address: ADDR,
                    register: regs::PRESCALE,
                    value: 101
                },
                BusEvent::Write {
                    address: ADDR,
                    register: regs::MODE1,
                    value: mode1::ALLCALL
                },
                BusEvent::Write {
                    address: ADDR,
                    register: regs::MODE1,
                    value: mode1::ALLCALL | mode1::RESTART
                },
            ]
        );
        assert_eq!(delay.delays_us(), vec![5_000]);
        assert_eq!(pwm.prescale(), Ok(101));
    }

    #[test]
    fn test_set_frequency_does_not_write_restart_while_sleeping() {
        let (mut pwm, bus, _) = controller();
        bus.set_register(regs::MODE1, mode1::RESTART | mode1::ALLCALL);

        block_on(pwm.set_frequency(1600.0)).unwrap();

        assert_eq!(bus.writes()[0], (regs::MODE1, mode1::ALLCALL | mode1::SLEEP));
        assert_eq!(bus.register(regs::PRESCALE), 3);
    }

    #[test]
    fn test_sleep_and_wake() {
        let (mut pwm, bus, delay) = controller();
        bus.set_register(regs::MODE1, mode1::ALLCALL);

        pwm.sleep().unwrap();
        assert_eq!(bus.register(regs::MODE1), mode1::ALLCALL | mode1::SLEEP);

        block_on(pwm.wake()).unwrap();
        assert_eq!(bus.register(regs::MODE1), mode1::ALLCALL);
        assert_eq!(delay.delays_us(), vec![5_000]);
    }

    #[test]
    fn test_wake_restarts_outputs() {
        let (mut pwm, bus, _) = controller();
        // Chip set RESTART when it went to sleep with outputs running
        bus.set_register(regs::MODE1, mode1::RESTART | mode1::SLEEP | mode1::ALLCALL);

        block_on(pwm.wake()).unwrap();

        assert_eq!(
            bus.writes(),
            vec![
                (regs::MODE1, mode1::ALLCALL),
                (regs::MODE1, mode1::ALLCALL | mode1::RESTART)
            ]
        );
    }

    #[test]
    fn test_software_reset_uses_general_call() {
        let (mut pwm, bus, _) = controller();

        pwm.software_reset().unwrap();

        assert_eq!(
            bus.events(),
            vec![BusEvent::Send {
                address: 0x00,
                value: 0x06
            }]
        );
    }

    #[test]
    fn test_channel_state_readback() {
        let (mut pwm, _bus, _) = controller();

        pwm.set_level(ch(4), PinLevel::High).unwrap();
        let state = pwm.channel_state(ch(4)).unwrap();

        assert!(state.is_always_on());
        assert_eq!(state, PwmChannelState::always_on(ch(4)));
    }
}
