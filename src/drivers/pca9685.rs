//! PCA9685 16-channel, 12-bit PWM controller
//!
//! All channels share one prescaler fed by the reference clock, so the PWM
//! frequency is global. Each channel has its own pair of 12-bit edge times
//! (`on`, `off`) within the 4096-step period.
//!
//! The chip only latches a new prescale value while its oscillator is
//! asleep, which is why [`Pca9685::set_frequency`] is a fixed five-step
//! sequence with a settle delay in the middle.

use embedded_hal::blocking::delay::DelayMs;
use log::{debug, trace};

use crate::config::{Config, CHANNEL_COUNT, MIN_PRESCALE, OSCILLATOR_SETTLE_MS, PWM_STEPS};
use crate::drivers::channel::{Channel, Channels};
use crate::error::Error;
use crate::hal::RegisterBus;
use crate::registers::{BitField, Struct, StructArray};

// Registers
static MODE1: Struct<u8> = Struct::new(0x00);
static MODE2: Struct<u8> = Struct::new(0x01);
static PRESCALE: Struct<u8> = Struct::new(0xFE);
/// LEDn_ON_L, LEDn_ON_H, LEDn_OFF_L, LEDn_OFF_H for n = 0..16
pub(crate) static PWM_REGS: StructArray<(u16, u16)> = StructArray::new(0x06, CHANNEL_COUNT as u8);

// MODE1 bits
const MODE1_RESTART: u8 = 0x80;
const MODE1_AI: u8 = 0x20;
const MODE1_SLEEP: u8 = 0x10;
static SLEEP: BitField = BitField::new(1, 0x00, 4);
static AUTO_INCREMENT: BitField = BitField::new(1, 0x00, 5);

// MODE2 bits
static INVRT: BitField = BitField::new(1, 0x01, 4);
static OUTDRV: BitField = BitField::new(1, 0x01, 2);

/// Prescale register value for `hz`, rounded to nearest.
///
/// `None` when the result falls outside what the one-byte register and the
/// chip accept (`3..=255`).
pub fn prescale_for(reference_clock_hz: u32, hz: f32) -> Option<u8> {
    // NaN and negative results saturate to 0, infinity to u32::MAX
    let prescale = (reference_clock_hz as f32 / PWM_STEPS / hz + 0.5) as u32;
    if prescale < MIN_PRESCALE as u32 {
        return None;
    }
    u8::try_from(prescale).ok()
}

/// PCA9685 driver
pub struct Pca9685<B, D> {
    bus: B,
    delay: D,
    address: u8,
    reference_clock_hz: u32,
}

impl<B, D> Pca9685<B, D>
where
    B: RegisterBus,
    D: DelayMs<u8>,
{
    /// Take the bus and a delay provider and reset the chip.
    ///
    /// Pass `&mut bus` to keep ownership of a shared bus.
    pub fn new(bus: B, delay: D, config: Config) -> Result<Self, Error<B::Error>> {
        if config.reference_clock_hz == 0 {
            return Err(Error::InvalidReferenceClock);
        }

        let mut pca = Self {
            bus,
            delay,
            address: config.address,
            reference_clock_hz: config.reference_clock_hz,
        };
        pca.reset()?;
        Ok(pca)
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    pub fn reference_clock_hz(&self) -> u32 {
        self.reference_clock_hz
    }

    /// Clear MODE1: oscillator on, auto-increment off, restart cleared.
    pub fn reset(&mut self) -> Result<(), Error<B::Error>> {
        debug!("pca9685@{:#04x}: reset", self.address);
        MODE1.set(&mut self.bus, self.address, 0x00)
    }

    /// Stop using the chip. Same register effect as [`reset`](Self::reset).
    pub fn deinit(&mut self) -> Result<(), Error<B::Error>> {
        self.reset()
    }

    /// Give back the bus and delay provider without touching the chip
    pub fn release(self) -> (B, D) {
        (self.bus, self.delay)
    }

    pub fn prescale(&mut self) -> Result<u8, Error<B::Error>> {
        PRESCALE.get(&mut self.bus, self.address)
    }

    /// PWM frequency in Hz derived from the PRESCALE register
    pub fn frequency(&mut self) -> Result<f32, Error<B::Error>> {
        let prescale = self.prescale()?;
        if prescale < MIN_PRESCALE {
            return Err(Error::PrescaleNotInitialized(prescale));
        }
        Ok(self.reference_clock_hz as f32 / PWM_STEPS / prescale as f32)
    }

    /// Set the PWM frequency shared by all channels.
    ///
    /// Sleeps the oscillator, writes PRESCALE, wakes it, waits for it to
    /// settle, then sets RESTART and auto-increment. The order is fixed by
    /// the chip. A failed step leaves MODE1 wherever that step left it.
    pub fn set_frequency(&mut self, hz: f32) -> Result<(), Error<B::Error>> {
        let prescale =
            prescale_for(self.reference_clock_hz, hz).ok_or(Error::FrequencyOutOfRange)?;

        let old_mode = MODE1.get(&mut self.bus, self.address)?;
        MODE1.set(
            &mut self.bus,
            self.address,
            (old_mode & !MODE1_RESTART) | MODE1_SLEEP,
        )?;
        PRESCALE.set(&mut self.bus, self.address, prescale)?;
        MODE1.set(&mut self.bus, self.address, old_mode)?;
        self.delay.delay_ms(OSCILLATOR_SETTLE_MS);
        MODE1.set(
            &mut self.bus,
            self.address,
            old_mode | MODE1_RESTART | MODE1_AI,
        )?;

        debug!(
            "pca9685@{:#04x}: prescale {} for {} Hz",
            self.address, prescale, hz
        );
        Ok(())
    }

    pub fn mode1(&mut self) -> Result<u8, Error<B::Error>> {
        MODE1.get(&mut self.bus, self.address)
    }

    pub fn mode2(&mut self) -> Result<u8, Error<B::Error>> {
        MODE2.get(&mut self.bus, self.address)
    }

    /// Raw MODE2 write. Output driver configuration is not interpreted.
    pub fn set_mode2(&mut self, value: u8) -> Result<(), Error<B::Error>> {
        MODE2.set(&mut self.bus, self.address, value)
    }

    /// MODE1 SLEEP: oscillator off, outputs frozen
    pub fn sleeping(&mut self) -> Result<bool, Error<B::Error>> {
        Ok(SLEEP.get(&mut self.bus, self.address)? != 0)
    }

    /// MODE1 AI: register pointer advances after each byte
    pub fn auto_increment(&mut self) -> Result<bool, Error<B::Error>> {
        Ok(AUTO_INCREMENT.get(&mut self.bus, self.address)? != 0)
    }

    /// MODE2 INVRT
    pub fn output_inverted(&mut self) -> Result<bool, Error<B::Error>> {
        Ok(INVRT.get(&mut self.bus, self.address)? != 0)
    }

    pub fn set_output_inverted(&mut self, inverted: bool) -> Result<(), Error<B::Error>> {
        INVRT.set(&mut self.bus, self.address, inverted as u32)
    }

    /// MODE2 OUTDRV: totem pole when set, open drain when clear
    pub fn totem_pole(&mut self) -> Result<bool, Error<B::Error>> {
        Ok(OUTDRV.get(&mut self.bus, self.address)? != 0)
    }

    pub fn set_totem_pole(&mut self, totem_pole: bool) -> Result<(), Error<B::Error>> {
        OUTDRV.set(&mut self.bus, self.address, totem_pole as u32)
    }

    /// All 16 channels
    pub fn channels(&mut self) -> Channels<'_, B, D> {
        Channels::new(self)
    }

    /// View of channel `index`
    pub fn channel(&mut self, index: usize) -> Result<Channel<'_, B, D>, Error<B::Error>> {
        Channel::new(self, index)
    }

    pub(crate) fn pwm(&mut self, index: usize) -> Result<(u16, u16), Error<B::Error>> {
        PWM_REGS.get(&mut self.bus, self.address, index)
    }

    pub(crate) fn set_pwm(&mut self, index: usize, on: u16, off: u16) -> Result<(), Error<B::Error>> {
        trace!(
            "pca9685@{:#04x}: channel {} on={:#05x} off={:#05x}",
            self.address,
            index,
            on,
            off
        );
        PWM_REGS.set(&mut self.bus, self.address, index, (on, off))
    }
}
