//! Per-channel views
//!
//! A [`Channel`] borrows the controller and addresses one element of the
//! LEDn register array. Duty cycles use a 16-bit scale; the chip resolves
//! 12 bits, so the low four bits are dropped on write and read back as 0.

use embedded_hal::blocking::delay::DelayMs;

use crate::config::CHANNEL_COUNT;
use crate::drivers::pca9685::{Pca9685, PWM_REGS};
use crate::error::Error;
use crate::hal::RegisterBus;

/// Bit 12 of an edge time: output forced fully on (in `on`) or off (in `off`)
pub const FULL: u16 = 0x1000;

/// Edge times for a 16-bit duty cycle. The rising edge is always at step 0.
pub fn encode_duty(value: u16) -> (u16, u16) {
    if value == 0xFFFF {
        (FULL, 0)
    } else if value < 0x0010 {
        (0, FULL)
    } else {
        (0, value >> 4)
    }
}

/// 16-bit duty cycle from edge times. Full-on wins over full-off.
pub fn decode_duty(on: u16, off: u16) -> u16 {
    if on == FULL {
        0xFFFF
    } else if off == FULL {
        0x0000
    } else {
        off << 4
    }
}

/// One PWM output of a [`Pca9685`]
pub struct Channel<'a, B, D> {
    pca: &'a mut Pca9685<B, D>,
    index: usize,
}

impl<'a, B, D> Channel<'a, B, D>
where
    B: RegisterBus,
    D: DelayMs<u8>,
{
    pub(crate) fn new(pca: &'a mut Pca9685<B, D>, index: usize) -> Result<Self, Error<B::Error>> {
        PWM_REGS.register_of::<B::Error>(index)?;
        Ok(Self { pca, index })
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Shared frequency of the whole chip
    pub fn frequency(&mut self) -> Result<f32, Error<B::Error>> {
        self.pca.frequency()
    }

    /// Always fails: all channels run off one prescaler. Use
    /// [`Pca9685::set_frequency`].
    pub fn set_frequency(&mut self, _hz: f32) -> Result<(), Error<B::Error>> {
        Err(Error::UnsupportedOperation)
    }

    pub fn duty_cycle(&mut self) -> Result<u16, Error<B::Error>> {
        let (on, off) = self.pca.pwm(self.index)?;
        Ok(decode_duty(on, off))
    }

    /// `0xFFFF` is always high, anything below `0x0010` always low.
    /// Values above `0xFFFF` are rejected.
    pub fn set_duty_cycle(&mut self, value: u32) -> Result<(), Error<B::Error>> {
        let value = u16::try_from(value).map_err(|_| Error::DutyCycleOutOfRange(value))?;
        let (on, off) = encode_duty(value);
        self.pca.set_pwm(self.index, on, off)
    }

    /// Raw edge times
    pub fn on_off(&mut self) -> Result<(u16, u16), Error<B::Error>> {
        self.pca.pwm(self.index)
    }

    pub fn set_on_off(&mut self, on: u16, off: u16) -> Result<(), Error<B::Error>> {
        self.pca.set_pwm(self.index, on, off)
    }
}

/// The fixed set of 16 channels
pub struct Channels<'a, B, D> {
    pca: &'a mut Pca9685<B, D>,
}

impl<'a, B, D> Channels<'a, B, D>
where
    B: RegisterBus,
    D: DelayMs<u8>,
{
    pub(crate) fn new(pca: &'a mut Pca9685<B, D>) -> Self {
        Self { pca }
    }

    pub fn len(&self) -> usize {
        CHANNEL_COUNT
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn get(&mut self, index: usize) -> Result<Channel<'_, B, D>, Error<B::Error>> {
        Channel::new(&mut *self.pca, index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::testing::{FakeDelay, FakeDevice, Op};

    fn setup() -> (Pca9685<FakeDevice, FakeDelay>, FakeDevice) {
        let dev = FakeDevice::new();
        let pca = Pca9685::new(dev.clone(), dev.delay(), Config::default()).unwrap();
        dev.clear_ops();
        (pca, dev)
    }

    #[test]
    fn encode_special_cases() {
        assert_eq!(encode_duty(0xFFFF), (0x1000, 0));
        assert_eq!(encode_duty(0x0000), (0, 0x1000));
        assert_eq!(encode_duty(0x000F), (0, 0x1000));
        assert_eq!(encode_duty(0x0010), (0, 0x0001));
        assert_eq!(encode_duty(0x7FFF), (0, 0x07FF));
        assert_eq!(encode_duty(0xFFFE), (0, 0x0FFF));
    }

    #[test]
    fn decode_special_cases() {
        assert_eq!(decode_duty(0x1000, 0), 0xFFFF);
        assert_eq!(decode_duty(0x1000, 0x1000), 0xFFFF);
        assert_eq!(decode_duty(0, 0x1000), 0x0000);
        assert_eq!(decode_duty(0, 0x07FF), 0x7FF0);
    }

    #[test]
    fn duty_round_trip_truncates_to_12_bits() {
        let (mut pca, _dev) = setup();
        let mut ch = pca.channel(5).unwrap();
        for value in (0x0010u32..=0xFFFE).step_by(7).chain([0x0010, 0xFFFE]) {
            ch.set_duty_cycle(value).unwrap();
            assert_eq!(ch.duty_cycle().unwrap() as u32, value & 0xFFF0);
        }
    }

    #[test]
    fn full_on_and_full_off_are_exact() {
        let (mut pca, _dev) = setup();
        let mut ch = pca.channel(0).unwrap();

        ch.set_duty_cycle(0xFFFF).unwrap();
        assert_eq!(ch.duty_cycle().unwrap(), 0xFFFF);

        for value in 0..=0x000F {
            ch.set_duty_cycle(value).unwrap();
            assert_eq!(ch.duty_cycle().unwrap(), 0x0000);
        }
    }

    #[test]
    fn set_duty_writes_channel_element() {
        let (mut pca, dev) = setup();
        pca.channel(3).unwrap().set_duty_cycle(0x7FFF).unwrap();
        assert_eq!(
            dev.ops(),
            vec![Op::Write {
                address: 0x40,
                register: 0x12,
                bytes: vec![0x00, 0x00, 0xFF, 0x07],
            }]
        );
    }

    #[test]
    fn duty_out_of_range_rejected() {
        let (mut pca, dev) = setup();
        let result = pca.channel(0).unwrap().set_duty_cycle(0x1_0000);
        assert_eq!(result, Err(Error::DutyCycleOutOfRange(0x1_0000)));
        assert!(dev.ops().is_empty());
    }

    #[test]
    fn channel_frequency_is_shared_and_read_only() {
        let (mut pca, dev) = setup();
        pca.set_frequency(60.0).unwrap();
        let global = pca.frequency().unwrap();
        dev.clear_ops();

        let mut ch = pca.channel(9).unwrap();
        assert_eq!(ch.frequency().unwrap(), global);
        assert_eq!(ch.set_frequency(1000.0), Err(Error::UnsupportedOperation));
        assert_eq!(dev.ops().len(), 1);
    }

    #[test]
    fn raw_edges() {
        let (mut pca, dev) = setup();
        let mut ch = pca.channel(1).unwrap();
        ch.set_on_off(0x0100, 0x0800).unwrap();
        assert_eq!(dev.peek(0x0A, 4), vec![0x00, 0x01, 0x00, 0x08]);
        assert_eq!(ch.on_off().unwrap(), (0x0100, 0x0800));
        assert_eq!(ch.duty_cycle().unwrap(), 0x8000);
    }

    #[test]
    fn collection_is_fixed_at_sixteen() {
        let (mut pca, _dev) = setup();
        let mut channels = pca.channels();
        assert_eq!(channels.len(), 16);
        for i in 0..16 {
            assert_eq!(channels.get(i).unwrap().index(), i);
        }
        assert!(matches!(
            channels.get(16),
            Err(Error::IndexOutOfRange { index: 16, len: 16 })
        ));
    }

    #[test]
    fn repeated_access_hits_same_element() {
        let (mut pca, dev) = setup();
        pca.channels().get(3).unwrap().set_duty_cycle(0x4000).unwrap();
        assert_eq!(pca.channels().get(3).unwrap().duty_cycle().unwrap(), 0x4000);

        let registers: Vec<u8> = dev
            .ops()
            .into_iter()
            .map(|op| match op {
                Op::Read { register, .. } | Op::Write { register, .. } => register,
                Op::DelayMs(_) => unreachable!(),
            })
            .collect();
        assert_eq!(registers, vec![0x12, 0x12]);
    }

    #[test]
    fn bus_error_surfaces_from_view() {
        let (mut pca, dev) = setup();
        dev.fail_after(0);
        assert!(matches!(
            pca.channel(2).unwrap().duty_cycle(),
            Err(Error::Bus(_))
        ));
    }
}
