//! Millisecond delays on Timer0
//!
//! Feeds the oscillator settle wait of the PCA9685 frequency sequence when
//! running on the ATmega128.

use avr_device::atmega128a::TC0;
use core::marker::PhantomData;
use embedded_hal::blocking::delay::DelayMs;

use crate::config::CPU_FREQ_HZ;

/// Timer0 clock select values. Timer0 on the ATmega128 has its own
/// prescaler table, distinct from Timer1/3.
#[derive(Clone, Copy)]
pub enum Prescaler {
    Stop = 0,
    Direct = 1,
    Div8 = 2,
    Div32 = 3,
    Div64 = 4,
    Div128 = 5,
    Div256 = 6,
    Div1024 = 7,
}

const PRESCALER_MASK: u8 = 0x07;
const TICKS_PER_MS: u8 = (CPU_FREQ_HZ / 64 / 1000) as u8;

/// Busy-wait delay provider
pub struct Delay {
    _timer: PhantomData<TC0>,
}

impl Delay {
    pub fn new() -> Self {
        unsafe {
            let p = TC0::ptr();
            // Normal mode, stopped
            (*p).tccr0.write(|w| w.bits(0));
            (*p).tcnt0.write(|w| w.bits(0));
        }
        Self { _timer: PhantomData }
    }

    fn start(&mut self, prescaler: Prescaler) {
        unsafe {
            (*TC0::ptr()).tccr0.modify(|r, w| {
                w.bits((r.bits() & !PRESCALER_MASK) | (prescaler as u8 & PRESCALER_MASK))
            });
        }
    }

    fn stop(&mut self) {
        unsafe {
            (*TC0::ptr())
                .tccr0
                .modify(|r, w| w.bits(r.bits() & !PRESCALER_MASK));
        }
    }

    fn set_counter(&mut self, value: u8) {
        unsafe {
            (*TC0::ptr()).tcnt0.write(|w| w.bits(value));
        }
    }

    fn counter(&self) -> u8 {
        unsafe { (*TC0::ptr()).tcnt0.read().bits() }
    }
}

impl DelayMs<u16> for Delay {
    fn delay_ms(&mut self, ms: u16) {
        self.set_counter(0);
        self.start(Prescaler::Div64);

        for _ in 0..ms {
            while self.counter() < TICKS_PER_MS {}
            self.set_counter(0);
        }

        self.stop();
    }
}

impl DelayMs<u8> for Delay {
    fn delay_ms(&mut self, ms: u8) {
        DelayMs::<u16>::delay_ms(self, ms as u16);
    }
}

impl Default for Delay {
    fn default() -> Self {
        Self::new()
    }
}
