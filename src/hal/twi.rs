//! TWI (I2C) master for the ATmega128
//!
//! Blocking, polled implementation of the embedded-hal I2C traits so the
//! generic [`I2cBus`](super::I2cBus) adapter can drive a PCA9685 from the AVR.

use avr_device::atmega128a::TWI;
use core::marker::PhantomData;
use embedded_hal::blocking::i2c::{Write, WriteRead};

use crate::config::CPU_FREQ_HZ;

// TWCR bits
const TWINT: u8 = 0x80;
const TWEA: u8 = 0x40;
const TWSTA: u8 = 0x20;
const TWSTO: u8 = 0x10;
const TWEN: u8 = 0x04;

/// TWI speed modes
#[derive(Clone, Copy)]
pub enum TwiSpeed {
    Standard100k,
    Fast400k,
}

impl TwiSpeed {
    fn scl_hz(self) -> u32 {
        match self {
            TwiSpeed::Standard100k => 100_000,
            TwiSpeed::Fast400k => 400_000,
        }
    }

    /// TWBR value with a prescaler of 1
    fn bit_rate(self) -> u8 {
        ((CPU_FREQ_HZ / self.scl_hz() - 16) / 2) as u8
    }
}

/// TWI status codes (TWSR with prescaler bits masked)
#[derive(Clone, Copy, PartialEq)]
#[repr(u8)]
pub enum TwiStatus {
    StartTransmitted = 0x08,
    RepStartTransmitted = 0x10,
    AddrWriteAck = 0x18,
    AddrWriteNack = 0x20,
    DataWriteAck = 0x28,
    DataWriteNack = 0x30,
    ArbitrationLost = 0x38,
    AddrReadAck = 0x40,
    AddrReadNack = 0x48,
    DataReadAck = 0x50,
    DataReadNack = 0x58,
}

/// Unexpected status after a bus step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TwiError {
    pub status: u8,
}

impl ufmt::uDebug for TwiError {
    fn fmt<W>(&self, f: &mut ufmt::Formatter<'_, W>) -> Result<(), W::Error>
    where
        W: ufmt::uWrite + ?Sized,
    {
        ufmt::uwrite!(f, "TwiError({})", self.status)
    }
}

/// TWI peripheral driver
pub struct Twi {
    _twi: PhantomData<TWI>,
}

impl Twi {
    /// Create new TWI instance at 100kHz
    pub fn new() -> Self {
        let mut twi = Self { _twi: PhantomData };
        unsafe {
            (*TWI::ptr()).twcr.write(|w| w.bits(TWEN));
        }
        twi.set_speed(TwiSpeed::Standard100k);
        twi
    }

    /// Set TWI speed
    pub fn set_speed(&mut self, speed: TwiSpeed) {
        unsafe {
            let p = TWI::ptr();
            (*p).twbr.write(|w| w.bits(speed.bit_rate()));
            (*p).twsr.write(|w| w.bits(0));
        }
    }

    fn status(&self) -> u8 {
        unsafe { (*TWI::ptr()).twsr.read().bits() & 0xF8 }
    }

    fn command(&mut self, bits: u8) {
        unsafe {
            let p = TWI::ptr();
            (*p).twcr.write(|w| w.bits(bits));
            while (*p).twcr.read().bits() & TWINT == 0 {}
        }
    }

    fn expect(&self, ok: &[TwiStatus]) -> Result<(), TwiError> {
        let status = self.status();
        if ok.iter().any(|s| *s as u8 == status) {
            Ok(())
        } else {
            Err(TwiError { status })
        }
    }

    /// Send (repeated) START
    fn start(&mut self) -> Result<(), TwiError> {
        self.command(TWINT | TWSTA | TWEN);
        self.expect(&[TwiStatus::StartTransmitted, TwiStatus::RepStartTransmitted])
    }

    fn stop(&mut self) {
        unsafe {
            let p = TWI::ptr();
            (*p).twcr.write(|w| w.bits(TWINT | TWSTO | TWEN));
            while (*p).twcr.read().bits() & TWSTO != 0 {}
        }
    }

    fn write_address(&mut self, addr: u8, read: bool) -> Result<(), TwiError> {
        self.load((addr << 1) | (read as u8));
        if read {
            self.expect(&[TwiStatus::AddrReadAck])
        } else {
            self.expect(&[TwiStatus::AddrWriteAck])
        }
    }

    fn load(&mut self, byte: u8) {
        unsafe {
            (*TWI::ptr()).twdr.write(|w| w.bits(byte));
        }
        self.command(TWINT | TWEN);
    }

    fn write_byte(&mut self, byte: u8) -> Result<(), TwiError> {
        self.load(byte);
        self.expect(&[TwiStatus::DataWriteAck])
    }

    /// Read a byte, ACKing it unless it is the last one
    fn read_byte(&mut self, ack: bool) -> Result<u8, TwiError> {
        self.command(if ack { TWINT | TWEA | TWEN } else { TWINT | TWEN });
        self.expect(&[TwiStatus::DataReadAck, TwiStatus::DataReadNack])?;
        Ok(unsafe { (*TWI::ptr()).twdr.read().bits() })
    }

    fn send(&mut self, addr: u8, bytes: &[u8]) -> Result<(), TwiError> {
        self.start()?;
        self.write_address(addr, false)?;
        for &byte in bytes {
            self.write_byte(byte)?;
        }
        Ok(())
    }

    fn receive(&mut self, addr: u8, buffer: &mut [u8]) -> Result<(), TwiError> {
        self.start()?;
        self.write_address(addr, true)?;
        let last = buffer.len().saturating_sub(1);
        for (i, byte) in buffer.iter_mut().enumerate() {
            *byte = self.read_byte(i < last)?;
        }
        Ok(())
    }
}

impl Write for Twi {
    type Error = TwiError;

    fn write(&mut self, addr: u8, bytes: &[u8]) -> Result<(), Self::Error> {
        let result = self.send(addr, bytes);
        self.stop();
        result
    }
}

impl WriteRead for Twi {
    type Error = TwiError;

    fn write_read(&mut self, addr: u8, bytes: &[u8], buffer: &mut [u8]) -> Result<(), Self::Error> {
        let result = self
            .send(addr, bytes)
            .and_then(|()| self.receive(addr, buffer));
        self.stop();
        result
    }
}

impl Default for Twi {
    fn default() -> Self {
        Self::new()
    }
}
