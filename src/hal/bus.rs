//! Register-oriented bus transport
//!
//! Devices on the bus expose a flat, byte-addressed register file. Every
//! access names the device address, the first register and a byte count.

use embedded_hal::blocking::i2c::{Write, WriteRead};

/// Longest payload a single register write may carry
pub const MAX_REGISTER_LEN: usize = 16;

/// Byte-addressed register access on a shared bus
pub trait RegisterBus {
    type Error;

    /// Fill `buffer` from consecutive registers starting at `register`.
    fn read(&mut self, address: u8, register: u8, buffer: &mut [u8]) -> Result<(), Self::Error>;

    /// Write `bytes` to consecutive registers starting at `register`.
    fn write(&mut self, address: u8, register: u8, bytes: &[u8]) -> Result<(), Self::Error>;
}

impl<T: RegisterBus + ?Sized> RegisterBus for &mut T {
    type Error = T::Error;

    fn read(&mut self, address: u8, register: u8, buffer: &mut [u8]) -> Result<(), Self::Error> {
        (**self).read(address, register, buffer)
    }

    fn write(&mut self, address: u8, register: u8, bytes: &[u8]) -> Result<(), Self::Error> {
        (**self).write(address, register, bytes)
    }
}

/// I2C adapter errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum I2cError<E> {
    I2c(E),
    /// Payload longer than [`MAX_REGISTER_LEN`]
    Overflow,
}

/// [`RegisterBus`] over a blocking embedded-hal I2C peripheral
pub struct I2cBus<I2C> {
    i2c: I2C,
}

impl<I2C> I2cBus<I2C> {
    pub fn new(i2c: I2C) -> Self {
        Self { i2c }
    }

    /// Give back the wrapped peripheral
    pub fn release(self) -> I2C {
        self.i2c
    }
}

impl<I2C, E> RegisterBus for I2cBus<I2C>
where
    I2C: Write<Error = E> + WriteRead<Error = E>,
{
    type Error = I2cError<E>;

    fn read(&mut self, address: u8, register: u8, buffer: &mut [u8]) -> Result<(), Self::Error> {
        self.i2c
            .write_read(address, &[register], buffer)
            .map_err(I2cError::I2c)
    }

    fn write(&mut self, address: u8, register: u8, bytes: &[u8]) -> Result<(), Self::Error> {
        if bytes.len() > MAX_REGISTER_LEN {
            return Err(I2cError::Overflow);
        }

        // Register pointer goes out first, in the same transfer
        let mut frame = [0u8; MAX_REGISTER_LEN + 1];
        frame[0] = register;
        frame[1..=bytes.len()].copy_from_slice(bytes);

        self.i2c
            .write(address, &frame[..=bytes.len()])
            .map_err(I2cError::I2c)
    }
}
