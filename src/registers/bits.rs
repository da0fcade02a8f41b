//! Bit-field register descriptor
//!
//! A field of `bits` bits starting at `start_bit` inside a `width`-byte
//! register. Reads pull the whole register, writes are read-modify-write of
//! the whole register.
//!
//! **NOTE**: `set` does not check that the value fits the field. Extra high
//! bits are shifted into the neighbouring fields of the same register.

use crate::error::Error;
use crate::hal::RegisterBus;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitField {
    mask: u32,
    register: u8,
    start_bit: u8,
    width: u8,
    lsb_first: bool,
}

impl BitField {
    /// Field in a single-byte register
    pub const fn new(bits: u8, register: u8, start_bit: u8) -> Self {
        Self::with_width(bits, register, start_bit, 1, true)
    }

    /// Field in a register of `width` bytes (1 to 4). With `lsb_first` the
    /// byte at the lowest address is the least significant one.
    pub const fn with_width(bits: u8, register: u8, start_bit: u8, width: u8, lsb_first: bool) -> Self {
        assert!(width >= 1 && width <= 4, "register width must be 1 to 4 bytes");
        assert!(bits >= 1, "field needs at least one bit");
        assert!(
            bits as u32 + start_bit as u32 <= width as u32 * 8,
            "field does not fit the register"
        );

        let ones = if bits == 32 { u32::MAX } else { (1u32 << bits) - 1 };
        Self {
            mask: ones << start_bit,
            register,
            start_bit,
            width,
            lsb_first,
        }
    }

    pub fn register(&self) -> u8 {
        self.register
    }

    pub fn mask(&self) -> u32 {
        self.mask
    }

    pub fn get<B: RegisterBus>(&self, bus: &mut B, address: u8) -> Result<u32, Error<B::Error>> {
        let reg = self.read_raw(bus, address)?;
        Ok((reg & self.mask) >> self.start_bit)
    }

    pub fn set<B: RegisterBus>(&self, bus: &mut B, address: u8, value: u32) -> Result<(), Error<B::Error>> {
        let mut reg = self.read_raw(bus, address)?;
        reg &= !self.mask;
        reg |= value << self.start_bit;

        let mut buf = [0u8; 4];
        let bytes = &mut buf[..self.width as usize];
        disassemble(reg, self.lsb_first, bytes);
        bus.write(address, self.register, bytes).map_err(Error::Bus)
    }

    fn read_raw<B: RegisterBus>(&self, bus: &mut B, address: u8) -> Result<u32, Error<B::Error>> {
        let mut buf = [0u8; 4];
        let bytes = &mut buf[..self.width as usize];
        bus.read(address, self.register, bytes).map_err(Error::Bus)?;
        Ok(assemble(bytes, self.lsb_first))
    }
}

/// Build an integer from register bytes. With `lsb_first` the last byte is
/// shifted in first, so `bytes[0]` ends up least significant.
pub fn assemble(bytes: &[u8], lsb_first: bool) -> u32 {
    let fold = |acc: u32, b: &u8| (acc << 8) | *b as u32;
    if lsb_first {
        bytes.iter().rev().fold(0, fold)
    } else {
        bytes.iter().fold(0, fold)
    }
}

/// Inverse of [`assemble`] for `bytes.len()` bytes
pub fn disassemble(value: u32, lsb_first: bool, bytes: &mut [u8]) {
    let len = bytes.len();
    for (i, byte) in bytes.iter_mut().enumerate() {
        let shift = (if lsb_first { i } else { len - 1 - i }) * 8;
        *byte = (value >> shift) as u8;
    }
}
