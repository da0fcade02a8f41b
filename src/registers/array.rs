//! Repeated fixed-format registers
//!
//! Element `i` starts at `first + i * T::LEN`. This assumes one register per
//! byte; devices with 16-bit register words need a different descriptor.

use byteorder::{ByteOrder, LittleEndian};
use core::marker::PhantomData;

use crate::error::Error;
use crate::hal::{RegisterBus, MAX_REGISTER_LEN};
use crate::registers::Format;

#[derive(Debug)]
pub struct StructArray<T, O = LittleEndian> {
    first: u8,
    count: u8,
    _format: PhantomData<(T, O)>,
}

impl<T: Format, O: ByteOrder> StructArray<T, O> {
    pub const fn new(first: u8, count: u8) -> Self {
        assert!(T::LEN <= MAX_REGISTER_LEN, "format too long for one transfer");
        assert!(
            first as usize + count as usize * T::LEN <= 256,
            "array runs past the register file"
        );
        Self {
            first,
            count,
            _format: PhantomData,
        }
    }

    pub fn len(&self) -> usize {
        self.count as usize
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Register address of element `index`
    pub fn register_of<E>(&self, index: usize) -> Result<u8, Error<E>> {
        if index < self.len() {
            Ok((self.first as usize + index * T::LEN) as u8)
        } else {
            Err(Error::IndexOutOfRange {
                index,
                len: self.len(),
            })
        }
    }

    pub fn get<B: RegisterBus>(&self, bus: &mut B, address: u8, index: usize) -> Result<T, Error<B::Error>> {
        let register = self.register_of(index)?;
        let mut buf = [0u8; MAX_REGISTER_LEN];
        let bytes = &mut buf[..T::LEN];
        bus.read(address, register, bytes).map_err(Error::Bus)?;
        Ok(T::unpack::<O>(bytes))
    }

    pub fn set<B: RegisterBus>(&self, bus: &mut B, address: u8, index: usize, value: T) -> Result<(), Error<B::Error>> {
        let register = self.register_of(index)?;
        let mut buf = [0u8; MAX_REGISTER_LEN];
        let bytes = &mut buf[..T::LEN];
        value.pack::<O>(bytes);
        bus.write(address, register, bytes).map_err(Error::Bus)
    }
}
