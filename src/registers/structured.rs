//! Fixed-format register descriptors
//!
//! A [`Format`] is a scalar or a tuple of integer fields with a fixed byte
//! length. [`Struct`] moves one such value to or from a register address in
//! a single bus transfer; partial updates are not possible.

use byteorder::{ByteOrder, LittleEndian};
use core::marker::PhantomData;

use crate::error::Error;
use crate::hal::{RegisterBus, MAX_REGISTER_LEN};

/// Binary layout of a register value
pub trait Format: Copy {
    /// Packed size in bytes
    const LEN: usize;

    /// Decode from exactly `LEN` bytes
    fn unpack<O: ByteOrder>(buf: &[u8]) -> Self;

    /// Encode into exactly `LEN` bytes
    fn pack<O: ByteOrder>(self, buf: &mut [u8]);
}

impl Format for u8 {
    const LEN: usize = 1;

    fn unpack<O: ByteOrder>(buf: &[u8]) -> Self {
        buf[0]
    }

    fn pack<O: ByteOrder>(self, buf: &mut [u8]) {
        buf[0] = self;
    }
}

impl Format for i8 {
    const LEN: usize = 1;

    fn unpack<O: ByteOrder>(buf: &[u8]) -> Self {
        buf[0] as i8
    }

    fn pack<O: ByteOrder>(self, buf: &mut [u8]) {
        buf[0] = self as u8;
    }
}

macro_rules! impl_format {
    ($T:ty, $LEN:expr, $READ_FN:ident, $WRITE_FN:ident) => {
        impl Format for $T {
            const LEN: usize = $LEN;

            fn unpack<O: ByteOrder>(buf: &[u8]) -> Self {
                O::$READ_FN(buf)
            }

            fn pack<O: ByteOrder>(self, buf: &mut [u8]) {
                O::$WRITE_FN(buf, self)
            }
        }
    };
}

impl_format!(u16, 2, read_u16, write_u16);
impl_format!(i16, 2, read_i16, write_i16);
impl_format!(u32, 4, read_u32, write_u32);
impl_format!(i32, 4, read_i32, write_i32);

macro_rules! impl_tuple {
    ($($T:ident $v:ident),+) => {
        impl<$($T: Format),+> Format for ($($T,)+) {
            const LEN: usize = 0 $(+ $T::LEN)+;

            fn unpack<O: ByteOrder>(buf: &[u8]) -> Self {
                let mut at = 0;
                $(
                    let $v = $T::unpack::<O>(&buf[at..at + $T::LEN]);
                    at += $T::LEN;
                )+
                debug_assert_eq!(at, Self::LEN);
                ($($v,)+)
            }

            fn pack<O: ByteOrder>(self, buf: &mut [u8]) {
                let ($($v,)+) = self;
                let mut at = 0;
                $(
                    $v.pack::<O>(&mut buf[at..at + $T::LEN]);
                    at += $T::LEN;
                )+
                debug_assert_eq!(at, Self::LEN);
            }
        }
    };
}

impl_tuple!(A a, B b);
impl_tuple!(A a, B b, C c);
impl_tuple!(A a, B b, C c, D d);

/// One fixed-format value at a register address
#[derive(Debug)]
pub struct Struct<T, O = LittleEndian> {
    register: u8,
    _format: PhantomData<(T, O)>,
}

impl<T: Format, O: ByteOrder> Struct<T, O> {
    pub const fn new(register: u8) -> Self {
        assert!(T::LEN <= MAX_REGISTER_LEN, "format too long for one transfer");
        Self {
            register,
            _format: PhantomData,
        }
    }

    pub fn register(&self) -> u8 {
        self.register
    }

    /// Bytes moved by every access
    pub fn len(&self) -> usize {
        T::LEN
    }

    pub fn get<B: RegisterBus>(&self, bus: &mut B, address: u8) -> Result<T, Error<B::Error>> {
        let mut buf = [0u8; MAX_REGISTER_LEN];
        let bytes = &mut buf[..T::LEN];
        bus.read(address, self.register, bytes).map_err(Error::Bus)?;
        Ok(T::unpack::<O>(bytes))
    }

    pub fn set<B: RegisterBus>(&self, bus: &mut B, address: u8, value: T) -> Result<(), Error<B::Error>> {
        let mut buf = [0u8; MAX_REGISTER_LEN];
        let bytes = &mut buf[..T::LEN];
        value.pack::<O>(bytes);
        bus.write(address, self.register, bytes).map_err(Error::Bus)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeDevice, Op};
    use byteorder::BigEndian;

    #[test]
    fn lengths_follow_format() {
        assert_eq!(Struct::<u8>::new(0).len(), 1);
        assert_eq!(Struct::<(u16, u16)>::new(0).len(), 4);
        assert_eq!(Struct::<(u8, i16, u32)>::new(0).len(), 7);
        assert_eq!(Struct::<(i8, i8, i8, i8)>::new(0).len(), 4);
    }

    #[test]
    fn scalar_get_and_set() {
        let mut dev = FakeDevice::new();
        dev.poke(0xFE, &[0x79]);

        let prescale = Struct::<u8>::new(0xFE);
        assert_eq!(prescale.get(&mut dev, 0x40).unwrap(), 0x79);

        prescale.set(&mut dev, 0x40, 0x1E).unwrap();
        assert_eq!(dev.peek(0xFE, 1), vec![0x1E]);
        assert_eq!(
            dev.ops(),
            vec![
                Op::Read { address: 0x40, register: 0xFE, len: 1 },
                Op::Write { address: 0x40, register: 0xFE, bytes: vec![0x1E] },
            ]
        );
    }

    #[test]
    fn tuple_is_little_endian_by_default() {
        let mut dev = FakeDevice::new();
        let pair = Struct::<(u16, u16)>::new(0x06);

        pair.set(&mut dev, 0x40, (0x1000, 0x0ABC)).unwrap();
        assert_eq!(dev.peek(0x06, 4), vec![0x00, 0x10, 0xBC, 0x0A]);
        assert_eq!(pair.get(&mut dev, 0x40).unwrap(), (0x1000, 0x0ABC));
    }

    #[test]
    fn big_endian_and_signed_fields() {
        let mut dev = FakeDevice::new();
        let reg = Struct::<(i16, u8), BigEndian>::new(0x20);

        reg.set(&mut dev, 0x40, (-2, 7)).unwrap();
        assert_eq!(dev.peek(0x20, 3), vec![0xFF, 0xFE, 0x07]);
        assert_eq!(reg.get(&mut dev, 0x40).unwrap(), (-2, 7));
    }

    #[test]
    fn whole_range_rewritten() {
        let mut dev = FakeDevice::new();
        dev.poke(0x30, &[0xAA, 0xAA, 0xAA, 0xAA]);
        Struct::<u32>::new(0x30).set(&mut dev, 0x40, 1).unwrap();
        assert_eq!(dev.peek(0x30, 4), vec![1, 0, 0, 0]);
    }

    #[test]
    fn bus_error_passes_through() {
        let mut dev = FakeDevice::new();
        dev.fail_after(0);
        assert!(matches!(
            Struct::<u8>::new(0x00).get(&mut dev, 0x40),
            Err(Error::Bus(_))
        ));
    }
}
