//! Driver error type

use ufmt::{uDebug, uWrite, uwrite, Formatter};

/// Errors returned by register descriptors and the PCA9685 driver.
///
/// `E` is the error type of the underlying [`RegisterBus`](crate::hal::RegisterBus).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E> {
    /// Transport failure, passed through untouched
    Bus(E),
    /// Duty cycle outside `0..=0xFFFF`
    DutyCycleOutOfRange(u32),
    /// Index past the end of a register array or the channel list
    IndexOutOfRange { index: usize, len: usize },
    /// Requested frequency needs a prescale outside `3..=255`
    FrequencyOutOfRange,
    /// PRESCALE register read back below 3
    PrescaleNotInitialized(u8),
    /// Reference clock of 0 Hz
    InvalidReferenceClock,
    /// Operation the hardware cannot do, such as a per-channel frequency
    UnsupportedOperation,
}

impl<E> Error<E> {
    /// True for every "value outside a documented bound" kind.
    pub fn is_range_error(&self) -> bool {
        matches!(
            self,
            Error::DutyCycleOutOfRange(_)
                | Error::IndexOutOfRange { .. }
                | Error::FrequencyOutOfRange
                | Error::PrescaleNotInitialized(_)
                | Error::InvalidReferenceClock
        )
    }
}

impl<E: uDebug> uDebug for Error<E> {
    fn fmt<W>(&self, f: &mut Formatter<'_, W>) -> Result<(), W::Error>
    where
        W: uWrite + ?Sized,
    {
        match self {
            Error::Bus(e) => uwrite!(f, "Bus({:?})", e),
            Error::DutyCycleOutOfRange(v) => uwrite!(f, "DutyCycleOutOfRange({})", *v),
            Error::IndexOutOfRange { index, len } => {
                uwrite!(f, "IndexOutOfRange({}, {})", *index, *len)
            }
            Error::FrequencyOutOfRange => f.write_str("FrequencyOutOfRange"),
            Error::PrescaleNotInitialized(p) => uwrite!(f, "PrescaleNotInitialized({})", *p),
            Error::InvalidReferenceClock => f.write_str("InvalidReferenceClock"),
            Error::UnsupportedOperation => f.write_str("UnsupportedOperation"),
        }
    }
}
