//! Register descriptor layer
//!
//! Descriptors carry register metadata only. The bus and the device address
//! are passed to every access by whoever owns them.

pub mod array;
pub mod bits;
pub mod structured;

pub use array::StructArray;
pub use bits::{assemble, disassemble, BitField};
pub use structured::{Format, Struct};
