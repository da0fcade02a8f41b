//! Driver for the PCA9685 16-channel, 12-bit PWM controller
//!
//! Layered bottom-up:
//!
//! * [`hal`]: the register bus seam and its I2C/TWI transports
//! * [`registers`]: bit-field, fixed-format and array register descriptors
//! * [`drivers`]: the PCA9685 controller and its channel views
//!
//! Everything is blocking and single-threaded. The driver does no locking;
//! share a bus between drivers by lending `&mut` to each in turn.
#![cfg_attr(not(test), no_std)]

pub mod config;
pub mod drivers;
pub mod error;
pub mod hal;
pub mod registers;

#[cfg(test)]
mod testing;

pub use config::Config;
pub use drivers::{Channel, Channels, Pca9685};
pub use error::Error;
pub use hal::{I2cBus, RegisterBus};
