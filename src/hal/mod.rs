pub mod bus;
#[cfg(feature = "atmega128")]
pub mod timer;
#[cfg(feature = "atmega128")]
pub mod twi;

// Re-export commonly used types
pub use bus::{I2cBus, I2cError, RegisterBus, MAX_REGISTER_LEN};
#[cfg(feature = "atmega128")]
pub use timer::Delay;
#[cfg(feature = "atmega128")]
pub use twi::{Twi, TwiError, TwiSpeed};
