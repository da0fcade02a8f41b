pub mod channel;
pub mod pca9685;

pub use channel::{decode_duty, encode_duty, Channel, Channels};
pub use pca9685::{prescale_for, Pca9685};
