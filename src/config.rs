//! Configuration constants for the PCA9685 driver

/// CPU frequency of the ATmega128 host in Hz
pub const CPU_FREQ_HZ: u32 = 16_000_000;

/// Bus address with all hardware address pins tied low
pub const DEFAULT_ADDRESS: u8 = 0x40;

/// Internal oscillator frequency in Hz
pub const DEFAULT_REFERENCE_CLOCK_HZ: u32 = 25_000_000;

/// Number of PWM outputs on the chip
pub const CHANNEL_COUNT: usize = 16;

/// Oscillator settling time after leaving sleep, in milliseconds
pub const OSCILLATOR_SETTLE_MS: u8 = 5;

/// Smallest prescale value the chip accepts
pub const MIN_PRESCALE: u8 = 3;

/// Counter steps per PWM period
pub const PWM_STEPS: f32 = 4096.0;

/// Controller construction parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    pub address: u8,
    /// Frequency of the clock feeding the prescaler. The internal oscillator
    /// drifts with temperature and between parts; a measured value improves
    /// frequency and duty cycle accuracy.
    pub reference_clock_hz: u32,
}

impl Config {
    pub const fn new() -> Self {
        Self {
            address: DEFAULT_ADDRESS,
            reference_clock_hz: DEFAULT_REFERENCE_CLOCK_HZ,
        }
    }

    pub const fn with_address(mut self, address: u8) -> Self {
        self.address = address;
        self
    }

    pub const fn with_reference_clock(mut self, hz: u32) -> Self {
        self.reference_clock_hz = hz;
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}
