//! Transport configuration
//!
//! Timing and sizing knobs for the virtual UART. Defaults match the
//! co-processor firmware's expectations; boards override them from
//! `rpio.toml`.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Default minimum interval between serviced polls (100 Hz)
pub const DEFAULT_POLL_INTERVAL_US: u32 = 10_000;

/// Buffer requests below this many bytes are replaced
pub const DEFAULT_MIN_BUFFER_SIZE: usize = 1024;

/// Size substituted for undersized buffer requests
pub const DEFAULT_BUFFER_SIZE: usize = 2048;

/// Upper bound on the poll interval: one serviced poll per second
pub const MAX_POLL_INTERVAL_US: u32 = 1_000_000;

/// Configuration errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Document is not valid TOML or has wrongly typed fields
    Parse,
    /// Poll interval outside 1..=1_000_000 µs
    InvalidPollInterval,
    /// Buffer floor is zero
    InvalidBufferFloor,
    /// Substitute buffer size is below the floor
    DefaultBelowFloor,
}

/// Timing and buffer policy of the transport
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct TransportConfig {
    /// Minimum time between serviced polls (µs)
    pub poll_interval_us: u32,
    /// Smallest buffer size honoured as requested
    pub min_buffer_size: usize,
    /// Size used instead of requests below `min_buffer_size`
    pub default_buffer_size: usize,
    /// How long `begin` waits for the baud rate to be negotiated (ms)
    pub negotiation_timeout_ms: u32,
    /// Pause after the baud rate write (µs)
    pub negotiation_settle_us: u32,
    /// Pause after each data transfer (µs)
    pub turnaround_us: u32,
    /// Reject responses whose CRC does not match
    pub verify_response_crc: bool,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl TransportConfig {
    /// Default configuration
    pub const fn new() -> Self {
        Self {
            poll_interval_us: DEFAULT_POLL_INTERVAL_US,
            min_buffer_size: DEFAULT_MIN_BUFFER_SIZE,
            default_buffer_size: DEFAULT_BUFFER_SIZE,
            negotiation_timeout_ms: 1000,
            negotiation_settle_us: 1000,
            turnaround_us: 100,
            verify_response_crc: true,
        }
    }

    /// Check the configuration for values the transport cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_interval_us == 0 || self.poll_interval_us > MAX_POLL_INTERVAL_US {
            return Err(ConfigError::InvalidPollInterval);
        }
        if self.min_buffer_size == 0 {
            return Err(ConfigError::InvalidBufferFloor);
        }
        if self.default_buffer_size < self.min_buffer_size {
            return Err(ConfigError::DefaultBelowFloor);
        }
        Ok(())
    }

    /// Apply the buffer floor to a requested capacity
    ///
    /// Requests below the floor are replaced by the default size rather
    /// than rounded up to the floor.
    pub fn clamp_capacity(&self, requested: usize) -> usize {
        if requested < self.min_buffer_size {
            self.default_buffer_size
        } else {
            requested
        }
    }
}

/// Link parameters requested by the application
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct LinkConfig {
    /// Baud rate negotiated with the co-processor
    pub baudrate: u32,
    /// Requested inbound buffer size
    pub rx_buffer: usize,
    /// Requested outbound buffer size
    pub tx_buffer: usize,
    /// Use a real hardware UART when the board has one
    pub passthrough: bool,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl LinkConfig {
    /// Default link: 57600 baud, 2 KiB each way, virtual UART
    pub const fn new() -> Self {
        Self {
            baudrate: 57_600,
            rx_buffer: DEFAULT_BUFFER_SIZE,
            tx_buffer: DEFAULT_BUFFER_SIZE,
            passthrough: false,
        }
    }
}

/// Complete configuration document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RpioConfig {
    /// `[transport]` table
    pub transport: TransportConfig,
    /// `[link]` table
    pub link: LinkConfig,
}

impl RpioConfig {
    /// Parse and validate a TOML document
    ///
    /// Missing tables and keys take their defaults.
    #[cfg(feature = "toml")]
    pub fn from_toml(document: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(document).map_err(|_| ConfigError::Parse)?;
        config.transport.validate()?;
        Ok(config)
    }
}
