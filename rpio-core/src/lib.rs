//! Board-agnostic virtual UART transport
//!
//! Gives upstream code a UART-style byte stream that is actually carried
//! through the I/O co-processor's register/packet protocol:
//!
//! - Bounded inbound/outbound byte queues shared with the application
//! - Bus transaction sequencer (baud negotiation, outbound drain, inbound fetch)
//! - Rate-limited poll scheduler driven by a periodic `tick`
//! - Mode selection between a real hardware UART and the virtual path
//! - Configuration types and TOML loading
//!
//! Hardware (bus, clock, delays, hardware UART) is injected through the
//! `rpio-hal` traits.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

extern crate alloc;

#[macro_use]
mod fmt;

pub mod buffer;
pub mod config;
pub mod error;
pub mod poll;
pub mod sequencer;
pub mod state;
pub mod transport;

pub use config::{ConfigError, LinkConfig, RpioConfig, TransportConfig};
pub use error::InitError;
pub use sequencer::{byte_budget, CycleReport, TickOutcome};
pub use state::{LinkStats, Mode, TransportState};
pub use transport::RpioUart;
