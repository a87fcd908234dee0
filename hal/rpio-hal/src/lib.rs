//! RPIO Hardware Abstraction Layer
//!
//! This crate defines the hardware abstraction traits the virtual UART
//! transport consumes. Chip-specific HALs (RP2040, host simulators) implement
//! them so the transport itself stays board-agnostic.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  Application (rpio-firmware, etc.)      │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  rpio-core (virtual UART transport)     │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  rpio-hal (this crate - traits)         │
//! └─────────────────────────────────────────┘
//!                     │
//!         ┌───────────┴───────────┐
//!         ▼                       ▼
//! ┌───────────────┐       ┌───────────────┐
//! │ rpio-hal-     │       │ host / test   │
//! │    rp2040     │       │  simulators   │
//! └───────────────┘       └───────────────┘
//! ```
//!
//! # Traits
//!
//! - [`spi::SpiBus`] - Full-duplex packet exchange with the co-processor
//! - [`bus::SharedBus`] - Non-blocking ownership of a bus shared with other users
//! - [`clock::MonotonicClock`] - Microsecond/millisecond timestamps
//! - [`uart::HardwareUart`] - Real serial device used in external mode
//!
//! Blocking and async delays come from `embedded-hal` / `embedded-hal-async`.

#![no_std]
#![deny(unsafe_code)]

pub mod bus;
pub mod clock;
pub mod spi;
pub mod uart;

// Re-export key traits at crate root for convenience
pub use bus::SharedBus;
pub use clock::MonotonicClock;
pub use spi::SpiBus;
pub use uart::{HardwareUart, NoHardwareUart};
