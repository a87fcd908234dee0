//! RP2040 implementations of the `rpio-hal` traits
//!
//! - [`IoSpi`]: blocking SPI master plus chip select, wired to the I/O
//!   co-processor
//! - [`EmbassyClock`]: microsecond clock backed by the embassy time driver
//! - [`PassthroughUart`]: a buffered on-chip UART for external mode

#![no_std]

pub mod clock;
pub mod spi;
pub mod uart;

pub use clock::EmbassyClock;
pub use spi::IoSpi;
pub use uart::PassthroughUart;
