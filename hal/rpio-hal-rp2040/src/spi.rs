//! SPI link to the I/O co-processor
//!
//! The co-processor latches a request on the falling edge of chip select
//! and answers during the same transfer, so CS frames exactly one
//! full-duplex exchange.

use embassy_rp::gpio::Output;
use embassy_rp::spi::{Blocking, Error, Instance, Spi};
use rpio_hal::SpiBus;

/// Blocking SPI master with a dedicated chip select line
pub struct IoSpi<'d, T: Instance> {
    spi: Spi<'d, T, Blocking>,
    cs: Output<'d>,
}

impl<'d, T: Instance> IoSpi<'d, T> {
    /// Wrap a configured SPI peripheral; `cs` is driven high (idle) here
    pub fn new(spi: Spi<'d, T, Blocking>, mut cs: Output<'d>) -> Self {
        cs.set_high();
        Self { spi, cs }
    }
}

impl<'d, T: Instance> SpiBus for IoSpi<'d, T> {
    type Error = Error;

    fn transfer(&mut self, read: &mut [u8], write: &[u8]) -> Result<(), Self::Error> {
        self.cs.set_low();
        let result = self.spi.blocking_transfer(read, write);
        self.cs.set_high();
        result
    }
}
