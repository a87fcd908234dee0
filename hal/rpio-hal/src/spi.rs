//! SPI bus abstractions
//!
//! The co-processor protocol exchanges one fixed-size packet in each
//! direction per transaction, so the only operation the transport needs is
//! a full-duplex transfer.

/// SPI bus master
///
/// Implementations are expected to frame the transfer with chip select.
pub trait SpiBus {
    /// Error type for SPI operations
    type Error;

    /// Transfer data (simultaneous read/write)
    ///
    /// Writes data from `write` buffer while reading into `read` buffer.
    /// Both buffers must be the same length.
    fn transfer(&mut self, read: &mut [u8], write: &[u8]) -> Result<(), Self::Error>;
}

impl<T: SpiBus + ?Sized> SpiBus for &mut T {
    type Error = T::Error;

    fn transfer(&mut self, read: &mut [u8], write: &[u8]) -> Result<(), Self::Error> {
        T::transfer(self, read, write)
    }
}
