//! Hardware UART delegate
//!
//! When a board exposes a real serial device for the link, the transport
//! hands every operation to it and never touches the co-processor bus.

/// Real serial device used in external mode
///
/// All operations are non-blocking: reads return what is buffered, writes
/// accept what fits.
pub trait HardwareUart {
    /// Open the device at `baudrate` with the requested buffer sizes
    fn begin(&mut self, baudrate: u32, rx_capacity: usize, tx_capacity: usize);

    /// Whether the device came up and can carry traffic
    fn is_ready(&self) -> bool;

    /// Read buffered bytes into `buf`, returning the count
    fn read(&mut self, buf: &mut [u8]) -> usize;

    /// Queue `data` for transmission, returning the count accepted
    fn write(&mut self, data: &[u8]) -> usize;

    /// Periodic service routine, called from the poll context
    fn tick(&mut self);
}

/// Placeholder for boards without a hardware serial device
///
/// Uninhabited: a transport built with this type can only run in
/// virtual mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoHardwareUart {}

impl HardwareUart for NoHardwareUart {
    fn begin(&mut self, _baudrate: u32, _rx_capacity: usize, _tx_capacity: usize) {
        match *self {}
    }

    fn is_ready(&self) -> bool {
        match *self {}
    }

    fn read(&mut self, _buf: &mut [u8]) -> usize {
        match *self {}
    }

    fn write(&mut self, _data: &[u8]) -> usize {
        match *self {}
    }

    fn tick(&mut self) {
        match *self {}
    }
}
