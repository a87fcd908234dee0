//! On-chip UART used in external mode
//!
//! The RP2040 UARTs are set up once at boot with static ring buffers, so
//! `begin` cannot reconfigure them. The device reports ready only when it
//! is enabled and the requested baud rate matches the one it was built
//! with; otherwise the transport falls back to the co-processor path.

use embedded_io::{Read, ReadReady, Write};
use rpio_hal::HardwareUart;

/// Interrupt-driven UART with fixed buffers
pub struct PassthroughUart<S> {
    serial: S,
    baudrate: u32,
    enabled: bool,
    ready: bool,
}

impl<S> PassthroughUart<S>
where
    S: Read + ReadReady + Write,
{
    /// `serial` must already be running at `baudrate`
    ///
    /// A disabled device never reports ready.
    pub fn new(serial: S, baudrate: u32, enabled: bool) -> Self {
        Self {
            serial,
            baudrate,
            enabled,
            ready: false,
        }
    }
}

impl<S> HardwareUart for PassthroughUart<S>
where
    S: Read + ReadReady + Write,
{
    fn begin(&mut self, baudrate: u32, _rx_capacity: usize, _tx_capacity: usize) {
        self.ready = self.enabled && baudrate == self.baudrate;
    }

    fn is_ready(&self) -> bool {
        self.ready
    }

    fn read(&mut self, buf: &mut [u8]) -> usize {
        if !self.ready || buf.is_empty() {
            return 0;
        }
        match self.serial.read_ready() {
            Ok(true) => self.serial.read(buf).unwrap_or(0),
            _ => 0,
        }
    }

    // Waits for ring buffer space only when the buffer is completely full
    fn write(&mut self, data: &[u8]) -> usize {
        if !self.ready || data.is_empty() {
            return 0;
        }
        self.serial.write(data).unwrap_or(0)
    }

    fn tick(&mut self) {}
}
