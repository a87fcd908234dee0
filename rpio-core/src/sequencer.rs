//! Bus transaction sequencer
//!
//! One poll cycle holds the bus for its whole length and runs, in order:
//!
//! 1. Baud rate write, while a negotiation is pending
//! 2. Outbound drain: a `BulkUart` packet carrying queued bytes
//! 3. Inbound fetch: a `Read` whose response carries received bytes
//!
//! If the bus is taken by another user the cycle is abandoned before
//! anything changes, so the co-processor never sees half a sequence.

use embassy_sync::blocking_mutex::raw::RawMutex;
use embedded_hal::delay::DelayNs;

use rpio_hal::{HardwareUart, MonotonicClock, SharedBus, SpiBus};
use rpio_protocol::{
    baudrate_regs, IoPacket, Request, Response, PACKET_PAYLOAD_BYTES, PACKET_SIZE,
    PAGE_UART_BUFFER,
};

use crate::transport::RpioUart;

/// Bytes per packet the co-processor UART can absorb in one poll interval
///
/// One byte on the wire takes ten bit times (8N1), so `baudrate / 10`
/// bytes per second, split across the polls made each second.
pub fn byte_budget(baudrate: u32, poll_interval_us: u32) -> usize {
    let bytes_per_second = baudrate / 10;
    let polls_per_second = (1_000_000 / poll_interval_us.max(1)).max(1);
    (bytes_per_second / polls_per_second) as usize
}

/// What a serviced poll cycle moved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CycleReport {
    /// A pending negotiation was completed
    pub negotiated: bool,
    /// Bytes drained from the outbound buffer
    pub sent: usize,
    /// Bytes appended to the inbound buffer
    pub received: usize,
}

/// Result of a call to `tick`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TickOutcome {
    /// Another tick is still running
    InProgress,
    /// External mode: the hardware UART was serviced
    Forwarded,
    /// Nothing to do: not configured, or no negotiation and no link
    Idle,
    /// The minimum poll interval has not elapsed
    NotDue,
    /// Another user holds the bus; nothing changed
    BusBusy,
    /// A bus transfer failed; the rest of the cycle was skipped
    TransferFailed,
    /// The cycle ran to completion
    Serviced(CycleReport),
}

impl TickOutcome {
    /// Whether this tick held the bus
    pub fn held_bus(&self) -> bool {
        matches!(self, TickOutcome::TransferFailed | TickOutcome::Serviced(_))
    }
}

impl<'a, M, B, C, D, U> RpioUart<'a, M, B, C, D, U>
where
    M: RawMutex,
    B: SharedBus,
    C: MonotonicClock,
    D: DelayNs,
    U: HardwareUart,
{
    /// Run one bus cycle
    pub(crate) fn run_cycle<T: DelayNs>(&self, delay: &mut T) -> TickOutcome {
        let state = self.state();
        if !state.negotiation_pending && !state.is_relaying() {
            return TickOutcome::Idle;
        }

        let Some(mut bus) = self.bus.try_acquire() else {
            trace!("bus busy, poll skipped");
            self.update_stats(|s| s.bus_busy = s.bus_busy.wrapping_add(1));
            return TickOutcome::BusBusy;
        };
        self.update_stats(|s| s.cycles = s.cycles.wrapping_add(1));

        let mut report = CycleReport::default();

        if state.negotiation_pending {
            if state.baudrate != 0 {
                let regs = baudrate_regs(state.baudrate);
                let request = Request::Write {
                    page: PAGE_UART_BUFFER,
                    offset: 0,
                    regs: &regs,
                };
                if self.exchange(&mut *bus, &request).is_none() {
                    return TickOutcome::TransferFailed;
                }
                delay.delay_us(self.config.negotiation_settle_us);
                debug!("baud rate {} written to co-processor", state.baudrate);
            } else {
                debug!("baud rate 0, nothing to negotiate");
            }
            self.finish_negotiation();
            report.negotiated = true;
        }

        if !state.is_relaying() {
            return TickOutcome::Serviced(report);
        }

        // Outbound: bytes stay queued until the transfer succeeds
        let limit = PACKET_PAYLOAD_BYTES.min(byte_budget(state.baudrate, self.config.poll_interval_us));
        let mut chunk = [0u8; PACKET_PAYLOAD_BYTES];
        let n = self.tx.lock(|q| q.borrow().peek(&mut chunk[..limit]));

        let request = Request::BulkUart {
            page: PAGE_UART_BUFFER,
            data: &chunk[..n],
        };
        if self.exchange(&mut *bus, &request).is_none() {
            return TickOutcome::TransferFailed;
        }
        self.tx.lock(|q| q.borrow_mut().consume(n));
        self.update_stats(|s| s.bytes_sent = s.bytes_sent.wrapping_add(n as u32));
        report.sent = n;
        delay.delay_us(self.config.turnaround_us);

        // Inbound
        let Some(response) = self.exchange(&mut *bus, &Request::Read { page: PAGE_UART_BUFFER })
        else {
            return TickOutcome::TransferFailed;
        };
        delay.delay_us(self.config.turnaround_us);
        drop(bus);

        report.received = self.accept_response(&response);
        TickOutcome::Serviced(report)
    }

    /// Send one request and return whatever was clocked back
    fn exchange(&self, bus: &mut B::Bus, request: &Request<'_>) -> Option<IoPacket> {
        let packet = match request.encode() {
            Ok(packet) => packet,
            Err(e) => {
                warn!("failed to encode request: {:?}", e);
                return None;
            }
        };

        let tx = packet.to_bytes();
        let mut rx = [0u8; PACKET_SIZE];
        match bus.transfer(&mut rx, &tx) {
            Ok(()) => Some(IoPacket::from_bytes(&rx)),
            Err(_) => {
                warn!("bus transfer failed");
                self.update_stats(|s| s.transfer_errors = s.transfer_errors.wrapping_add(1));
                None
            }
        }
    }

    /// Move the data of a `Read` response into the inbound buffer
    fn accept_response(&self, packet: &IoPacket) -> usize {
        if self.config.verify_response_crc && packet.verify().is_err() {
            warn!("response CRC mismatch, discarded");
            self.update_stats(|s| s.corrupt_responses = s.corrupt_responses.wrapping_add(1));
            return 0;
        }

        let response = Response::from_packet(packet);
        if !response.is_for(PAGE_UART_BUFFER) {
            // Co-processor busy or not running its UART bridge yet
            trace!("response for page {}, no data", response.page);
            self.update_stats(|s| s.page_mismatches = s.page_mismatches.wrapping_add(1));
            return 0;
        }

        let accepted = self.rx.lock(|q| q.borrow_mut().push(&response.data));
        let dropped = response.data.len() - accepted;
        if dropped > 0 {
            warn!("inbound buffer full, dropped {} bytes", dropped);
        }

        self.update_stats(|s| {
            s.bytes_received = s.bytes_received.wrapping_add(accepted as u32);
            s.rx_dropped = s.rx_dropped.wrapping_add(dropped as u32);
        });
        accepted
    }

    fn finish_negotiation(&self) {
        self.update_state(|s| s.negotiation_pending = false);
        self.update_stats(|s| s.negotiations = s.negotiations.wrapping_add(1));
        self.negotiated.signal(());
    }
}
