//! Simulated co-processor, bus lock, clock and timers for transport tests

#![allow(dead_code)]

use std::collections::VecDeque;
use std::future::poll_fn;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use std::task::Poll;
use std::thread;
use std::time::{Duration, Instant};

use embassy_futures::block_on;
use embassy_futures::select::{select, Either};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::mutex::{Mutex, MutexGuard};

use rpio_core::{InitError, Mode, RpioUart, TickOutcome, TransportConfig};
use rpio_hal::{HardwareUart, MonotonicClock, SharedBus, SpiBus};
use rpio_protocol::{IoPacket, PacketCode, PACKET_PAYLOAD_BYTES, PACKET_SIZE, PAGE_UART_BUFFER};

/// Poll interval used by the default configuration
pub const POLL_US: u64 = 10_000;

pub type TestUart<'a> = RpioUart<'a, CriticalSectionRawMutex, TestBus, &'a ManualClock, NoDelay>;

pub type ExternalUart<'a> =
    RpioUart<'a, CriticalSectionRawMutex, TestBus, &'a ManualClock, NoDelay, MockHardwareUart>;

/// Clock that only moves when told to
pub struct ManualClock {
    now_us: AtomicU64,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now_us: AtomicU64::new(1_000_000),
        }
    }

    pub fn advance(&self, us: u64) {
        self.now_us.fetch_add(us, Ordering::SeqCst);
    }
}

impl MonotonicClock for ManualClock {
    fn now_micros(&self) -> u64 {
        self.now_us.load(Ordering::SeqCst)
    }
}

/// Turnaround delay that returns immediately
pub struct NoDelay;

impl embedded_hal::delay::DelayNs for NoDelay {
    fn delay_ns(&mut self, _ns: u32) {}
}

/// Async delay measured against the host's wall clock
pub struct StdTimer;

impl embedded_hal_async::delay::DelayNs for StdTimer {
    async fn delay_ns(&mut self, ns: u32) {
        let deadline = Instant::now() + Duration::from_nanos(ns as u64);
        poll_fn(|cx| {
            if Instant::now() >= deadline {
                Poll::Ready(())
            } else {
                cx.waker().wake_by_ref();
                Poll::Pending
            }
        })
        .await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimError;

/// Holds the next `Read` transfer inside the bus until opened
#[derive(Default)]
pub struct ReadGate {
    entered: AtomicBool,
    open: AtomicBool,
}

impl ReadGate {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Whether a `Read` is waiting at the gate
    pub fn is_entered(&self) -> bool {
        self.entered.load(Ordering::SeqCst)
    }

    pub fn open(&self) {
        self.open.store(true, Ordering::SeqCst);
    }

    fn pass(&self) {
        self.entered.store(true, Ordering::SeqCst);
        while !self.open.load(Ordering::SeqCst) {
            thread::yield_now();
        }
    }
}

/// I/O co-processor running its UART bridge
pub struct CoProcessor {
    /// Every request received, in order
    pub requests: Vec<IoPacket>,
    /// Baud rate last written to the UART page
    pub baudrate: Option<u32>,
    /// Bytes the co-processor UART has received, waiting to be fetched
    pub inbound: VecDeque<u8>,
    /// Bytes pushed out through the co-processor UART
    pub outbound: Vec<u8>,
    /// Loop outbound bytes straight back into `inbound`
    pub echo: bool,
    /// Page reported in `Read` responses
    pub response_page: u16,
    /// Report this byte count instead of the real one
    pub claimed_offset: Option<u16>,
    /// Damage the CRC of every response
    pub corrupt_responses: bool,
    /// Fail every transfer
    pub fail_transfers: bool,
    /// Stall the next `Read` until the gate opens
    pub read_gate: Option<Arc<ReadGate>>,
}

impl CoProcessor {
    pub fn new() -> Self {
        Self {
            requests: Vec::new(),
            baudrate: None,
            inbound: VecDeque::new(),
            outbound: Vec::new(),
            echo: false,
            response_page: PAGE_UART_BUFFER,
            claimed_offset: None,
            corrupt_responses: false,
            fail_transfers: false,
            read_gate: None,
        }
    }

    /// Requests with the given opcode
    pub fn requests_with(&self, code: PacketCode) -> Vec<IoPacket> {
        self.requests
            .iter()
            .filter(|p| p.code() == Ok(code))
            .copied()
            .collect()
    }

    fn respond(&mut self, request: &IoPacket) -> IoPacket {
        match request.code() {
            Ok(PacketCode::Write) if request.page == PAGE_UART_BUFFER && request.offset == 0 => {
                self.baudrate = Some(request.regs[0] as u32 | (request.regs[1] as u32) << 16);
                IoPacket::zeroed()
            }
            Ok(PacketCode::BulkUart) => {
                let n = (request.offset as usize).min(PACKET_PAYLOAD_BYTES);
                let payload = request.payload();
                self.outbound.extend_from_slice(&payload[..n]);
                if self.echo {
                    self.inbound.extend(&payload[..n]);
                }
                IoPacket::zeroed()
            }
            Ok(PacketCode::Read) => {
                let n = self.inbound.len().min(PACKET_PAYLOAD_BYTES);
                let data: Vec<u8> = self.inbound.drain(..n).collect();

                let mut response = IoPacket::zeroed();
                response.count_code = PacketCode::BulkUart as u16 | PACKET_PAYLOAD_BYTES as u16;
                response.page = self.response_page;
                response.offset = self.claimed_offset.unwrap_or(n as u16);
                response.set_payload(&data).unwrap();
                response.seal();
                response
            }
            _ => IoPacket::zeroed(),
        }
    }
}

impl SpiBus for CoProcessor {
    type Error = SimError;

    fn transfer(&mut self, read: &mut [u8], write: &[u8]) -> Result<(), Self::Error> {
        assert_eq!(write.len(), PACKET_SIZE);
        assert_eq!(read.len(), PACKET_SIZE);

        if self.fail_transfers {
            return Err(SimError);
        }

        let bytes: &[u8; PACKET_SIZE] = write.try_into().map_err(|_| SimError)?;
        let request = IoPacket::from_bytes(bytes);
        assert_eq!(request.verify(), Ok(()), "transport sent a bad CRC");
        self.requests.push(request);

        if request.code() == Ok(PacketCode::Read) {
            if let Some(gate) = self.read_gate.take() {
                gate.pass();
            }
        }

        let mut response = self.respond(&request);
        if self.corrupt_responses {
            response.crc ^= 0x5A;
        }
        read.copy_from_slice(&response.to_bytes());
        Ok(())
    }
}

/// Shared bus with a co-processor on it and a controllable lock
pub struct TestBus {
    device: Mutex<CriticalSectionRawMutex, CoProcessor>,
    /// Refuse every acquisition
    pub locked_out: AtomicBool,
    /// Refuse this many acquisitions, then behave
    pub busy_polls: AtomicU32,
}

impl TestBus {
    pub fn new() -> Self {
        Self {
            device: Mutex::new(CoProcessor::new()),
            locked_out: AtomicBool::new(false),
            busy_polls: AtomicU32::new(0),
        }
    }

    /// Inspect or reconfigure the co-processor between ticks
    pub fn device<R>(&self, f: impl FnOnce(&mut CoProcessor) -> R) -> R {
        let mut device = self.device.try_lock().expect("bus held during inspection");
        f(&mut *device)
    }

    pub fn lock_out(&self, locked: bool) {
        self.locked_out.store(locked, Ordering::SeqCst);
    }
}

impl SharedBus for TestBus {
    type Bus = CoProcessor;
    type Guard<'a>
        = MutexGuard<'a, CriticalSectionRawMutex, CoProcessor>
    where
        Self: 'a;

    fn try_acquire(&self) -> Option<Self::Guard<'_>> {
        if self.locked_out.load(Ordering::SeqCst) {
            return None;
        }
        let busy = self
            .busy_polls
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        if busy.is_ok() {
            return None;
        }
        self.device.try_lock().ok()
    }
}

/// Real serial device stand-in for external mode
pub struct MockHardwareUart {
    pub ready: bool,
    pub begun_at: Option<u32>,
    pub written: Vec<u8>,
    pub to_read: VecDeque<u8>,
    pub ticks: u32,
}

impl MockHardwareUart {
    pub fn new(ready: bool) -> Self {
        Self {
            ready,
            begun_at: None,
            written: Vec::new(),
            to_read: VecDeque::new(),
            ticks: 0,
        }
    }
}

impl HardwareUart for MockHardwareUart {
    fn begin(&mut self, baudrate: u32, _rx_capacity: usize, _tx_capacity: usize) {
        self.begun_at = Some(baudrate);
    }

    fn is_ready(&self) -> bool {
        self.ready
    }

    fn read(&mut self, buf: &mut [u8]) -> usize {
        let n = buf.len().min(self.to_read.len());
        for (dst, src) in buf.iter_mut().zip(self.to_read.drain(..n)) {
            *dst = src;
        }
        n
    }

    fn write(&mut self, data: &[u8]) -> usize {
        self.written.extend_from_slice(data);
        data.len()
    }

    fn tick(&mut self) {
        self.ticks += 1;
    }
}

/// Default configuration with a short negotiation timeout
pub fn test_config() -> TransportConfig {
    TransportConfig {
        negotiation_timeout_ms: 50,
        ..TransportConfig::default()
    }
}

/// Run `begin` while a poll context ticks alongside it every interval
pub fn begin_serviced<U: HardwareUart>(
    uart: &RpioUart<'_, CriticalSectionRawMutex, TestBus, &ManualClock, NoDelay, U>,
    clock: &ManualClock,
    baudrate: u32,
    rx_capacity: usize,
    tx_capacity: usize,
) -> Result<Mode, InitError> {
    let poll_context = poll_fn(|cx| {
        clock.advance(POLL_US);
        uart.tick();
        cx.waker().wake_by_ref();
        Poll::<()>::Pending
    });

    let mut timer = StdTimer;
    let begin = uart.begin(baudrate, rx_capacity, tx_capacity, &mut timer);
    match block_on(select(begin, poll_context)) {
        Either::First(result) => result,
        Either::Second(()) => unreachable!("poll context never finishes"),
    }
}

/// Advance one poll interval and tick
pub fn service<U: HardwareUart>(
    uart: &RpioUart<'_, CriticalSectionRawMutex, TestBus, &ManualClock, NoDelay, U>,
    clock: &ManualClock,
) -> TickOutcome {
    clock.advance(POLL_US);
    uart.tick()
}
