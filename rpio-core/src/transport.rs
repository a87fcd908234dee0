//! Application-facing virtual UART
//!
//! [`RpioUart`] is shared by two contexts: the application calls
//! [`begin`](RpioUart::begin), [`write`](RpioUart::write) and
//! [`read`](RpioUart::read), while a periodic timer calls
//! [`tick`](RpioUart::tick). The application side never touches the bus;
//! it only moves bytes in and out of the two queues.
//!
//! `begin` picks the operating mode. With a ready hardware UART every
//! call is delegated to it. Otherwise the queues are sized, the baud rate
//! is handed to the poll context and `begin` waits (bounded) until it has
//! been written to the co-processor.

use core::cell::{Cell, RefCell};

use embassy_futures::select::{select, Either};
use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::blocking_mutex::Mutex as BlockingMutex;
use embassy_sync::mutex::Mutex;
use embassy_sync::signal::Signal;
use embedded_hal::delay::DelayNs;
use embedded_hal_async::delay::DelayNs as AsyncDelayNs;

use rpio_hal::{HardwareUart, MonotonicClock, NoHardwareUart, SharedBus};

use crate::buffer::ByteQueue;
use crate::config::TransportConfig;
use crate::error::InitError;
use crate::poll::Poller;
use crate::state::{LinkStats, Mode, TransportState};

/// Virtual UART relayed through the co-processor bus
pub struct RpioUart<'a, M, B, C, D, U = NoHardwareUart>
where
    M: RawMutex,
    B: SharedBus,
    C: MonotonicClock,
    D: DelayNs,
    U: HardwareUart,
{
    pub(crate) config: TransportConfig,
    pub(crate) bus: &'a B,
    pub(crate) state: BlockingMutex<M, Cell<TransportState>>,
    pub(crate) rx: BlockingMutex<M, RefCell<ByteQueue>>,
    pub(crate) tx: BlockingMutex<M, RefCell<ByteQueue>>,
    pub(crate) stats: BlockingMutex<M, Cell<LinkStats>>,
    pub(crate) negotiated: Signal<M, ()>,
    pub(crate) poller: Mutex<M, Poller<C, D>>,
    pub(crate) hardware: BlockingMutex<M, RefCell<Option<U>>>,
}

impl<'a, M, B, C, D> RpioUart<'a, M, B, C, D, NoHardwareUart>
where
    M: RawMutex,
    B: SharedBus,
    C: MonotonicClock,
    D: DelayNs,
{
    /// Create a transport on `bus`
    ///
    /// `clock` and `delay` belong to the poll context: they are only used
    /// from [`tick`](RpioUart::tick).
    pub fn new(bus: &'a B, clock: C, delay: D, config: TransportConfig) -> Self {
        Self {
            config,
            bus,
            state: BlockingMutex::new(Cell::new(TransportState::new())),
            rx: BlockingMutex::new(RefCell::new(ByteQueue::new())),
            tx: BlockingMutex::new(RefCell::new(ByteQueue::new())),
            stats: BlockingMutex::new(Cell::new(LinkStats::new())),
            negotiated: Signal::new(),
            poller: Mutex::new(Poller::new(clock, delay)),
            hardware: BlockingMutex::new(RefCell::new(None)),
        }
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
    /// Offer a real serial device; `begin` uses it if it comes up ready
    pub fn with_hardware_uart<H: HardwareUart>(self, uart: H) -> RpioUart<'a, M, B, C, D, H> {
        RpioUart {
            config: self.config,
            bus: self.bus,
            state: self.state,
            rx: self.rx,
            tx: self.tx,
            stats: self.stats,
            negotiated: self.negotiated,
            poller: self.poller,
            hardware: BlockingMutex::new(RefCell::new(Some(uart))),
        }
    }

    /// Bring the link up
    ///
    /// Buffer sizes below the configured floor are replaced by the default
    /// size. In virtual mode this waits for the poll context to write the
    /// baud rate, giving up after `negotiation_timeout_ms` as measured by
    /// `timer`.
    pub async fn begin<T: AsyncDelayNs>(
        &self,
        baudrate: u32,
        rx_capacity: usize,
        tx_capacity: usize,
        timer: &mut T,
    ) -> Result<Mode, InitError> {
        if self.begin_external(baudrate, rx_capacity, tx_capacity) {
            info!("hardware UART ready at {} baud, external mode", baudrate);
            return Ok(Mode::External);
        }

        let rx_size = self.config.clamp_capacity(rx_capacity);
        let tx_size = self.config.clamp_capacity(tx_capacity);
        if rx_size != rx_capacity || tx_size != tx_capacity {
            debug!(
                "buffer request rx={} tx={} below floor, using rx={} tx={}",
                rx_capacity,
                tx_capacity,
                rx_size,
                tx_size
            );
        }

        {
            // A cycle already in flight finishes against the old queues
            let _poller = self.poller.lock().await;

            self.update_state(|s| {
                s.mode = Mode::Virtual;
                s.initialized = false;
                s.negotiation_pending = false;
            });

            let rx_ok = self.rx.lock(|q| q.borrow_mut().resize(rx_size)).is_ok();
            let tx_ok = self.tx.lock(|q| q.borrow_mut().resize(tx_size)).is_ok();
            if !(rx_ok && tx_ok) {
                warn!("failed to allocate buffers rx={} tx={}", rx_size, tx_size);
                return Err(InitError::OutOfMemory);
            }

            self.negotiated.reset();
            self.update_state(|s| {
                s.baudrate = baudrate;
                s.negotiation_pending = true;
            });
        }

        let timeout = timer.delay_ms(self.config.negotiation_timeout_ms);
        match select(self.negotiated.wait(), timeout).await {
            Either::First(()) => {
                self.update_state(|s| s.initialized = true);
                info!("virtual UART up at {} baud", baudrate);
                Ok(Mode::Virtual)
            }
            Either::Second(()) => {
                self.update_state(|s| s.negotiation_pending = false);
                warn!(
                    "baud rate negotiation timed out after {} ms",
                    self.config.negotiation_timeout_ms
                );
                Err(InitError::NegotiationTimeout)
            }
        }
    }

    /// Hand `begin` to the hardware UART, if there is one and it comes up
    fn begin_external(&self, baudrate: u32, rx_capacity: usize, tx_capacity: usize) -> bool {
        let ready = self.hardware.lock(|hw| match hw.borrow_mut().as_mut() {
            Some(uart) => {
                uart.begin(baudrate, rx_capacity, tx_capacity);
                uart.is_ready()
            }
            None => false,
        });

        if ready {
            self.update_state(|s| {
                *s = TransportState {
                    mode: Mode::External,
                    baudrate,
                    negotiation_pending: false,
                    initialized: true,
                };
            });
        }
        ready
    }

    /// Shut the link down; reads and writes are rejected until the next `begin`
    pub fn end(&self) {
        self.update_state(|s| *s = TransportState::new());
        self.rx.lock(|q| q.borrow_mut().release());
        self.tx.lock(|q| q.borrow_mut().release());
    }

    /// Queue bytes for the co-processor, returning how many were accepted
    ///
    /// Never blocks. Returns 0 before a successful `begin`.
    pub fn write(&self, data: &[u8]) -> usize {
        let state = self.state();
        match state.mode {
            Mode::External => self.hardware_uart(|uart| uart.write(data)).unwrap_or(0),
            _ if !state.initialized => 0,
            _ => self.tx.lock(|q| q.borrow_mut().push(data)),
        }
    }

    /// Take received bytes into `buf`, returning how many were copied
    ///
    /// Never blocks. Returns 0 before a successful `begin`.
    pub fn read(&self, buf: &mut [u8]) -> usize {
        let state = self.state();
        match state.mode {
            Mode::External => self.hardware_uart(|uart| uart.read(buf)).unwrap_or(0),
            _ if !state.initialized => 0,
            _ => self.rx.lock(|q| q.borrow_mut().pop(buf)),
        }
    }

    /// Received bytes waiting to be read (virtual mode)
    pub fn available(&self) -> usize {
        self.rx.lock(|q| q.borrow().available())
    }

    /// Free space in the outbound buffer (virtual mode)
    pub fn tx_space(&self) -> usize {
        self.tx.lock(|q| q.borrow().space())
    }

    /// Capacities of the inbound and outbound buffers
    pub fn buffer_sizes(&self) -> (usize, usize) {
        (
            self.rx.lock(|q| q.borrow().capacity()),
            self.tx.lock(|q| q.borrow().capacity()),
        )
    }

    /// Whether the link is up
    pub fn is_initialized(&self) -> bool {
        self.state().initialized
    }

    /// Whether a real hardware UART is carrying the link
    pub fn is_external(&self) -> bool {
        self.state().mode == Mode::External
    }

    /// Current operating mode
    pub fn mode(&self) -> Mode {
        self.state().mode
    }

    /// Baud rate requested by the last `begin`
    pub fn baudrate(&self) -> u32 {
        self.state().baudrate
    }

    /// Snapshot of the shared state
    pub fn state(&self) -> TransportState {
        self.state.lock(Cell::get)
    }

    /// Snapshot of the link counters
    pub fn stats(&self) -> LinkStats {
        self.stats.lock(Cell::get)
    }

    /// Transport configuration
    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    pub(crate) fn update_state(&self, f: impl FnOnce(&mut TransportState)) {
        self.state.lock(|cell| {
            let mut state = cell.get();
            f(&mut state);
            cell.set(state);
        });
    }

    pub(crate) fn update_stats(&self, f: impl FnOnce(&mut LinkStats)) {
        self.stats.lock(|cell| {
            let mut stats = cell.get();
            f(&mut stats);
            cell.set(stats);
        });
    }

    /// Run `f` on the hardware UART, if one was attached
    pub fn hardware_uart<R>(&self, f: impl FnOnce(&mut U) -> R) -> Option<R> {
        self.hardware.lock(|hw| hw.borrow_mut().as_mut().map(f))
    }
}
