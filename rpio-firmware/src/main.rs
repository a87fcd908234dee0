//! RPIO firmware
//!
//! RP2040 flight controller build whose telemetry link runs over the I/O
//! co-processor instead of a spare UART. The co-processor sits on SPI0;
//! a 1 kHz poll task services the virtual UART while the link task
//! behaves like any other serial consumer.

#![no_std]
#![no_main]

extern crate alloc;

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::bind_interrupts;
use embassy_rp::gpio::{Level, Output};
use embassy_rp::peripherals::{SPI0, UART0};
use embassy_rp::spi::{Config as SpiConfig, Spi};
use embassy_rp::uart::{BufferedInterruptHandler, BufferedUart, Config as UartConfig, Uart};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::mutex::Mutex;
use embassy_time::Delay;
use embedded_alloc::LlffHeap as Heap;
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use rpio_core::RpioUart;
use rpio_hal_rp2040::{EmbassyClock, IoSpi, PassthroughUart};

mod tasks;

include!(concat!(env!("OUT_DIR"), "/rpio_config.rs"));

// Heap for the virtual UART buffers
#[global_allocator]
static HEAP: Heap = Heap::empty();

// Heap size: 16KB
const HEAP_SIZE: usize = 16 * 1024;

/// SPI clock to the co-processor
const IO_SPI_FREQUENCY: u32 = 8_000_000;

/// Baud rate UART0 is wired for when used in passthrough
const PASSTHROUGH_BAUDRATE: u32 = 57_600;

/// Co-processor bus, shared with any other driver on SPI0
pub type IoBus = Mutex<CriticalSectionRawMutex, IoSpi<'static, SPI0>>;

/// The telemetry link
pub type LinkUart = RpioUart<
    'static,
    CriticalSectionRawMutex,
    IoBus,
    EmbassyClock,
    Delay,
    PassthroughUart<BufferedUart>,
>;

bind_interrupts!(struct Irqs {
    UART0_IRQ => BufferedInterruptHandler<UART0>;
});

// Static cells for UART buffers (must live forever)
static TX_BUF: StaticCell<[u8; 256]> = StaticCell::new();
static RX_BUF: StaticCell<[u8; 256]> = StaticCell::new();

static IO_BUS: StaticCell<IoBus> = StaticCell::new();
static LINK: StaticCell<LinkUart> = StaticCell::new();

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("RPIO firmware starting...");

    init_heap();

    let p = embassy_rp::init(Default::default());
    info!("Peripherals initialized");

    if let Err(e) = RPIO_CONFIG.transport.validate() {
        error!("Invalid transport configuration: {:?}", e);
        return;
    }

    // Co-processor on SPI0: CLK=GPIO18, MOSI=GPIO19, MISO=GPIO16, CS=GPIO17
    let mut spi_config = SpiConfig::default();
    spi_config.frequency = IO_SPI_FREQUENCY;
    let spi = Spi::new_blocking(p.SPI0, p.PIN_18, p.PIN_19, p.PIN_16, spi_config);
    let cs = Output::new(p.PIN_17, Level::High);
    let bus = IO_BUS.init(Mutex::new(IoSpi::new(spi, cs)));

    info!("Co-processor bus initialized");

    // UART0 for passthrough: TX=GPIO0, RX=GPIO1
    let uart_config = {
        let mut cfg = UartConfig::default();
        cfg.baudrate = PASSTHROUGH_BAUDRATE;
        cfg
    };
    let tx_buf = TX_BUF.init([0u8; 256]);
    let rx_buf = RX_BUF.init([0u8; 256]);
    let serial = Uart::new_blocking(p.UART0, p.PIN_0, p.PIN_1, uart_config);
    let serial = serial.into_buffered(Irqs, tx_buf, rx_buf);
    let hardware = PassthroughUart::new(
        serial,
        PASSTHROUGH_BAUDRATE,
        RPIO_CONFIG.link.passthrough,
    );

    let link: &'static LinkUart = LINK.init(
        RpioUart::new(bus, EmbassyClock, Delay, RPIO_CONFIG.transport)
            .with_hardware_uart(hardware),
    );

    spawner.spawn(tasks::poll_task(link)).unwrap();
    spawner.spawn(tasks::link_task(link, RPIO_CONFIG.link)).unwrap();

    info!("All tasks spawned, firmware running");

    loop {
        embassy_time::Timer::after_secs(60).await;
        trace!("Main loop heartbeat");
    }
}

/// Initialize the heap allocator
fn init_heap() {
    use core::mem::MaybeUninit;
    static mut HEAP_MEM: [MaybeUninit<u8>; HEAP_SIZE] = [MaybeUninit::uninit(); HEAP_SIZE];
    #[allow(static_mut_refs)]
    unsafe {
        HEAP.init(HEAP_MEM.as_ptr() as usize, HEAP_SIZE)
    }
}
