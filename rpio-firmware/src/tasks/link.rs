//! Telemetry link task
//!
//! Brings the link up, then echoes back anything received and sends a
//! heartbeat line once a second. Stands in for the telemetry protocol
//! that would normally sit on this serial port.

use core::fmt::Write as _;

use defmt::*;
use embassy_time::{Delay, Duration, Instant, Timer};

use rpio_core::{LinkConfig, Mode};

use crate::LinkUart;

/// Wait between attempts when `begin` fails
const RETRY_DELAY: Duration = Duration::from_secs(1);

/// Interval between heartbeat lines
const HEARTBEAT: Duration = Duration::from_secs(1);

#[embassy_executor::task]
pub async fn link_task(link: &'static LinkUart, config: LinkConfig) {
    info!("Link task started");

    let mut delay = Delay;
    loop {
        match link
            .begin(config.baudrate, config.rx_buffer, config.tx_buffer, &mut delay)
            .await
        {
            Ok(Mode::External) => {
                info!("Link on UART0 at {} baud", config.baudrate);
                break;
            }
            Ok(mode) => {
                info!("Link via co-processor at {} baud ({:?})", config.baudrate, mode);
                break;
            }
            Err(e) => {
                warn!("Link begin failed: {:?}, retrying", e);
                Timer::after(RETRY_DELAY).await;
            }
        }
    }

    let mut buf = [0u8; 64];
    let mut next_heartbeat = Instant::now() + HEARTBEAT;
    let mut sequence: u32 = 0;

    loop {
        let n = link.read(&mut buf);
        if n > 0 {
            trace!("Link rx {} bytes", n);
            let accepted = link.write(&buf[..n]);
            if accepted < n {
                warn!("Link tx full, {} bytes not echoed", n - accepted);
            }
        }

        if Instant::now() >= next_heartbeat {
            next_heartbeat += HEARTBEAT;
            sequence = sequence.wrapping_add(1);

            let mut line: heapless::String<32> = heapless::String::new();
            let _ = write!(line, "HB {}\r\n", sequence);
            link.write(line.as_bytes());
        }

        Timer::after_millis(5).await;
    }
}
