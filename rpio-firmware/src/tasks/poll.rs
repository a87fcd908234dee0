//! Poll task
//!
//! Calls `tick` at 1 kHz. The transport rate-limits itself to the
//! configured poll interval, so most ticks return `NotDue`.

use defmt::*;
use embassy_time::{Duration, Ticker};

use rpio_core::TickOutcome;

use crate::LinkUart;

/// Tick interval in microseconds
pub const TICK_INTERVAL_US: u64 = 1_000;

/// Log link counters every this many ticks
const STATS_EVERY: u32 = 10_000;

#[embassy_executor::task]
pub async fn poll_task(link: &'static LinkUart) {
    info!("Poll task started");

    let mut ticker = Ticker::every(Duration::from_micros(TICK_INTERVAL_US));
    let mut ticks: u32 = 0;

    loop {
        ticker.next().await;

        match link.tick() {
            TickOutcome::Serviced(report) if report.negotiated => {
                debug!("Baud rate negotiated");
            }
            TickOutcome::TransferFailed => warn!("Co-processor transfer failed"),
            _ => {}
        }

        ticks = ticks.wrapping_add(1);
        if ticks % STATS_EVERY == 0 && link.is_initialized() {
            let stats = link.stats();
            info!(
                "Link: sent={} received={} busy={} dropped={} corrupt={}",
                stats.bytes_sent,
                stats.bytes_received,
                stats.bus_busy,
                stats.rx_dropped,
                stats.corrupt_responses
            );
        }
    }
}
