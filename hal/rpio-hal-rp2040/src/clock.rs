//! Monotonic clock from the embassy time driver

use embassy_time::Instant;
use rpio_hal::MonotonicClock;

/// Clock reading [`Instant::now`]
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbassyClock;

impl MonotonicClock for EmbassyClock {
    fn now_micros(&self) -> u64 {
        Instant::now().as_micros()
    }

    fn now_millis(&self) -> u64 {
        Instant::now().as_millis()
    }
}
