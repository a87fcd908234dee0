//! Poll scheduler
//!
//! `tick` is meant to be called far more often than the bus should be
//! polled (a 1 kHz timer is typical). It forwards to the hardware UART in
//! external mode; in virtual mode it runs a bus cycle at most once per
//! `poll_interval_us`.

use embassy_sync::blocking_mutex::raw::RawMutex;
use embedded_hal::delay::DelayNs;

use rpio_hal::{HardwareUart, MonotonicClock, SharedBus};

use crate::sequencer::TickOutcome;
use crate::state::Mode;
use crate::transport::RpioUart;

/// Resources owned by whichever tick is running
///
/// Held behind a try-lock: a tick that finds it taken returns at once,
/// so two ticks can never overlap.
pub struct Poller<C, D> {
    pub(crate) clock: C,
    pub(crate) delay: D,
    last_serviced_us: Option<u64>,
}

impl<C: MonotonicClock, D: DelayNs> Poller<C, D> {
    pub(crate) fn new(clock: C, delay: D) -> Self {
        Self {
            clock,
            delay,
            last_serviced_us: None,
        }
    }

    /// Whether at least `interval_us` has passed since the last serviced poll
    pub fn is_due(&self, now_us: u64, interval_us: u32) -> bool {
        match self.last_serviced_us {
            Some(last) => now_us.saturating_sub(last) >= interval_us as u64,
            None => true,
        }
    }

    /// Record a serviced poll
    pub fn mark_serviced(&mut self, at_us: u64) {
        self.last_serviced_us = Some(at_us);
    }

    /// Timestamp of the last serviced poll
    pub fn last_serviced_us(&self) -> Option<u64> {
        self.last_serviced_us
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
    /// Periodic service entry point for the timer context
    pub fn tick(&self) -> TickOutcome {
        let Ok(mut poller) = self.poller.try_lock() else {
            return TickOutcome::InProgress;
        };

        match self.mode() {
            Mode::Unconfigured => return TickOutcome::Idle,
            Mode::External => {
                self.hardware_uart(|uart| uart.tick());
                return TickOutcome::Forwarded;
            }
            Mode::Virtual => {}
        }

        let now = poller.clock.now_micros();
        if !poller.is_due(now, self.config.poll_interval_us) {
            return TickOutcome::NotDue;
        }

        let outcome = self.run_cycle(&mut poller.delay);
        if outcome.held_bus() {
            let finished = poller.clock.now_micros();
            poller.mark_serviced(finished);
        }
        outcome
    }

    /// Timestamp of the last serviced poll, unless a tick is running
    pub fn last_poll_us(&self) -> Option<u64> {
        self.poller
            .try_lock()
            .ok()
            .and_then(|poller| poller.last_serviced_us())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedClock(u64);

    impl MonotonicClock for FixedClock {
        fn now_micros(&self) -> u64 {
            self.0
        }
    }

    struct NoDelay;

    impl DelayNs for NoDelay {
        fn delay_ns(&mut self, _ns: u32) {}
    }

    #[test]
    fn test_first_poll_is_due() {
        let poller = Poller::new(FixedClock(0), NoDelay);
        assert!(poller.is_due(0, 10_000));
    }

    #[test]
    fn test_interval_boundary() {
        let mut poller = Poller::new(FixedClock(0), NoDelay);
        poller.mark_serviced(50_000);

        assert!(!poller.is_due(50_000, 10_000));
        assert!(!poller.is_due(59_999, 10_000));
        assert!(poller.is_due(60_000, 10_000));
        assert_eq!(poller.last_serviced_us(), Some(50_000));
    }

    #[test]
    fn test_clock_behind_last_poll_is_not_due() {
        let mut poller = Poller::new(FixedClock(0), NoDelay);
        poller.mark_serviced(50_000);
        assert!(!poller.is_due(40_000, 10_000));
    }

    struct SilentSpi;

    impl rpio_hal::SpiBus for SilentSpi {
        type Error = ();

        fn transfer(&mut self, read: &mut [u8], _write: &[u8]) -> Result<(), Self::Error> {
            read.fill(0);
            Ok(())
        }
    }

    #[test]
    fn test_overlapping_tick_returns_at_once() {
        use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
        use embassy_sync::mutex::Mutex;

        use crate::config::TransportConfig;

        let bus: Mutex<CriticalSectionRawMutex, SilentSpi> = Mutex::new(SilentSpi);
        let uart: RpioUart<'_, CriticalSectionRawMutex, _, _, _> =
            RpioUart::new(&bus, FixedClock(0), NoDelay, TransportConfig::default());

        let running = uart.poller.try_lock().unwrap();
        assert_eq!(uart.tick(), TickOutcome::InProgress);
        assert_eq!(uart.last_poll_us(), None);
        drop(running);

        assert_eq!(uart.tick(), TickOutcome::Idle);
    }
}
