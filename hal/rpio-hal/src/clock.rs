//! Monotonic time source

/// Monotonic clock
///
/// Readings never go backwards. The epoch is arbitrary (usually boot).
pub trait MonotonicClock {
    /// Microseconds since the clock's epoch
    fn now_micros(&self) -> u64;

    /// Milliseconds since the clock's epoch
    fn now_millis(&self) -> u64 {
        self.now_micros() / 1000
    }
}

impl<T: MonotonicClock + ?Sized> MonotonicClock for &T {
    fn now_micros(&self) -> u64 {
        T::now_micros(self)
    }

    fn now_millis(&self) -> u64 {
        T::now_millis(self)
    }
}
