//! Shared bus ownership
//!
//! The co-processor bus is also used by other drivers (RC input, PWM
//! output, sensors). A transport may only touch it while holding the
//! ownership token, and it must never wait for that token: a poll cycle
//! that cannot get the bus is skipped instead.

use core::ops::DerefMut;

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::mutex::{Mutex, MutexGuard};

use crate::spi::SpiBus;

/// A bus guarded by a non-blocking ownership token
///
/// The token is the returned guard; dropping it releases the bus.
pub trait SharedBus {
    /// Underlying transfer interface
    type Bus: SpiBus;

    /// Ownership token giving exclusive access to [`Self::Bus`]
    type Guard<'a>: DerefMut<Target = Self::Bus>
    where
        Self: 'a;

    /// Try to take ownership of the bus without waiting
    ///
    /// Returns `None` if another user currently holds it.
    fn try_acquire(&self) -> Option<Self::Guard<'_>>;
}

impl<M: RawMutex, B: SpiBus> SharedBus for Mutex<M, B> {
    type Bus = B;
    type Guard<'a>
        = MutexGuard<'a, M, B>
    where
        Self: 'a;

    fn try_acquire(&self) -> Option<Self::Guard<'_>> {
        self.try_lock().ok()
    }
}
