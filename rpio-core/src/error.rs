//! Transport errors

/// Why `begin` could not bring the link up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InitError {
    /// A buffer of the requested size could not be allocated
    OutOfMemory,
    /// The poll context did not negotiate the baud rate in time
    NegotiationTimeout,
}
