//! Transport state shared by the application and poll contexts

/// Which path carries the byte streams
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Mode {
    /// `begin` has not selected a path yet
    #[default]
    Unconfigured,
    /// A real hardware UART handles everything
    External,
    /// Bytes are relayed through the co-processor packet protocol
    Virtual,
}

/// Flags and parameters both contexts read and write
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TransportState {
    /// Operating mode chosen by `begin`
    pub mode: Mode,
    /// Baud rate announced to the co-processor and used for the byte budget
    pub baudrate: u32,
    /// A baud rate write is waiting for the poll context
    pub negotiation_pending: bool,
    /// Buffers are sized and the baud rate acknowledged
    pub initialized: bool,
}

impl TransportState {
    /// Fresh state: unconfigured, nothing pending
    pub const fn new() -> Self {
        Self {
            mode: Mode::Unconfigured,
            baudrate: 0,
            negotiation_pending: false,
            initialized: false,
        }
    }

    /// Whether byte traffic may be relayed over the bus
    pub fn is_relaying(&self) -> bool {
        self.mode == Mode::Virtual && self.initialized
    }
}

/// Running counters of link activity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LinkStats {
    /// Poll cycles that held the bus
    pub cycles: u32,
    /// Poll cycles skipped because another user held the bus
    pub bus_busy: u32,
    /// Baud rate negotiations completed
    pub negotiations: u32,
    /// Bytes relayed to the co-processor
    pub bytes_sent: u32,
    /// Bytes received from the co-processor
    pub bytes_received: u32,
    /// Received bytes dropped because the inbound buffer was full
    pub rx_dropped: u32,
    /// Responses rejected for a bad CRC
    pub corrupt_responses: u32,
    /// Responses answering for a different page
    pub page_mismatches: u32,
    /// Bus transfers that reported an error
    pub transfer_errors: u32,
}

impl LinkStats {
    /// All counters zero
    pub const fn new() -> Self {
        Self {
            cycles: 0,
            bus_busy: 0,
            negotiations: 0,
            bytes_sent: 0,
            bytes_received: 0,
            rx_dropped: 0,
            corrupt_responses: 0,
            page_mismatches: 0,
            transfer_errors: 0,
        }
    }
}
