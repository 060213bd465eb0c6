//! Events that trigger transceiver state transitions

/// Driver-issued events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Event {
    // Lifecycle
    /// Register table written, calibration about to start
    InitStarted,
    /// All three calibration stages passed
    CalibrationPassed,
    /// Every calibration attempt failed, or the bus self-test did
    InitFailed,

    // Power
    /// Sleep strobe issued
    SleepRequested,
    /// Standby strobe issued and settle time elapsed
    WakeRequested,

    // Transactions
    /// TX or RX strobe issued
    TransactionStarted,
    /// Transaction finished, timed out or was cancelled
    TransactionEnded,
}
