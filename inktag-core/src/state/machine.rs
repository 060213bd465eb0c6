//! State machine definition

use super::events::Event;

/// Transceiver states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransceiverState {
    /// Power-on, registers not yet programmed
    #[default]
    Uninitialized,
    /// Register table written, calibration in progress
    Calibrating,
    /// Calibrated and in standby, ready for a transaction
    Idle,
    /// TX or RX in flight
    Busy,
    /// Low-power sleep, configuration retained
    Sleeping,
    /// Init failed; unusable until reset
    Failed,
}

impl TransceiverState {
    /// Check if transactions may be attempted (possibly after a wake)
    pub fn is_usable(&self) -> bool {
        matches!(self, Self::Idle | Self::Busy | Self::Sleeping)
    }

    /// Check if the crystal is running
    pub fn is_awake(&self) -> bool {
        matches!(self, Self::Idle | Self::Busy)
    }

    /// Check if this is a terminal state for the current boot
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Failed)
    }

    /// Process an event and return the next state
    ///
    /// Events that make no sense in the current state leave it unchanged.
    pub fn transition(self, event: Event) -> Self {
        use Event::*;
        use TransceiverState::*;

        match (self, event) {
            // Failed is sticky
            (Failed, _) => Failed,

            // Init may be re-run from anywhere else
            (_, InitStarted) => Calibrating,
            (Calibrating, CalibrationPassed) => Idle,
            (Calibrating, InitFailed) => Failed,

            // Power
            (Idle, SleepRequested) => Sleeping,
            (Sleeping, WakeRequested) => Idle,

            // Transactions always resolve back to Idle
            (Idle, TransactionStarted) => Busy,
            (Busy, TransactionEnded) => Idle,

            (state, _) => state,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_successful_init() {
        let state = TransceiverState::default()
            .transition(Event::InitStarted)
            .transition(Event::CalibrationPassed);
        assert_eq!(state, TransceiverState::Idle);
        assert!(state.is_usable());
        assert!(state.is_awake());
    }

    #[test]
    fn test_failed_is_sticky() {
        let state = TransceiverState::Uninitialized
            .transition(Event::InitStarted)
            .transition(Event::InitFailed);
        assert_eq!(state, TransceiverState::Failed);
        assert!(!state.is_usable());

        for event in [
            Event::InitStarted,
            Event::CalibrationPassed,
            Event::WakeRequested,
            Event::TransactionStarted,
        ] {
            assert_eq!(state.transition(event), TransceiverState::Failed);
        }
    }

    #[test]
    fn test_sleep_wake_cycle() {
        let state = TransceiverState::Idle.transition(Event::SleepRequested);
        assert_eq!(state, TransceiverState::Sleeping);
        assert!(state.is_usable());
        assert!(!state.is_awake());
        assert_eq!(state.transition(Event::WakeRequested), TransceiverState::Idle);
    }

    #[test]
    fn test_transaction_resolves_to_idle() {
        let busy = TransceiverState::Idle.transition(Event::TransactionStarted);
        assert_eq!(busy, TransceiverState::Busy);
        assert_eq!(busy.transition(Event::TransactionEnded), TransceiverState::Idle);
    }

    #[test]
    fn test_transaction_needs_wake() {
        // A sleeping radio cannot start a transaction without waking first
        assert_eq!(
            TransceiverState::Sleeping.transition(Event::TransactionStarted),
            TransceiverState::Sleeping
        );
    }

    #[test]
    fn test_uninitialized_ignores_power_events() {
        let state = TransceiverState::Uninitialized;
        assert_eq!(state.transition(Event::WakeRequested), state);
        assert_eq!(state.transition(Event::SleepRequested), state);
        assert!(!state.is_usable());
    }
}
