//! Synchronization with the gateway
//!
//! A round is one Hello out and at most one Data back. A session is the run
//! of rounds performed on a single wake.

pub mod cadence;
pub mod engine;

pub use cadence::WakeCadence;
pub use engine::{RoundOutcome, SessionReport, SyncEngine, SyncError};
