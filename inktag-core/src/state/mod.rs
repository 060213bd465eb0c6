//! Transceiver power/lifecycle state machine
//!
//! The driver owns one of these and feeds it events as it issues strobes;
//! the protocol layer only ever observes the result.

pub mod events;
pub mod machine;

pub use events::Event;
pub use machine::TransceiverState;
