//! Embassy async tasks

pub mod tick;

pub use tick::{tick_task, TICKS, TICK_SIGNAL};
