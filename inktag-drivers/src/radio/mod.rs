//! Radio transceiver drivers

pub mod a7106;
pub mod regs;

pub use a7106::{A7106Config, InitError, RadioStats, A7106};
