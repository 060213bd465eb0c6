//! Collaborator traits
//!
//! The interfaces between the synchronization logic and everything that
//! touches hardware: the transceiver, the battery gauge, and the panel.

pub mod battery;
pub mod display;
pub mod radio;

pub use battery::BatteryMonitor;
pub use display::{CompletedImage, EpdPanel, RenderError, Renderer};
pub use radio::{Radio, RadioAddress, RadioError};
