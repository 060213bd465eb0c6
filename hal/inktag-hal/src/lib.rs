//! Inktag Hardware Abstraction Layer
//!
//! This crate defines hardware abstraction traits that can be implemented
//! by chip-specific HALs. The radio driver, image store and renderer are
//! written against these traits so they can be exercised on the host.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  Application (inktag-firmware)          │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  inktag-core / inktag-drivers           │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  inktag-hal (this crate - traits)       │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//!             ┌───────────────┐
//!             │ inktag-hal-   │
//!             │    rp2040     │
//!             └───────────────┘
//! ```
//!
//! # Traits
//!
//! - [`gpio::OutputPin`], [`gpio::InputPin`], [`gpio::FlexPin`] - Digital I/O
//! - [`bus::ThreeWireBus`] - Half-duplex synchronous register bus
//! - [`flash::SerialFlash`] - External serial NOR flash

#![no_std]
#![deny(unsafe_code)]

pub mod bus;
pub mod flash;
pub mod gpio;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

// Re-export key traits at crate root for convenience
pub use bus::{BitBangBus, ThreeWireBus};
pub use flash::{FlashError, SerialFlash};
pub use gpio::{FlexPin, InputPin, OutputPin};
