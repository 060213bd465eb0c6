//! RP2040-specific HAL for the tag firmware
//!
//! This crate provides RP2040 implementations of the shared `inktag-hal`
//! and `inktag-core` traits:
//!
//! - GPIO wrappers (push-pull outputs, inputs, the bidirectional radio
//!   data line)
//! - SPI NOR serial flash driver (implements `inktag_hal::SerialFlash`)
//! - ADC battery gauge (implements `inktag_core::traits::BatteryMonitor`)

#![no_std]

pub mod adc;
pub mod flash;
pub mod gpio;

pub use adc::AdcBattery;
pub use flash::SpiNorFlash;
pub use gpio::{RpFlex, RpInput, RpOutput};
