//! Board-agnostic core logic for the e-paper tag firmware
//!
//! This crate contains all application logic that does not depend on
//! specific hardware implementations:
//!
//! - Collaborator traits (radio, panel/renderer, battery)
//! - Transceiver power/calibration state machine
//! - Bounded polling helper used by every busy-wait
//! - Completeness bitmap and the persistent image store
//! - Image synchronization engine and wake cadence
//! - Configuration type definitions

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod config;
pub mod image;
pub mod poll;
pub mod state;
pub mod sync;
pub mod tick;
pub mod traits;
