//! Configuration types
//!
//! Board-agnostic configuration structures. Identity values are provisioned
//! at build time by the firmware; everything else has working defaults.

pub mod types;

pub use types::*;
