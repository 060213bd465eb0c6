//! Hardware driver implementations
//!
//! This crate provides concrete implementations of the traits defined
//! in inktag-core:
//!
//! - A7106 2.4GHz transceiver over a half-duplex three-wire bus
//! - Panel renderer streaming a completed image from flash to an e-paper
//!   controller

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod radio;
pub mod render;
