//! Tag ⇄ gateway radio protocol
//!
//! The tag and the gateway exchange two fixed-size little-endian records,
//! each carried as one radio packet. There is no framing byte: the
//! transceiver's hardware address filter and CRC delimit packets, and the
//! record type is implied by direction.
//!
//! # Hello (tag → gateway, 40 bytes)
//! ```text
//! ┌──────────┬────────┬─────────┬──────────┬─────────┬──────────┬──────────┬─────────────┐
//! │ TAG TYPE │ TAG ID │ FW HASH │ INSTALLED│ BATT mV │ RESERVED │ IMAGE ID │ CHUNK MAP   │
//! │ 4B       │ 4B     │ 4B      │ 4B       │ 2B      │ 2B       │ 4B       │ 16B         │
//! └──────────┴────────┴─────────┴──────────┴─────────┴──────────┴──────────┴─────────────┘
//! ```
//!
//! # Data (gateway → tag, 40 bytes)
//! ```text
//! ┌──────────┬────────┬───────┬─────────────┐
//! │ IMAGE ID │ OFFSET │ FLAGS │ PAYLOAD     │
//! │ 4B       │ 2B     │ 2B    │ 32B         │
//! └──────────┴────────┴───────┴─────────────┘
//! ```
//!
//! Chunk map bit `i` lives in byte `i / 8` under mask `1 << (i % 8)` and
//! is set once chunk `i` is stored on the tag.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod data;
pub mod hello;
pub mod wire;

pub use data::{DataFlags, DataMessage, DATA_LEN};
pub use hello::{Hello, HELLO_LEN};
pub use wire::WireError;

/// Bytes of image payload carried by one Data record
pub const CHUNK_SIZE: usize = 32;

/// Bytes of chunk map carried by one Hello record
pub const MAP_BYTES: usize = 16;

/// Largest number of chunks one image can be split into
pub const MAX_CHUNKS: usize = MAP_BYTES * 8;

/// Largest packet the transceiver FIFO can hold
pub const MAX_PACKET_LEN: usize = 64;
