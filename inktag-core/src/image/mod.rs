//! Persistent image record
//!
//! One image lives in flash at a time: a 32-byte header (id, status,
//! completeness map) followed by the payload, chunk after chunk.

pub mod chunk_map;
pub mod layout;
pub mod store;

pub use chunk_map::{ChunkIndex, ChunkMap};
pub use layout::{FlashLayout, HeaderStatus, StoredHeader, HEADER_LEN};
pub use store::{ApplyOutcome, ImageStore, StoreError};
