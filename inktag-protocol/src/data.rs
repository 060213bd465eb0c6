//! Data record, sent by the gateway in reply to a Hello

use crate::wire::{Reader, WireError, Writer};
use crate::CHUNK_SIZE;

/// Encoded Data length in bytes
pub const DATA_LEN: usize = 4 + 2 + 2 + CHUNK_SIZE;

/// Status flags carried by a Data record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DataFlags(pub u16);

impl DataFlags {
    /// Tag already holds the gateway's image; no payload follows
    pub const SYNCED: u16 = 1 << 0;

    /// Flags for an ordinary chunk reply
    pub const fn none() -> Self {
        Self(0)
    }

    /// Flags for a "nothing to do" reply
    pub const fn synced() -> Self {
        Self(Self::SYNCED)
    }

    /// Check whether the gateway reports the tag as fully synced
    pub fn is_synced(self) -> bool {
        self.0 & Self::SYNCED != 0
    }
}

/// One chunk of image payload, or a bare "synced" notice
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DataMessage {
    /// Image the chunk belongs to
    pub image_id: u32,
    /// Byte offset of the chunk within the image, a multiple of [`CHUNK_SIZE`]
    pub offset: u16,
    /// Status flags
    pub flags: DataFlags,
    /// Chunk payload (ignored when [`DataFlags::SYNCED`] is set)
    pub payload: [u8; CHUNK_SIZE],
}

impl DataMessage {
    /// Build a chunk reply
    pub fn chunk(image_id: u32, offset: u16, payload: [u8; CHUNK_SIZE]) -> Self {
        Self {
            image_id,
            offset,
            flags: DataFlags::none(),
            payload,
        }
    }

    /// Build a "you are synced" reply
    pub fn synced(image_id: u32) -> Self {
        Self {
            image_id,
            offset: 0,
            flags: DataFlags::synced(),
            payload: [0u8; CHUNK_SIZE],
        }
    }

    /// Decode a received packet
    ///
    /// Bytes past [`DATA_LEN`] (FIFO padding) are ignored.
    pub fn decode(buf: &[u8]) -> Result<Self, WireError> {
        let mut r = Reader::new(buf, DATA_LEN)?;
        let image_id = r.u32();
        let offset = r.u16();
        let flags = DataFlags(r.u16());
        let payload = r.array();
        Ok(Self {
            image_id,
            offset,
            flags,
            payload,
        })
    }

    /// Encode into `buf` (gateway side, tests)
    pub fn encode(&self, buf: &mut [u8]) -> Result<usize, WireError> {
        let mut w = Writer::new(buf, DATA_LEN)?;
        w.u32(self.image_id);
        w.u16(self.offset);
        w.u16(self.flags.0);
        w.bytes(&self.payload);
        Ok(w.finish())
    }
}
