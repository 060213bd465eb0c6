//! Flash layout of the image record
//!
//! ```text
//! base + 0   image id      (4, LE, complemented)
//! base + 4   status flags  (4, LE, complemented)
//! base + 8   reserved      (8)
//! base + 16  chunk map     (16, complemented)
//! base + 32  payload       (chunk_count × 32)
//! ```
//!
//! Header words are stored complemented so that an erased record reads as
//! "no image, nothing received", and every later update (a new chunk, the
//! complete flag) only clears bits.

use core::ops::Range;

use inktag_protocol::{CHUNK_SIZE, MAP_BYTES};

use super::chunk_map::{ChunkIndex, ChunkMap};

/// Header length, also the payload offset
pub const HEADER_LEN: u32 = 32;

const ID_OFFSET: u32 = 0;
const STATUS_OFFSET: u32 = 4;
const MAP_OFFSET: u32 = 16;

/// Header status flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct HeaderStatus(pub u32);

impl HeaderStatus {
    /// Header was written for the stored id
    pub const VALID: u32 = 1 << 0;
    /// Every tracked chunk has been stored
    pub const COMPLETE: u32 = 1 << 1;

    pub fn is_valid(self) -> bool {
        self.0 & Self::VALID != 0
    }

    pub fn is_complete(self) -> bool {
        self.0 & Self::COMPLETE != 0
    }

    pub fn with(self, flag: u32) -> Self {
        Self(self.0 | flag)
    }
}

/// Decoded image record header
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StoredHeader {
    pub image_id: u32,
    pub status: HeaderStatus,
    pub map: ChunkMap,
}

impl StoredHeader {
    /// Header for "no image"
    pub fn empty(tracked: u16) -> Self {
        Self {
            image_id: 0,
            status: HeaderStatus::default(),
            map: ChunkMap::new(tracked),
        }
    }
}

/// Addresses of one image record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FlashLayout {
    base: u32,
    chunk_count: u16,
}

impl FlashLayout {
    pub fn new(base: u32, chunk_count: u16) -> Self {
        Self { base, chunk_count }
    }

    pub fn base(&self) -> u32 {
        self.base
    }

    pub fn chunk_count(&self) -> u16 {
        self.chunk_count
    }

    pub fn id_addr(&self) -> u32 {
        self.base + ID_OFFSET
    }

    pub fn status_addr(&self) -> u32 {
        self.base + STATUS_OFFSET
    }

    /// Address of the map byte holding `index`
    pub fn map_byte_addr(&self, index: ChunkIndex) -> u32 {
        self.base + MAP_OFFSET + index.byte() as u32
    }

    /// Address of chunk `index` in the payload region
    pub fn chunk_addr(&self, index: ChunkIndex) -> u32 {
        self.base + HEADER_LEN + index.offset()
    }

    /// Payload region
    pub fn payload_range(&self) -> Range<u32> {
        let start = self.base + HEADER_LEN;
        start..start + u32::from(self.chunk_count) * CHUNK_SIZE as u32
    }

    /// Whole record, header included
    pub fn record_range(&self) -> Range<u32> {
        self.base..self.payload_range().end
    }

    /// Decode a raw header read from flash
    ///
    /// A header without the valid flag (erased, or never finished) decodes
    /// as the empty record.
    pub fn decode_header(&self, raw: &[u8; HEADER_LEN as usize]) -> StoredHeader {
        let word = |at: u32| {
            let at = at as usize;
            !u32::from_le_bytes([raw[at], raw[at + 1], raw[at + 2], raw[at + 3]])
        };
        let status = HeaderStatus(word(STATUS_OFFSET));
        if !status.is_valid() {
            return StoredHeader::empty(self.chunk_count);
        }

        let mut stored_map = [0u8; MAP_BYTES];
        let map_at = MAP_OFFSET as usize;
        stored_map.copy_from_slice(&raw[map_at..map_at + MAP_BYTES]);

        StoredHeader {
            image_id: word(ID_OFFSET),
            status,
            map: ChunkMap::from_stored(stored_map, self.chunk_count),
        }
    }

    /// Stored form of a header word
    pub fn encode_word(value: u32) -> [u8; 4] {
        (!value).to_le_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_addresses() {
        let layout = FlashLayout::new(0x1000, 125);
        let third = ChunkIndex::new(2).unwrap();
        let ninth = ChunkIndex::new(8).unwrap();

        assert_eq!(layout.id_addr(), 0x1000);
        assert_eq!(layout.status_addr(), 0x1004);
        assert_eq!(layout.map_byte_addr(third), 0x1010);
        assert_eq!(layout.map_byte_addr(ninth), 0x1011);
        assert_eq!(layout.chunk_addr(third), 0x1000 + 32 + 64);
        assert_eq!(layout.payload_range(), 0x1020..0x1020 + 4000);
        assert_eq!(layout.record_range(), 0x1000..0x1020 + 4000);
    }

    #[test]
    fn test_erased_header_is_empty() {
        let layout = FlashLayout::new(0, 125);
        let header = layout.decode_header(&[0xFF; 32]);
        assert_eq!(header, StoredHeader::empty(125));
    }

    #[test]
    fn test_header_without_valid_flag_is_empty() {
        let layout = FlashLayout::new(0, 125);
        let mut raw = [0xFF; 32];
        raw[0..4].copy_from_slice(&FlashLayout::encode_word(42));
        let header = layout.decode_header(&raw);
        assert_eq!(header.image_id, 0);
    }

    #[test]
    fn test_decode_valid_header() {
        let layout = FlashLayout::new(0, 125);
        let mut raw = [0xFF; 32];
        raw[0..4].copy_from_slice(&FlashLayout::encode_word(9));
        raw[4..8].copy_from_slice(&FlashLayout::encode_word(HeaderStatus::VALID));
        raw[16] = !0b0000_0101;

        let header = layout.decode_header(&raw);
        assert_eq!(header.image_id, 9);
        assert!(header.status.is_valid());
        assert!(!header.status.is_complete());
        assert_eq!(header.map.count(), 2);
        assert!(header.map.get(ChunkIndex::new(2).unwrap()));
    }

    #[test]
    fn test_complete_flag_only_clears_bits() {
        let valid = FlashLayout::encode_word(HeaderStatus::VALID);
        let complete =
            FlashLayout::encode_word(HeaderStatus(HeaderStatus::VALID).with(HeaderStatus::COMPLETE).0);
        for (before, after) in valid.iter().zip(complete.iter()) {
            assert_eq!(before & after, *after);
        }
    }
}
