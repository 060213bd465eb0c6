//! Completeness bitmap
//!
//! Bit order: chunk `i` lives in byte `i / 8` under mask `1 << (i % 8)`,
//! so chunk 0 is the least significant bit of byte 0. A set bit means the
//! chunk has been durably stored. This is the order used on the wire; the
//! flash copy is the bitwise complement (see [`ChunkMap::to_stored`]).

use inktag_protocol::{CHUNK_SIZE, MAP_BYTES, MAX_CHUNKS};

/// Index of a chunk within the image
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChunkIndex(u16);

impl ChunkIndex {
    /// Index for a payload byte offset
    ///
    /// `None` when the offset is not chunk-aligned or lies past the largest
    /// map the wire format can carry.
    pub fn from_offset(offset: u16) -> Option<Self> {
        if offset as usize % CHUNK_SIZE != 0 {
            return None;
        }
        Self::new(offset / CHUNK_SIZE as u16)
    }

    /// Index from a raw chunk number, `None` past [`MAX_CHUNKS`]
    pub fn new(index: u16) -> Option<Self> {
        (usize::from(index) < MAX_CHUNKS).then_some(Self(index))
    }

    /// Raw chunk number
    pub fn get(self) -> u16 {
        self.0
    }

    /// Payload byte offset of the chunk
    pub fn offset(self) -> u32 {
        u32::from(self.0) * CHUNK_SIZE as u32
    }

    /// Map byte holding this chunk's bit
    pub fn byte(self) -> usize {
        usize::from(self.0 / 8)
    }

    /// Mask of this chunk's bit within [`ChunkIndex::byte`]
    pub fn mask(self) -> u8 {
        1 << (self.0 % 8)
    }
}

/// Fixed-size set of received chunks
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChunkMap {
    bits: [u8; MAP_BYTES],
    tracked: u16,
}

impl ChunkMap {
    /// Empty map tracking `tracked` chunks (clamped to [`MAX_CHUNKS`])
    pub fn new(tracked: u16) -> Self {
        Self {
            bits: [0; MAP_BYTES],
            tracked: tracked.min(MAX_CHUNKS as u16),
        }
    }

    /// Map from wire-order bytes; bits past `tracked` are dropped
    pub fn from_bytes(bits: [u8; MAP_BYTES], tracked: u16) -> Self {
        let mut map = Self::new(tracked);
        map.bits = bits;
        map.mask_untracked();
        map
    }

    /// Map from the complemented flash copy
    pub fn from_stored(stored: [u8; MAP_BYTES], tracked: u16) -> Self {
        Self::from_bytes(stored.map(|b| !b), tracked)
    }

    /// Complemented copy for flash (erased `0xFF` = nothing received)
    pub fn to_stored(&self) -> [u8; MAP_BYTES] {
        self.bits.map(|b| !b)
    }

    /// Complemented value of one map byte, as stored in flash
    pub fn stored_byte(&self, byte: usize) -> u8 {
        !self.bits[byte]
    }

    /// Wire-order bytes
    pub fn as_bytes(&self) -> &[u8; MAP_BYTES] {
        &self.bits
    }

    /// Number of chunks tracked
    pub fn tracked(&self) -> u16 {
        self.tracked
    }

    /// Check whether `index` is inside the tracked range
    pub fn contains(&self, index: ChunkIndex) -> bool {
        index.0 < self.tracked
    }

    /// Check whether a chunk has been received
    pub fn get(&self, index: ChunkIndex) -> bool {
        self.contains(index) && self.bits[index.byte()] & index.mask() != 0
    }

    /// Mark a chunk received
    ///
    /// Returns `true` if the bit was newly set. Untracked indices are
    /// ignored.
    pub fn set(&mut self, index: ChunkIndex) -> bool {
        if !self.contains(index) || self.get(index) {
            return false;
        }
        self.bits[index.byte()] |= index.mask();
        true
    }

    /// Forget every chunk
    pub fn clear_all(&mut self) {
        self.bits = [0; MAP_BYTES];
    }

    /// Check whether every tracked chunk has been received
    pub fn is_full(&self) -> bool {
        self.count() == self.tracked
    }

    /// Number of chunks received
    pub fn count(&self) -> u16 {
        self.bits.iter().map(|b| b.count_ones() as u16).sum()
    }

    /// Lowest chunk not yet received
    pub fn first_missing(&self) -> Option<ChunkIndex> {
        (0..self.tracked).map(ChunkIndex).find(|&i| !self.get(i))
    }

    fn mask_untracked(&mut self) {
        for (byte, bits) in self.bits.iter_mut().enumerate() {
            let first = byte as u16 * 8;
            if first >= self.tracked {
                *bits = 0;
            } else if first + 8 > self.tracked {
                *bits &= (1u8 << (self.tracked - first)) - 1;
            }
        }
    }
}
