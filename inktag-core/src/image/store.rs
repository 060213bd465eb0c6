//! Image store
//!
//! Owns the flash device and keeps an in-RAM copy of the header. Every
//! mutation reaches flash before the RAM copy changes, so the RAM state
//! never claims more than a reboot would find.

use inktag_hal::{FlashError, SerialFlash};
use inktag_protocol::CHUNK_SIZE;

use super::chunk_map::{ChunkIndex, ChunkMap};
use super::layout::{FlashLayout, HeaderStatus, HEADER_LEN};
use crate::config::StoreConfig;
use crate::traits::CompletedImage;

/// Errors from the image store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StoreError {
    /// Underlying flash operation failed
    Flash(FlashError),
    /// Offset not chunk-aligned or past the tracked chunks
    InvalidOffset,
    /// Record base is not on a sector boundary of the device
    Misaligned,
    /// Record does not fit on the device
    TooLarge,
}

impl From<FlashError> for StoreError {
    fn from(e: FlashError) -> Self {
        StoreError::Flash(e)
    }
}

/// Result of applying one chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ApplyOutcome {
    /// Chunk written and its map bit persisted
    Stored {
        index: ChunkIndex,
        /// This chunk was the last one missing
        complete: bool,
    },
    /// Chunk already held; payload discarded
    Duplicate { index: ChunkIndex },
}

/// Persistent store for the current image
pub struct ImageStore<F> {
    flash: F,
    layout: FlashLayout,
    image_id: u32,
    status: HeaderStatus,
    map: ChunkMap,
}

impl<F: SerialFlash> ImageStore<F> {
    /// Read the record header from flash
    pub fn load(mut flash: F, config: &StoreConfig) -> Result<Self, StoreError> {
        let layout = FlashLayout::new(config.flash_base, config.chunk_count);
        if layout.base() % flash.sector_size() != 0 {
            return Err(StoreError::Misaligned);
        }
        if layout.record_range().end > flash.capacity() {
            return Err(StoreError::TooLarge);
        }

        let mut raw = [0u8; HEADER_LEN as usize];
        flash.read(layout.base(), &mut raw)?;
        let header = layout.decode_header(&raw);

        Ok(Self {
            flash,
            layout,
            image_id: header.image_id,
            status: header.status,
            map: header.map,
        })
    }

    /// Id of the stored image (0 = none)
    pub fn image_id(&self) -> u32 {
        self.image_id
    }

    pub fn chunk_map(&self) -> &ChunkMap {
        &self.map
    }

    pub fn layout(&self) -> &FlashLayout {
        &self.layout
    }

    /// Check whether every tracked chunk is stored
    pub fn is_complete(&self) -> bool {
        self.map.is_full()
    }

    /// Check whether an assigned image is still missing chunks
    pub fn is_downloading(&self) -> bool {
        self.image_id != 0 && !self.is_complete()
    }

    /// Check whether the complete flag has been persisted
    pub fn is_marked_complete(&self) -> bool {
        self.status.is_complete()
    }

    /// Index for a payload offset, if it is aligned and tracked
    pub fn index_for_offset(&self, offset: u16) -> Option<ChunkIndex> {
        ChunkIndex::from_offset(offset).filter(|&i| self.map.contains(i))
    }

    /// Drop the current image and start a new, empty one
    ///
    /// The whole record is erased before the new header is written, and the
    /// id goes down before the valid flag. Power loss at any point leaves
    /// either the empty record or the new empty header, never bits from the
    /// previous image.
    pub fn reset_to(&mut self, image_id: u32) -> Result<(), StoreError> {
        self.image_id = 0;
        self.status = HeaderStatus::default();
        self.map.clear_all();

        let sector = self.flash.sector_size();
        let record = self.layout.record_range();
        let mut addr = record.start;
        while addr < record.end {
            self.flash.erase(addr)?;
            addr += sector;
        }

        self.flash
            .write(self.layout.id_addr(), &FlashLayout::encode_word(image_id))?;
        let status = HeaderStatus::default().with(HeaderStatus::VALID);
        self.flash
            .write(self.layout.status_addr(), &FlashLayout::encode_word(status.0))?;

        self.image_id = image_id;
        self.status = status;
        Ok(())
    }

    /// Store one chunk of the current image
    ///
    /// Applying the same chunk again is a no-op reported as
    /// [`ApplyOutcome::Duplicate`]. Only the single map byte that changed is
    /// written back.
    pub fn apply_chunk(
        &mut self,
        offset: u16,
        payload: &[u8; CHUNK_SIZE],
    ) -> Result<ApplyOutcome, StoreError> {
        let index = self
            .index_for_offset(offset)
            .ok_or(StoreError::InvalidOffset)?;
        if self.map.get(index) {
            return Ok(ApplyOutcome::Duplicate { index });
        }

        self.flash.write(self.layout.chunk_addr(index), payload)?;

        let mut next = self.map.clone();
        next.set(index);
        let byte = next.stored_byte(index.byte());
        self.flash.write(self.layout.map_byte_addr(index), &[byte])?;
        self.map = next;

        Ok(ApplyOutcome::Stored {
            index,
            complete: self.map.is_full(),
        })
    }

    /// Persist the complete flag
    ///
    /// Returns `true` if the flag was newly written.
    pub fn mark_complete(&mut self) -> Result<bool, StoreError> {
        if self.status.is_complete() || !self.map.is_full() {
            return Ok(false);
        }
        let status = self.status.with(HeaderStatus::COMPLETE);
        self.flash
            .write(self.layout.status_addr(), &FlashLayout::encode_word(status.0))?;
        self.status = status;
        Ok(true)
    }

    /// Read one stored chunk
    pub fn read_chunk(
        &mut self,
        index: ChunkIndex,
        buf: &mut [u8; CHUNK_SIZE],
    ) -> Result<(), StoreError> {
        if !self.map.contains(index) {
            return Err(StoreError::InvalidOffset);
        }
        self.flash.read(self.layout.chunk_addr(index), buf)?;
        Ok(())
    }

    /// Render notification for the stored image, if it is complete
    pub fn completed_image(&self) -> Option<CompletedImage> {
        self.is_complete().then(|| CompletedImage {
            image_id: self.image_id,
            payload: self.layout.payload_range(),
        })
    }

    pub fn flash_mut(&mut self) -> &mut F {
        &mut self.flash
    }

    /// Give the flash device back
    pub fn release(self) -> F {
        self.flash
    }
}
