//! In-memory doubles for host-side tests
//!
//! [`MemFlash`] behaves like a small NOR device, including the ability to
//! "lose power" after a given number of program operations so callers can
//! check what survives an interrupted update.

use crate::flash::{FlashError, SerialFlash};

/// Sector size used by [`MemFlash`]
pub const MEM_FLASH_SECTOR: u32 = 4096;

/// RAM-backed NOR flash
pub struct MemFlash<const SIZE: usize> {
    data: [u8; SIZE],
    writes: u32,
    erases: u32,
    bytes_written: u32,
    power_cut_after: Option<u32>,
}

impl<const SIZE: usize> Default for MemFlash<SIZE> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const SIZE: usize> MemFlash<SIZE> {
    /// Create a fully erased device
    pub fn new() -> Self {
        Self {
            data: [0xFF; SIZE],
            writes: 0,
            erases: 0,
            bytes_written: 0,
            power_cut_after: None,
        }
    }

    /// Fail every program and erase once `ops` more programs have succeeded
    pub fn cut_power_after(&mut self, ops: u32) {
        self.power_cut_after = Some(self.writes + ops);
    }

    /// Restore power
    pub fn restore_power(&mut self) {
        self.power_cut_after = None;
    }

    /// Number of successful program operations
    pub fn write_count(&self) -> u32 {
        self.writes
    }

    /// Number of successful sector erases
    pub fn erase_count(&self) -> u32 {
        self.erases
    }

    /// Total bytes programmed
    pub fn bytes_written(&self) -> u32 {
        self.bytes_written
    }

    /// Raw contents
    pub fn contents(&self) -> &[u8] {
        &self.data
    }

    fn powered(&self) -> bool {
        match self.power_cut_after {
            Some(limit) => self.writes < limit,
            None => true,
        }
    }

    fn range(&self, addr: u32, len: usize) -> Result<core::ops::Range<usize>, FlashError> {
        let start = addr as usize;
        let end = start.checked_add(len).ok_or(FlashError::OutOfRange)?;
        if end > SIZE {
            return Err(FlashError::OutOfRange);
        }
        Ok(start..end)
    }
}

impl<const SIZE: usize> SerialFlash for MemFlash<SIZE> {
    fn read(&mut self, addr: u32, buf: &mut [u8]) -> Result<(), FlashError> {
        let range = self.range(addr, buf.len())?;
        buf.copy_from_slice(&self.data[range]);
        Ok(())
    }

    fn write(&mut self, addr: u32, data: &[u8]) -> Result<(), FlashError> {
        let range = self.range(addr, data.len())?;
        if !self.powered() {
            return Err(FlashError::Bus);
        }
        for (cell, &byte) in self.data[range].iter_mut().zip(data) {
            *cell &= byte;
        }
        self.writes += 1;
        self.bytes_written += data.len() as u32;
        Ok(())
    }

    fn erase(&mut self, addr: u32) -> Result<(), FlashError> {
        let start = (addr - addr % MEM_FLASH_SECTOR) as usize;
        let range = self.range(start as u32, MEM_FLASH_SECTOR as usize)?;
        if !self.powered() {
            return Err(FlashError::Bus);
        }
        self.data[range].fill(0xFF);
        self.erases += 1;
        Ok(())
    }

    fn sector_size(&self) -> u32 {
        MEM_FLASH_SECTOR
    }

    fn capacity(&self) -> u32 {
        SIZE as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_program_only_clears_bits() {
        let mut flash = MemFlash::<8192>::new();
        flash.write(10, &[0xF0]).unwrap();
        flash.write(10, &[0x3C]).unwrap();

        let mut buf = [0u8; 1];
        flash.read(10, &mut buf).unwrap();
        assert_eq!(buf[0], 0x30);
    }

    #[test]
    fn test_erase_restores_sector() {
        let mut flash = MemFlash::<8192>::new();
        flash.write(4100, &[0x00, 0x00]).unwrap();
        flash.write(10, &[0x00]).unwrap();
        flash.erase(5000).unwrap();

        assert_eq!(flash.contents()[4100], 0xFF);
        // Other sector untouched
        assert_eq!(flash.contents()[10], 0x00);
        assert_eq!(flash.erase_count(), 1);
    }

    #[test]
    fn test_power_cut() {
        let mut flash = MemFlash::<4096>::new();
        flash.cut_power_after(1);
        assert!(flash.write(0, &[0x00]).is_ok());
        assert_eq!(flash.write(1, &[0x00]), Err(FlashError::Bus));
        assert_eq!(flash.erase(0), Err(FlashError::Bus));
        assert_eq!(flash.contents()[1], 0xFF);

        flash.restore_power();
        assert!(flash.write(1, &[0x00]).is_ok());
    }

    #[test]
    fn test_out_of_range() {
        let mut flash = MemFlash::<4096>::new();
        let mut buf = [0u8; 4];
        assert_eq!(flash.read(4094, &mut buf), Err(FlashError::OutOfRange));
        assert_eq!(flash.erase(4096), Err(FlashError::OutOfRange));
    }
}
