//! Serial flash abstractions
//!
//! The tag keeps its image in an external SPI NOR flash. NOR semantics
//! apply: an erase sets every byte of a sector to `0xFF`, and programming
//! can only clear bits. A write must therefore only target bytes erased
//! since they were last programmed, or bytes whose new value clears bits
//! of the old one.

/// Errors from flash operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FlashError {
    /// Address range lies outside the device
    OutOfRange,
    /// Write-in-progress flag never cleared within its poll bound
    Timeout,
    /// Transfer on the underlying bus failed
    Bus,
}

/// External serial NOR flash
///
/// Implementations poll the device busy flag to completion inside
/// [`write`](Self::write) and [`erase`](Self::erase); callers never see a
/// busy device.
pub trait SerialFlash {
    /// Read `buf.len()` bytes starting at `addr`
    fn read(&mut self, addr: u32, buf: &mut [u8]) -> Result<(), FlashError>;

    /// Program `data` starting at `addr`
    ///
    /// The range must have been erased (see module docs).
    fn write(&mut self, addr: u32, data: &[u8]) -> Result<(), FlashError>;

    /// Erase the whole sector containing `addr`
    fn erase(&mut self, addr: u32) -> Result<(), FlashError>;

    /// Size of one erase sector in bytes
    fn sector_size(&self) -> u32;

    /// Total device capacity in bytes
    fn capacity(&self) -> u32;
}
