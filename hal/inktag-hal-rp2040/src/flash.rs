//! SPI NOR serial flash driver
//!
//! Standard 25-series command set: 3-byte addresses, 256-byte program
//! pages, 4KB sector erase. Program and erase poll the status register's
//! write-in-progress bit to completion before returning, so callers never
//! see a busy device.

use embedded_hal::digital::OutputPin;
use embedded_hal::spi::SpiBus;
use inktag_core::poll::{try_poll_until, PollError};
use inktag_hal::{FlashError, SerialFlash};

/// Flash commands
mod cmd {
    pub const READ: u8 = 0x03;
    pub const PAGE_PROGRAM: u8 = 0x02;
    pub const WRITE_ENABLE: u8 = 0x06;
    pub const READ_STATUS: u8 = 0x05;
    pub const SECTOR_ERASE: u8 = 0x20;
    pub const POWER_DOWN: u8 = 0xB9;
    pub const RELEASE_POWER_DOWN: u8 = 0xAB;
}

/// Status register: write in progress
const STATUS_WIP: u8 = 0x01;

/// Program page size
pub const PAGE_SIZE: u32 = 256;

/// Erase sector size
pub const SECTOR_SIZE: u32 = 4096;

/// Status polls allowed for a page program or sector erase
///
/// A sector erase takes up to ~400ms; at the SPI rates used here one status
/// poll is a few µs.
const BUSY_POLL_LIMIT: u32 = 500_000;

/// SPI NOR flash on a dedicated chip select
pub struct SpiNorFlash<SPI, CS> {
    spi: SPI,
    cs: CS,
    capacity: u32,
}

impl<SPI, CS> SpiNorFlash<SPI, CS>
where
    SPI: SpiBus,
    CS: OutputPin,
{
    /// Create a driver for a device of `capacity` bytes
    pub fn new(spi: SPI, mut cs: CS, capacity: u32) -> Self {
        let _ = cs.set_high();
        Self { spi, cs, capacity }
    }

    /// Wake the device from deep power-down
    pub fn wake(&mut self) -> Result<(), FlashError> {
        self.transaction(&[cmd::RELEASE_POWER_DOWN], |_| Ok(()))
    }

    /// Enter deep power-down
    pub fn power_down(&mut self) -> Result<(), FlashError> {
        self.transaction(&[cmd::POWER_DOWN], |_| Ok(()))
    }

    /// Run one chip-select framed transaction
    fn transaction<F>(&mut self, header: &[u8], body: F) -> Result<(), FlashError>
    where
        F: FnOnce(&mut SPI) -> Result<(), SPI::Error>,
    {
        self.cs.set_low().map_err(|_| FlashError::Bus)?;
        let result = self
            .spi
            .write(header)
            .and_then(|()| body(&mut self.spi))
            .and_then(|()| self.spi.flush());
        let released = self.cs.set_high();
        result.map_err(|_| FlashError::Bus)?;
        released.map_err(|_| FlashError::Bus)
    }

    fn read_status(&mut self) -> Result<u8, FlashError> {
        let mut status = [0u8; 1];
        self.transaction(&[cmd::READ_STATUS], |spi| spi.read(&mut status))?;
        Ok(status[0])
    }

    fn wait_idle(&mut self) -> Result<(), FlashError> {
        try_poll_until(BUSY_POLL_LIMIT, || {
            self.read_status().map(|s| s & STATUS_WIP == 0)
        })
        .map(|_| ())
        .map_err(|e| match e {
            PollError::Timeout => FlashError::Timeout,
            PollError::Io(e) => e,
        })
    }

    fn check_range(&self, addr: u32, len: usize) -> Result<(), FlashError> {
        let end = addr
            .checked_add(len as u32)
            .ok_or(FlashError::OutOfRange)?;
        if end > self.capacity {
            return Err(FlashError::OutOfRange);
        }
        Ok(())
    }
}

fn addressed(command: u8, addr: u32) -> [u8; 4] {
    let [_, a2, a1, a0] = addr.to_be_bytes();
    [command, a2, a1, a0]
}

impl<SPI, CS> SerialFlash for SpiNorFlash<SPI, CS>
where
    SPI: SpiBus,
    CS: OutputPin,
{
    fn read(&mut self, addr: u32, buf: &mut [u8]) -> Result<(), FlashError> {
        self.check_range(addr, buf.len())?;
        self.transaction(&addressed(cmd::READ, addr), |spi| spi.read(buf))
    }

    fn write(&mut self, addr: u32, data: &[u8]) -> Result<(), FlashError> {
        self.check_range(addr, data.len())?;

        // Programs must not cross a page boundary
        let mut addr = addr;
        let mut rest = data;
        while !rest.is_empty() {
            let room = (PAGE_SIZE - addr % PAGE_SIZE) as usize;
            let (page, tail) = rest.split_at(room.min(rest.len()));

            self.transaction(&[cmd::WRITE_ENABLE], |_| Ok(()))?;
            self.transaction(&addressed(cmd::PAGE_PROGRAM, addr), |spi| spi.write(page))?;
            self.wait_idle()?;

            addr += page.len() as u32;
            rest = tail;
        }
        Ok(())
    }

    fn erase(&mut self, addr: u32) -> Result<(), FlashError> {
        self.check_range(addr, 1)?;
        let sector = addr - addr % SECTOR_SIZE;
        self.transaction(&[cmd::WRITE_ENABLE], |_| Ok(()))?;
        self.transaction(&addressed(cmd::SECTOR_ERASE, sector), |_| Ok(()))?;
        self.wait_idle()
    }

    fn sector_size(&self) -> u32 {
        SECTOR_SIZE
    }

    fn capacity(&self) -> u32 {
        self.capacity
    }
}
