//! A7106 register map and power-on register table
//!
//! # Command byte
//!
//! ```text
//! bit 7     0 = register access, 1 = strobe
//! bit 6     1 = read, 0 = write (register access only)
//! bits 5-0  register address
//! ```
//!
//! Strobes are a single byte, the command nibble in the high bits.

/// Register addresses
pub mod reg {
    /// Mode (write = software reset, read = status)
    pub const MODE: u8 = 0x00;
    /// Mode control
    pub const MODE_CTRL: u8 = 0x01;
    /// Calibration control; enable bits read back as busy flags
    pub const CALC: u8 = 0x02;
    /// FIFO end pointer (packet length - 1)
    pub const FIFO1: u8 = 0x03;
    /// FIFO data port
    pub const FIFO_DATA: u8 = 0x05;
    /// 4-byte ID (address filter), big-endian
    pub const ID: u8 = 0x06;
    /// GIO1 pin function
    pub const GIO1: u8 = 0x0B;
    /// GIO2 pin function
    pub const GIO2: u8 = 0x0C;
    /// PLL I (channel number)
    pub const PLL1: u8 = 0x0F;
    /// IF filter bank calibration
    pub const IF_CAL: u8 = 0x22;
    /// VCO current calibration
    pub const VCO_CURRENT_CAL: u8 = 0x24;
    /// VCO single-band calibration
    pub const VCO_BAND_CAL: u8 = 0x25;
}

/// Strobe commands
pub mod strobe {
    pub const SLEEP: u8 = 0x80;
    pub const IDLE: u8 = 0x90;
    pub const STANDBY: u8 = 0xA0;
    pub const PLL: u8 = 0xB0;
    pub const RX: u8 = 0xC0;
    pub const TX: u8 = 0xD0;
    pub const FIFO_WRITE_RESET: u8 = 0xE0;
    pub const FIFO_READ_RESET: u8 = 0xF0;
}

/// Read flag in the command byte
pub const READ: u8 = 1 << 6;

/// Mask for the register address in the command byte
pub const ADDR_MASK: u8 = 0x3F;

/// MODE status: CRC error on the last packet
pub const MODE_CRC_ERROR: u8 = 1 << 5;
/// MODE status: FEC error on the last packet
pub const MODE_FEC_ERROR: u8 = 1 << 6;

/// CALC: IF filter bank calibration
pub const CALC_FBC: u8 = 1 << 0;
/// CALC: VCO current calibration
pub const CALC_VCC: u8 = 1 << 2;
/// CALC: VCO bank calibration
pub const CALC_VBC: u8 = 1 << 3;
/// CALC: every calibration busy bit
pub const CALC_BUSY_MASK: u8 = 0x0F;

/// IF_CAL: filter bank calibration failed
pub const IF_CAL_FAIL: u8 = 1 << 4;
/// VCO_CURRENT_CAL: current calibration failed
pub const VCO_CURRENT_FAIL: u8 = 1 << 4;
/// VCO_BAND_CAL: band calibration failed
pub const VCO_BAND_FAIL: u8 = 1 << 3;

/// Hardware FIFO size in bytes
pub const FIFO_LEN: usize = 64;

/// Power-on register values
///
/// 16MHz crystal, 500kbps, FIFO simple mode, FEC + CRC on, whitening off,
/// 4-byte ID and preamble. GIO1 is disabled (three-wire bus, data returns on
/// SDIO) and GIO2 outputs WTR, which is high while a TX or RX is in flight.
/// CALC, FIFO data, ID and the channel are programmed separately.
pub const INIT_TABLE: &[(u8, u8)] = &[
    (reg::MODE_CTRL, 0b0110_0010),
    (reg::FIFO1, 0x3F),
    (0x04, 0x00),
    (0x07, 0x00),
    (0x08, 0x00),
    (0x09, 0x00),
    (0x0A, 0x00),
    (reg::GIO1, 0x00),
    (reg::GIO2, 0b0000_0001),
    (0x0D, 0b0000_0101),
    (0x0E, 0x00),
    (0x10, 0b1001_1110),
    (0x11, 0x4B),
    (0x12, 0x00),
    (0x13, 0x02),
    (0x14, 0b0001_0110),
    (0x15, 0b0010_1011),
    (0x16, 0b0001_0010),
    (0x17, 0b0100_1111),
    (0x18, 0b0110_0011),
    (0x19, 0b1000_0000),
    (0x1A, 0x80),
    (0x1B, 0x00),
    (0x1C, 0b0000_1010),
    (0x1D, 0x32),
    (0x1E, 0b1100_0011),
    (0x1F, 0b0001_1111),
    (0x20, 0b0001_0110),
    (0x21, 0x00),
    (reg::IF_CAL, 0x00),
    (reg::VCO_CURRENT_CAL, 0b0001_0011),
    (0x26, 0x23),
    (0x27, 0x00),
    // TXCS=0 TBG=7 PAC=3, about +1.35dBm
    (0x28, 0b0011_0111),
    (0x29, 0b0100_0111),
    (0x2A, 0x80),
    (0x2B, 0b1101_0110),
    (0x2C, 0b0000_0001),
    (0x2D, 0b0101_0001),
    (0x2E, 0b0001_1000),
    (0x2F, 0x00),
    (0x30, 0b0000_0001),
    (0x31, 0x0F),
    // Max PA ramping
    (0x32, 0b0111_1111),
];

/// Build a register write command byte
pub const fn write_cmd(register: u8) -> u8 {
    register & ADDR_MASK
}

/// Build a register read command byte
pub const fn read_cmd(register: u8) -> u8 {
    (register & ADDR_MASK) | READ
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_bytes() {
        assert_eq!(write_cmd(reg::ID), 0x06);
        assert_eq!(read_cmd(reg::ID), 0x46);
        assert_eq!(read_cmd(reg::MODE), 0x40);
        // Strobes never look like register accesses
        for s in [strobe::SLEEP, strobe::STANDBY, strobe::TX, strobe::FIFO_READ_RESET] {
            assert_ne!(s & 0x80, 0);
        }
    }

    #[test]
    fn test_init_table_skips_runtime_registers() {
        for &(register, _) in INIT_TABLE {
            assert!(register <= 0x32);
            assert!(![reg::MODE, reg::CALC, reg::FIFO_DATA, reg::ID, reg::PLL1].contains(&register));
        }
    }
}
