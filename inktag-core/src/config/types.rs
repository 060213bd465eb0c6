//! Configuration type definitions

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use inktag_protocol::MAX_CHUNKS;

use crate::traits::RadioAddress;

/// Gateway address used when none is provisioned
pub const DEFAULT_GATEWAY_ID: u32 = 0x55AB_CDEF;

/// RF channel used when none is provisioned
pub const DEFAULT_CHANNEL: u8 = 4;

/// Highest channel that stays inside the 2.4GHz ISM band
pub const MAX_CHANNEL: u8 = 166;

/// Chunks in a 128×250 1-bpp image
pub const DEFAULT_CHUNK_COUNT: u16 = 125;

/// The image record must start on a sector boundary
pub const FLASH_SECTOR_ALIGN: u32 = 4096;

/// Errors found while validating a configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Tag id is zero or equal to the gateway id
    InvalidTagId,
    /// Channel outside 0..=MAX_CHANNEL
    InvalidChannel,
    /// Chunk count is zero or above the map capacity
    InvalidChunkCount,
    /// Image record does not start on a sector boundary
    MisalignedFlashBase,
    /// A poll bound, attempt count or interval is zero
    ZeroLimit,
}

/// Identity announced in every Hello
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TagIdentity {
    /// Hardware/board type
    pub tag_type: u32,
    /// Tag id, doubles as the tag's receive address
    pub tag_id: u32,
    /// Short hash of the firmware build
    pub firmware_hash: u32,
    /// Provisioning timestamp (UNIX seconds)
    pub install_time: u32,
}

impl Default for TagIdentity {
    fn default() -> Self {
        Self {
            tag_type: 1,
            tag_id: 0x5012_3456,
            firmware_hash: 0,
            install_time: 0,
        }
    }
}

impl TagIdentity {
    /// Address the tag listens on
    pub fn address(&self) -> RadioAddress {
        RadioAddress(self.tag_id)
    }
}

/// Transceiver configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RadioConfig {
    /// RF channel (500kHz steps above 2400.001MHz)
    pub channel: u8,
    /// Calibration attempts before the radio is declared unusable
    pub calibration_attempts: u8,
    /// Polls of the calibration-busy register per attempt
    pub calibration_poll_limit: u32,
    /// Polls of the busy line before a transmit is declared timed out
    pub tx_poll_limit: u32,
    /// Settle time after leaving sleep (µs)
    pub wake_settle_us: u32,
}

impl Default for RadioConfig {
    fn default() -> Self {
        Self {
            channel: DEFAULT_CHANNEL,
            calibration_attempts: 3,
            calibration_poll_limit: 1_000,
            tx_poll_limit: 50_000,
            wake_settle_us: 2_000,
        }
    }
}

impl RadioConfig {
    /// Carrier frequency for the configured channel in kHz
    ///
    /// `2400.001MHz + 0.5MHz × channel`
    pub fn frequency_khz(&self) -> u32 {
        2_400_001 + 500 * self.channel as u32
    }
}

/// Synchronization and wake cadence configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SyncConfig {
    /// Gateway address Hellos are sent to
    pub gateway: RadioAddress,
    /// Receive budget for a reply, in busy-line polls
    pub rx_timeout: u32,
    /// Upper bound on request/reply rounds per wake
    pub max_rounds_per_wake: u16,
    /// Period of the wake tick (ms)
    pub tick_interval_ms: u32,
    /// Ticks between check-ins while the image is complete
    pub checkin_interval_ticks: u32,
    /// Ticks between rounds while the image is incomplete
    pub incomplete_interval_ticks: u32,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            gateway: RadioAddress(DEFAULT_GATEWAY_ID),
            rx_timeout: 200_000,
            max_rounds_per_wake: 160,
            tick_interval_ms: 1_000,
            checkin_interval_ticks: 600,
            incomplete_interval_ticks: 8,
        }
    }
}

/// Persistent image store configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StoreConfig {
    /// Flash address of the image record header
    pub flash_base: u32,
    /// Chunks tracked for one image
    pub chunk_count: u16,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            flash_base: 0,
            chunk_count: DEFAULT_CHUNK_COUNT,
        }
    }
}

/// Complete tag configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TagConfig {
    pub identity: TagIdentity,
    pub radio: RadioConfig,
    pub sync: SyncConfig,
    pub store: StoreConfig,
}

impl TagConfig {
    /// Check cross-field constraints
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.identity.tag_id == 0 || self.identity.tag_id == self.sync.gateway.0 {
            return Err(ConfigError::InvalidTagId);
        }
        if self.radio.channel > MAX_CHANNEL {
            return Err(ConfigError::InvalidChannel);
        }
        if self.store.chunk_count == 0 || self.store.chunk_count as usize > MAX_CHUNKS {
            return Err(ConfigError::InvalidChunkCount);
        }
        if self.store.flash_base % FLASH_SECTOR_ALIGN != 0 {
            return Err(ConfigError::MisalignedFlashBase);
        }
        let limits = [
            self.radio.calibration_attempts as u32,
            self.radio.calibration_poll_limit,
            self.radio.tx_poll_limit,
            self.sync.rx_timeout,
            self.sync.max_rounds_per_wake as u32,
            self.sync.tick_interval_ms,
            self.sync.checkin_interval_ticks,
            self.sync.incomplete_interval_ticks,
        ];
        if limits.contains(&0) {
            return Err(ConfigError::ZeroLimit);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert_eq!(TagConfig::default().validate(), Ok(()));
    }

    #[test]
    fn test_tag_id_must_differ_from_gateway() {
        let mut config = TagConfig::default();
        config.identity.tag_id = config.sync.gateway.0;
        assert_eq!(config.validate(), Err(ConfigError::InvalidTagId));

        config.identity.tag_id = 0;
        assert_eq!(config.validate(), Err(ConfigError::InvalidTagId));
    }

    #[test]
    fn test_chunk_count_bounds() {
        let mut config = TagConfig::default();
        config.store.chunk_count = 0;
        assert_eq!(config.validate(), Err(ConfigError::InvalidChunkCount));

        config.store.chunk_count = 129;
        assert_eq!(config.validate(), Err(ConfigError::InvalidChunkCount));

        config.store.chunk_count = 128;
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn test_flash_base_alignment() {
        let mut config = TagConfig::default();
        config.store.flash_base = 0x1000;
        assert_eq!(config.validate(), Ok(()));

        config.store.flash_base = 0x1020;
        assert_eq!(config.validate(), Err(ConfigError::MisalignedFlashBase));
    }

    #[test]
    fn test_zero_limits_rejected() {
        let mut config = TagConfig::default();
        config.sync.rx_timeout = 0;
        assert_eq!(config.validate(), Err(ConfigError::ZeroLimit));

        let mut config = TagConfig::default();
        config.radio.calibration_attempts = 0;
        assert_eq!(config.validate(), Err(ConfigError::ZeroLimit));
    }

    #[test]
    fn test_channel_frequency() {
        let mut radio = RadioConfig::default();
        radio.channel = 0;
        assert_eq!(radio.frequency_khz(), 2_400_001);
        radio.channel = 4;
        assert_eq!(radio.frequency_khz(), 2_402_001);
        radio.channel = MAX_CHANNEL;
        assert_eq!(radio.frequency_khz(), 2_483_001);
    }
}
