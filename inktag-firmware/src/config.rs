//! Build-time provisioning
//!
//! `provision.rs` is generated by build.rs from tag.toml.

use inktag_core::config::{RadioConfig, StoreConfig, SyncConfig, TagConfig, TagIdentity};
use inktag_core::traits::RadioAddress;

mod provision {
    include!(concat!(env!("OUT_DIR"), "/provision.rs"));
}

/// Tag configuration from provisioned values, defaults elsewhere
pub fn tag_config() -> TagConfig {
    TagConfig {
        identity: TagIdentity {
            tag_type: provision::TAG_TYPE,
            tag_id: provision::TAG_ID,
            firmware_hash: provision::FIRMWARE_HASH,
            install_time: provision::INSTALL_TIME,
        },
        radio: RadioConfig {
            channel: provision::CHANNEL,
            ..RadioConfig::default()
        },
        sync: SyncConfig {
            gateway: RadioAddress(provision::GATEWAY_ID),
            rx_timeout: provision::RX_TIMEOUT,
            max_rounds_per_wake: provision::MAX_ROUNDS_PER_WAKE,
            tick_interval_ms: provision::TICK_INTERVAL_MS,
            checkin_interval_ticks: provision::CHECKIN_INTERVAL_TICKS,
            incomplete_interval_ticks: provision::INCOMPLETE_INTERVAL_TICKS,
        },
        store: StoreConfig {
            flash_base: provision::FLASH_BASE,
            chunk_count: provision::CHUNK_COUNT,
        },
    }
}
