//! Build script for inktag-firmware
//!
//! - Sets up linker search paths for memory.x
//! - Validates tag.toml and generates provision.rs from it

use std::env;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::{SystemTime, UNIX_EPOCH};

/// Highest RF channel inside the 2.4GHz ISM band
const MAX_CHANNEL: i64 = 166;
/// Chunks the completeness map can track
const MAX_CHUNKS: i64 = 128;
/// Serial flash sector size
const SECTOR_SIZE: i64 = 4096;

fn main() {
    setup_linker();
    let provision = validate_config();
    write_provision(&provision);
}

/// Set up linker search paths for memory.x
fn setup_linker() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());

    // Copy memory.x to the output directory
    let memory_x = include_bytes!("memory.x");
    let mut f = File::create(out_dir.join("memory.x")).unwrap();
    f.write_all(memory_x).unwrap();

    // Tell rustc where to find memory.x
    println!("cargo:rustc-link-search={}", out_dir.display());
    println!("cargo:rustc-link-arg-bins=--nmagic");
    println!("cargo:rustc-link-arg-bins=-Tlink.x");
    println!("cargo:rustc-link-arg-bins=-Tlink-rp.x");
    println!("cargo:rustc-link-arg-bins=-Tdefmt.x");

    // Re-run if memory.x changes
    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=build.rs");
}

/// Provisioned values, already range-checked
struct Provision {
    tag_type: u32,
    tag_id: u32,
    channel: u8,
    gateway_id: u32,
    rx_timeout: u32,
    max_rounds_per_wake: u16,
    tick_interval_ms: u32,
    checkin_interval_ticks: u32,
    incomplete_interval_ticks: u32,
    flash_base: u32,
    chunk_count: u16,
}

/// Validate tag.toml at compile time
fn validate_config() -> Provision {
    println!("cargo:rerun-if-changed=tag.toml");

    let config_path = Path::new("tag.toml");

    if !config_path.exists() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: tag.toml not found!                                      ║\n\
            ║                                                                  ║\n\
            ║  The firmware requires a tag.toml provisioning file.             ║\n\
            ║  Please create one in the inktag-firmware directory.             ║\n\
            ╚══════════════════════════════════════════════════════════════════╝\n"
        );
    }

    let config_content = match fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(e) => {
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Failed to read tag.toml                                  ║\n\
                ║                                                                  ║\n\
                ║  Error: {:<56} ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                e
            );
        }
    };

    let config: toml::Value = match toml::from_str(&config_content) {
        Ok(value) => value,
        Err(e) => {
            let error_msg = e.to_string();
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Invalid TOML syntax in tag.toml                          ║\n\
                ╠══════════════════════════════════════════════════════════════════╣\n\
                ║                                                                  ║\n\
                {}\n\
                ║                                                                  ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                format_error_lines(&error_msg)
            );
        }
    };

    let mut errors = Vec::new();
    let mut fields = Fields {
        config: &config,
        errors: &mut errors,
    };

    let tag_type = fields.int("identity", "tag_type", 0, u32::MAX as i64);
    let tag_id = fields.int("identity", "tag_id", 1, u32::MAX as i64);
    let channel = fields.int("radio", "channel", 0, MAX_CHANNEL);
    let gateway_id = fields.int("sync", "gateway_id", 1, u32::MAX as i64);
    let rx_timeout = fields.int("sync", "rx_timeout", 1, u32::MAX as i64);
    let max_rounds_per_wake = fields.int("sync", "max_rounds_per_wake", 1, u16::MAX as i64);
    let tick_interval_ms = fields.int("sync", "tick_interval_ms", 1, u32::MAX as i64);
    let checkin_interval_ticks = fields.int("sync", "checkin_interval_ticks", 1, u32::MAX as i64);
    let incomplete_interval_ticks =
        fields.int("sync", "incomplete_interval_ticks", 1, u32::MAX as i64);
    let flash_base = fields.int("store", "flash_base", 0, u32::MAX as i64);
    let chunk_count = fields.int("store", "chunk_count", 1, MAX_CHUNKS);

    if tag_id != 0 && tag_id == gateway_id {
        errors.push("[identity] tag_id must differ from [sync] gateway_id".to_string());
    }
    if flash_base % SECTOR_SIZE != 0 {
        errors.push(format!(
            "[store] flash_base must be {} byte aligned",
            SECTOR_SIZE
        ));
    }

    if !errors.is_empty() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: Invalid tag.toml                                         ║\n\
            ╠══════════════════════════════════════════════════════════════════╣\n\
            {}\n\
            ╚══════════════════════════════════════════════════════════════════╝\n",
            errors
                .iter()
                .map(|e| format!("║  • {:<62} ║", e))
                .collect::<Vec<_>>()
                .join("\n")
        );
    }

    println!("cargo:warning=tag.toml validated successfully");

    Provision {
        tag_type: tag_type as u32,
        tag_id: tag_id as u32,
        channel: channel as u8,
        gateway_id: gateway_id as u32,
        rx_timeout: rx_timeout as u32,
        max_rounds_per_wake: max_rounds_per_wake as u16,
        tick_interval_ms: tick_interval_ms as u32,
        checkin_interval_ticks: checkin_interval_ticks as u32,
        incomplete_interval_ticks: incomplete_interval_ticks as u32,
        flash_base: flash_base as u32,
        chunk_count: chunk_count as u16,
    }
}

/// Integer lookups that collect errors instead of stopping at the first
struct Fields<'a> {
    config: &'a toml::Value,
    errors: &'a mut Vec<String>,
}

impl Fields<'_> {
    /// Read `[section] key` as an integer in `min..=max`, 0 on error
    fn int(&mut self, section: &str, key: &str, min: i64, max: i64) -> i64 {
        let value = self.config.get(section).and_then(|s| s.get(key));
        match value {
            None => {
                self.errors
                    .push(format!("[{}] missing '{}'", section, key));
                0
            }
            Some(toml::Value::Integer(v)) if (min..=max).contains(v) => *v,
            Some(toml::Value::Integer(_)) => {
                self.errors.push(format!(
                    "[{}] {} must be {}..={}",
                    section, key, min, max
                ));
                0
            }
            Some(_) => {
                self.errors
                    .push(format!("[{}] {} must be an integer", section, key));
                0
            }
        }
    }
}

/// Format error message lines with box drawing
fn format_error_lines(msg: &str) -> String {
    msg.lines()
        .map(|line| {
            let truncated = if line.len() > 64 {
                format!("{}...", &line[..61])
            } else {
                line.to_string()
            };
            format!("║  {:<64} ║", truncated)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Short git revision as a number, 0 outside a checkout
fn firmware_hash() -> u32 {
    println!("cargo:rerun-if-changed=../.git/HEAD");

    Command::new("git")
        .args(["rev-parse", "--short=8", "HEAD"])
        .output()
        .ok()
        .filter(|out| out.status.success())
        .and_then(|out| String::from_utf8(out.stdout).ok())
        .and_then(|rev| u32::from_str_radix(rev.trim(), 16).ok())
        .unwrap_or(0)
}

/// Build time in UNIX seconds
fn install_time() -> u32 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as u32)
        .unwrap_or(0)
}

/// Write provision.rs into OUT_DIR
fn write_provision(p: &Provision) {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    let source = format!(
        "// Generated from tag.toml by build.rs\n\
         pub const TAG_TYPE: u32 = {};\n\
         pub const TAG_ID: u32 = {:#010x};\n\
         pub const FIRMWARE_HASH: u32 = {:#010x};\n\
         pub const INSTALL_TIME: u32 = {};\n\
         pub const CHANNEL: u8 = {};\n\
         pub const GATEWAY_ID: u32 = {:#010x};\n\
         pub const RX_TIMEOUT: u32 = {};\n\
         pub const MAX_ROUNDS_PER_WAKE: u16 = {};\n\
         pub const TICK_INTERVAL_MS: u32 = {};\n\
         pub const CHECKIN_INTERVAL_TICKS: u32 = {};\n\
         pub const INCOMPLETE_INTERVAL_TICKS: u32 = {};\n\
         pub const FLASH_BASE: u32 = {:#x};\n\
         pub const CHUNK_COUNT: u16 = {};\n",
        p.tag_type,
        p.tag_id,
        firmware_hash(),
        install_time(),
        p.channel,
        p.gateway_id,
        p.rx_timeout,
        p.max_rounds_per_wake,
        p.tick_interval_ms,
        p.checkin_interval_ticks,
        p.incomplete_interval_ticks,
        p.flash_base,
        p.chunk_count,
    );
    fs::write(out_dir.join("provision.rs"), source).unwrap();
}
