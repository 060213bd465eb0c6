//! Inktag - E-Paper Price Tag Firmware
//!
//! Main firmware binary for RP2040-based tags. The tag sleeps between
//! ticks; on the ticks the cadence selects it announces its image state to
//! the gateway, stores the chunks sent back, and redraws the panel when an
//! image completes.

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::adc::{Adc, Channel};
use embassy_rp::gpio::{Flex, Input, Level, Output, Pull};
use embassy_rp::spi::{self, Spi};
use embassy_time::{Delay, Timer};
use {defmt_rtt as _, panic_probe as _};

use inktag_core::image::ImageStore;
use inktag_core::sync::{RoundOutcome, SessionReport, SyncEngine, WakeCadence};
use inktag_drivers::radio::{A7106Config, A7106};
use inktag_drivers::render::PanelRenderer;
use inktag_hal::BitBangBus;
use inktag_hal_rp2040::{AdcBattery, RpFlex, RpInput, RpOutput, SpiNorFlash};

use crate::epd::{Epd, EpdPins};
use crate::tasks::TICK_SIGNAL;

mod config;
mod epd;
mod tasks;

/// Serial flash size (8Mbit part)
const FLASH_CAPACITY: u32 = 1024 * 1024;

/// Serial flash SPI clock
const FLASH_SPI_HZ: u32 = 8_000_000;

/// Battery divider ratio, 1M over 1M
const BATTERY_DIVIDER: (u32, u32) = (2, 1);

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Inktag firmware starting...");

    let p = embassy_rp::init(Default::default());
    info!("Peripherals initialized");

    let config = config::tag_config();
    if let Err(e) = config.validate() {
        error!("Provisioned configuration invalid: {:?}", e);
        park().await;
    }
    info!(
        "Tag {=u32:x} fw {=u32:x}, gateway {=u32:x}, {} kHz",
        config.identity.tag_id,
        config.identity.firmware_hash,
        config.sync.gateway.0,
        config.radio.frequency_khz()
    );

    // Radio: three-wire bus on GPIO5 (CS), GPIO6 (SCK), GPIO7 (SDIO);
    // GIO2 carries WTR on GPIO8
    let bus = BitBangBus::new(
        RpOutput(Output::new(p.PIN_5, Level::High)),
        RpOutput(Output::new(p.PIN_6, Level::Low)),
        RpFlex(Flex::new(p.PIN_7)),
    );
    let wtr = RpInput(Input::new(p.PIN_8, Pull::Down));
    let mut radio = A7106::new(bus, wtr, Delay, A7106Config::from(&config.radio));

    // Serial flash on SPI0: SCK GPIO18, MOSI GPIO19, MISO GPIO16, CS GPIO17
    let mut spi_config = spi::Config::default();
    spi_config.frequency = FLASH_SPI_HZ;
    let spi = Spi::new_blocking(p.SPI0, p.PIN_18, p.PIN_19, p.PIN_16, spi_config);
    let mut flash = SpiNorFlash::new(spi, Output::new(p.PIN_17, Level::High), FLASH_CAPACITY);
    if let Err(e) = flash.wake() {
        warn!("Flash wake failed: {:?}", e);
    }

    let store = match ImageStore::load(flash, &config.store) {
        Ok(store) => store,
        Err(e) => {
            error!("Image store unavailable: {:?}", e);
            park().await
        }
    };
    info!(
        "Stored image {}: {}/{} chunks",
        store.image_id(),
        store.chunk_map().count(),
        store.chunk_map().tracked()
    );

    // Battery through a divider on GPIO26 (ADC0)
    let adc = Adc::new_blocking(p.ADC, Default::default());
    let battery_channel = Channel::new_pin(p.PIN_26, Pull::None);
    let mut battery = AdcBattery::new(adc, battery_channel, BATTERY_DIVIDER);

    // Panel: bit-banged SPI on GPIO11-15, BUSY on GPIO9, supply switch on GPIO10
    let panel = Epd::new(
        EpdPins {
            power: RpOutput(Output::new(p.PIN_10, Level::High)),
            cs: RpOutput(Output::new(p.PIN_11, Level::High)),
            dc: RpOutput(Output::new(p.PIN_12, Level::High)),
            reset: RpOutput(Output::new(p.PIN_13, Level::High)),
            sck: RpOutput(Output::new(p.PIN_14, Level::Low)),
            mosi: RpOutput(Output::new(p.PIN_15, Level::Low)),
            busy: RpInput(Input::new(p.PIN_9, Pull::None)),
        },
        Delay,
    );
    let mut renderer = PanelRenderer::new(panel);

    let mut engine = SyncEngine::new(config.identity, config.sync, store);

    match engine.render_stored(&mut renderer) {
        Ok(true) => info!("Drew stored image {}", engine.store().image_id()),
        Ok(false) => info!("No complete image stored"),
        Err(e) => warn!("Boot render failed: {:?}", e),
    }

    // A radio that fails init stays untouched until the next reset
    let radio_ready = match radio.init() {
        Ok(()) => {
            info!("Radio ready on channel {}", config.radio.channel);
            true
        }
        Err(e) => {
            error!(
                "Radio init failed: {:?} ({} calibration failures)",
                e,
                radio.stats().calibration_failures
            );
            false
        }
    };

    if let Err(e) = engine.store_mut().flash_mut().power_down() {
        warn!("Flash power-down failed: {:?}", e);
    }

    spawner
        .spawn(tasks::tick_task(config.sync.tick_interval_ms))
        .unwrap();

    info!("Tick task spawned, entering sync loop");

    let mut cadence = WakeCadence::new(&config.sync);
    loop {
        let now = TICK_SIGNAL.wait().await;

        if !radio_ready {
            trace!("Tick {}: radio unusable", now);
            continue;
        }
        if !cadence.should_sync(now, engine.store().is_downloading()) {
            continue;
        }

        if let Err(e) = engine.store_mut().flash_mut().wake() {
            warn!("Flash wake failed: {:?}", e);
            continue;
        }

        match engine.run_session(&mut radio, &mut battery, &mut renderer) {
            Ok(report) => log_session(now, &report),
            Err(e) => warn!("Tick {}: session aborted: {:?}", now, e),
        }
        trace!("Radio stats: {:?}", radio.stats());

        if let Err(e) = engine.store_mut().flash_mut().power_down() {
            warn!("Flash power-down failed: {:?}", e);
        }
    }
}

/// Log a session at the level its outcome deserves
fn log_session(now: u32, report: &SessionReport) {
    if let Some(image_id) = report.adopted_image {
        info!("Adopted image {}", image_id);
    }

    if let Some(RoundOutcome::Completed {
        persist_error: Some(e),
        ..
    }) = report.last
    {
        warn!("Complete flag not persisted: {:?}", e);
    }

    match report.last {
        Some(RoundOutcome::Completed {
            image_id,
            render_error: None,
            ..
        }) => info!("Image {} complete, panel updated", image_id),
        Some(RoundOutcome::Completed {
            image_id,
            render_error: Some(e),
            ..
        }) => warn!("Image {} complete, render failed: {:?}", image_id, e),
        Some(RoundOutcome::TransmitFailed) => warn!("Tick {}: hello not sent", now),
        Some(RoundOutcome::Corrupted) => warn!("Tick {}: corrupted reply", now),
        Some(RoundOutcome::Rejected { image_id, offset }) => {
            warn!("Tick {}: rejected offset {} for image {}", now, offset, image_id)
        }
        _ => {}
    }

    debug!(
        "Tick {}: {} rounds, {} stored, {} duplicates, round limit {}",
        now, report.rounds, report.chunks_stored, report.duplicates, report.hit_round_limit
    );
}

/// Idle forever; used when the tag cannot do anything useful until reset
async fn park() -> ! {
    loop {
        Timer::after_secs(3600).await;
    }
}
