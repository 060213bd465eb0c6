//! Wake tick
//!
//! The only timer the tag keeps. Each tick bumps the shared counter and
//! wakes the sync loop; ticks that arrive while a session is running
//! coalesce in the signal, the counter still records them.

use defmt::*;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use embassy_time::{Duration, Ticker};
use inktag_core::tick::TickCounter;

/// Ticks since boot
pub static TICKS: TickCounter = TickCounter::new();

/// Signal carrying the tick count to the sync loop
pub static TICK_SIGNAL: Signal<CriticalSectionRawMutex, u32> = Signal::new();

/// Tick task - counts and signals every `interval_ms`
#[embassy_executor::task]
pub async fn tick_task(interval_ms: u32) {
    info!("Tick task started ({} ms)", interval_ms);

    let mut ticker = Ticker::every(Duration::from_millis(interval_ms as u64));

    loop {
        ticker.next().await;
        let now = TICKS.increment();
        TICK_SIGNAL.signal(now);
    }
}
