//! Wake cadence policy
//!
//! The tick fires far more often than the tag needs to talk. While an image
//! is partly downloaded a round runs every `incomplete_interval` ticks;
//! otherwise, including when no image has been assigned yet, the tag only
//! checks in every `checkin_interval` ticks. The first tick after boot always
//! checks in.

use crate::config::SyncConfig;

/// Decides which ticks run a sync session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct WakeCadence {
    checkin_interval: u32,
    incomplete_interval: u32,
    last_sync: Option<u32>,
}

impl WakeCadence {
    pub fn new(config: &SyncConfig) -> Self {
        Self {
            checkin_interval: config.checkin_interval_ticks.max(1),
            incomplete_interval: config.incomplete_interval_ticks.max(1),
            last_sync: None,
        }
    }

    /// Check whether tick `now` should run a session, recording it if so
    ///
    /// Intervals are measured from the last session, so ticks coalesced
    /// while the main loop was busy do not skip a check-in.
    pub fn should_sync(&mut self, now: u32, downloading: bool) -> bool {
        let due = match self.last_sync {
            None => true,
            Some(last) => {
                let interval = if downloading {
                    self.incomplete_interval
                } else {
                    self.checkin_interval
                };
                now.wrapping_sub(last) >= interval
            }
        };
        if due {
            self.last_sync = Some(now);
        }
        due
    }
}
