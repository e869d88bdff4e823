//! Screen tracker — load/unload bookkeeping for live screens.
//!
//! Screens are reported by the dashboard page, independently of the
//! simulated tabs. Records persist until an explicit reset.

use std::collections::HashMap;
use tokio::time::Instant;
use tracing::debug;

use crate::types::{iso_clock, ScreenAction, ScreenRecord, ScreenStatus};

struct TrackedScreen {
    record: ScreenRecord,
    loaded_at: Instant,
}

#[derive(Default)]
pub struct ScreenTracker {
    active: u32,
    screens: HashMap<String, TrackedScreen>,
}

impl ScreenTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a load/unload report and return the active-screen count.
    pub fn record(&mut self, action: &ScreenAction, screen_id: &str) -> u32 {
        match action {
            ScreenAction::Load => {
                self.active += 1;
                self.screens.insert(
                    screen_id.to_string(),
                    TrackedScreen {
                        record: ScreenRecord {
                            screen_id: screen_id.to_string(),
                            start_time: iso_clock(),
                            status: ScreenStatus::Watching,
                            watch_time: None,
                        },
                        loaded_at: Instant::now(),
                    },
                );
                debug!(screen_id, active = self.active, "Screen loaded");
            }
            ScreenAction::Unload => {
                self.active = self.active.saturating_sub(1);
                if let Some(screen) = self.screens.get_mut(screen_id) {
                    let elapsed = screen.loaded_at.elapsed().as_secs_f64();
                    screen.record.watch_time = Some(elapsed);
                    screen.record.status = ScreenStatus::Completed;
                    debug!(screen_id, watch_time = elapsed, "Screen unloaded");
                }
            }
            ScreenAction::Other(raw) => {
                debug!(screen_id, action = %raw, "Ignoring unknown screen action");
            }
        }
        self.active
    }

    pub fn active(&self) -> u32 {
        self.active
    }

    /// Zero the active counter without touching recorded screens.
    pub fn clear_active(&mut self) {
        self.active = 0;
    }

    #[cfg(test)]
    pub fn get(&self, screen_id: &str) -> Option<&ScreenRecord> {
        self.screens.get(screen_id).map(|s| &s.record)
    }

    /// All records, ordered by screen id.
    pub fn records(&self) -> Vec<ScreenRecord> {
        let mut records: Vec<ScreenRecord> =
            self.screens.values().map(|s| s.record.clone()).collect();
        records.sort_by(|a, b| a.screen_id.cmp(&b.screen_id));
        records
    }

    pub fn clear(&mut self) {
        self.active = 0;
        self.screens.clear();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
