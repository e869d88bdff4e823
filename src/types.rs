//! Shared types for the VIEWDECK dashboard.
//!
//! These types form the data model used across the engine and the
//! dashboard. Field names follow the JSON contract the dashboard page
//! polls, so most of them serialize as-is.

use chrono::Local;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// `status_text` stamped on every view event.
pub const TAB_OPENED: &str = "Tab Opened";

/// Wall-clock format used for view event timestamps.
const EVENT_TIME_FORMAT: &str = "%H:%M:%S";

/// Wall-clock format used for tab and screen start stamps.
const STARTED_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

/// Current local time as shown on a view event.
pub fn event_clock() -> String {
    Local::now().format(EVENT_TIME_FORMAT).to_string()
}

/// Current local time as an ISO-8601 stamp without offset.
pub fn iso_clock() -> String {
    Local::now().format(STARTED_FORMAT).to_string()
}

// ---------------------------------------------------------------------------
// Run status
// ---------------------------------------------------------------------------

/// Overall lifecycle of the simulated session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    #[default]
    Idle,
    Running,
    Completed,
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunStatus::Idle => write!(f, "idle"),
            RunStatus::Running => write!(f, "running"),
            RunStatus::Completed => write!(f, "completed"),
        }
    }
}

// ---------------------------------------------------------------------------
// Tabs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TabStatus {
    Playing,
    Completed,
}

/// Live state of one simulated tab, resampled on every tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TabState {
    pub status: TabStatus,
    /// Seconds elapsed since the tab opened, as of the last sample.
    pub watch_time: f64,
    pub started: String,
}

impl TabState {
    pub fn opened() -> Self {
        Self {
            status: TabStatus::Playing,
            watch_time: 0.0,
            started: iso_clock(),
        }
    }

    /// Apply an elapsed-time sample against the target duration.
    ///
    /// Below target the sample is recorded; at or past target the tab
    /// completes and keeps whatever was last recorded. A completed tab
    /// ignores further samples.
    pub fn sample(&mut self, elapsed_secs: f64, target_secs: u64) {
        if self.status == TabStatus::Completed {
            return;
        }
        if elapsed_secs < target_secs as f64 {
            if elapsed_secs > self.watch_time {
                self.watch_time = elapsed_secs;
            }
        } else {
            self.status = TabStatus::Completed;
        }
    }
}

/// One entry per tab, emitted when the tab opens and never updated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewEvent {
    pub attempt: u32,
    pub status: u16,
    pub status_text: String,
    pub error: Option<String>,
    pub screen_id: String,
    /// Configured target, not live progress.
    pub watch_time: u64,
    pub timestamp: String,
}

impl ViewEvent {
    pub fn tab_opened(tab_id: u32, watch_duration: u64) -> Self {
        Self {
            attempt: tab_id,
            status: 200,
            status_text: TAB_OPENED.to_string(),
            error: None,
            screen_id: format!("Tab {tab_id}"),
            watch_time: watch_duration,
            timestamp: event_clock(),
        }
    }
}

// ---------------------------------------------------------------------------
// Session status
// ---------------------------------------------------------------------------

/// The session record polled by the dashboard.
///
/// Replaced wholesale at the start of each run and on reset; mutated in
/// place by the simulation loop in between.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionStatus {
    pub status: RunStatus,
    pub results: Vec<ViewEvent>,
    pub current: u32,
    pub total: u32,
    pub views_count: u32,
    /// Sum of configured targets of opened tabs, in seconds.
    pub total_watch_time: u64,
    pub tab_status: BTreeMap<u32, TabState>,
}

impl SessionStatus {
    /// Fresh record for a run about to open `times` tabs.
    pub fn running(times: u32) -> Self {
        Self {
            status: RunStatus::Running,
            total: times,
            ..Default::default()
        }
    }

    /// Open a tab: record its view event and initial state, bump counters.
    pub fn open_tab(&mut self, tab_id: u32, watch_duration: u64) {
        self.results.push(ViewEvent::tab_opened(tab_id, watch_duration));
        self.tab_status.insert(tab_id, TabState::opened());
        self.current += 1;
        self.views_count = self.current;
        self.total_watch_time += watch_duration;
    }
}

// ---------------------------------------------------------------------------
// Screens
// ---------------------------------------------------------------------------

/// Action reported by the dashboard page for a live screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScreenAction {
    Load,
    Unload,
    /// Anything else; recorded as a no-op but echoed in the reply.
    Other(String),
}

impl ScreenAction {
    pub fn as_str(&self) -> &str {
        match self {
            ScreenAction::Load => "load",
            ScreenAction::Unload => "unload",
            ScreenAction::Other(raw) => raw,
        }
    }
}

impl FromStr for ScreenAction {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "load" => ScreenAction::Load,
            "unload" => ScreenAction::Unload,
            other => ScreenAction::Other(other.to_string()),
        })
    }
}

impl fmt::Display for ScreenAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScreenStatus {
    Watching,
    Completed,
}

/// Bookkeeping for one externally reported screen.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScreenRecord {
    pub screen_id: String,
    pub start_time: String,
    pub status: ScreenStatus,
    /// Seconds between load and unload; set once the screen unloads.
    pub watch_time: Option<f64>,
}

// ---------------------------------------------------------------------------
// Accrual mode
// ---------------------------------------------------------------------------

/// How long the simulation keeps sampling tab watch time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccrualMode {
    /// Open every tab, take one sample after a single tick, then finish.
    #[default]
    SingleSweep,
    /// Keep sampling each tick until every tab reaches its target.
    FullDuration,
}

impl FromStr for AccrualMode {
    type Err = ViewDeckError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "single_sweep" | "single" => Ok(AccrualMode::SingleSweep),
            "full_duration" | "full" => Ok(AccrualMode::FullDuration),
            _ => Err(ViewDeckError::Config(format!("Unknown accrual mode: {s}"))),
        }
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Domain-specific error types for VIEWDECK.
#[derive(Debug, thiserror::Error)]
pub enum ViewDeckError {
    #[error("URL is required")]
    MissingUrl,

    #[error("screen_id is required")]
    MissingScreenId,

    #[error("Invalid value for {field}: {value}")]
    InvalidNumber { field: &'static str, value: String },

    #[error("{field} must be between {min} and {max}, got {value}")]
    OutOfRange {
        field: &'static str,
        value: i64,
        min: i64,
        max: i64,
    },

    #[error("A run is already in progress ({total} tabs)")]
    RunInProgress { total: u32 },

    #[error("Configuration error: {0}")]
    Config(String),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
