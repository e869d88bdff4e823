//! View simulator — opens fake tabs and samples their watch time.
//!
//! Each run claims the session store, opens every tab on the first sweep,
//! then sleeps one tick and samples elapsed time per tab. In
//! `SingleSweep` mode the run finishes after that first sample; in
//! `FullDuration` mode it keeps ticking until every tab hits its target.

use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::SimulationConfig;
use crate::engine::session::SessionStore;
use crate::types::{AccrualMode, TabStatus, ViewDeckError};

// ---------------------------------------------------------------------------
// Run request
// ---------------------------------------------------------------------------

/// A validated request to simulate `times` tabs.
#[derive(Debug, Clone, PartialEq)]
pub struct RunRequest {
    /// Carried for logging only.
    pub url: String,
    pub times: u32,
    pub watch_duration: u64,
}

impl RunRequest {
    /// Validate raw start input, applying configured defaults.
    ///
    /// `times` and `watch_duration` accept integers, floats (truncated)
    /// and numeric strings. `null` counts as absent.
    pub fn from_input(
        url: Option<&str>,
        times: Option<&Value>,
        watch_duration: Option<&Value>,
        cfg: &SimulationConfig,
    ) -> Result<Self, ViewDeckError> {
        let url = url
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .ok_or(ViewDeckError::MissingUrl)?;

        let times = match present(times) {
            Some(v) => coerce_int("times", v)?,
            None => i64::from(cfg.default_times),
        };
        if times < 1 || times > i64::from(cfg.max_tabs) {
            return Err(ViewDeckError::OutOfRange {
                field: "times",
                value: times,
                min: 1,
                max: i64::from(cfg.max_tabs),
            });
        }

        let watch_duration = match present(watch_duration) {
            Some(v) => coerce_int("watch_duration", v)?,
            None => i64::try_from(cfg.default_watch_duration_secs).unwrap_or(i64::MAX),
        };
        let watch_duration = u64::try_from(watch_duration).map_err(|_| ViewDeckError::OutOfRange {
            field: "watch_duration",
            value: watch_duration,
            min: 0,
            max: i64::MAX,
        })?;

        Ok(Self {
            url: url.to_string(),
            times: times as u32,
            watch_duration,
        })
    }
}

fn present(v: Option<&Value>) -> Option<&Value> {
    v.filter(|v| !v.is_null())
}

fn coerce_int(field: &'static str, value: &Value) -> Result<i64, ViewDeckError> {
    let invalid = || ViewDeckError::InvalidNumber {
        field,
        value: value.to_string(),
    };
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64))
            .ok_or_else(invalid),
        Value::String(s) => s.trim().parse::<i64>().map_err(|_| invalid()),
        _ => Err(invalid()),
    }
}

// ---------------------------------------------------------------------------
// Simulator
// ---------------------------------------------------------------------------

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Completed { sweeps: u64 },
    /// The session was reset underneath the run.
    Superseded,
}

#[derive(Debug, Clone)]
pub struct Simulator {
    tick: Duration,
    accrual: AccrualMode,
}

impl Simulator {
    pub fn new(cfg: &SimulationConfig) -> Self {
        Self {
            tick: cfg.tick_interval(),
            accrual: cfg.accrual,
        }
    }

    /// Claim the store for `request` and run the loop in the background.
    ///
    /// Fails without spawning if another run is active.
    pub async fn start(
        &self,
        store: Arc<SessionStore>,
        request: RunRequest,
    ) -> Result<(Uuid, JoinHandle<RunOutcome>), ViewDeckError> {
        let run_id = store.begin_run(request.times).await?;
        info!(
            run_id = %run_id,
            url = %request.url,
            times = request.times,
            watch_duration = request.watch_duration,
            accrual = ?self.accrual,
            "Simulation run started"
        );
        let sim = self.clone();
        let handle = tokio::spawn(async move { sim.run(&store, run_id, &request).await });
        Ok((run_id, handle))
    }

    /// Drive one run to completion against a store already claimed by `run_id`.
    pub async fn run(&self, store: &SessionStore, run_id: Uuid, request: &RunRequest) -> RunOutcome {
        let times = request.times;
        let target = request.watch_duration;
        let mut opened: BTreeMap<u32, Instant> = BTreeMap::new();
        let mut sweeps = 0u64;

        loop {
            let unseen: Vec<u32> = (1..=times).filter(|id| !opened.contains_key(id)).collect();
            if !unseen.is_empty() {
                let now = Instant::now();
                let applied = store
                    .update_run(run_id, |session| {
                        for id in &unseen {
                            session.open_tab(*id, target);
                        }
                    })
                    .await;
                if applied.is_none() {
                    return superseded(run_id);
                }
                for id in unseen {
                    opened.insert(id, now);
                }
                debug!(run_id = %run_id, opened = opened.len(), "Tabs opened");
            }

            tokio::time::sleep(self.tick).await;

            let now = Instant::now();
            let samples: Vec<(u32, f64)> = opened
                .iter()
                .map(|(id, started)| (*id, now.duration_since(*started).as_secs_f64()))
                .collect();
            let all_done = store
                .update_run(run_id, |session| {
                    for (id, elapsed) in &samples {
                        if let Some(tab) = session.tab_status.get_mut(id) {
                            tab.sample(*elapsed, target);
                        }
                    }
                    session
                        .tab_status
                        .values()
                        .all(|tab| tab.status == TabStatus::Completed)
                })
                .await;
            let Some(all_done) = all_done else {
                return superseded(run_id);
            };
            sweeps += 1;

            let finished = match self.accrual {
                AccrualMode::SingleSweep => opened.len() as u32 >= times,
                AccrualMode::FullDuration => all_done,
            };
            if finished {
                break;
            }
        }

        if !store.finish_run(run_id).await {
            return superseded(run_id);
        }
        info!(run_id = %run_id, tabs = times, sweeps, "Simulation run completed");
        RunOutcome::Completed { sweeps }
    }
}

fn superseded(run_id: Uuid) -> RunOutcome {
    warn!(run_id = %run_id, "Run superseded by reset, stopping");
    RunOutcome::Superseded
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
