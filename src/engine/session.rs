//! Session store — the single owned state behind the dashboard.
//!
//! Holds the session record, the screen tracker, and the id of the run
//! currently allowed to write. Everything sits behind one lock; the
//! simulation loop takes it only for short synchronous updates.

use serde::Serialize;
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

use crate::engine::screens::ScreenTracker;
use crate::types::{RunStatus, ScreenAction, ScreenRecord, SessionStatus, ViewDeckError};

/// What `/api/status` returns: the session record plus the live screen count.
#[derive(Debug, Clone, Serialize)]
pub struct StatusSnapshot {
    #[serde(flatten)]
    pub session: SessionStatus,
    pub active_screens: u32,
}

#[derive(Default)]
struct Ledger {
    session: SessionStatus,
    screens: ScreenTracker,
    active_run: Option<Uuid>,
}

#[derive(Default)]
pub struct SessionStore {
    inner: RwLock<Ledger>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the session for a new run of `times` tabs.
    ///
    /// Replaces the session record and zeroes the active-screen counter.
    /// Fails if another run still owns the session.
    pub async fn begin_run(&self, times: u32) -> Result<Uuid, ViewDeckError> {
        let mut ledger = self.inner.write().await;
        if ledger.active_run.is_some() {
            return Err(ViewDeckError::RunInProgress {
                total: ledger.session.total,
            });
        }
        let run_id = Uuid::new_v4();
        ledger.session = SessionStatus::running(times);
        ledger.screens.clear_active();
        ledger.active_run = Some(run_id);
        Ok(run_id)
    }

    /// Mutate the session on behalf of `run_id`.
    ///
    /// Returns `None` without applying `f` if the run no longer owns the
    /// session (it was reset underneath the loop).
    pub async fn update_run<R>(
        &self,
        run_id: Uuid,
        f: impl FnOnce(&mut SessionStatus) -> R,
    ) -> Option<R> {
        let mut ledger = self.inner.write().await;
        if ledger.active_run != Some(run_id) {
            return None;
        }
        Some(f(&mut ledger.session))
    }

    /// Mark the run completed and release the session. Returns false if
    /// the run had already been superseded.
    pub async fn finish_run(&self, run_id: Uuid) -> bool {
        let mut ledger = self.inner.write().await;
        if ledger.active_run != Some(run_id) {
            return false;
        }
        ledger.session.status = RunStatus::Completed;
        ledger.active_run = None;
        true
    }

    #[cfg(test)]
    pub async fn is_running(&self) -> bool {
        self.inner.read().await.active_run.is_some()
    }

    pub async fn status_snapshot(&self) -> StatusSnapshot {
        let ledger = self.inner.read().await;
        StatusSnapshot {
            session: ledger.session.clone(),
            active_screens: ledger.screens.active(),
        }
    }

    /// Apply a screen report; returns the active-screen count afterwards.
    pub async fn record_screen(&self, action: &ScreenAction, screen_id: &str) -> u32 {
        self.inner.write().await.screens.record(action, screen_id)
    }

    pub async fn screen_records(&self) -> Vec<ScreenRecord> {
        self.inner.read().await.screens.records()
    }

    /// Restore defaults: idle session, no screens, no owning run.
    pub async fn reset(&self) {
        let mut ledger = self.inner.write().await;
        if let Some(run_id) = ledger.active_run.take() {
            info!(run_id = %run_id, "Reset while run in progress, run abandoned");
        }
        ledger.session = SessionStatus::default();
        ledger.screens.clear();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_begin_run_resets_session() {
        let store = SessionStore::new();
        store.record_screen(&ScreenAction::Load, "s1").await;

        store.begin_run(4).await.unwrap();
        let snap = store.status_snapshot().await;
        assert_eq!(snap.session.status, RunStatus::Running);
        assert_eq!(snap.session.total, 4);
        assert_eq!(snap.session.current, 0);
        assert_eq!(snap.active_screens, 0);
        assert_eq!(store.screen_records().await.len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_begin_rejected() {
        let store = SessionStore::new();
        store.begin_run(2).await.unwrap();
        let err = store.begin_run(3).await.unwrap_err();
        assert!(matches!(err, ViewDeckError::RunInProgress { total: 2 }));
    }

    #[tokio::test]
    async fn test_finish_releases_session() {
        let store = SessionStore::new();
        let run = store.begin_run(1).await.unwrap();
        assert!(store.is_running().await);
        assert!(store.finish_run(run).await);
        assert!(!store.is_running().await);
        assert_eq!(store.status_snapshot().await.session.status, RunStatus::Completed);
        assert!(store.begin_run(1).await.is_ok());
    }

    #[tokio::test]
    async fn test_reset_supersedes_run() {
        let store = SessionStore::new();
        let run = store.begin_run(2).await.unwrap();
        store.reset().await;

        let applied = store.update_run(run, |s| s.open_tab(1, 5)).await;
        assert!(applied.is_none());
        assert!(!store.finish_run(run).await);

        let snap = store.status_snapshot().await;
        assert_eq!(snap.session.status, RunStatus::Idle);
        assert!(snap.session.results.is_empty());
    }

    #[tokio::test]
    async fn test_reset_clears_screens() {
        let store = SessionStore::new();
        store.record_screen(&ScreenAction::Load, "s1").await;
        store.record_screen(&ScreenAction::Load, "s2").await;
        store.reset().await;

        let snap = store.status_snapshot().await;
        assert_eq!(snap.active_screens, 0);
        assert!(store.screen_records().await.is_empty());
    }

    #[tokio::test]
    async fn test_snapshot_serializes_flat() {
        let store = SessionStore::new();
        let json = serde_json::to_value(store.status_snapshot().await).unwrap();
        assert_eq!(json["status"], "idle");
        assert_eq!(json["active_screens"], 0);
        assert!(json["results"].as_array().unwrap().is_empty());
    }
}
