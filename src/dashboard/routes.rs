//! Dashboard API route handlers.
//!
//! All endpoints return JSON. State is shared via `Arc<DashboardState>`.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

use crate::config::SimulationConfig;
use crate::dashboard::error::ApiError;
use crate::engine::session::{SessionStore, StatusSnapshot};
use crate::engine::simulator::{RunRequest, Simulator};
use crate::types::{ScreenAction, ScreenRecord, ViewDeckError};

// ---------------------------------------------------------------------------
// Shared state
// ---------------------------------------------------------------------------

/// Shared state accessible by all route handlers.
pub struct DashboardState {
    pub store: Arc<SessionStore>,
    pub simulator: Simulator,
    pub simulation: SimulationConfig,
}

impl DashboardState {
    pub fn new(simulation: SimulationConfig) -> Self {
        Self {
            store: Arc::new(SessionStore::new()),
            simulator: Simulator::new(&simulation),
            simulation,
        }
    }
}

pub type AppState = Arc<DashboardState>;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct StartRequest {
    pub url: Option<String>,
    /// Integer, float, or numeric string.
    pub times: Option<Value>,
    pub watch_duration: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ScreenEventRequest {
    pub action: Option<String>,
    pub screen_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusMessage {
    pub status: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScreenEventResponse {
    pub active_screens: u32,
    pub message: String,
}

// ---------------------------------------------------------------------------
// Route handlers
// ---------------------------------------------------------------------------

/// POST /api/start
pub async fn start(
    State(state): State<AppState>,
    payload: Result<Json<StartRequest>, JsonRejection>,
) -> Result<Json<StatusMessage>, ApiError> {
    let Json(req) = payload?;
    let request = RunRequest::from_input(
        req.url.as_deref(),
        req.times.as_ref(),
        req.watch_duration.as_ref(),
        &state.simulation,
    )?;
    // The run is detached; progress is observed through /api/status.
    let (run_id, _handle) = state.simulator.start(state.store.clone(), request).await?;
    info!(run_id = %run_id, "Start request accepted");
    Ok(Json(StatusMessage { status: "started" }))
}

/// GET /api/status
pub async fn get_status(State(state): State<AppState>) -> Json<StatusSnapshot> {
    Json(state.store.status_snapshot().await)
}

/// POST /api/screen-loaded
pub async fn screen_loaded(
    State(state): State<AppState>,
    payload: Result<Json<ScreenEventRequest>, JsonRejection>,
) -> Result<Json<ScreenEventResponse>, ApiError> {
    let Json(req) = payload?;
    let raw_action = req.action.unwrap_or_else(|| "load".to_string());
    let action: ScreenAction = raw_action.parse().unwrap_or(ScreenAction::Other(raw_action.clone()));
    let screen_id = req.screen_id.filter(|id| !id.is_empty());
    // Unknown actions are no-ops and need no screen.
    let screen_id = match (&action, screen_id) {
        (ScreenAction::Other(_), id) => id.unwrap_or_default(),
        (_, Some(id)) => id,
        (_, None) => return Err(ViewDeckError::MissingScreenId.into()),
    };

    let active_screens = state.store.record_screen(&action, &screen_id).await;
    Ok(Json(ScreenEventResponse {
        active_screens,
        message: format!("Screen {action}ed successfully"),
    }))
}

/// GET /api/screens
pub async fn get_screens(State(state): State<AppState>) -> Json<Vec<ScreenRecord>> {
    Json(state.store.screen_records().await)
}

/// POST /api/reset
pub async fn reset(State(state): State<AppState>) -> Json<StatusMessage> {
    state.store.reset().await;
    info!("Session reset");
    Json(StatusMessage { status: "reset" })
}

/// GET /health
pub async fn health() -> StatusCode {
    StatusCode::OK
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
