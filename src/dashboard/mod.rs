//! Dashboard — Axum web server for launching and watching simulated runs.
//!
//! Serves a REST API and a self-contained HTML dashboard.
//! CORS enabled for local development.

pub mod error;
pub mod routes;

use anyhow::{Context, Result};
use axum::{
    http::{header, HeaderValue, Method},
    response::Html,
    routing::{get, post},
    Router,
};
use std::future::Future;
use tower_http::cors::CorsLayer;
use tracing::info;

use routes::AppState;

/// The embedded dashboard HTML (compiled into the binary).
const DASHBOARD_HTML: &str = include_str!("templates/index.html");

/// Bind `addr` and serve the dashboard until `shutdown` resolves.
pub async fn serve(
    state: AppState,
    addr: &str,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<()> {
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind dashboard address {addr}"))?;
    let local = listener.local_addr().context("Failed to read bound address")?;
    info!(addr = %local, "Dashboard server listening on http://{local}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .context("Dashboard server error")?;

    Ok(())
}

/// Build the Axum router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(HeaderValue::from_static("*"))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        // API routes
        .route("/api/start", post(routes::start))
        .route("/api/status", get(routes::get_status))
        .route("/api/screen-loaded", post(routes::screen_loaded))
        .route("/api/screens", get(routes::get_screens))
        .route("/api/reset", post(routes::reset))
        .route("/health", get(routes::health))
        // Dashboard HTML
        .route("/", get(serve_dashboard))
        .layer(cors)
        .with_state(state)
}

/// Serve the embedded HTML dashboard.
async fn serve_dashboard() -> Html<&'static str> {
    Html(DASHBOARD_HTML)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimulationConfig;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use routes::DashboardState;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn test_state() -> AppState {
        Arc::new(DashboardState::new(SimulationConfig::default()))
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(resp: axum::response::Response) -> serde_json::Value {
        let body = axum::body::to_bytes(resp.into_body(), 100_000).await.unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let app = build_router(test_state());
        let resp = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_status_endpoint() {
        let app = build_router(test_state());
        let resp = app
            .oneshot(Request::builder().uri("/api/status").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let json = body_json(resp).await;
        assert_eq!(json["status"], "idle");
        assert_eq!(json["current"], 0);
        assert_eq!(json["active_screens"], 0);
    }

    #[tokio::test]
    async fn test_start_missing_url_is_bad_request() {
        let app = build_router(test_state());
        let resp = app.oneshot(post_json("/api/start", r#"{"times": 3}"#)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(resp).await["error"], "URL is required");
    }

    #[tokio::test]
    async fn test_start_non_numeric_times_is_bad_request() {
        let app = build_router(test_state());
        let resp = app
            .oneshot(post_json("/api/start", r#"{"url": "x", "times": "lots"}"#))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    async fn assert_json_bad_request(resp: axum::response::Response) {
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let json = body_json(resp).await;
        assert!(!json["error"].as_str().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_start_wrong_field_type_is_json_bad_request() {
        let app = build_router(test_state());
        let resp = app
            .oneshot(post_json("/api/start", r#"{"url": 5, "times": 2}"#))
            .await
            .unwrap();
        assert_json_bad_request(resp).await;
    }

    #[tokio::test]
    async fn test_start_truncated_body_is_json_bad_request() {
        let app = build_router(test_state());
        let resp = app
            .oneshot(post_json("/api/start", r#"{"url": "x", "times": "#))
            .await
            .unwrap();
        assert_json_bad_request(resp).await;
    }

    #[tokio::test]
    async fn test_start_without_content_type_is_json_bad_request() {
        let app = build_router(test_state());
        let req = Request::builder()
            .method("POST")
            .uri("/api/start")
            .body(Body::from(r#"{"url": "x"}"#))
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_json_bad_request(resp).await;
    }

    #[tokio::test]
    async fn test_screen_loaded_malformed_body_is_json_bad_request() {
        let app = build_router(test_state());
        let resp = app
            .oneshot(post_json("/api/screen-loaded", r#"{"action": ["load"]}"#))
            .await
            .unwrap();
        assert_json_bad_request(resp).await;
    }

    #[tokio::test]
    async fn test_screen_loaded_unknown_action_without_id() {
        let app = build_router(test_state());
        let resp = app
            .oneshot(post_json("/api/screen-loaded", r#"{"action": "pause"}"#))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json["active_screens"], 0);
        assert_eq!(json["message"], "Screen pauseed successfully");
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_start_conflicts() {
        let state = test_state();
        let app = build_router(state.clone());
        let body = r#"{"url": "x", "times": 2, "watch_duration": 5}"#;

        let resp = app.clone().oneshot(post_json("/api/start", body)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await["status"], "started");

        let resp = app.oneshot(post_json("/api/start", body)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_screen_loaded_endpoint() {
        let app = build_router(test_state());
        let resp = app
            .oneshot(post_json("/api/screen-loaded", r#"{"action": "load", "screen_id": "s1"}"#))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json["active_screens"], 1);
        assert_eq!(json["message"], "Screen loaded successfully");
    }

    #[tokio::test]
    async fn test_reset_endpoint() {
        let app = build_router(test_state());
        let resp = app.oneshot(post_json("/api/reset", "")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await["status"], "reset");
    }

    #[tokio::test]
    async fn test_screens_endpoint_empty() {
        let app = build_router(test_state());
        let resp = app
            .oneshot(Request::builder().uri("/api/screens").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(body_json(resp).await.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_dashboard_html() {
        let app = build_router(test_state());
        let resp = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let body = axum::body::to_bytes(resp.into_body(), 100_000).await.unwrap();
        let html = String::from_utf8(body.to_vec()).unwrap();
        assert!(html.contains("VIEWDECK"));
        assert!(html.contains("/api/status"));
    }
}
