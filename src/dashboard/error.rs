//! API error mapping.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::types::ViewDeckError;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Domain(#[from] ViewDeckError),

    /// Body missing, malformed, wrongly typed, or not sent as JSON.
    #[error("{}", .0.body_text())]
    Body(#[from] JsonRejection),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Domain(ViewDeckError::RunInProgress { .. }) => StatusCode::CONFLICT,
            ApiError::Domain(_) | ApiError::Body(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        tracing::debug!(error = %self, status = status.as_u16(), "Request rejected");
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
