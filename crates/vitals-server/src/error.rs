//! HTTP error bodies: `{error, message, timestamp}`.

use axum::{
    http::{StatusCode, Uri},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde_json::json;
use thiserror::Error;

use vitals_core::snapshot::format_timestamp;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Route {0} not found")]
    NotFound(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
        }
    }

    /// Human-readable error title used in the `error` field.
    pub fn title(&self) -> &'static str {
        match self {
            ApiError::NotFound(_) => "Not Found",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        tracing::debug!(status = %self.status(), error = %self, "request rejected");
        let body = Json(json!({
            "error": self.title(),
            "message": self.to_string(),
            "timestamp": format_timestamp(&Utc::now()),
        }));
        (self.status(), body).into_response()
    }
}

/// Fallback for every unrouted path.
pub async fn not_found(uri: Uri) -> ApiError {
    let path = uri
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| uri.path().to_string());
    ApiError::NotFound(path)
}
