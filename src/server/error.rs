//! Unified API error type.
//!
//! Every handler returns `Result<T, ApiError>`; the `IntoResponse` impl
//! converts failures into a JSON body with the matching status code.
//! Internal errors are logged in full but clients only see a generic
//! message.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// The `url` parameter is missing, unparseable, or not http(s).
    #[error("invalid url: {0}")]
    InvalidUrl(String),

    /// The `format` parameter is outside the supported enum.
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Channel listing was requested without a configured API key.
    #[error("server has no YouTube API key configured")]
    MissingApiKey,

    /// The caller referenced a resource that does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The extractor chain could not produce a file.
    #[error("extraction failed: {0}")]
    Extraction(String),

    /// An upstream API returned a non-success response.
    #[error("upstream error: {0}")]
    Upstream(String),

    /// Propagated from the channel store.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// An unclassified internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidUrl(_)
            | ApiError::UnsupportedFormat(_)
            | ApiError::MissingApiKey => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Extraction(_) | ApiError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ApiError::Database(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let client_message = match &self {
            // Client-facing errors expose the message directly.
            ApiError::InvalidUrl(_)
            | ApiError::UnsupportedFormat(_)
            | ApiError::MissingApiKey
            | ApiError::NotFound(_)
            | ApiError::Extraction(_)
            | ApiError::Upstream(_) => self.to_string(),

            // Internal errors: full detail goes to the log only.
            ApiError::Database(e) => {
                error!(error = %e, "database error");
                "internal server error".to_string()
            }
            ApiError::Internal(m) => {
                error!(message = %m, "internal server error");
                "internal server error".to_string()
            }
        };

        (status, Json(json!({ "error": client_message }))).into_response()
    }
}

impl From<crate::youtube::YouTubeError> for ApiError {
    fn from(e: crate::youtube::YouTubeError) -> Self {
        use crate::youtube::YouTubeError;
        match e {
            YouTubeError::ChannelNotFound => ApiError::NotFound("channel not found".to_string()),
            YouTubeError::Status { .. } | YouTubeError::Http(_) => ApiError::Upstream(e.to_string()),
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(e: anyhow::Error) -> Self {
        error!(error = ?e, "converting anyhow error to ApiError::Internal");
        ApiError::Internal(e.to_string())
    }
}
