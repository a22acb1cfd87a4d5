use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::warn;

use super::error::ApiError;
use super::AppState;
use crate::media::{self, MediaMetadata};

/// Heartbeat. Reports the version and whether channel listing is enabled.
pub async fn root(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "youtube_api": state.youtube.is_some(),
    }))
}

#[derive(Debug, Deserialize)]
pub struct InfoParams {
    url: Option<String>,
    save: Option<u8>,
}

/// Metadata lookup without downloading. `save=1` persists the channel.
pub async fn video_info(
    State(state): State<Arc<AppState>>,
    Query(params): Query<InfoParams>,
) -> Result<Json<MediaMetadata>, ApiError> {
    let raw_url = params
        .url
        .ok_or_else(|| ApiError::InvalidUrl("missing url parameter".to_string()))?;

    let url = media::parse_request_url(&raw_url)
        .map_err(|e| ApiError::InvalidUrl(e.to_string()))?;
    let url = media::canonicalize_url(url);

    let metadata = state
        .extractor
        .metadata(&url)
        .await
        .map_err(|e| ApiError::Extraction(e.to_string()))?;

    if params.save == Some(1) {
        if let Some(channel_id) = &metadata.channel_id {
            if let Err(e) = state
                .store
                .upsert_channel(
                    channel_id,
                    metadata.uploader.as_deref(),
                    metadata.thumbnail.as_deref(),
                )
                .await
            {
                warn!("Failed to save channel {}: {}", channel_id, e);
            }
        }
    }

    Ok(Json(metadata))
}
