use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::warn;

use super::error::ApiError;
use super::AppState;
use crate::youtube::ChannelUploads;

/// Saved channels, most recently used first.
pub async fn list_channels(State(state): State<Arc<AppState>>) -> Result<Json<Value>, ApiError> {
    let channels = state.store.list_channels().await?;
    Ok(Json(json!({ "channels": channels })))
}

#[derive(Debug, Deserialize)]
pub struct ChannelVideosParams {
    page_token: Option<String>,
    max_results: Option<u32>,
}

/// Recent uploads for a saved (or any known) channel. Needs an API key.
pub async fn channel_videos(
    State(state): State<Arc<AppState>>,
    Path(channel_id): Path<String>,
    Query(params): Query<ChannelVideosParams>,
) -> Result<Json<ChannelUploads>, ApiError> {
    let youtube = state.youtube.as_ref().ok_or(ApiError::MissingApiKey)?;

    let uploads = youtube
        .channel_uploads(
            &channel_id,
            params.page_token.as_deref(),
            params.max_results.unwrap_or(20),
        )
        .await?;

    // The lookup proves the channel exists, so keep the catalogue fresh.
    if let Err(e) = state
        .store
        .upsert_channel(
            &channel_id,
            Some(uploads.channel.title.as_str()),
            uploads.channel.thumbnail.as_deref(),
        )
        .await
    {
        warn!("Failed to save channel {}: {}", channel_id, e);
    }

    Ok(Json(uploads))
}
