use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Query, State};
use axum::http::{header, HeaderValue};
use axum::response::{IntoResponse, Response};
use futures::StreamExt;
use serde::Deserialize;
use tempfile::TempDir;
use tokio_util::io::ReaderStream;
use tracing::{info, warn};

use super::error::ApiError;
use super::AppState;
use crate::media::{self, MediaFormat};

#[derive(Debug, Deserialize)]
pub struct DownloadParams {
    url: Option<String>,
    format: Option<String>,
}

pub async fn download(
    State(state): State<Arc<AppState>>,
    Query(params): Query<DownloadParams>,
) -> Result<Response, ApiError> {
    let raw_url = params
        .url
        .ok_or_else(|| ApiError::InvalidUrl("missing url parameter".to_string()))?;
    let format = resolve_format(params.format.as_deref())?;

    let url = media::parse_request_url(&raw_url)
        .map_err(|e| ApiError::InvalidUrl(e.to_string()))?;
    let url = media::canonicalize_url(url);

    let downloads_dir = state.config.get_downloads_dir();
    tokio::fs::create_dir_all(&downloads_dir)
        .await
        .map_err(|e| ApiError::Internal(format!("cannot create downloads dir: {e}")))?;

    // One scratch directory per request; concurrent downloads never share
    // paths, and dropping the guard removes everything in it.
    let workdir = TempDir::new_in(&downloads_dir)
        .map_err(|e| ApiError::Internal(format!("cannot create scratch dir: {e}")))?;

    let extracted = state
        .extractor
        .extract(&url, format, workdir.path())
        .await
        .map_err(|e| ApiError::Extraction(e.to_string()))?;

    info!("Serving {}: {}", format, extracted.metadata.title);

    if let Some(channel_id) = &extracted.metadata.channel_id {
        if let Err(e) = state
            .store
            .upsert_channel(
                channel_id,
                extracted.metadata.uploader.as_deref(),
                extracted.metadata.thumbnail.as_deref(),
            )
            .await
        {
            warn!("Failed to save channel {}: {}", channel_id, e);
        }
    }

    let filename = format!(
        "{}.{}",
        media::sanitize_filename(&extracted.metadata.title),
        format.extension()
    );

    file_response(&extracted.path, format, &filename, workdir).await
}

fn resolve_format(raw: Option<&str>) -> Result<MediaFormat, ApiError> {
    match raw {
        None => Ok(MediaFormat::Mp4),
        Some(value) => {
            MediaFormat::parse(value).ok_or_else(|| ApiError::UnsupportedFormat(value.to_string()))
        }
    }
}

/// Stream the produced file back to the client. The scratch directory is
/// owned by the stream, so it is removed once the body has been sent (or
/// the client disconnects).
async fn file_response(
    path: &std::path::Path,
    format: MediaFormat,
    filename: &str,
    workdir: TempDir,
) -> Result<Response, ApiError> {
    let file = tokio::fs::File::open(path)
        .await
        .map_err(|e| ApiError::Internal(format!("cannot open extracted file: {e}")))?;
    let size = file
        .metadata()
        .await
        .map_err(|e| ApiError::Internal(format!("cannot stat extracted file: {e}")))?
        .len();

    let stream = ReaderStream::new(file).map(move |chunk| {
        let _workdir = &workdir;
        chunk
    });

    let mut response = Body::from_stream(stream).into_response();
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(format.content_type()),
    );
    headers.insert(
        header::CONTENT_LENGTH,
        HeaderValue::from_str(&size.to_string())
            .map_err(|e| ApiError::Internal(e.to_string()))?,
    );
    headers.insert(
        header::CONTENT_DISPOSITION,
        HeaderValue::from_str(&format!("attachment; filename=\"{filename}\""))
            .map_err(|e| ApiError::Internal(e.to_string()))?,
    );

    Ok(response)
}
