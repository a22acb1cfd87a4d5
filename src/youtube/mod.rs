//! Minimal YouTube Data API v3 client for channel upload listings.

use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

const API_BASE: &str = "https://www.googleapis.com/youtube/v3";

#[derive(Debug, Error)]
pub enum YouTubeError {
    #[error("channel not found")]
    ChannelNotFound,

    #[error("YouTube API returned HTTP {status}")]
    Status { status: reqwest::StatusCode },

    #[error("YouTube API request failed: {0}")]
    Http(#[from] reqwest::Error),
}

pub struct YouTubeApi {
    client: reqwest::Client,
    api_key: String,
}

impl YouTubeApi {
    pub fn new(api_key: String) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(20))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client, api_key })
    }

    /// List a channel's most recent uploads via its uploads playlist.
    pub async fn channel_uploads(
        &self,
        channel_id: &str,
        page_token: Option<&str>,
        max_results: u32,
    ) -> Result<ChannelUploads, YouTubeError> {
        debug!("Resolving uploads playlist for channel {}", channel_id);

        let response = self
            .client
            .get(format!("{API_BASE}/channels"))
            .query(&[
                ("part", "contentDetails,snippet"),
                ("id", channel_id),
                ("key", self.api_key.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(YouTubeError::Status {
                status: response.status(),
            });
        }

        let channels: ChannelListResponse = response.json().await?;
        let channel = channels
            .items
            .into_iter()
            .next()
            .ok_or(YouTubeError::ChannelNotFound)?;

        let uploads_playlist = channel.content_details.related_playlists.uploads;

        let max_results = max_results.to_string();
        let response = self
            .client
            .get(format!("{API_BASE}/playlistItems"))
            .query(&[
                ("part", "snippet,contentDetails"),
                ("playlistId", uploads_playlist.as_str()),
                ("maxResults", max_results.as_str()),
                ("pageToken", page_token.unwrap_or("")),
                ("key", self.api_key.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(YouTubeError::Status {
                status: response.status(),
            });
        }

        let playlist: PlaylistItemsResponse = response.json().await?;

        Ok(ChannelUploads {
            channel: ChannelSummary {
                id: channel_id.to_string(),
                title: channel.snippet.title,
                thumbnail: channel.snippet.thumbnails.best(),
            },
            videos: playlist.items.into_iter().map(VideoSummary::from).collect(),
            next_page_token: playlist.next_page_token,
        })
    }
}

// ── Response payload ─────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelUploads {
    pub channel: ChannelSummary,
    pub videos: Vec<VideoSummary>,
    pub next_page_token: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelSummary {
    pub id: String,
    pub title: String,
    pub thumbnail: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoSummary {
    pub video_id: Option<String>,
    pub title: Option<String>,
    pub thumbnail: Option<String>,
    pub published_at: Option<String>,
    pub channel_title: Option<String>,
}

impl From<PlaylistItem> for VideoSummary {
    fn from(item: PlaylistItem) -> Self {
        Self {
            video_id: item.content_details.video_id,
            title: item.snippet.title,
            thumbnail: item.snippet.thumbnails.best(),
            published_at: item.snippet.published_at,
            channel_title: item.snippet.channel_title,
        }
    }
}

// ── Wire types ───────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ChannelListResponse {
    #[serde(default)]
    items: Vec<ChannelItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChannelItem {
    content_details: ChannelContentDetails,
    snippet: ChannelSnippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChannelContentDetails {
    related_playlists: RelatedPlaylists,
}

#[derive(Debug, Deserialize)]
struct RelatedPlaylists {
    uploads: String,
}

#[derive(Debug, Deserialize)]
struct ChannelSnippet {
    title: String,
    #[serde(default)]
    thumbnails: Thumbnails,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaylistItemsResponse {
    #[serde(default)]
    items: Vec<PlaylistItem>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaylistItem {
    snippet: PlaylistSnippet,
    content_details: PlaylistContentDetails,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaylistSnippet {
    title: Option<String>,
    published_at: Option<String>,
    channel_title: Option<String>,
    #[serde(default)]
    thumbnails: Thumbnails,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaylistContentDetails {
    video_id: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct Thumbnails {
    medium: Option<Thumbnail>,
    default: Option<Thumbnail>,
}

impl Thumbnails {
    fn best(self) -> Option<String> {
        self.medium.or(self.default).map(|t| t.url)
    }
}

#[derive(Debug, Deserialize)]
struct Thumbnail {
    url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_channel_list() {
        let raw = r#"{
            "items": [{
                "contentDetails": {"relatedPlaylists": {"uploads": "UU123"}},
                "snippet": {
                    "title": "A Channel",
                    "thumbnails": {"default": {"url": "https://img/default.jpg"}}
                }
            }]
        }"#;
        let decoded: ChannelListResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(decoded.items.len(), 1);
        let item = decoded.items.into_iter().next().unwrap();
        assert_eq!(item.content_details.related_playlists.uploads, "UU123");
        assert_eq!(item.snippet.title, "A Channel");
    }

    #[test]
    fn test_decode_playlist_items() {
        let raw = r#"{
            "items": [{
                "snippet": {
                    "title": "Video One",
                    "publishedAt": "2024-01-01T00:00:00Z",
                    "channelTitle": "A Channel",
                    "thumbnails": {
                        "medium": {"url": "https://img/medium.jpg"},
                        "default": {"url": "https://img/default.jpg"}
                    }
                },
                "contentDetails": {"videoId": "abc123"}
            }],
            "nextPageToken": "TOKEN"
        }"#;
        let decoded: PlaylistItemsResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(decoded.next_page_token.as_deref(), Some("TOKEN"));

        let video = VideoSummary::from(decoded.items.into_iter().next().unwrap());
        assert_eq!(video.video_id.as_deref(), Some("abc123"));
        // Medium thumbnail is preferred over default
        assert_eq!(video.thumbnail.as_deref(), Some("https://img/medium.jpg"));
    }

    #[test]
    fn test_decode_empty_channel_list() {
        let decoded: ChannelListResponse = serde_json::from_str("{}").unwrap();
        assert!(decoded.items.is_empty());
    }

    #[test]
    fn test_uploads_serializes_camel_case() {
        let uploads = ChannelUploads {
            channel: ChannelSummary {
                id: "UC123".into(),
                title: "A Channel".into(),
                thumbnail: None,
            },
            videos: vec![],
            next_page_token: Some("TOKEN".into()),
        };
        let json = serde_json::to_value(&uploads).unwrap();
        assert_eq!(json["nextPageToken"], "TOKEN");
        assert!(json["channel"]["thumbnail"].is_null());
    }
}
