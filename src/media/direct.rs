use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use url::Url;

use super::{
    extractor::Extractor,
    types::{ExtractedMedia, MediaFormat, MediaMetadata},
};
use tracing::{debug, info};

/// Fetches URLs that already point at a plain media file in the requested
/// format, skipping the yt-dlp round trip entirely.
pub struct DirectExtractor {
    client: reqwest::Client,
}

impl DirectExtractor {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client })
    }

    fn file_stem(url: &Url) -> Option<String> {
        let segment = url.path_segments()?.next_back()?;
        let stem = Path::new(segment).file_stem()?.to_str()?;
        if stem.is_empty() {
            None
        } else {
            Some(stem.to_string())
        }
    }
}

#[async_trait]
impl Extractor for DirectExtractor {
    fn name(&self) -> &'static str {
        "direct"
    }

    fn can_handle(&self, url: &Url, format: MediaFormat) -> bool {
        url.path()
            .to_ascii_lowercase()
            .ends_with(&format!(".{}", format.extension()))
    }

    async fn metadata(&self, url: &Url) -> Result<MediaMetadata> {
        let stem = Self::file_stem(url).unwrap_or_else(|| "media".to_string());

        Ok(MediaMetadata {
            id: stem.clone(),
            title: stem,
            duration: None,
            thumbnail: None,
            uploader: None,
            channel_id: None,
            channel_url: None,
            upload_date: None,
            webpage_url: Some(url.to_string()),
        })
    }

    async fn extract(
        &self,
        url: &Url,
        format: MediaFormat,
        workdir: &Path,
    ) -> Result<ExtractedMedia> {
        debug!("Fetching media file directly: {}", url);

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .context("Failed to fetch media URL")?;

        if !response.status().is_success() {
            return Err(anyhow::anyhow!(
                "Failed to download media: HTTP {}",
                response.status()
            ));
        }

        let data = response
            .bytes()
            .await
            .context("Failed to read media data")?;

        let path = workdir.join(format!("media.{}", format.extension()));
        tokio::fs::write(&path, &data)
            .await
            .context("Failed to write media file")?;

        info!("Fetched {} bytes directly from {}", data.len(), url);

        let metadata = self.metadata(url).await?;
        Ok(ExtractedMedia { path, metadata })
    }

    async fn test_availability() -> bool {
        // No external binary involved
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_can_handle_matches_extension() {
        let extractor = DirectExtractor::new().unwrap();
        let mp4 = Url::parse("https://example.com/clips/intro.mp4").unwrap();
        let mp3 = Url::parse("https://example.com/audio/track.MP3").unwrap();
        let page = Url::parse("https://www.youtube.com/watch?v=abc").unwrap();

        assert!(extractor.can_handle(&mp4, MediaFormat::Mp4));
        assert!(!extractor.can_handle(&mp4, MediaFormat::Mp3));
        assert!(extractor.can_handle(&mp3, MediaFormat::Mp3));
        assert!(!extractor.can_handle(&page, MediaFormat::Mp4));
    }

    #[tokio::test]
    async fn test_metadata_uses_filename_stem() {
        let extractor = DirectExtractor::new().unwrap();
        let url = Url::parse("https://example.com/clips/intro.mp4").unwrap();
        let metadata = extractor.metadata(&url).await.unwrap();
        assert_eq!(metadata.id, "intro");
        assert_eq!(metadata.title, "intro");
        assert!(metadata.channel_id.is_none());
    }
}
