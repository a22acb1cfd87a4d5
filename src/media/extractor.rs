use std::path::Path;

use anyhow::Result;
use async_trait::async_trait;
use url::Url;

use super::types::{ExtractedMedia, MediaFormat, MediaMetadata};

#[async_trait]
pub trait Extractor: Send + Sync {
    /// Human-readable name of the extractor
    fn name(&self) -> &'static str;

    /// Whether this extractor wants to try the given URL at all
    fn can_handle(&self, url: &Url, format: MediaFormat) -> bool {
        let _ = (url, format);
        true
    }

    /// Fetch source metadata without downloading
    async fn metadata(&self, url: &Url) -> Result<MediaMetadata>;

    /// Produce a file in the requested format inside `workdir`
    async fn extract(&self, url: &Url, format: MediaFormat, workdir: &Path)
        -> Result<ExtractedMedia>;

    /// Test if this extractor is usable on the system
    async fn test_availability() -> bool
    where
        Self: Sized;
}
