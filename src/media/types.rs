use std::path::PathBuf;

use serde::Serialize;

/// Output container requested by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaFormat {
    Mp4,
    Mp3,
}

impl MediaFormat {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "mp4" => Some(Self::Mp4),
            "mp3" => Some(Self::Mp3),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Mp4 => "mp4",
            Self::Mp3 => "mp3",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Mp4 => "video/mp4",
            Self::Mp3 => "audio/mpeg",
        }
    }
}

impl std::fmt::Display for MediaFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

/// Source metadata as reported by the extractor.
#[derive(Debug, Clone, Serialize)]
pub struct MediaMetadata {
    pub id: String,
    pub title: String,
    pub duration: Option<u64>,
    pub thumbnail: Option<String>,
    pub uploader: Option<String>,
    pub channel_id: Option<String>,
    pub channel_url: Option<String>,
    pub upload_date: Option<String>,
    pub webpage_url: Option<String>,
}

/// A file produced by an extractor inside the request's scratch directory.
#[derive(Debug)]
pub struct ExtractedMedia {
    pub path: PathBuf,
    pub metadata: MediaMetadata,
}
