use std::fmt;
use std::path::Path;

use bytes::Bytes;
use log::info;

use crate::error::{ApiError, ApiResult};

/// The three asset categories an entry can reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
    Audio,
}

impl MediaKind {
    /// Top-level media type every accepted file must carry.
    pub fn prefix(&self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
            MediaKind::Audio => "audio",
        }
    }

    /// Message shown when a file of the wrong kind is picked.
    pub fn wrong_type_message(&self) -> &'static str {
        match self {
            MediaKind::Image => "Choose an image",
            MediaKind::Video => "Choose a video file",
            MediaKind::Audio => "Choose an audio file",
        }
    }

    pub fn accepts(&self, media_type: &str) -> bool {
        media_type
            .trim()
            .to_ascii_lowercase()
            .starts_with(&format!("{}/", self.prefix()))
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.prefix())
    }
}

/// A file picked for upload, with the media type the picker declared.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub file_name: String,
    pub media_type: String,
    pub data: Bytes,
}

impl UploadFile {
    pub fn new(file_name: impl Into<String>, media_type: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            file_name: file_name.into(),
            media_type: media_type.into(),
            data: data.into(),
        }
    }

    /// Read a file from disk. The media type is declared from the extension.
    pub async fn from_path(path: &Path) -> ApiResult<Self> {
        let data = tokio::fs::read(path)
            .await
            .map_err(|e| ApiError::Validation(format!("Failed to read {}: {}", path.display(), e)))?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        let media_type = media_type_for(path).to_string();
        info!("Read {} ({} bytes, {})", file_name, data.len(), media_type);
        Ok(Self::new(file_name, media_type, data))
    }

    /// Fail locally when the declared type does not match the expected kind.
    pub fn ensure_kind(&self, kind: MediaKind) -> ApiResult<()> {
        if kind.accepts(&self.media_type) {
            Ok(())
        } else {
            Err(ApiError::InvalidMediaType {
                expected: kind.prefix(),
                actual: self.media_type.clone(),
            })
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

fn media_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        "mkv" => "video/x-matroska",
        "mov" => "video/quicktime",
        "mp3" => "audio/mpeg",
        "ogg" => "audio/ogg",
        "wav" => "audio/wav",
        "flac" => "audio/flac",
        "pdf" => "application/pdf",
        _ => "application/octet-stream",
    }
}
