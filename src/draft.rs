use chrono::Datelike;
use url::Url;

use crate::models::{CatalogEntry, ContentType, EntryPayload};
use crate::upload::MediaKind;

/// Cover shown for new entries until a real one is uploaded.
pub const PLACEHOLDER_THUMBNAIL: &str =
    "https://v3b.fal.media/files/b/tiger/UXPfrGySjtBEuDWgc5z29_output.png";

/// Field values for an entry that has not been submitted yet.
#[derive(Debug, Clone, PartialEq)]
pub struct EntryDraft {
    pub title: String,
    pub description: String,
    pub content_type: ContentType,
    pub genre: String,
    pub year: i32,
    pub episodes: i32,
    pub thumbnail_url: Option<String>,
    pub video_url: Option<String>,
    pub music_url: Option<String>,
}

impl Default for EntryDraft {
    fn default() -> Self {
        Self::template()
    }
}

impl EntryDraft {
    /// The blank form: a one-episode series dated this year with the
    /// placeholder cover.
    pub fn template() -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            content_type: ContentType::Series,
            genre: String::new(),
            year: chrono::Local::now().year(),
            episodes: 1,
            thumbnail_url: Some(PLACEHOLDER_THUMBNAIL.to_string()),
            video_url: None,
            music_url: None,
        }
    }

    /// Start an edit form pre-filled from an existing entry.
    pub fn from_entry(entry: &CatalogEntry) -> Self {
        Self {
            title: entry.title.clone(),
            description: entry.description.clone().unwrap_or_default(),
            content_type: entry.content_type,
            genre: entry.genre.clone(),
            year: entry.year,
            episodes: entry.episodes,
            thumbnail_url: entry.thumbnail_url.clone(),
            video_url: entry.video_url.clone(),
            music_url: entry.music_url.clone(),
        }
    }

    pub fn set_title(&mut self, title: impl Into<String>) -> &mut Self {
        self.title = title.into();
        self
    }

    pub fn set_description(&mut self, description: impl Into<String>) -> &mut Self {
        self.description = description.into();
        self
    }

    pub fn set_content_type(&mut self, content_type: ContentType) -> &mut Self {
        self.content_type = content_type;
        self
    }

    pub fn set_genre(&mut self, genre: impl Into<String>) -> &mut Self {
        self.genre = genre.into();
        self
    }

    pub fn set_year(&mut self, year: i32) -> &mut Self {
        self.year = year;
        self
    }

    pub fn set_episodes(&mut self, episodes: i32) -> &mut Self {
        self.episodes = episodes;
        self
    }

    pub fn set_thumbnail_url(&mut self, url: impl Into<String>) -> &mut Self {
        self.thumbnail_url = Some(url.into());
        self
    }

    pub fn set_video_url(&mut self, url: impl Into<String>) -> &mut Self {
        self.video_url = Some(url.into());
        self
    }

    pub fn set_music_url(&mut self, url: impl Into<String>) -> &mut Self {
        self.music_url = Some(url.into());
        self
    }

    /// Put an uploaded asset URL into the field for its media kind.
    pub fn set_media(&mut self, kind: MediaKind, url: impl Into<String>) -> &mut Self {
        match kind {
            MediaKind::Image => self.set_thumbnail_url(url),
            MediaKind::Video => self.set_video_url(url),
            MediaKind::Audio => self.set_music_url(url),
        }
    }

    /// Media references must at least parse as URLs. Everything else is
    /// left to the server.
    pub fn validate(&self) -> Result<(), String> {
        check_media_url("thumbnail", self.thumbnail_url.as_deref())?;
        check_media_url("video", self.video_url.as_deref())?;
        check_media_url("music", self.music_url.as_deref())?;
        Ok(())
    }

    /// Payload for a create request.
    pub fn to_payload(&self) -> EntryPayload {
        EntryPayload {
            id: None,
            title: self.title.clone(),
            description: self.description.clone(),
            content_type: self.content_type,
            genre: self.genre.clone(),
            year: self.year,
            episodes: self.episodes,
            thumbnail_url: self.thumbnail_url.clone(),
            video_url: self.video_url.clone(),
            music_url: self.music_url.clone(),
        }
    }

    /// Copy the draft's fields onto an existing entry, keeping its id and
    /// server-computed fields.
    pub fn apply_to(&self, entry: &CatalogEntry) -> CatalogEntry {
        CatalogEntry {
            title: self.title.clone(),
            description: Some(self.description.clone()),
            content_type: self.content_type,
            genre: self.genre.clone(),
            year: self.year,
            episodes: self.episodes,
            thumbnail_url: self.thumbnail_url.clone(),
            video_url: self.video_url.clone(),
            music_url: self.music_url.clone(),
            ..entry.clone()
        }
    }
}

/// Same check applied to entries being edited in place.
pub fn validate_entry_media(entry: &CatalogEntry) -> Result<(), String> {
    check_media_url("thumbnail", entry.thumbnail_url.as_deref())?;
    check_media_url("video", entry.video_url.as_deref())?;
    check_media_url("music", entry.music_url.as_deref())?;
    Ok(())
}

fn check_media_url(field: &str, value: Option<&str>) -> Result<(), String> {
    match value {
        None => Ok(()),
        Some(v) if v.trim().is_empty() => Ok(()),
        Some(v) => Url::parse(v.trim())
            .map(|_| ())
            .map_err(|_| format!("Invalid {} URL: {}", field, v)),
    }
}
