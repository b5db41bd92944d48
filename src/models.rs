use std::fmt;
use std::str::FromStr;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Series,
    Movie,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Series => "series",
            ContentType::Movie => "movie",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for ContentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "series" => Ok(ContentType::Series),
            "movie" => Ok(ContentType::Movie),
            other => Err(format!("unknown content type: {}", other)),
        }
    }
}

/// One catalog item as returned by the anime endpoint.
///
/// `comments` is only populated by the single-entry fetch; list responses
/// carry summaries and leave it as `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub content_type: ContentType,
    #[serde(default)]
    pub genre: String,
    pub year: i32,
    #[serde(default = "default_episodes")]
    pub episodes: i32,
    #[serde(default, deserialize_with = "number_or_string")]
    pub rating: f64,
    #[serde(default)]
    pub rating_count: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub music_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comments: Option<Vec<Comment>>,
}

fn default_episodes() -> i32 {
    1
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub comment_text: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    #[serde(default)]
    pub is_admin: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VerifyResponse {
    pub user: User,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthAction {
    Login,
    Register,
}

#[derive(Debug, Serialize)]
pub struct AuthRequest<'a> {
    pub action: AuthAction,
    pub email: &'a str,
    pub password: &'a str,
}

/// Full mutable field set sent on create (no id) and update (with id).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntryPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub title: String,
    pub description: String,
    #[serde(rename = "type")]
    pub content_type: ContentType,
    pub genre: String,
    pub year: i32,
    pub episodes: i32,
    pub thumbnail_url: Option<String>,
    pub video_url: Option<String>,
    pub music_url: Option<String>,
}

impl From<&CatalogEntry> for EntryPayload {
    fn from(entry: &CatalogEntry) -> Self {
        Self {
            id: Some(entry.id),
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
}

/// A score from the fixed 1..=10 rating button set.
///
/// There is no way to build a `Rating` outside that range, so an invalid
/// value can never reach the ratings endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Rating(u8);

impl Rating {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 10;

    pub fn new(value: u8) -> Option<Self> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Some(Rating(value))
        } else {
            None
        }
    }

    pub fn value(&self) -> u8 {
        self.0
    }

    /// The rating buttons, lowest first.
    pub fn all() -> impl Iterator<Item = Rating> {
        (Self::MIN..=Self::MAX).map(Rating)
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.0, Self::MAX)
    }
}

#[derive(Debug, Serialize)]
pub struct RatingRequest {
    pub anime_id: i64,
    pub rating: Rating,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RatingSummary {
    #[serde(deserialize_with = "number_or_string")]
    pub rating: f64,
    #[serde(default)]
    pub rating_count: i64,
}

#[derive(Debug, Serialize)]
pub struct CommentRequest<'a> {
    pub anime_id: i64,
    pub comment_text: &'a str,
}

#[derive(Debug, Serialize)]
pub struct PasswordChangeRequest<'a> {
    pub old_password: &'a str,
    pub new_password: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MessageResponse {
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UploadResponse {
    pub url: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Banner {
    pub id: i64,
    pub title: String,
    pub image_url: String,
    #[serde(default)]
    pub link_url: Option<String>,
    #[serde(default)]
    pub display_order: i32,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

// The ratings backend returns NUMERIC columns, which arrive either as JSON
// numbers or as decimal strings depending on the driver.
fn number_or_string<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| de::Error::custom("rating is not representable as f64")),
        Value::String(s) => s.trim().parse::<f64>().map_err(de::Error::custom),
        Value::Null => Ok(0.0),
        other => Err(de::Error::custom(format!("unexpected rating value: {}", other))),
    }
}
