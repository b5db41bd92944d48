use std::env;
use std::path::PathBuf;
use std::time::Duration;

use log::{info, warn};
use url::Url;

const DEFAULT_API_URL: &str = "http://localhost:5050";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Endpoint URLs for each logical API group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub auth: String,
    pub anime: String,
    pub ratings: String,
    pub comments: String,
    pub change_password: String,
    pub upload: String,
    pub banners: String,
}

impl Endpoints {
    /// Derive every endpoint from a single base URL.
    pub fn from_base(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            auth: format!("{}/auth", base),
            anime: format!("{}/anime", base),
            ratings: format!("{}/ratings", base),
            comments: format!("{}/comments", base),
            change_password: format!("{}/change-password", base),
            upload: format!("{}/upload", base),
            banners: format!("{}/banners", base),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub endpoints: Endpoints,
    pub timeout: Duration,
    pub session_file: PathBuf,
}

impl ApiConfig {
    pub fn new(endpoints: Endpoints) -> Self {
        Self {
            endpoints,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            session_file: default_session_file(),
        }
    }

    /// Read configuration from the environment. Call `dotenv().ok()` first
    /// if a `.env` file should be honoured.
    pub fn from_env() -> Self {
        let base = env::var("CATALOG_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        if Url::parse(&base).is_err() {
            warn!("CATALOG_API_URL is not a valid URL: {}", base);
        }

        // Any single group can live on its own host
        let defaults = Endpoints::from_base(&base);
        let endpoints = Endpoints {
            auth: env::var("CATALOG_AUTH_URL").unwrap_or(defaults.auth),
            anime: env::var("CATALOG_ANIME_URL").unwrap_or(defaults.anime),
            ratings: env::var("CATALOG_RATINGS_URL").unwrap_or(defaults.ratings),
            comments: env::var("CATALOG_COMMENTS_URL").unwrap_or(defaults.comments),
            change_password: env::var("CATALOG_PASSWORD_URL").unwrap_or(defaults.change_password),
            upload: env::var("CATALOG_UPLOAD_URL").unwrap_or(defaults.upload),
            banners: env::var("CATALOG_BANNERS_URL").unwrap_or(defaults.banners),
        };

        let timeout = env::var("CATALOG_HTTP_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        let session_file = env::var("CATALOG_SESSION_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_session_file());

        info!("Content API base: {}", base);
        info!("Session file: {}", session_file.display());

        Self {
            endpoints,
            timeout: Duration::from_secs(timeout),
            session_file,
        }
    }

    pub fn with_session_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.session_file = path.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

fn default_session_file() -> PathBuf {
    let home = env::var("HOME").map(PathBuf::from).unwrap_or_else(|_| PathBuf::from("."));
    home.join(".anime-catalog").join("session.json")
}
