//! Session token ownership.
//!
//! The token lives in exactly one place: a [`SessionContext`] built at start-up
//! and handed to every controller. Durable persistence goes through a
//! [`TokenStore`] so the file-backed store can be swapped for an in-memory one.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, RwLock};

use log::{debug, error, warn};
use serde::{Deserialize, Serialize};

pub trait TokenStore: Send + Sync {
    fn load(&self) -> io::Result<Option<String>>;
    fn save(&self, token: &str) -> io::Result<()>;
    fn clear(&self) -> io::Result<()>;
}

// On-disk layout: `{"auth_token": "..."}`
#[derive(Debug, Default, Serialize, Deserialize)]
struct StoredSession {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    auth_token: Option<String>,
}

/// Keeps the token in a small JSON document on disk so it survives restarts.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> io::Result<Option<String>> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e),
        };

        match serde_json::from_str::<StoredSession>(&raw) {
            Ok(stored) => Ok(stored.auth_token.filter(|t| !t.is_empty())),
            Err(e) => {
                // A corrupt file is the same as no session
                warn!("Ignoring unreadable session file {}: {}", self.path.display(), e);
                Ok(None)
            }
        }
    }

    fn save(&self, token: &str) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                create_private_dir(parent)?;
            }
        }
        let stored = StoredSession {
            auth_token: Some(token.to_string()),
        };
        let json = serde_json::to_string_pretty(&stored)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        let mut file = open_private(&self.path)?;
        file.write_all(json.as_bytes())
    }

    fn clear(&self) -> io::Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }
}

// Only directories created here are tightened; existing parents are left alone.
fn create_private_dir(path: &Path) -> io::Result<()> {
    fs::create_dir_all(path)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o700))?;
    }
    Ok(())
}

/// Open the session file for writing, readable by its owner only.
fn open_private(path: &Path) -> io::Result<fs::File> {
    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let file = options.open(path)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        // `mode` only applies when the file is created
        file.set_permissions(fs::Permissions::from_mode(0o600))?;
    }
    Ok(file)
}

/// Process-local store, used by tests and by callers that do not want
/// anything written to disk.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: Mutex<Option<String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Mutex::new(Some(token.into())),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> io::Result<Option<String>> {
        Ok(self.token.lock().unwrap_or_else(|e| e.into_inner()).clone())
    }

    fn save(&self, token: &str) -> io::Result<()> {
        *self.token.lock().unwrap_or_else(|e| e.into_inner()) = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> io::Result<()> {
        *self.token.lock().unwrap_or_else(|e| e.into_inner()) = None;
        Ok(())
    }
}

pub struct SessionContext {
    store: Box<dyn TokenStore>,
    token: RwLock<Option<String>>,
}

impl SessionContext {
    pub fn new(store: impl TokenStore + 'static) -> Self {
        Self {
            store: Box::new(store),
            token: RwLock::new(None),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(MemoryTokenStore::new())
    }

    /// Pull any persisted token into memory. Returns whether one was found.
    pub fn init_session(&self) -> bool {
        let loaded = match self.store.load() {
            Ok(token) => token,
            Err(e) => {
                error!("Failed to read persisted session: {}", e);
                None
            }
        };
        let found = loaded.is_some();
        *self.token.write().unwrap_or_else(|e| e.into_inner()) = loaded;
        debug!("Session initialised (token present: {})", found);
        found
    }

    /// Adopt a freshly issued token and persist it.
    pub fn begin(&self, token: String) {
        if let Err(e) = self.store.save(&token) {
            // The in-memory session still works for this run
            error!("Failed to persist session token: {}", e);
        }
        *self.token.write().unwrap_or_else(|e| e.into_inner()) = Some(token);
    }

    /// Forget the token both in memory and in the durable store.
    pub fn teardown_session(&self) {
        *self.token.write().unwrap_or_else(|e| e.into_inner()) = None;
        if let Err(e) = self.store.clear() {
            error!("Failed to clear persisted session token: {}", e);
        }
    }

    pub fn token(&self) -> Option<String> {
        self.token.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn has_token(&self) -> bool {
        self.token.read().unwrap_or_else(|e| e.into_inner()).is_some()
    }

    /// Whether the durable store still holds a token, independent of memory.
    pub fn persisted_token(&self) -> Option<String> {
        self.store.load().ok().flatten()
    }
}

impl std::fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionContext")
            .field("has_token", &self.has_token())
            .finish()
    }
}
