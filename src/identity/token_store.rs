//! Durable client storage for the bearer token.
//!
//! The application keeps exactly one key: the current token string. It is
//! read once at startup, written when a login-like operation succeeds and
//! removed on logout, on failure and whenever the backend answers 401.

use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use crate::error::AppResult;

pub trait TokenStorage: Send + Sync {
    fn load(&self) -> AppResult<Option<String>>;
    fn save(&self, token: &str) -> AppResult<()>;
    fn clear(&self) -> AppResult<()>;
}

/// Token persisted as a small text file (the terminal equivalent of `localStorage`).
#[derive(Debug, Clone)]
pub struct FileTokenStorage {
    path: PathBuf,
}

impl FileTokenStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self { Self { path: path.into() } }

    pub fn path(&self) -> &Path { &self.path }
}

impl TokenStorage for FileTokenStorage {
    fn load(&self) -> AppResult<Option<String>> {
        match std::fs::read_to_string(&self.path) {
            Ok(s) => {
                let t = s.trim();
                Ok(if t.is_empty() { None } else { Some(t.to_string()) })
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, token: &str) -> AppResult<()> {
        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() { std::fs::create_dir_all(dir)?; }
        }
        write_private(&self.path, token)?;
        Ok(())
    }

    fn clear(&self) -> AppResult<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Writes the token readable by its owner only (mode 0600 on unix).
#[cfg(unix)]
fn write_private(path: &Path, token: &str) -> std::io::Result<()> {
    use std::io::Write;
    use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

    let mut file = std::fs::OpenOptions::new().write(true).create(true).truncate(true).mode(0o600).open(path)?;
    // `mode` only applies on creation; tighten a file left by an older build.
    file.set_permissions(std::fs::Permissions::from_mode(0o600))?;
    file.write_all(token.as_bytes())?;
    file.sync_all()
}

#[cfg(not(unix))]
fn write_private(path: &Path, token: &str) -> std::io::Result<()> { std::fs::write(path, token) }

#[derive(Debug, Default)]
pub struct MemoryTokenStorage {
    slot: Mutex<Option<String>>,
}

impl MemoryTokenStorage {
    pub fn new() -> Self { Self::default() }

    pub fn with_token(token: &str) -> Self { Self { slot: Mutex::new(Some(token.to_string())) } }
}

impl TokenStorage for MemoryTokenStorage {
    fn load(&self) -> AppResult<Option<String>> { Ok(self.slot.lock().clone()) }

    fn save(&self, token: &str) -> AppResult<()> {
        *self.slot.lock() = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> AppResult<()> {
        *self.slot.lock() = None;
        Ok(())
    }
}

/// Short, log-safe form of a token.
pub fn redact(token: &str) -> String {
    let head: String = token.chars().take(6).collect();
    format!("{head}…")
}
