//! Durable single-slot storage for the signed credential.
//!
//! ARCHITECTURE
//! ============
//! The store behaves like a browser cookie: one key (`token`), an absolute
//! expiry fixed when the value is written, and no refresh on read. An expired
//! record reads as absent but stays on disk until it is overwritten by the
//! next login or removed by logout.
//!
//! TRADE-OFFS
//! ==========
//! `get` never fails. A missing, unreadable or corrupt file is reported as
//! "no credential" (and logged) so a damaged jar degrades to a login prompt
//! instead of an error screen. Writes and removals do surface failures,
//! because a logout that silently kept the credential would be worse.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use time::Duration;

use crate::clock::Clock;
use crate::error::ErrorCode;

/// Key of the credential slot.
pub const TOKEN_KEY: &str = "token";

/// Lifetime applied when the credential is written.
pub const DEFAULT_TOKEN_TTL: Duration = Duration::days(7);

// =============================================================================
// CONTRACT
// =============================================================================

/// Persistence for the current credential.
pub trait TokenStore: Send + Sync {
    /// Persist `token`, replacing any previous one, expiring `ttl` from now.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the record cannot be written.
    fn set(&mut self, token: &str, ttl: Duration) -> Result<(), StoreError>;

    /// Current unexpired credential, if any.
    fn get(&self) -> Option<String>;

    /// Delete the credential. Removing an absent credential is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if an existing record cannot be deleted.
    fn remove(&mut self) -> Result<(), StoreError>;
}

/// One persisted slot: the value and its absolute expiry in Unix seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredRecord {
    pub value: String,
    pub expires_at: i64,
}

impl StoredRecord {
    fn issue(clock: &dyn Clock, value: &str, ttl: Duration) -> Result<Self, StoreError> {
        if !ttl.is_positive() {
            return Err(StoreError::InvalidTtl(ttl));
        }
        let expires_at = clock
            .now()
            .checked_add(ttl)
            .ok_or(StoreError::InvalidTtl(ttl))?;
        Ok(Self { value: value.to_owned(), expires_at: expires_at.unix_timestamp() })
    }

    fn is_live(&self, clock: &dyn Clock) -> bool {
        clock.now().unix_timestamp() < self.expires_at
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("token store io failed at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("token store encoding failed: {0}")]
    Codec(#[from] serde_json::Error),

    #[error("token ttl out of range: {0}")]
    InvalidTtl(Duration),
}

impl ErrorCode for StoreError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Io { .. } => "E_STORE_IO",
            Self::Codec(_) => "E_STORE_CODEC",
            Self::InvalidTtl(_) => "E_STORE_TTL",
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::Io { .. })
    }
}

// =============================================================================
// FILE STORE
// =============================================================================

type Jar = BTreeMap<String, StoredRecord>;

/// JSON key/value jar on disk. Survives restarts of the client.
///
/// Other keys in the jar are preserved; only the `token` slot is managed.
pub struct FileTokenStore {
    path: PathBuf,
    clock: Arc<dyn Clock>,
}

impl FileTokenStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, clock: Arc<dyn Clock>) -> Self {
        Self { path: path.into(), clock }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: io::Error) -> StoreError {
        StoreError::Io { path: self.path.clone(), source }
    }

    fn read_jar(&self) -> Result<Jar, StoreError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Jar::new()),
            Err(e) => return Err(self.io_error(e)),
        };
        if raw.trim().is_empty() {
            return Ok(Jar::new());
        }
        Ok(serde_json::from_str(&raw)?)
    }

    fn write_jar(&self, jar: &Jar) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }
        let raw = serde_json::to_string_pretty(jar)?;

        // Write-then-rename so a crash never leaves a half-written jar.
        let staging = self.path.with_extension("tmp");
        fs::write(&staging, raw).map_err(|e| self.io_error(e))?;
        restrict_permissions(&staging).map_err(|e| self.io_error(e))?;
        fs::rename(&staging, &self.path).map_err(|e| self.io_error(e))
    }

    fn delete_file(&self) -> Result<(), StoreError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.io_error(e)),
        }
    }
}

impl TokenStore for FileTokenStore {
    fn set(&mut self, token: &str, ttl: Duration) -> Result<(), StoreError> {
        let record = StoredRecord::issue(self.clock.as_ref(), token, ttl)?;
        let mut jar = match self.read_jar() {
            Ok(jar) => jar,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "discarding unreadable token jar");
                Jar::new()
            }
        };
        jar.insert(TOKEN_KEY.to_owned(), record);
        self.write_jar(&jar)
    }

    fn get(&self) -> Option<String> {
        match self.read_jar() {
            Ok(jar) => jar
                .get(TOKEN_KEY)
                .filter(|record| record.is_live(self.clock.as_ref()))
                .map(|record| record.value.clone()),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "token jar unreadable; treating as empty");
                None
            }
        }
    }

    fn remove(&mut self) -> Result<(), StoreError> {
        match self.read_jar() {
            Ok(mut jar) => {
                if jar.remove(TOKEN_KEY).is_none() {
                    return Ok(());
                }
                if jar.is_empty() { self.delete_file() } else { self.write_jar(&jar) }
            }
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "removing unreadable token jar");
                self.delete_file()
            }
        }
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> io::Result<()> {
    Ok(())
}

// =============================================================================
// MEMORY STORE
// =============================================================================

/// Process-local store. Same expiry semantics as the file store, nothing
/// survives a restart.
pub struct MemoryTokenStore {
    record: Option<StoredRecord>,
    clock: Arc<dyn Clock>,
}

impl MemoryTokenStore {
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { record: None, clock }
    }

    /// Raw record including expired ones.
    #[must_use]
    pub fn record(&self) -> Option<&StoredRecord> {
        self.record.as_ref()
    }
}

impl TokenStore for MemoryTokenStore {
    fn set(&mut self, token: &str, ttl: Duration) -> Result<(), StoreError> {
        self.record = Some(StoredRecord::issue(self.clock.as_ref(), token, ttl)?);
        Ok(())
    }

    fn get(&self) -> Option<String> {
        self.record
            .as_ref()
            .filter(|record| record.is_live(self.clock.as_ref()))
            .map(|record| record.value.clone())
    }

    fn remove(&mut self) -> Result<(), StoreError> {
        self.record = None;
        Ok(())
    }
}

#[cfg(test)]
#[path = "store_test.rs"]
mod tests;
