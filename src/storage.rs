//! Session store.
//!
//! Page-scoped key/value persistence holding one value: the session
//! identifier of the last popup handshake. Only the popup strategy reads or
//! writes it, and the value is handed back to the wallet untouched.
//!
//! | Store | Lifetime |
//! |-------|----------|
//! | [`MemorySessionStore`] | Process |
//! | [`FileSessionStore`] | JSON file, survives restarts |

// ============================================================================
// Imports
// ============================================================================

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::identifiers::SessionId;

// ============================================================================
// Constants
// ============================================================================

/// Storage key of the persisted session identifier.
pub const SESSION_KEY: &str = "sphere-connect:session";

// ============================================================================
// SessionStore
// ============================================================================

/// Key/value persistence, `localStorage` shaped.
pub trait SessionStore: Send + Sync {
    /// Reads a value.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Writes a value, replacing any previous one.
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Removes a value. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<()>;
}

/// Typed access to [`SESSION_KEY`].
pub trait SessionStoreExt: SessionStore {
    /// Reads the persisted session identifier.
    fn session_id(&self) -> Result<Option<SessionId>> {
        Ok(self.get(SESSION_KEY)?.and_then(SessionId::new))
    }

    /// Persists a session identifier.
    fn save_session_id(&self, session_id: &SessionId) -> Result<()> {
        self.set(SESSION_KEY, session_id.as_str())
    }

    /// Forgets the session identifier.
    fn clear_session_id(&self) -> Result<()> {
        self.remove(SESSION_KEY)
    }
}

impl<S: SessionStore + ?Sized> SessionStoreExt for S {}

// ============================================================================
// MemorySessionStore
// ============================================================================

/// In-memory store.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    entries: Mutex<FxHashMap<String, String>>,
}

impl MemorySessionStore {
    /// Creates an empty store.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored entries.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Returns `true` if nothing is stored.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.entries.lock().remove(key);
        Ok(())
    }
}

// ============================================================================
// FileSessionStore
// ============================================================================

/// Store backed by a JSON object file.
///
/// Every write rewrites the whole file.
#[derive(Debug)]
pub struct FileSessionStore {
    /// Backing file.
    path: PathBuf,
    /// Cached contents.
    entries: Mutex<FxHashMap<String, String>>,
}

impl FileSessionStore {
    /// Opens the store, loading the file if it exists.
    ///
    /// # Errors
    ///
    /// - [`Error::Io`] if the file exists but cannot be read
    /// - [`Error::Storage`] if the file is not a JSON object of strings
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        let entries = match fs::read_to_string(&path) {
            Ok(text) if text.trim().is_empty() => FxHashMap::default(),
            Ok(text) => serde_json::from_str(&text).map_err(|e| {
                Error::storage(format!("{} is not a session file: {e}", path.display()))
            })?,
            Err(e) if e.kind() == ErrorKind::NotFound => FxHashMap::default(),
            Err(e) => return Err(e.into()),
        };

        debug!(path = %path.display(), entries = entries.len(), "Session store opened");

        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    /// Returns the backing file path.
    #[inline]
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes the cached entries to disk.
    fn flush(&self, entries: &FxHashMap<String, String>) -> Result<()> {
        let json = serde_json::to_string_pretty(entries)?;
        fs::write(&self.path, json)?;
        trace!(path = %self.path.display(), entries = entries.len(), "Session store flushed");
        Ok(())
    }
}

impl SessionStore for FileSessionStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.entries.lock();
        entries.insert(key.to_string(), value.to_string());
        self.flush(&entries)
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self.entries.lock();
        if entries.remove(key).is_some() {
            self.flush(&entries)?;
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
