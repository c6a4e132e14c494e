//! Durable conversation history.
//!
//! The store persists the full message log as a single JSON snapshot under
//! a fixed session key. Persistence is best-effort: `load` never fails (it
//! falls back to the welcome default) and `save` swallows backend errors,
//! so storage trouble can never break the conversation flow.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};

use askline_models::Message;

/// Key under which the conversation snapshot is stored.
pub const SESSION_KEY: &str = "askline-chat-history";

/// Minimal key-value storage abstraction, so the store can run against an
/// in-memory fake in tests and an on-disk directory in the app.
pub trait StorageBackend {
    fn read(&self, key: &str) -> Option<String>;
    fn write(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

impl<B: StorageBackend + ?Sized> StorageBackend for Arc<B> {
    fn read(&self, key: &str) -> Option<String> {
        (**self).read(key)
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        (**self).write(key, value)
    }

    fn remove(&self, key: &str) -> Result<()> {
        (**self).remove(key)
    }
}

impl StorageBackend for Box<dyn StorageBackend> {
    fn read(&self, key: &str) -> Option<String> {
        (**self).read(key)
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        (**self).write(key, value)
    }

    fn remove(&self, key: &str) -> Result<()> {
        (**self).remove(key)
    }
}

/// File-per-key storage rooted at a directory.
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Storage rooted at `~/.askline`.
    pub fn default_dir() -> Result<Self> {
        let home = std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .context("Failed to get home directory")?;
        Ok(Self::new(PathBuf::from(home).join(".askline")))
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl StorageBackend for FileStorage {
    fn read(&self, key: &str) -> Option<String> {
        fs::read_to_string(self.path_for(key)).ok()
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create storage directory {}", self.dir.display()))?;
        let path = self.path_for(key);
        fs::write(&path, value).with_context(|| format!("Failed to write {}", path.display()))
    }

    fn remove(&self, key: &str) -> Result<()> {
        let path = self.path_for(key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("Failed to remove {}", path.display())),
        }
    }
}

/// In-memory storage for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StorageBackend for MemoryStorage {
    fn read(&self, key: &str) -> Option<String> {
        self.entries.lock().ok()?.get(key).cloned()
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        self.entries
            .lock()
            .map_err(|_| anyhow::anyhow!("storage lock poisoned"))?
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.entries
            .lock()
            .map_err(|_| anyhow::anyhow!("storage lock poisoned"))?
            .remove(key);
        Ok(())
    }
}

/// Persists the message log as a single snapshot under a fixed key.
///
/// The persisted form is always a complete overwrite, never a partial
/// update, so the store holds a consistent snapshot after every mutation.
pub struct HistoryStore<B: StorageBackend> {
    backend: B,
    key: String,
}

impl<B: StorageBackend> HistoryStore<B> {
    pub fn new(backend: B) -> Self {
        Self::with_key(backend, SESSION_KEY)
    }

    pub fn with_key(backend: B, key: impl Into<String>) -> Self {
        Self {
            backend,
            key: key.into(),
        }
    }

    /// Initial session state: the stored snapshot, or the welcome default
    /// on absence, decode failure, or an empty decoded list.
    pub fn load(&self) -> Vec<Message> {
        let decoded = self
            .backend
            .read(&self.key)
            .and_then(|raw| serde_json::from_str::<Vec<Message>>(&raw).ok());
        match decoded {
            Some(messages) if !messages.is_empty() => messages,
            _ => vec![Message::welcome()],
        }
    }

    /// Overwrite the snapshot with the full current sequence.
    pub fn save(&self, messages: &[Message]) {
        if let Ok(json) = serde_json::to_string(messages) {
            let _ = self.backend.write(&self.key, &json);
        }
    }

    /// Drop the persisted snapshot. In-memory state is the caller's to reset.
    pub fn clear(&self) {
        let _ = self.backend.remove(&self.key);
    }
}
