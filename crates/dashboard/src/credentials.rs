//! Durable storage for the two access keys.
//!
//! Keys are opaque: no validation, no expiry. An empty value is the same as
//! an absent one and removes the slot.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub const MARKET_KEY_SLOT: &str = "coingecko_api_key";
pub const INSIGHT_KEY_SLOT: &str = "gemini_api_key";

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Credential file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Credential file {path} is not valid JSON: {source}")]
    Format {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Named string slots that survive restarts.
pub trait KeyValueStore: Send {
    fn get(&self, name: &str) -> Option<String>;
    fn set(&mut self, name: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&mut self, name: &str) -> Result<(), StorageError>;
}

/// JSON object on disk, rewritten whole on every change.
pub struct FileStore {
    path: PathBuf,
    values: BTreeMap<String, String>,
}

impl FileStore {
    /// Open `path`, treating a missing file as empty.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        let values = match fs::read_to_string(&path) {
            Ok(raw) if raw.trim().is_empty() => BTreeMap::new(),
            Ok(raw) => serde_json::from_str(&raw).map_err(|source| StorageError::Format {
                path: path.clone(),
                source,
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(source) => return Err(StorageError::Io { path, source }),
        };
        Ok(Self { path, values })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self) -> Result<(), StorageError> {
        let io_err = |source| StorageError::Io {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let raw = serde_json::to_string_pretty(&self.values).map_err(|source| StorageError::Format {
            path: self.path.clone(),
            source,
        })?;
        fs::write(&self.path, raw).map_err(io_err)?;
        restrict_permissions(&self.path).map_err(io_err)
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> std::io::Result<()> {
    Ok(())
}

impl KeyValueStore for FileStore {
    fn get(&self, name: &str) -> Option<String> {
        self.values.get(name).cloned()
    }

    /// The in-memory value only changes once it is on disk.
    fn set(&mut self, name: &str, value: &str) -> Result<(), StorageError> {
        let previous = self.values.insert(name.to_string(), value.to_string());
        self.persist().inspect_err(|_| self.restore(name, previous))
    }

    fn remove(&mut self, name: &str) -> Result<(), StorageError> {
        let Some(previous) = self.values.remove(name) else {
            return Ok(());
        };
        self.persist().inspect_err(|_| self.restore(name, Some(previous)))
    }
}

impl FileStore {
    fn restore(&mut self, name: &str, previous: Option<String>) {
        match previous {
            Some(value) => self.values.insert(name.to_string(), value),
            None => self.values.remove(name),
        };
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    values: HashMap<String, String>,
}

impl KeyValueStore for MemoryStore {
    fn get(&self, name: &str) -> Option<String> {
        self.values.get(name).cloned()
    }

    fn set(&mut self, name: &str, value: &str) -> Result<(), StorageError> {
        self.values.insert(name.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, name: &str) -> Result<(), StorageError> {
        self.values.remove(name);
        Ok(())
    }
}

/// Which of the two keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySlot {
    Market,
    Insight,
}

impl KeySlot {
    pub fn slot_name(self) -> &'static str {
        match self {
            KeySlot::Market => MARKET_KEY_SLOT,
            KeySlot::Insight => INSIGHT_KEY_SLOT,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            KeySlot::Market => "Market data key",
            KeySlot::Insight => "Insight key",
        }
    }
}

pub struct CredentialStore {
    store: Box<dyn KeyValueStore>,
}

impl CredentialStore {
    pub fn new(store: impl KeyValueStore + 'static) -> Self {
        Self {
            store: Box::new(store),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(MemoryStore::default())
    }

    pub fn get(&self, slot: KeySlot) -> Option<String> {
        self.store
            .get(slot.slot_name())
            .filter(|v| !v.is_empty())
    }

    /// Write `value`; an empty value clears the slot.
    pub fn set(&mut self, slot: KeySlot, value: &str) -> Result<(), StorageError> {
        if value.is_empty() {
            self.store.remove(slot.slot_name())
        } else {
            self.store.set(slot.slot_name(), value)
        }
    }

    pub fn market_key(&self) -> Option<String> {
        self.get(KeySlot::Market)
    }

    pub fn insight_key(&self) -> Option<String> {
        self.get(KeySlot::Insight)
    }

    pub fn clear_all(&mut self) -> Result<(), StorageError> {
        self.store.remove(MARKET_KEY_SLOT)?;
        self.store.remove(INSIGHT_KEY_SLOT)
    }
}
