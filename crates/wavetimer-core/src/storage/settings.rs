//! Per-user timer settings store.
//!
//! A small key-value document store: `get` returns whatever fields a user has
//! saved and `merge_set` overwrites only the fields present in the partial
//! update. The background process only ever reads it; the UI writes.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::data_dir;
use crate::error::{ConfigError, StoreError};
use crate::events::UiMessage;

/// Stored fields for one user. Absent fields mean "use the default".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoredSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl StoredSettings {
    /// Partial update carrying the setting in `message`, if it is one.
    pub fn from_message(message: &UiMessage) -> Option<Self> {
        match *message {
            UiMessage::DurationChanged(secs) => Some(Self {
                duration_seconds: Some(secs),
                ..Default::default()
            }),
            UiMessage::VolumeChanged(volume) => Some(Self {
                volume: Some(volume),
                ..Default::default()
            }),
            UiMessage::StartTimer | UiMessage::StopService => None,
        }
    }

    /// Overwrite the fields `partial` carries; keep the rest.
    pub fn merge(&mut self, partial: &StoredSettings) {
        if let Some(secs) = partial.duration_seconds {
            self.duration_seconds = Some(secs);
        }
        if let Some(volume) = partial.volume {
            self.volume = Some(volume);
        }
        self.updated_at = partial.updated_at.or(self.updated_at);
    }
}

pub trait SettingsStore: Send + Sync {
    fn get(&self, user: &str) -> Result<StoredSettings, StoreError>;
    fn merge_set(&self, user: &str, partial: &StoredSettings) -> Result<(), StoreError>;
}

/// On-disk layout: one table per user key.
#[derive(Debug, Default, Serialize, Deserialize)]
struct SettingsDocument {
    #[serde(default)]
    users: BTreeMap<String, StoredSettings>,
}

/// Settings store backed by `<data_dir>/settings.toml`.
#[derive(Debug)]
pub struct TomlSettingsStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl TomlSettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Store at the default location.
    pub fn open_default() -> Result<Self, ConfigError> {
        Ok(Self::new(data_dir()?.join("settings.toml")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_document(&self, user: &str) -> Result<SettingsDocument, StoreError> {
        let read_failed = |message: String| StoreError::ReadFailed {
            user: user.to_string(),
            message,
        };
        match std::fs::read_to_string(&self.path) {
            Ok(content) => toml::from_str(&content).map_err(|e| read_failed(e.to_string())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(SettingsDocument::default()),
            Err(e) => Err(read_failed(e.to_string())),
        }
    }
}

impl SettingsStore for TomlSettingsStore {
    fn get(&self, user: &str) -> Result<StoredSettings, StoreError> {
        let mut doc = self.read_document(user)?;
        Ok(doc.users.remove(user).unwrap_or_default())
    }

    fn merge_set(&self, user: &str, partial: &StoredSettings) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().map_err(|_| StoreError::Poisoned)?;
        let write_failed = |message: String| StoreError::WriteFailed {
            user: user.to_string(),
            message,
        };

        let mut doc = self.read_document(user)?;
        let mut partial = partial.clone();
        partial.updated_at = Some(Utc::now());
        doc.users.entry(user.to_string()).or_default().merge(&partial);

        let content = toml::to_string_pretty(&doc).map_err(|e| write_failed(e.to_string()))?;
        // Write beside the target and rename so readers never see half a file.
        let tmp = self.path.with_extension("toml.tmp");
        std::fs::write(&tmp, content).map_err(|e| write_failed(e.to_string()))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| write_failed(e.to_string()))
    }
}

/// In-memory store, used by tests and as a fallback when no data directory
/// is available.
#[derive(Debug, Default)]
pub struct MemorySettingsStore {
    users: Mutex<HashMap<String, StoredSettings>>,
    failing: AtomicBool,
}

impl MemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail, to exercise error paths.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

impl SettingsStore for MemorySettingsStore {
    fn get(&self, user: &str) -> Result<StoredSettings, StoreError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::ReadFailed {
                user: user.to_string(),
                message: "store unavailable".into(),
            });
        }
        let users = self.users.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(users.get(user).cloned().unwrap_or_default())
    }

    fn merge_set(&self, user: &str, partial: &StoredSettings) -> Result<(), StoreError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::WriteFailed {
                user: user.to_string(),
                message: "store unavailable".into(),
            });
        }
        let mut users = self.users.lock().map_err(|_| StoreError::Poisoned)?;
        users.entry(user.to_string()).or_default().merge(partial);
        Ok(())
    }
}
