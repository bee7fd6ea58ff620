//! The persisted settings record.
//!
//! A single JSON object, `{"creationChannelId": "<id>" | null}`, read once at
//! startup and rewritten whenever the setup command succeeds.

use std::{
    path::{Path, PathBuf},
    sync::Mutex,
};

use {
    serde::{Deserialize, Serialize},
    tempvoice_common::ChannelId,
    tracing::{debug, info},
};

use crate::error::{Error, Result};

/// Global settings written by the setup command.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// The voice channel whose join events provision personal rooms.
    pub creation_channel_id: Option<ChannelId>,
}

/// Persistent storage for [`Settings`].
///
/// Concurrent writers are not expected; the last `save` wins.
pub trait SettingsStore: Send + Sync {
    /// Read the persisted record, creating and persisting the default when
    /// none exists. A malformed record is an error.
    fn load(&self) -> Result<Settings>;

    /// Replace the persisted record.
    fn save(&self, settings: &Settings) -> Result<()>;
}

/// Settings stored as pretty-printed JSON on disk.
#[derive(Debug, Clone)]
pub struct FileSettingsStore {
    path: PathBuf,
}

impl FileSettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "settings.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl SettingsStore for FileSettingsStore {
    fn load(&self) -> Result<Settings> {
        if !self.path.exists() {
            let settings = Settings::default();
            self.save(&settings)?;
            info!(path = %self.path.display(), "created default settings file");
            return Ok(settings);
        }

        let raw = std::fs::read_to_string(&self.path).map_err(|source| Error::Read {
            path: self.path.clone(),
            source,
        })?;
        let settings = serde_json::from_str(&raw).map_err(|e| Error::parse(&self.path, e))?;
        debug!(path = %self.path.display(), ?settings, "loaded settings");
        Ok(settings)
    }

    fn save(&self, settings: &Settings) -> Result<()> {
        let write_err = |source: std::io::Error| Error::Write {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }

        let json = serde_json::to_string_pretty(settings)?;
        // Write-then-rename so readers never see a half-written record.
        let tmp = self.tmp_path();
        std::fs::write(&tmp, json).map_err(write_err)?;
        std::fs::rename(&tmp, &self.path).map_err(write_err)?;
        debug!(path = %self.path.display(), "saved settings");
        Ok(())
    }
}

/// In-memory store, for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemorySettingsStore {
    inner: Mutex<Settings>,
    saves: Mutex<usize>,
}

impl MemorySettingsStore {
    pub fn new(settings: Settings) -> Self {
        Self {
            inner: Mutex::new(settings),
            saves: Mutex::new(0),
        }
    }

    /// Number of successful `save` calls.
    pub fn save_count(&self) -> usize {
        self.saves.lock().map(|n| *n).unwrap_or_default()
    }
}

impl SettingsStore for MemorySettingsStore {
    fn load(&self) -> Result<Settings> {
        Ok(self
            .inner
            .lock()
            .map(|s| s.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone()))
    }

    fn save(&self, settings: &Settings) -> Result<()> {
        match self.inner.lock() {
            Ok(mut guard) => *guard = settings.clone(),
            Err(poisoned) => *poisoned.into_inner() = settings.clone(),
        }
        if let Ok(mut n) = self.saves.lock() {
            *n += 1;
        }
        Ok(())
    }
}
