use std::sync::Arc;

use {
    tempvoice_common::ChannelId,
    tempvoice_config::{Settings, SettingsStore},
    tokio::sync::RwLock,
    tracing::info,
};

use crate::Result;

/// Cached view of the persisted [`Settings`].
///
/// Read on every membership event, written only by the setup command.
pub struct SettingsHandle {
    store: Arc<dyn SettingsStore>,
    current: RwLock<Settings>,
}

impl SettingsHandle {
    /// Load the persisted record. A malformed record is an error the caller
    /// should treat as fatal.
    pub fn load(store: Arc<dyn SettingsStore>) -> Result<Self> {
        let current = store.load()?;
        Ok(Self {
            store,
            current: RwLock::new(current),
        })
    }

    pub async fn creation_channel(&self) -> Option<ChannelId> {
        self.current.read().await.creation_channel_id
    }

    /// Persist a new creation channel, then make it visible to readers.
    /// On a failed write the cached value is left as it was.
    pub async fn set_creation_channel(&self, channel: ChannelId) -> Result<Option<ChannelId>> {
        let mut current = self.current.write().await;
        let next = Settings {
            creation_channel_id: Some(channel),
        };
        self.store.save(&next)?;
        let previous = std::mem::replace(&mut *current, next).creation_channel_id;
        info!(channel_id = %channel, previous = ?previous, "creation channel updated");
        Ok(previous)
    }
}
