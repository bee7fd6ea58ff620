//! The administrative setup command.
//!
//! Creates a fresh creation channel and records it in the settings. Running
//! it again replaces the configured id; the previous creation channel is
//! left in place.

use std::sync::Arc;

use {
    tempvoice_common::{ChannelId, GuildId},
    tempvoice_config::RoomsConfig,
    tracing::{debug, info},
};

#[cfg(feature = "metrics")]
use tempvoice_metrics::{counter, setup as setup_metrics};

use crate::{
    Result,
    platform::{Permission, PermissionGrant, VoiceChannelSpec, VoicePlatform},
    settings::SettingsHandle,
};

/// Reply sent when any setup step fails.
pub const FAILURE_REPLY: &str = "❌ Something went wrong while configuring the creation channel.";

/// Who asked for setup, and where.
#[derive(Debug, Clone)]
pub struct SetupRequest {
    pub guild_id: GuildId,
    /// Human-readable invoker name for the audit log.
    pub invoker: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetupOutcome {
    pub channel_id: ChannelId,
    pub name: String,
    pub category: Option<ChannelId>,
    /// The creation channel configured before this run, if any.
    pub replaced: Option<ChannelId>,
}

impl SetupOutcome {
    pub fn reply(&self) -> String {
        format!(
            "✅ Creation channel configured: **{}** (ID: {})",
            self.name, self.channel_id
        )
    }
}

pub struct SetupHandler {
    platform: Arc<dyn VoicePlatform>,
    settings: Arc<SettingsHandle>,
    config: RoomsConfig,
}

impl SetupHandler {
    pub fn new(
        platform: Arc<dyn VoicePlatform>,
        settings: Arc<SettingsHandle>,
        config: RoomsConfig,
    ) -> Self {
        Self {
            platform,
            settings,
            config,
        }
    }

    /// Exact match, no arguments.
    pub fn is_setup_command(&self, content: &str) -> bool {
        content == self.config.setup_command
    }

    /// Provision the creation channel and persist its id.
    ///
    /// If the channel was created but the settings write fails, the channel
    /// is left orphaned and the error is returned; nothing is retried.
    pub async fn run(&self, request: &SetupRequest) -> Result<SetupOutcome> {
        #[cfg(feature = "metrics")]
        counter!(setup_metrics::RUNS_TOTAL).increment(1);

        let result = self.provision(request).await;

        #[cfg(feature = "metrics")]
        if result.is_err() {
            counter!(setup_metrics::FAILURES_TOTAL).increment(1);
        }
        result
    }

    async fn provision(&self, request: &SetupRequest) -> Result<SetupOutcome> {
        let keyword = self.config.category_keyword.trim();
        let category = if keyword.is_empty() {
            None
        } else {
            self.platform
                .find_category(request.guild_id, keyword)
                .await?
        };
        debug!(guild_id = %request.guild_id, category = ?category, "creation channel category");

        let created = self
            .platform
            .create_voice_channel(request.guild_id, VoiceChannelSpec {
                name: self.config.creation_channel_name.clone(),
                parent: category,
                user_limit: None,
                grants: vec![PermissionGrant::everyone([Permission::Connect])],
                reason: Some(format!(
                    "Creation channel configured by {}",
                    request.invoker
                )),
            })
            .await?;

        let replaced = self.settings.set_creation_channel(created.id).await?;

        info!(
            guild_id = %request.guild_id,
            channel_id = %created.id,
            name = %created.name,
            invoker = %request.invoker,
            "creation channel configured"
        );

        Ok(SetupOutcome {
            channel_id: created.id,
            name: created.name,
            category,
            replaced,
        })
    }
}
