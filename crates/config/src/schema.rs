//! Config schema types (discord credentials, room policy, settings path, metrics).
use std::{net::SocketAddr, path::PathBuf};

use {
    secrecy::{ExposeSecret, Secret},
    serde::{Deserialize, Serialize},
};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TempVoiceConfig {
    pub discord: DiscordConfig,
    pub rooms: RoomsConfig,
    pub settings: SettingsConfig,
    pub metrics: MetricsConfig,
}

/// Discord connection settings.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscordConfig {
    /// Bot token. Usually left unset here and supplied through `DISCORD_TOKEN`.
    #[serde(
        serialize_with = "serialize_secret",
        skip_serializing_if = "Option::is_none"
    )]
    pub token: Option<Secret<String>>,
}

impl DiscordConfig {
    /// True when a non-blank token is present.
    pub fn has_token(&self) -> bool {
        self.token
            .as_ref()
            .is_some_and(|t| !t.expose_secret().trim().is_empty())
    }
}

impl std::fmt::Debug for DiscordConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscordConfig")
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

fn serialize_secret<S: serde::Serializer>(
    secret: &Option<Secret<String>>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match secret {
        Some(s) => serializer.serialize_str(s.expose_secret()),
        None => serializer.serialize_none(),
    }
}

/// Ephemeral room policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RoomsConfig {
    /// Exact text of the administrative command that provisions the creation channel.
    pub setup_command: String,
    /// Display name of the creation channel made by the setup command.
    pub creation_channel_name: String,
    /// Case-insensitive substring used to find the category that hosts the
    /// creation channel. No match places it at the top level.
    pub category_keyword: String,
    /// Name template for personal rooms; `{name}` is the member's display name.
    pub room_name_template: String,
    /// Maximum occupancy of a personal room.
    pub user_limit: u32,
    /// Direct message sent when a personal room could not be provisioned.
    pub failure_notice: String,
    /// Also provision when a member moves into the creation channel from
    /// another voice channel, not only when they connect fresh.
    pub trigger_on_transfer: bool,
    /// Move a member back into the room they already own instead of
    /// creating a second one.
    pub reuse_owned_room: bool,
}

impl Default for RoomsConfig {
    fn default() -> Self {
        Self {
            setup_command: "!setup".into(),
            creation_channel_name: "➕ Create Channel".into(),
            category_keyword: "voice".into(),
            room_name_template: "🔊 {name}".into(),
            user_limit: 7,
            failure_notice: "⚠️ I couldn't create your voice channel!".into(),
            trigger_on_transfer: true,
            reuse_owned_room: true,
        }
    }
}

/// Where the runtime settings record lives.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SettingsConfig {
    pub path: PathBuf,
}

impl Default for SettingsConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("settings.json"),
        }
    }
}

/// Prometheus exporter configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Whether metrics collection is enabled.
    pub enabled: bool,
    /// Address the `/metrics` HTTP listener binds to.
    pub listen: SocketAddr,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            listen: SocketAddr::from(([127, 0, 0, 1], 9464)),
        }
    }
}
