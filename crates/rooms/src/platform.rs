//! The platform operations the lifecycle needs.

use {async_trait::async_trait, tempvoice_common::{ChannelId, GuildId, MemberId}};

use crate::Result;

/// Channel permissions granted through overwrites.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    ManageChannels,
    Connect,
    Speak,
}

/// Who a permission overwrite applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverwriteTarget {
    /// The guild-wide `@everyone` role.
    Everyone,
    Member(MemberId),
}

/// An explicit allow overwrite on a new channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionGrant {
    pub target: OverwriteTarget,
    pub allow: Vec<Permission>,
}

impl PermissionGrant {
    pub fn everyone(allow: impl IntoIterator<Item = Permission>) -> Self {
        Self {
            target: OverwriteTarget::Everyone,
            allow: allow.into_iter().collect(),
        }
    }

    pub fn member(member: MemberId, allow: impl IntoIterator<Item = Permission>) -> Self {
        Self {
            target: OverwriteTarget::Member(member),
            allow: allow.into_iter().collect(),
        }
    }
}

/// Parameters of a voice channel to create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceChannelSpec {
    pub name: String,
    /// Category to create the channel under; `None` means top level.
    pub parent: Option<ChannelId>,
    /// Maximum occupancy; `None` means unlimited.
    pub user_limit: Option<u32>,
    pub grants: Vec<PermissionGrant>,
    /// Audit log reason.
    pub reason: Option<String>,
}

/// A channel the platform reports as created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedChannel {
    pub id: ChannelId,
    pub name: String,
}

/// Chat platform operations used by the lifecycle controller and the setup
/// command. Every call may suspend; other handlers can run in between.
#[async_trait]
pub trait VoicePlatform: Send + Sync {
    /// First category whose name contains `keyword`, case-insensitively.
    async fn find_category(&self, guild: GuildId, keyword: &str) -> Result<Option<ChannelId>>;

    /// The category a channel sits in, if any.
    async fn parent_category(&self, guild: GuildId, channel: ChannelId)
    -> Result<Option<ChannelId>>;

    async fn create_voice_channel(
        &self,
        guild: GuildId,
        spec: VoiceChannelSpec,
    ) -> Result<CreatedChannel>;

    async fn delete_channel(&self, guild: GuildId, channel: ChannelId) -> Result<()>;

    /// Move a connected member into another voice channel.
    async fn move_member(&self, guild: GuildId, member: MemberId, channel: ChannelId)
    -> Result<()>;

    /// Members currently connected to a voice channel, as of the latest
    /// presence update the platform has applied.
    async fn occupancy(&self, guild: GuildId, channel: ChannelId) -> Result<usize>;

    async fn send_direct_message(&self, member: MemberId, text: &str) -> Result<()>;
}
