//! `VoicePlatform` backed by serenity.
//!
//! Occupancy is read from the gateway cache: serenity applies each voice
//! state update to the cache before dispatching it, so a handler sees the
//! post-move membership. Everything else goes through the REST client.

use std::sync::{Arc, OnceLock};

use {
    serenity::{
        all::{
            self as discord, Cache, ChannelType, CreateChannel, CreateMessage, Http,
            PermissionOverwrite, PermissionOverwriteType, Permissions,
        },
        async_trait,
    },
    tempvoice_common::{ChannelId, GuildId, MemberId},
    tempvoice_rooms::{
        CreatedChannel, Error, OverwriteTarget, Permission, PermissionGrant, Result,
        VoiceChannelSpec, VoicePlatform,
    },
    tracing::debug,
};

/// Serenity-backed platform. Created before the client and bound to the
/// client's HTTP handle and cache once those exist.
#[derive(Default)]
pub struct SerenityPlatform {
    http: OnceLock<Arc<Http>>,
    cache: OnceLock<Arc<Cache>>,
}

impl SerenityPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach the client's HTTP handle and cache. Later calls are ignored.
    pub fn bind(&self, http: Arc<Http>, cache: Arc<Cache>) {
        let _ = self.http.set(http);
        let _ = self.cache.set(cache);
    }

    fn http(&self) -> Result<&Http> {
        self.http
            .get()
            .map(Arc::as_ref)
            .ok_or_else(|| Error::unavailable("discord client is not connected"))
    }

    fn cache(&self) -> Result<&Cache> {
        self.cache
            .get()
            .map(Arc::as_ref)
            .ok_or_else(|| Error::unavailable("discord cache is not available"))
    }
}

pub(crate) fn to_guild(id: GuildId) -> discord::GuildId {
    discord::GuildId::new(id.get())
}

pub(crate) fn to_channel(id: ChannelId) -> discord::ChannelId {
    discord::ChannelId::new(id.get())
}

pub(crate) fn to_user(id: MemberId) -> discord::UserId {
    discord::UserId::new(id.get())
}

fn from_channel(id: discord::ChannelId) -> Result<ChannelId> {
    ChannelId::new(id.get()).ok_or_else(|| Error::unavailable("discord returned channel id 0"))
}

fn permissions(allow: &[Permission]) -> Permissions {
    allow
        .iter()
        .fold(Permissions::empty(), |acc, permission| {
            acc | match permission {
                Permission::ManageChannels => Permissions::MANAGE_CHANNELS,
                Permission::Connect => Permissions::CONNECT,
                Permission::Speak => Permissions::SPEAK,
            }
        })
}

/// The `@everyone` role shares its id with the guild.
fn overwrite(guild: GuildId, grant: &PermissionGrant) -> PermissionOverwrite {
    let kind = match grant.target {
        OverwriteTarget::Everyone => PermissionOverwriteType::Role(discord::RoleId::new(guild.get())),
        OverwriteTarget::Member(member) => PermissionOverwriteType::Member(to_user(member)),
    };
    PermissionOverwrite {
        allow: permissions(&grant.allow),
        deny: Permissions::empty(),
        kind,
    }
}

#[async_trait]
impl VoicePlatform for SerenityPlatform {
    async fn find_category(&self, guild: GuildId, keyword: &str) -> Result<Option<ChannelId>> {
        let channels = to_guild(guild)
            .channels(self.http()?)
            .await
            .map_err(|e| Error::platform("list guild channels", e))?;

        let keyword = keyword.to_lowercase();
        let category = channels
            .values()
            .filter(|c| c.kind == ChannelType::Category && c.name.to_lowercase().contains(&keyword))
            .min_by_key(|c| (c.position, c.id))
            .map(|c| c.id);
        category.map(from_channel).transpose()
    }

    async fn parent_category(
        &self,
        guild: GuildId,
        channel: ChannelId,
    ) -> Result<Option<ChannelId>> {
        let cached = self.cache().ok().and_then(|cache| {
            cache
                .guild(to_guild(guild))
                .and_then(|g| g.channels.get(&to_channel(channel)).map(|c| c.parent_id))
        });

        let parent = match cached {
            Some(parent) => parent,
            None => {
                debug!(channel_id = %channel, "channel not cached, fetching");
                let fetched = to_channel(channel)
                    .to_channel(self.http()?)
                    .await
                    .map_err(|e| Error::platform("fetch channel", e))?;
                fetched.guild().and_then(|c| c.parent_id)
            },
        };
        parent.map(from_channel).transpose()
    }

    async fn create_voice_channel(
        &self,
        guild: GuildId,
        spec: VoiceChannelSpec,
    ) -> Result<CreatedChannel> {
        let overwrites: Vec<_> = spec.grants.iter().map(|g| overwrite(guild, g)).collect();
        let mut builder = CreateChannel::new(spec.name.as_str())
            .kind(ChannelType::Voice)
            .permissions(overwrites);
        if let Some(parent) = spec.parent {
            builder = builder.category(to_channel(parent));
        }
        if let Some(limit) = spec.user_limit {
            builder = builder.user_limit(limit);
        }
        if let Some(reason) = spec.reason.as_deref() {
            builder = builder.audit_log_reason(reason);
        }

        let created = to_guild(guild)
            .create_channel(self.http()?, builder)
            .await
            .map_err(|e| Error::platform("create voice channel", e))?;
        Ok(CreatedChannel {
            id: from_channel(created.id)?,
            name: created.name,
        })
    }

    async fn delete_channel(&self, _guild: GuildId, channel: ChannelId) -> Result<()> {
        to_channel(channel)
            .delete(self.http()?)
            .await
            .map(|_| ())
            .map_err(|e| Error::platform("delete channel", e))
    }

    async fn move_member(&self, guild: GuildId, member: MemberId, channel: ChannelId) -> Result<()> {
        to_guild(guild)
            .move_member(self.http()?, to_user(member), to_channel(channel))
            .await
            .map(|_| ())
            .map_err(|e| Error::platform("move member", e))
    }

    async fn occupancy(&self, guild: GuildId, channel: ChannelId) -> Result<usize> {
        let channel = to_channel(channel);
        self.cache()?
            .guild(to_guild(guild))
            .map(|g| {
                g.voice_states
                    .values()
                    .filter(|state| state.channel_id == Some(channel))
                    .count()
            })
            .ok_or_else(|| Error::unavailable(format!("guild {guild} is not cached")))
    }

    async fn send_direct_message(&self, member: MemberId, text: &str) -> Result<()> {
        to_user(member)
            .direct_message(self.http()?, CreateMessage::new().content(text))
            .await
            .map(|_| ())
            .map_err(|e| Error::platform("send direct message", e))
    }
}
