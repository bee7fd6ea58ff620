//! Discord event handler for serenity.
//!
//! Implements the EventHandler trait to receive and process Discord events.

use std::sync::Arc;

use {
    serenity::{
        all::{self as discord, Context, EventHandler, GatewayIntents, Message, Ready, VoiceState},
        async_trait,
    },
    tracing::{debug, info, warn},
};

use {
    tempvoice_common::{ChannelId, GuildId, MemberId},
    tempvoice_rooms::{
        CleanupOutcome, LifecycleController, MembershipMovement, MovementReport, NotifyOutcome,
        ProvisionOutcome, Rollback, SetupHandler, SetupRequest, setup::FAILURE_REPLY,
    },
};

/// Handler for Discord gateway events.
pub struct TempVoiceHandler {
    pub lifecycle: Arc<LifecycleController>,
    pub setup: Arc<SetupHandler>,
}

impl TempVoiceHandler {
    /// Required gateway intents for the bot.
    pub fn intents() -> GatewayIntents {
        GatewayIntents::GUILDS
            | GatewayIntents::GUILD_MESSAGES
            | GatewayIntents::MESSAGE_CONTENT
            | GatewayIntents::GUILD_VOICE_STATES
            | GatewayIntents::GUILD_MEMBERS
    }
}

#[async_trait]
impl EventHandler for TempVoiceHandler {
    async fn ready(&self, _ctx: Context, ready: Ready) {
        info!(
            bot = %ready.user.tag(),
            bot_id = %ready.user.id,
            guilds = ready.guilds.len(),
            "discord bot ready"
        );
    }

    async fn cache_ready(&self, _ctx: Context, guilds: Vec<discord::GuildId>) {
        debug!(guild_count = guilds.len(), "discord cache ready");
    }

    async fn message(&self, ctx: Context, msg: Message) {
        // Skip bot messages to prevent loops
        if msg.author.bot {
            return;
        }
        // Setup only makes sense inside a guild
        let Some(guild_id) = msg.guild_id.and_then(|g| GuildId::new(g.get())) else {
            return;
        };
        if !self.setup.is_setup_command(&msg.content) {
            return;
        }

        let request = SetupRequest {
            guild_id,
            invoker: msg.author.tag(),
        };
        let reply = match self.setup.run(&request).await {
            Ok(outcome) => outcome.reply(),
            Err(e) => {
                warn!(
                    guild_id = %guild_id,
                    invoker = %request.invoker,
                    error = %e,
                    "setup command failed"
                );
                FAILURE_REPLY.to_string()
            },
        };

        if let Err(e) = msg.reply(&ctx.http, reply).await {
            warn!(error = %e, "failed to send setup reply");
        }
    }

    async fn voice_state_update(&self, _ctx: Context, old: Option<VoiceState>, new: VoiceState) {
        let Some(movement) = movement_from(
            new.guild_id,
            new.user_id,
            new.member.as_ref().map(|m| m.display_name()),
            new.member.as_ref().map(|m| m.user.tag()),
            old.and_then(|s| s.channel_id),
            new.channel_id,
        ) else {
            return;
        };

        let report = self.lifecycle.handle_movement(&movement).await;
        log_report(&movement, &report);
    }
}

/// Translate a presence update into a movement. Updates outside a guild
/// carry nothing for the lifecycle.
pub(crate) fn movement_from(
    guild: Option<discord::GuildId>,
    user: discord::UserId,
    display_name: Option<&str>,
    account_tag: Option<String>,
    previous: Option<discord::ChannelId>,
    current: Option<discord::ChannelId>,
) -> Option<MembershipMovement> {
    let guild_id = guild.and_then(|g| GuildId::new(g.get()))?;
    let member_id = MemberId::new(user.get())?;
    Some(MembershipMovement {
        guild_id,
        member_id,
        display_name: display_name
            .map(str::to_string)
            .unwrap_or_else(|| member_id.to_string()),
        account_tag: account_tag.unwrap_or_else(|| member_id.to_string()),
        previous: previous.and_then(|c| ChannelId::new(c.get())),
        current: current.and_then(|c| ChannelId::new(c.get())),
    })
}

/// Successes are logged by the lifecycle itself; surface the failures here.
/// An undeliverable failure notice is not escalated beyond debug.
fn log_report(movement: &MembershipMovement, report: &MovementReport) {
    if let Some(ProvisionOutcome::Failed {
        stage,
        error,
        rollback,
        notice,
    }) = &report.provision
    {
        warn!(
            guild_id = %movement.guild_id,
            member_id = %movement.member_id,
            stage = ?stage,
            error = %error,
            "failed to provision personal room"
        );
        match rollback {
            Rollback::NotNeeded => {},
            Rollback::Deleted(channel_id) => {
                debug!(channel_id = %channel_id, "removed half-provisioned room");
            },
            Rollback::Failed { channel_id, error } => {
                warn!(channel_id = %channel_id, error = %error, "half-provisioned room left behind");
            },
        }
        if let NotifyOutcome::Undelivered(e) = notice {
            debug!(member_id = %movement.member_id, error = %e, "failure notice not delivered");
        }
    }

    if let Some(ProvisionOutcome::Abandoned {
        cleanup: CleanupOutcome::Failed { channel_id, error },
        ..
    }) = &report.provision
    {
        warn!(
            guild_id = %movement.guild_id,
            channel_id = %channel_id,
            error = %error,
            "failed to remove a room its owner already left"
        );
    }

    match &report.cleanup {
        Some(CleanupOutcome::Failed { channel_id, error }) => {
            warn!(
                guild_id = %movement.guild_id,
                channel_id = %channel_id,
                error = %error,
                "failed to delete empty room, leaving it registered"
            );
        },
        Some(CleanupOutcome::AlreadyClaimed { channel_id }) => {
            debug!(channel_id = %channel_id, "room deletion already in progress");
        },
        _ => {},
    }
}
