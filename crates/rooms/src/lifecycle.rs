//! Membership-driven room lifecycle.
//!
//! Two independent reactions to each voice presence transition:
//!
//! - **provision**: entering the creation channel creates a personal room,
//!   moves the member into it and registers it.
//! - **cleanup**: leaving a registered room deletes it once nobody is left.
//!
//! Handlers for different members may interleave at every platform call.
//! A room is registered only after both creation and the move succeeded,
//! and deletion goes through a registry claim so one room is deleted at
//! most once. A new room is checked once more right after registration,
//! since its owner may have left before it was registered.

use std::{sync::Arc, time::Instant};

use {
    tempvoice_common::{ChannelId, GuildId, MemberId},
    tempvoice_config::RoomsConfig,
    tracing::{debug, info, warn},
};

#[cfg(feature = "metrics")]
use tempvoice_metrics::{counter, histogram, rooms as room_metrics};

use crate::{
    Error,
    naming::render_room_name,
    platform::{Permission, PermissionGrant, VoiceChannelSpec, VoicePlatform},
    registry::{DeleteClaim, RoomRegistry},
    settings::SettingsHandle,
};

/// A single voice presence transition.
#[derive(Debug, Clone)]
pub struct MembershipMovement {
    pub guild_id: GuildId,
    pub member_id: MemberId,
    /// Name used for the member's personal room.
    pub display_name: String,
    /// Account tag recorded in the audit log, matching the setup command.
    pub account_tag: String,
    pub previous: Option<ChannelId>,
    pub current: Option<ChannelId>,
}

/// Which provisioning step failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisionStage {
    ResolveCategory,
    CreateChannel,
    MoveMember,
}

/// What happened to a channel created before a later step failed.
#[derive(Debug)]
pub enum Rollback {
    /// Nothing was created.
    NotNeeded,
    Deleted(ChannelId),
    /// The unregistered channel is left behind.
    Failed { channel_id: ChannelId, error: Error },
}

/// Delivery of the best-effort failure notice.
#[derive(Debug)]
pub enum NotifyOutcome {
    Delivered,
    Undelivered(Error),
}

#[derive(Debug)]
pub enum ProvisionOutcome {
    /// A new room was created, the member moved in, and the room registered.
    Created { channel_id: ChannelId, name: String },
    /// The member was moved back into a room they already own.
    Reused { channel_id: ChannelId },
    /// The room was created and registered, but the member had already left
    /// it by then. `cleanup` is the check run right after registration.
    Abandoned {
        channel_id: ChannelId,
        cleanup: CleanupOutcome,
    },
    /// Nothing was registered. The member must leave and re-join to retry.
    Failed {
        stage: ProvisionStage,
        error: Error,
        rollback: Rollback,
        notice: NotifyOutcome,
    },
}

#[derive(Debug)]
pub enum CleanupOutcome {
    /// The empty room was deleted and unregistered.
    Deleted {
        channel_id: ChannelId,
        owner: MemberId,
    },
    /// Someone is still connected; the room stays.
    Occupied {
        channel_id: ChannelId,
        occupants: usize,
    },
    /// Another handler is already deleting this room.
    AlreadyClaimed { channel_id: ChannelId },
    /// The channel is not (or no longer) a registered room.
    NotRegistered { channel_id: ChannelId },
    /// Occupancy lookup or deletion failed; the room stays registered.
    Failed { channel_id: ChannelId, error: Error },
}

/// Outcomes of the reactions a movement triggered.
#[derive(Debug, Default)]
pub struct MovementReport {
    pub provision: Option<ProvisionOutcome>,
    pub cleanup: Option<CleanupOutcome>,
}

impl MovementReport {
    pub fn is_empty(&self) -> bool {
        self.provision.is_none() && self.cleanup.is_none()
    }
}

/// Drives room creation and deletion from membership movements.
pub struct LifecycleController {
    platform: Arc<dyn VoicePlatform>,
    registry: Arc<RoomRegistry>,
    settings: Arc<SettingsHandle>,
    config: RoomsConfig,
}

impl LifecycleController {
    pub fn new(
        platform: Arc<dyn VoicePlatform>,
        registry: Arc<RoomRegistry>,
        settings: Arc<SettingsHandle>,
        config: RoomsConfig,
    ) -> Self {
        Self {
            platform,
            registry,
            settings,
            config,
        }
    }

    /// React to one presence transition.
    ///
    /// Provisioning and cleanup touch different channels (a member cannot
    /// leave and enter the same channel in one transition), so both run
    /// concurrently and neither depends on the other's outcome.
    pub async fn handle_movement(&self, movement: &MembershipMovement) -> MovementReport {
        if movement.previous == movement.current {
            // Mute, deafen, stream toggles: no channel change.
            return MovementReport::default();
        }

        let creation = self.settings.creation_channel().await;
        let provision = self.should_provision(movement, creation);
        let cleanup = movement
            .previous
            .filter(|channel| self.registry.contains(*channel));

        let (provision, cleanup) = tokio::join!(
            async {
                if provision {
                    Some(self.provision(movement).await)
                } else {
                    None
                }
            },
            async {
                if let Some(channel) = cleanup {
                    Some(self.check_room(movement.guild_id, channel).await)
                } else {
                    None
                }
            },
        );

        MovementReport { provision, cleanup }
    }

    fn should_provision(&self, movement: &MembershipMovement, creation: Option<ChannelId>) -> bool {
        let Some(creation) = creation else {
            return false;
        };
        if movement.current != Some(creation) {
            return false;
        }
        match movement.previous {
            None => true,
            Some(previous) if previous == creation => false,
            Some(_) => self.config.trigger_on_transfer,
        }
    }

    /// Give the member a personal room.
    pub async fn provision(&self, movement: &MembershipMovement) -> ProvisionOutcome {
        let started = Instant::now();
        let guild = movement.guild_id;
        let member = movement.member_id;

        if let Some(channel_id) = self.reusable_room(movement) {
            match self.platform.move_member(guild, member, channel_id).await {
                Ok(()) => {
                    info!(
                        guild_id = %guild,
                        member_id = %member,
                        channel_id = %channel_id,
                        "member moved back into owned room"
                    );
                    #[cfg(feature = "metrics")]
                    counter!(room_metrics::REUSED_TOTAL).increment(1);
                    return ProvisionOutcome::Reused { channel_id };
                },
                Err(e) => {
                    warn!(
                        guild_id = %guild,
                        member_id = %member,
                        channel_id = %channel_id,
                        error = %e,
                        "could not move member into owned room, creating a new one"
                    );
                },
            }
        }

        let Some(creation) = movement.current else {
            return self
                .fail(
                    movement,
                    ProvisionStage::ResolveCategory,
                    Error::unavailable("member is not in a voice channel"),
                    Rollback::NotNeeded,
                )
                .await;
        };

        let parent = match self.platform.parent_category(guild, creation).await {
            Ok(parent) => parent,
            Err(e) => {
                return self
                    .fail(movement, ProvisionStage::ResolveCategory, e, Rollback::NotNeeded)
                    .await;
            },
        };

        let spec = VoiceChannelSpec {
            name: render_room_name(&self.config.room_name_template, &movement.display_name, member),
            parent,
            user_limit: Some(self.config.user_limit),
            grants: vec![PermissionGrant::member(member, [
                Permission::ManageChannels,
                Permission::Connect,
                Permission::Speak,
            ])],
            reason: Some(format!("Channel created by {}", movement.account_tag)),
        };

        let created = match self.platform.create_voice_channel(guild, spec).await {
            Ok(created) => created,
            Err(e) => {
                return self
                    .fail(movement, ProvisionStage::CreateChannel, e, Rollback::NotNeeded)
                    .await;
            },
        };

        if let Err(e) = self.platform.move_member(guild, member, created.id).await {
            let rollback = match self.platform.delete_channel(guild, created.id).await {
                Ok(()) => Rollback::Deleted(created.id),
                Err(error) => Rollback::Failed {
                    channel_id: created.id,
                    error,
                },
            };
            return self
                .fail(movement, ProvisionStage::MoveMember, e, rollback)
                .await;
        }

        if !self.registry.register(created.id, guild, member) {
            warn!(channel_id = %created.id, "platform returned an already registered channel id");
        }

        info!(
            guild_id = %guild,
            member_id = %member,
            channel_id = %created.id,
            name = %created.name,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "personal room created"
        );
        #[cfg(feature = "metrics")]
        {
            counter!(room_metrics::CREATED_TOTAL).increment(1);
            histogram!(room_metrics::PROVISION_DURATION_SECONDS)
                .record(started.elapsed().as_secs_f64());
        }

        // A leave seen between the move and `register` skipped cleanup
        // because the room was not registered yet.
        match self.check_room(guild, created.id).await {
            CleanupOutcome::Occupied { .. } => ProvisionOutcome::Created {
                channel_id: created.id,
                name: created.name,
            },
            cleanup => {
                debug!(
                    channel_id = %created.id,
                    cleanup = ?cleanup,
                    "member left the new room before it was registered"
                );
                ProvisionOutcome::Abandoned {
                    channel_id: created.id,
                    cleanup,
                }
            },
        }
    }

    fn reusable_room(&self, movement: &MembershipMovement) -> Option<ChannelId> {
        if !self.config.reuse_owned_room {
            return None;
        }
        // The room just left is being cleaned up concurrently.
        self.registry
            .owned_by(movement.guild_id, movement.member_id)
            .filter(|channel| movement.previous != Some(*channel))
    }

    async fn fail(
        &self,
        movement: &MembershipMovement,
        stage: ProvisionStage,
        error: Error,
        rollback: Rollback,
    ) -> ProvisionOutcome {
        let notice = match self
            .platform
            .send_direct_message(movement.member_id, &self.config.failure_notice)
            .await
        {
            Ok(()) => NotifyOutcome::Delivered,
            Err(e) => NotifyOutcome::Undelivered(e),
        };
        #[cfg(feature = "metrics")]
        counter!(room_metrics::PROVISION_FAILURES_TOTAL).increment(1);

        ProvisionOutcome::Failed {
            stage,
            error,
            rollback,
            notice,
        }
    }

    /// Delete `channel` if it is a registered room with nobody left in it.
    ///
    /// Safe to call repeatedly: an unregistered channel is a no-op.
    pub async fn check_room(&self, guild: GuildId, channel: ChannelId) -> CleanupOutcome {
        if !self.registry.contains(channel) {
            return CleanupOutcome::NotRegistered {
                channel_id: channel,
            };
        }

        let occupants = match self.platform.occupancy(guild, channel).await {
            Ok(n) => n,
            Err(error) => {
                #[cfg(feature = "metrics")]
                counter!(room_metrics::CLEANUP_FAILURES_TOTAL).increment(1);
                return CleanupOutcome::Failed {
                    channel_id: channel,
                    error,
                };
            },
        };
        if occupants > 0 {
            debug!(channel_id = %channel, occupants, "room still occupied");
            return CleanupOutcome::Occupied {
                channel_id: channel,
                occupants,
            };
        }

        let room = match self.registry.claim_for_deletion(channel) {
            DeleteClaim::Claimed(room) => room,
            DeleteClaim::InProgress => {
                return CleanupOutcome::AlreadyClaimed {
                    channel_id: channel,
                };
            },
            DeleteClaim::Unregistered => {
                return CleanupOutcome::NotRegistered {
                    channel_id: channel,
                };
            },
        };

        match self.platform.delete_channel(guild, channel).await {
            Ok(()) => {
                self.registry.remove(channel);
                info!(
                    guild_id = %guild,
                    channel_id = %channel,
                    owner = %room.owner,
                    lifetime_secs = room.age().as_secs(),
                    "empty room deleted"
                );
                #[cfg(feature = "metrics")]
                counter!(room_metrics::DELETED_TOTAL).increment(1);
                CleanupOutcome::Deleted {
                    channel_id: channel,
                    owner: room.owner,
                }
            },
            Err(error) => {
                self.registry.release(channel);
                #[cfg(feature = "metrics")]
                counter!(room_metrics::CLEANUP_FAILURES_TOTAL).increment(1);
                CleanupOutcome::Failed {
                    channel_id: channel,
                    error,
                }
            },
        }
    }
}
