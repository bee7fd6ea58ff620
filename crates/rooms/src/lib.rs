//! Temporary voice room lifecycle.
//!
//! Joining the configured creation channel provisions a personal voice room
//! for the member; the room is deleted once its last occupant leaves. The
//! platform itself sits behind [`VoicePlatform`], so everything here runs
//! without a live gateway connection.

pub mod error;
pub mod lifecycle;
pub mod naming;
pub mod platform;
pub mod registry;
pub mod settings;
pub mod setup;

pub use {
    error::{Error, Result},
    lifecycle::{
        CleanupOutcome, LifecycleController, MembershipMovement, MovementReport, NotifyOutcome,
        ProvisionOutcome, ProvisionStage, Rollback,
    },
    platform::{
        CreatedChannel, OverwriteTarget, Permission, PermissionGrant, VoiceChannelSpec,
        VoicePlatform,
    },
    registry::{DeleteClaim, Room, RoomRegistry, RoomState},
    settings::SettingsHandle,
    setup::{SetupHandler, SetupOutcome, SetupRequest},
};
