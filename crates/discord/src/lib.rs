//! Discord adapter for tempvoice.
//!
//! Connects to the gateway with serenity, feeds voice presence updates to the
//! room lifecycle and `!setup` messages to the setup command, and implements
//! `VoicePlatform` on top of serenity's HTTP client and cache.

pub mod bot;
pub mod error;
pub mod handler;
pub mod platform;

pub use {
    bot::run_bot,
    error::{Error, Result},
    handler::TempVoiceHandler,
    platform::SerenityPlatform,
};
