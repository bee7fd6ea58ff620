//! Shared identifier types and errors used across all tempvoice crates.

pub mod error;
pub mod types;

pub use {
    error::{Error, Result},
    types::{ChannelId, GuildId, MemberId},
};
