//! Configuration loading and the persisted settings record.
//!
//! Config files: `tempvoice.toml`, `tempvoice.yaml`, or `tempvoice.json`
//! Searched in `./` then `~/.config/tempvoice/`.
//!
//! The settings record (`settings.json`) is separate: it holds state the bot
//! writes at runtime, currently just the configured creation channel.

pub mod error;
pub mod loader;
pub mod schema;
pub mod settings;

pub use {
    error::{Error, Result},
    loader::{config_dir, discover_and_load, find_config_file, load_config},
    schema::{DiscordConfig, MetricsConfig, RoomsConfig, SettingsConfig, TempVoiceConfig},
    settings::{FileSettingsStore, MemorySettingsStore, Settings, SettingsStore},
};
