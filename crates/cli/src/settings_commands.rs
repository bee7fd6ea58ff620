use {
    anyhow::{Context, Result},
    clap::Subcommand,
    tempvoice_common::ChannelId,
    tempvoice_config::{Settings, SettingsStore},
};

#[derive(Subcommand)]
pub enum SettingsAction {
    /// Print the persisted settings record.
    Show,
    /// Point the bot at an existing creation channel without running `!setup`.
    Set {
        /// Channel ID of the voice channel members join to get a room.
        channel_id: ChannelId,
    },
    /// Forget the creation channel. Rooms stop being provisioned until the
    /// next `!setup`.
    Clear,
}

pub fn handle_settings(action: SettingsAction, store: &dyn SettingsStore) -> Result<()> {
    match action {
        SettingsAction::Show => {
            let settings = store.load().context("failed to read settings")?;
            println!("{}", serde_json::to_string_pretty(&settings)?);
        },
        SettingsAction::Set { channel_id } => {
            let previous = store.load().context("failed to read settings")?;
            store.save(&Settings {
                creation_channel_id: Some(channel_id),
            })?;
            match previous.creation_channel_id {
                Some(old) if old != channel_id => {
                    eprintln!("Creation channel changed from {old} to {channel_id}.")
                },
                _ => eprintln!("Creation channel set to {channel_id}."),
            }
        },
        SettingsAction::Clear => {
            store.save(&Settings::default())?;
            eprintln!("Creation channel cleared.");
        },
    }
    Ok(())
}
