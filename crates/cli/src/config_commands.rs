use std::path::Path;

use {
    anyhow::{Context, Result},
    clap::Subcommand,
    secrecy::Secret,
    tempvoice_config::TempVoiceConfig,
};

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print the effective configuration as TOML, token redacted.
    Show,
    /// Print which config file would be loaded.
    Path,
}

pub fn handle_config(
    action: ConfigAction,
    config: &TempVoiceConfig,
    source: Option<&Path>,
) -> Result<()> {
    match action {
        ConfigAction::Show => {
            println!("{}", render(config)?);
            Ok(())
        },
        ConfigAction::Path => {
            match source {
                Some(path) => println!("{}", path.display()),
                None => eprintln!("No config file found; using defaults."),
            }
            Ok(())
        },
    }
}

fn render(config: &TempVoiceConfig) -> Result<String> {
    let mut shown = config.clone();
    if shown.discord.token.is_some() {
        shown.discord.token = Some(Secret::new("[REDACTED]".to_string()));
    }
    toml::to_string_pretty(&shown).context("failed to render config as TOML")
}
