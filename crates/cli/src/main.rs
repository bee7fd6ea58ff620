mod config_commands;
mod settings_commands;

use std::{path::PathBuf, sync::Arc};

use {
    anyhow::{Context, bail},
    clap::{Parser, Subcommand},
    secrecy::{ExposeSecret, Secret},
    tempvoice_config::{FileSettingsStore, TempVoiceConfig},
    tempvoice_metrics::MetricsRecorderConfig,
    tempvoice_rooms::{RoomRegistry, SettingsHandle},
    tracing::{info, warn},
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

#[derive(Parser)]
#[command(name = "tempvoice", about = "tempvoice: temporary voice rooms for Discord")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Config file to load instead of searching ./ and ~/.config/tempvoice/.
    #[arg(long, global = true, env = "TEMPVOICE_CONFIG")]
    config: Option<PathBuf>,

    /// Settings file (overrides `settings.path`).
    #[arg(long, global = true, env = "TEMPVOICE_SETTINGS")]
    settings: Option<PathBuf>,

    /// Discord bot token (overrides `discord.token`).
    #[arg(long, global = true, env = "DISCORD_TOKEN", hide_env_values = true)]
    token: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Connect to Discord and manage rooms (default when no subcommand is provided).
    Run,
    /// Inspect or edit the persisted settings record offline.
    Settings {
        #[command(subcommand)]
        action: settings_commands::SettingsAction,
    },
    /// Configuration inspection.
    Config {
        #[command(subcommand)]
        action: config_commands::ConfigAction,
    },
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(fmt::layer().json().with_target(true).with_thread_ids(false))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true),
            )
            .init();
    }
}

/// Load the explicit config file, or fall back to discovery.
fn load_config(cli: &Cli) -> anyhow::Result<(TempVoiceConfig, Option<PathBuf>)> {
    if let Some(ref path) = cli.config {
        let config = tempvoice_config::load_config(path)?;
        return Ok((config, Some(path.clone())));
    }
    let source = tempvoice_config::find_config_file();
    let config = tempvoice_config::discover_and_load()?;
    Ok((config, source))
}

/// The command line wins over the config file. Blank values count as missing.
fn resolve_token(cli_token: Option<String>, config: &TempVoiceConfig) -> Option<Secret<String>> {
    if let Some(token) = cli_token.filter(|t| !t.trim().is_empty()) {
        return Some(Secret::new(token));
    }
    config
        .discord
        .token
        .as_ref()
        .filter(|_| config.discord.has_token())
        .map(|t| Secret::new(t.expose_secret().trim().to_string()))
}

async fn run(
    config: TempVoiceConfig,
    store: FileSettingsStore,
    token: Option<Secret<String>>,
) -> anyhow::Result<()> {
    let Some(token) = token else {
        bail!("no Discord token configured: set DISCORD_TOKEN, pass --token, or add discord.token");
    };

    let settings_path = store.path().to_path_buf();
    let settings = SettingsHandle::load(Arc::new(store)).with_context(|| {
        format!(
            "failed to load settings from {}; fix or remove the file",
            settings_path.display()
        )
    })?;
    match settings.creation_channel().await {
        Some(channel) => info!(creation_channel = %channel, "creation channel configured"),
        None => warn!("no creation channel configured yet; run the setup command in a server"),
    }

    tempvoice_metrics::init_metrics(MetricsRecorderConfig {
        enabled: config.metrics.enabled,
        listen: config.metrics.listen,
        global_labels: Vec::new(),
    })?;

    tempvoice_discord::run_bot(
        &token,
        config.rooms,
        Arc::new(settings),
        Arc::new(RoomRegistry::new()),
    )
    .await?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    init_telemetry(&cli);

    let (config, source) = load_config(&cli)?;
    match source {
        Some(ref path) => info!(path = %path.display(), "loaded config"),
        None => info!("no config file found, using defaults"),
    }

    let settings_path = cli
        .settings
        .clone()
        .unwrap_or_else(|| config.settings.path.clone());
    let store = FileSettingsStore::new(settings_path);

    match cli.command {
        None | Some(Commands::Run) => {
            info!(version = env!("CARGO_PKG_VERSION"), "tempvoice starting");
            let token = resolve_token(cli.token, &config);
            run(config, store, token).await
        },
        Some(Commands::Settings { action }) => settings_commands::handle_settings(action, &store),
        Some(Commands::Config { action }) => {
            config_commands::handle_config(action, &config, source.as_deref())
        },
    }
}
