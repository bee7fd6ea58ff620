use std::sync::Arc;

use {
    secrecy::{ExposeSecret, Secret},
    serenity::Client,
    tempvoice_config::RoomsConfig,
    tempvoice_rooms::{LifecycleController, RoomRegistry, SettingsHandle, SetupHandler},
    tracing::info,
};

use crate::{Result, handler::TempVoiceHandler, platform::SerenityPlatform};

/// Connect to the gateway and process events until shutdown.
///
/// `registry` starts empty on every run: rooms created by an earlier process
/// are not tracked and will not be cleaned up automatically.
pub async fn run_bot(
    token: &Secret<String>,
    rooms: RoomsConfig,
    settings: Arc<SettingsHandle>,
    registry: Arc<RoomRegistry>,
) -> Result<()> {
    let platform = Arc::new(SerenityPlatform::new());
    let lifecycle = Arc::new(LifecycleController::new(
        platform.clone(),
        registry,
        Arc::clone(&settings),
        rooms.clone(),
    ));
    let setup = Arc::new(SetupHandler::new(platform.clone(), settings, rooms));

    let handler = TempVoiceHandler { lifecycle, setup };
    let mut client = Client::builder(token.expose_secret(), TempVoiceHandler::intents())
        .event_handler(handler)
        .await?;
    platform.bind(Arc::clone(&client.http), Arc::clone(&client.cache));

    let shard_manager = Arc::clone(&client.shard_manager);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutdown requested, closing gateway connections");
            shard_manager.shutdown_all().await;
        }
    });

    info!("connecting to discord gateway");
    client.start().await?;
    info!("discord client stopped");
    Ok(())
}
