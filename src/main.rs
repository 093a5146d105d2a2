use std::sync::Arc;

use kumabot::bot::{commands::{builtin_loader, commands::BotResult}, db::{initialize_database, settings::SettingsStore}, platforms::discord::{discord::DiscordClient, event_loop::build_discord_client}, run_event_loop, runtime::command_lifecycle::registry_from_report, state::def::{AppState, BotConfig}};
use sqlx::sqlite::SqlitePoolOptions;
use tokio::sync::mpsc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> BotResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(true)
        .init();

    let config = BotConfig::from_env().inspect_err(|e| error!("Configuration error: {e}"))?;

    let pool = SqlitePoolOptions::new().max_connections(5).connect(&config.database_url).await?;
    initialize_database(&pool).await?;

    let loader = builtin_loader(config.commands_dir.clone());
    let (registry, summary) = registry_from_report(loader.load_all()?);
    info!(
        commands = summary.command_count(),
        categories = summary.categories.len(),
        skipped = summary.failures.len(),
        "Command registry ready"
    );

    let (tx, rx) = mpsc::unbounded_channel();
    let mut client = build_discord_client(&config.discord_token, tx).await?;

    let chat_client = Arc::new(DiscordClient::new(client.http.clone()));
    let settings = SettingsStore::new(pool, config.limits.clone());
    let state = Arc::new(AppState::new(config, chat_client, settings, registry, Some(loader)));

    tokio::spawn(run_event_loop(state, rx));

    info!("Connecting to Discord");
    client.start().await?;
    Ok(())
}
