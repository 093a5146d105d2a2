use std::{collections::HashSet, io, path::PathBuf, sync::Arc, time::Duration};

use once_cell::sync::OnceCell;
use thiserror::Error;
use tokio::sync::RwLock;

use crate::bot::{commands::{loader::{CommandLoader, LoadError}, registry::{CommandRegistry, RegistryError}}, db::{settings::SettingsStore, UserId}, handler::{channel_queue::ChannelQueues, handler::{ChatClient, ChatError}}, pagination::collector::CollectorHub, permissions::cooldown::CooldownTable};

/// Process-scoped state. Built once in `main` (or per test) and handed to the
/// dispatcher; nothing in the bot reaches for globals.
pub struct AppState {
    pub config: Arc<BotConfig>,
    pub chat_client: Arc<dyn ChatClient>,
    pub settings: Arc<SettingsStore>,
    pub registry: Arc<RwLock<CommandRegistry>>,
    pub cooldowns: Arc<CooldownTable>,
    pub collectors: Arc<CollectorHub>,
    pub dispatch_queues: Arc<ChannelQueues>,
    /// Present when commands came from a manifest tree and can be reloaded.
    pub loader: Option<Arc<CommandLoader>>,
    /// Filled in once the gateway reports ready.
    pub bot_user: OnceCell<UserId>,
}

#[derive(Clone, Debug)]
pub struct BotConfig {
    pub discord_token: String,
    pub database_url: String,
    pub commands_dir: PathBuf,
    pub default_prefix: String,
    pub operators: HashSet<UserId>,
    pub pagination_timeout: Duration,
    pub jump_timeout: Duration,
    pub limits: SettingsLimits,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SettingsLimits {
    pub max_prefixes: usize,
    pub max_prefix_len: usize,
    pub max_mod_roles: usize,
}

impl Default for SettingsLimits {
    fn default() -> Self {
        Self { max_prefixes: 5, max_prefix_len: 10, max_mod_roles: 10 }
    }
}

#[derive(Debug, Error)]
pub enum BotError {
    #[error("HTTP request error: {0}")]
    RequestError(#[from] reqwest::Error),
    #[error("JSON deserialization error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),
    #[error("Database error: {0}")]
    SqlxError(#[from] sqlx::Error),
    #[error("Discord error: {0}")]
    Serenity(#[from] serenity::Error),
    #[error("Gateway error: {0}")]
    Gateway(#[from] ChatError),
    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),
    #[error("Load error: {0}")]
    Load(#[from] LoadError),
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    /// Meant for the person who ran the command; shown verbatim.
    #[error("{0}")]
    Chat(String),
    #[error("{0}")]
    Custom(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing environment variable {0}")]
    Missing(&'static str),
    #[error("invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}
