use std::{collections::HashSet, path::PathBuf, sync::Arc, time::Duration};

use once_cell::sync::OnceCell;
use tokio::sync::RwLock;

use crate::bot::{commands::{loader::CommandLoader, registry::CommandRegistry}, db::{settings::SettingsStore, UserId}, handler::{channel_queue::ChannelQueues, handler::ChatClient}, pagination::collector::CollectorHub, permissions::cooldown::CooldownTable, state::def::{AppState, BotConfig, ConfigError, SettingsLimits}};

pub const DEFAULT_PAGINATION_TIMEOUT: Duration = Duration::from_secs(300);
pub const DEFAULT_JUMP_TIMEOUT: Duration = Duration::from_secs(30);

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            discord_token: String::new(),
            database_url: "sqlite://kumabot.db?mode=rwc".to_string(),
            commands_dir: PathBuf::from("./commands"),
            default_prefix: "!".to_string(),
            operators: HashSet::new(),
            pagination_timeout: DEFAULT_PAGINATION_TIMEOUT,
            jump_timeout: DEFAULT_JUMP_TIMEOUT,
            limits: SettingsLimits::default(),
        }
    }
}

impl BotConfig {
    /// Reads the process environment, after loading `.env` if there is one.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| dotenvy::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let discord_token = lookup("DISCORD_TOKEN")
            .filter(|t| !t.trim().is_empty())
            .ok_or(ConfigError::Missing("DISCORD_TOKEN"))?;

        let operators = match lookup("BOT_OPERATORS") {
            Some(raw) => parse_operators(&raw)?,
            None => HashSet::new(),
        };

        let pagination_timeout = match lookup("PAGINATION_TIMEOUT_SECS") {
            Some(raw) => Duration::from_secs(raw.trim().parse::<u64>().map_err(|e| ConfigError::Invalid {
                name: "PAGINATION_TIMEOUT_SECS",
                reason: e.to_string(),
            })?),
            None => defaults.pagination_timeout,
        };

        let default_prefix = lookup("DEFAULT_PREFIX").unwrap_or(defaults.default_prefix);
        if default_prefix.trim().is_empty() {
            return Err(ConfigError::Invalid { name: "DEFAULT_PREFIX", reason: "must not be empty".into() });
        }

        Ok(Self {
            discord_token,
            database_url: lookup("DATABASE_URL").unwrap_or(defaults.database_url),
            commands_dir: lookup("COMMANDS_DIR").map(PathBuf::from).unwrap_or(defaults.commands_dir),
            default_prefix: default_prefix.trim().to_string(),
            operators,
            pagination_timeout,
            jump_timeout: defaults.jump_timeout,
            limits: defaults.limits,
        })
    }

    pub fn is_operator(&self, user: UserId) -> bool {
        self.operators.contains(&user)
    }
}

fn parse_operators(raw: &str) -> Result<HashSet<UserId>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<UserId>().map_err(|e| ConfigError::Invalid { name: "BOT_OPERATORS", reason: format!("{s}: {e}") })
        })
        .collect()
}

impl AppState {
    pub fn new(config: BotConfig, chat_client: Arc<dyn ChatClient>, settings: SettingsStore, registry: CommandRegistry, loader: Option<CommandLoader>) -> Self {
        Self {
            config: Arc::new(config),
            chat_client,
            settings: Arc::new(settings),
            registry: Arc::new(RwLock::new(registry)),
            cooldowns: Arc::new(CooldownTable::new()),
            collectors: Arc::new(CollectorHub::new()),
            dispatch_queues: Arc::new(ChannelQueues::new()),
            loader: loader.map(Arc::new),
            bot_user: OnceCell::new(),
        }
    }

    pub fn is_operator(&self, user: UserId) -> bool {
        self.config.is_operator(user)
    }
}
