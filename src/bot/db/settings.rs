use std::collections::HashMap;

use sqlx::{Row, SqlitePool};
use tokio::sync::{Mutex, RwLock};

use crate::bot::{commands::commands::BotResult, db::{ChannelId, GuildId, RoleId}, replies::Replies, state::def::{BotError, SettingsLimits}};

pub const GUILD_SETTINGS_TABLE: &str = "
    CREATE TABLE IF NOT EXISTS guild_settings (
        guild_id INTEGER PRIMARY KEY,
        log_channel INTEGER
    );
";

pub const GUILD_PREFIXES_TABLE: &str = "
    CREATE TABLE IF NOT EXISTS guild_prefixes (
        guild_id INTEGER NOT NULL,
        position INTEGER NOT NULL,
        prefix TEXT NOT NULL,
        PRIMARY KEY (guild_id, prefix)
    );
";

pub const GUILD_MOD_ROLES_TABLE: &str = "
    CREATE TABLE IF NOT EXISTS guild_mod_roles (
        guild_id INTEGER NOT NULL,
        role_id INTEGER NOT NULL,
        PRIMARY KEY (guild_id, role_id)
    );
";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GuildSettings {
    /// Custom prefixes in the order they were added. Empty means the default
    /// prefix applies.
    pub prefixes: Vec<String>,
    pub mod_roles: Vec<RoleId>,
    pub log_channel: Option<ChannelId>,
}

/// Guild settings backed by SQLite with a write-through in-memory cache.
pub struct SettingsStore {
    pool: SqlitePool,
    limits: SettingsLimits,
    cache: RwLock<HashMap<GuildId, GuildSettings>>,
    /// Held across a capped add's check and insert.
    writes: Mutex<()>,
}

impl SettingsStore {
    pub fn new(pool: SqlitePool, limits: SettingsLimits) -> Self {
        Self { pool, limits, cache: RwLock::new(HashMap::new()), writes: Mutex::new(()) }
    }

    pub fn limits(&self) -> &SettingsLimits {
        &self.limits
    }

    pub async fn get(&self, guild: GuildId) -> BotResult<GuildSettings> {
        if let Some(settings) = self.cache.read().await.get(&guild) {
            return Ok(settings.clone());
        }

        let settings = self.fetch(guild).await?;
        self.cache.write().await.insert(guild, settings.clone());
        Ok(settings)
    }

    pub async fn prefixes(&self, guild: GuildId) -> BotResult<Vec<String>> {
        Ok(self.get(guild).await?.prefixes)
    }

    pub async fn add_prefix(&self, guild: GuildId, prefix: &str) -> BotResult<Vec<String>> {
        let prefix = prefix.trim();
        if prefix.is_empty() || prefix.chars().count() > self.limits.max_prefix_len {
            return Err(BotError::Chat(Replies::prefix_invalid(self.limits.max_prefix_len)));
        }

        let _write = self.writes.lock().await;
        let current = self.get(guild).await?;
        if current.prefixes.iter().any(|p| p == prefix) {
            return Err(BotError::Chat(Replies::prefix_exists(prefix)));
        }
        if current.prefixes.len() >= self.limits.max_prefixes {
            return Err(BotError::Chat(Replies::prefix_limit(self.limits.max_prefixes)));
        }

        sqlx::query(
            r#"
            INSERT INTO guild_prefixes (guild_id, position, prefix)
            SELECT ?1, COALESCE(MAX(position) + 1, 0), ?2 FROM guild_prefixes WHERE guild_id = ?1
            "#,
        )
        .bind(guild.to_db())
        .bind(prefix)
        .execute(&self.pool)
        .await
        .map_err(|e| unique_violation_or(e, || Replies::prefix_exists(prefix)))?;

        self.refresh(guild).await.map(|s| s.prefixes)
    }

    pub async fn remove_prefix(&self, guild: GuildId, prefix: &str) -> BotResult<Vec<String>> {
        let removed = sqlx::query("DELETE FROM guild_prefixes WHERE guild_id = ? AND prefix = ?")
            .bind(guild.to_db())
            .bind(prefix.trim())
            .execute(&self.pool)
            .await?
            .rows_affected();

        if removed == 0 {
            return Err(BotError::Chat(Replies::prefix_missing(prefix.trim())));
        }

        self.refresh(guild).await.map(|s| s.prefixes)
    }

    pub async fn add_mod_role(&self, guild: GuildId, role: RoleId) -> BotResult<Vec<RoleId>> {
        let _write = self.writes.lock().await;
        let current = self.get(guild).await?;
        if current.mod_roles.contains(&role) {
            return Err(BotError::Chat(Replies::mod_role_exists(role)));
        }
        if current.mod_roles.len() >= self.limits.max_mod_roles {
            return Err(BotError::Chat(Replies::mod_role_limit(self.limits.max_mod_roles)));
        }

        sqlx::query("INSERT INTO guild_mod_roles (guild_id, role_id) VALUES (?, ?)")
            .bind(guild.to_db())
            .bind(role.to_db())
            .execute(&self.pool)
            .await
            .map_err(|e| unique_violation_or(e, || Replies::mod_role_exists(role)))?;

        self.refresh(guild).await.map(|s| s.mod_roles)
    }

    pub async fn remove_mod_role(&self, guild: GuildId, role: RoleId) -> BotResult<Vec<RoleId>> {
        let removed = sqlx::query("DELETE FROM guild_mod_roles WHERE guild_id = ? AND role_id = ?")
            .bind(guild.to_db())
            .bind(role.to_db())
            .execute(&self.pool)
            .await?
            .rows_affected();

        if removed == 0 {
            return Err(BotError::Chat(Replies::mod_role_missing(role)));
        }

        self.refresh(guild).await.map(|s| s.mod_roles)
    }

    pub async fn set_log_channel(&self, guild: GuildId, channel: Option<ChannelId>) -> BotResult<()> {
        sqlx::query(
            r#"
            INSERT INTO guild_settings (guild_id, log_channel)
            VALUES (?, ?)
            ON CONFLICT (guild_id)
            DO UPDATE SET log_channel = excluded.log_channel
            "#,
        )
        .bind(guild.to_db())
        .bind(channel.map(ChannelId::to_db))
        .execute(&self.pool)
        .await?;

        self.refresh(guild).await?;
        Ok(())
    }

    async fn refresh(&self, guild: GuildId) -> BotResult<GuildSettings> {
        let settings = self.fetch(guild).await?;
        self.cache.write().await.insert(guild, settings.clone());
        Ok(settings)
    }

    async fn fetch(&self, guild: GuildId) -> BotResult<GuildSettings> {
        let prefixes = sqlx::query("SELECT prefix FROM guild_prefixes WHERE guild_id = ? ORDER BY position, prefix")
            .bind(guild.to_db())
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(|row| row.try_get::<String, _>("prefix"))
            .collect::<Result<Vec<_>, _>>()?;

        let mod_roles = sqlx::query("SELECT role_id FROM guild_mod_roles WHERE guild_id = ? ORDER BY rowid")
            .bind(guild.to_db())
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(|row| row.try_get::<i64, _>("role_id").map(RoleId::from_db))
            .collect::<Result<Vec<_>, _>>()?;

        let log_channel = sqlx::query("SELECT log_channel FROM guild_settings WHERE guild_id = ?")
            .bind(guild.to_db())
            .fetch_optional(&self.pool)
            .await?
            .map(|row| row.try_get::<Option<i64>, _>("log_channel"))
            .transpose()?
            .flatten()
            .map(ChannelId::from_db);

        Ok(GuildSettings { prefixes, mod_roles, log_channel })
    }
}

/// A row written behind this process's back is still a duplicate, not a
/// fault.
fn unique_violation_or(e: sqlx::Error, reply: impl FnOnce() -> String) -> BotError {
    match e.as_database_error() {
        Some(db) if db.is_unique_violation() => BotError::Chat(reply()),
        _ => e.into(),
    }
}
