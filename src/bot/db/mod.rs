use core::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::bot::db::settings::{GUILD_MOD_ROLES_TABLE, GUILD_PREFIXES_TABLE, GUILD_SETTINGS_TABLE};

pub mod settings;

pub async fn initialize_database(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(GUILD_SETTINGS_TABLE).execute(pool).await?;
    sqlx::query(GUILD_PREFIXES_TABLE).execute(pool).await?;
    sqlx::query(GUILD_MOD_ROLES_TABLE).execute(pool).await?;

    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_guild_prefixes_guild
        ON guild_prefixes (guild_id, position);
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Declares a snowflake-style id newtype. Ids are stored as `INTEGER` in
/// SQLite, so they round-trip through `i64`.
macro_rules! snowflake {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
        pub struct $name(u64);

        impl $name {
            pub const fn new(id: u64) -> Self {
                Self(id)
            }

            pub const fn get(self) -> u64 {
                self.0
            }

            pub fn to_db(self) -> i64 {
                self.0 as i64
            }

            pub fn from_db(raw: i64) -> Self {
                Self(raw as u64)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = std::num::ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim().parse::<u64>().map(Self)
            }
        }
    };
}

snowflake!(UserId);
snowflake!(ChannelId);
snowflake!(GuildId);
snowflake!(MessageId);
snowflake!(RoleId);

impl UserId {
    pub fn mention(self) -> String {
        format!("<@{}>", self.0)
    }
}

impl ChannelId {
    pub fn mention(self) -> String {
        format!("<#{}>", self.0)
    }
}

impl RoleId {
    pub fn mention(self) -> String {
        format!("<@&{}>", self.0)
    }
}

/// Strips a mention wrapper (`<@&id>`, `<#id>`, `<@id>`, `<@!id>`) or accepts
/// a raw id.
fn parse_mention(input: &str, openers: &[&str]) -> Option<u64> {
    let input = input.trim();
    let inner = openers
        .iter()
        .find_map(|open| input.strip_prefix(open).and_then(|rest| rest.strip_suffix('>')))
        .unwrap_or(input);

    inner.parse::<u64>().ok().filter(|id| *id != 0)
}

pub fn parse_role_id(input: &str) -> Option<RoleId> {
    parse_mention(input, &["<@&"]).map(RoleId)
}

pub fn parse_channel_id(input: &str) -> Option<ChannelId> {
    parse_mention(input, &["<#"]).map(ChannelId)
}

pub fn parse_user_id(input: &str) -> Option<UserId> {
    parse_mention(input, &["<@!", "<@"]).map(UserId)
}
