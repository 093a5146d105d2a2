use std::time::Duration;

use crate::bot::db::{ChannelId, RoleId};

pub struct Replies;

impl Replies {
    pub fn guild_only() -> String {
        "❌ This command can only be used in a server.".to_string()
    }

    pub fn usage(usage_line: &str) -> String {
        format!("❌ Not enough arguments. Usage: `{usage_line}`")
    }

    pub fn group_usage(usage_line: &str, subcommands: &[&str]) -> String {
        format!("📋 Usage: `{usage_line}`\nSubcommands: {}", subcommands.join(", "))
    }

    pub fn missing_member_permissions(names: &[&str]) -> String {
        format!("❌ You need the following permissions to use this command: {}", names.join(", "))
    }

    pub fn missing_bot_permissions(names: &[&str]) -> String {
        format!("❌ I need the following permissions to do that: {}", names.join(", "))
    }

    pub fn cooldown(remaining: Duration) -> String {
        let secs = remaining.as_secs_f64();
        format!("⏳ Slow down! Try again in {secs:.1} seconds.")
    }

    pub fn internal_failure() -> String {
        "💀 Something went wrong while running that command. Please try again later.".to_string()
    }

    pub fn bad_flag_value(name: &str, raw: &str) -> String {
        format!("❌ `{raw}` is not a valid value for `--{name}`")
    }

    pub fn moderator_required() -> String {
        "❌ Only moderators can use this command.".to_string()
    }

    pub fn jump_prompt(page_count: usize) -> String {
        format!("🔢 Which page would you like to see? Reply with a number from 1 to {page_count}.")
    }

    pub fn page_footer(page: usize, page_count: usize) -> String {
        format!("Page {page}/{page_count}")
    }

    pub fn prefix_invalid(max_len: usize) -> String {
        format!("❌ Prefixes must be between 1 and {max_len} characters long.")
    }

    pub fn prefix_exists(prefix: &str) -> String {
        format!("❌ `{prefix}` is already a prefix here.")
    }

    pub fn prefix_limit(max: usize) -> String {
        format!("❌ This server already has the maximum of {max} prefixes. Remove one first.")
    }

    pub fn prefix_missing(prefix: &str) -> String {
        format!("❌ `{prefix}` is not one of this server's prefixes.")
    }

    pub fn prefixes_updated(prefixes: &[String], default_prefix: &str) -> String {
        if prefixes.is_empty() {
            format!("✅ No custom prefixes left; the default `{default_prefix}` applies again.")
        } else {
            format!("✅ Prefixes are now: {}", Self::code_list(prefixes))
        }
    }

    pub fn prefix_list(prefixes: &[String], default_prefix: &str) -> String {
        if prefixes.is_empty() {
            format!("📋 No custom prefixes; using the default `{default_prefix}`.")
        } else {
            format!("📋 Prefixes: {}", Self::code_list(prefixes))
        }
    }

    pub fn mod_roles(roles: &[RoleId]) -> String {
        if roles.is_empty() {
            "📋 No moderator roles set. Members with Manage Server still count as moderators.".to_string()
        } else {
            let mentions: Vec<String> = roles.iter().map(|r| r.mention()).collect();
            format!("📋 Moderator roles: {}", mentions.join(", "))
        }
    }

    pub fn log_channel(channel: Option<ChannelId>) -> String {
        match channel {
            Some(channel) => format!("📋 Logging to {}.", channel.mention()),
            None => "📋 No logging channel set.".to_string(),
        }
    }

    pub fn log_channel_set(channel: ChannelId) -> String {
        format!("✅ Logging channel set to {}.", channel.mention())
    }

    pub fn log_channel_cleared() -> String {
        "✅ Logging channel cleared.".to_string()
    }

    pub fn mod_role_exists(role: RoleId) -> String {
        format!("❌ {} is already a moderator role.", role.mention())
    }

    pub fn mod_role_limit(max: usize) -> String {
        format!("❌ This server already has the maximum of {max} moderator roles.")
    }

    pub fn mod_role_missing(role: RoleId) -> String {
        format!("❌ {} is not a moderator role.", role.mention())
    }

    pub fn not_a_role(input: &str) -> String {
        format!("❌ `{input}` is not a role mention or id.")
    }

    pub fn not_a_channel(input: &str) -> String {
        format!("❌ `{input}` is not a channel mention or id.")
    }

    pub fn unknown_command(name: &str) -> String {
        format!("❌ There is no command called `{name}`.")
    }

    pub fn unknown_category(name: &str) -> String {
        format!("❌ There is no command category called `{name}`.")
    }

    pub fn reload_rejected(reason: &str) -> String {
        format!("❌ Reload rejected, nothing was changed: {reason}")
    }

    pub fn no_commands() -> String {
        "📭 There are no commands to show.".to_string()
    }

    pub fn pong() -> String {
        "🏓 Pong!".to_string()
    }

    pub fn no_definitions(term: &str) -> String {
        format!("📭 No definitions found for **{term}**.")
    }

    pub fn code_list(items: &[String]) -> String {
        items.iter().map(|i| format!("`{i}`")).collect::<Vec<_>>().join(", ")
    }
}
