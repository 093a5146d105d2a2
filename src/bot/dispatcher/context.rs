use std::str::FromStr;

use crate::bot::{chat_event::chat_event::{ChatEvent, ChatUser, MemberContext}, commands::commands::BotResult, db::{ChannelId, GuildId, MessageId}, parser::parser::{FlagValue, Flags, Tokens}, render::{render, Renderable}, replies::Replies, state::def::{AppState, BotError}};

/// One command invocation. Built per message and dropped once the handler
/// returns.
#[derive(Debug, Clone)]
pub struct InvocationContext {
    pub prefix: String,
    /// What the user typed: the command name or one of its aliases.
    pub invoked_name: String,
    pub command: String,
    pub subcommand: Option<String>,
    pub author: ChatUser,
    pub message_id: MessageId,
    pub channel_id: ChannelId,
    pub guild_id: Option<GuildId>,
    pub member: Option<MemberContext>,
    pub args: Vec<String>,
    pub flags: Flags,
    /// Whether replies may be cards. Decided once from the bot's permissions.
    pub can_embed: bool,
}

impl InvocationContext {
    pub fn new(event: &ChatEvent, prefix: String, invoked_name: String, command: String, tokens: Tokens) -> Self {
        Self {
            prefix,
            invoked_name,
            command,
            subcommand: None,
            author: event.author.clone(),
            message_id: event.message_id,
            channel_id: event.channel_id,
            guild_id: event.guild_id,
            member: event.member.clone(),
            args: tokens.args,
            flags: tokens.flags,
            can_embed: event.can_embed(),
        }
    }

    /// `command` or `command sub`, as used for cooldowns and logs.
    pub fn qualified_name(&self) -> String {
        match &self.subcommand {
            Some(sub) => format!("{} {}", self.command, sub),
            None => self.command.clone(),
        }
    }

    pub fn arg(&self, index: usize) -> Option<&str> {
        self.args.get(index).map(String::as_str)
    }

    /// Positional arguments from `from` on, joined with single spaces.
    pub fn rest(&self, from: usize) -> String {
        self.args.get(from..).map(|a| a.join(" ")).unwrap_or_default()
    }

    pub fn has_flag(&self, name: &str) -> bool {
        self.flags.contains_key(&name.to_lowercase())
    }

    pub fn flag_value(&self, name: &str) -> Option<&str> {
        match self.flags.get(&name.to_lowercase()) {
            Some(FlagValue::Value(v)) => Some(v.as_str()),
            _ => None,
        }
    }

    /// Parses a valued flag. A value that does not parse is the user's
    /// mistake and comes back as a friendly error.
    pub fn flag_parsed<T: FromStr>(&self, name: &str) -> BotResult<Option<T>> {
        match self.flag_value(name) {
            Some(raw) => raw
                .parse::<T>()
                .map(Some)
                .map_err(|_| BotError::Chat(Replies::bad_flag_value(name, raw))),
            None => Ok(None),
        }
    }

    /// `prefix` + `usage`, ready to show to the user.
    pub fn usage_line(&self, usage: &str) -> String {
        let spacer = if self.prefix.starts_with("<@") { " " } else { "" };
        format!("{}{}{}", self.prefix, spacer, usage)
    }

    pub async fn say(&self, state: &AppState, text: impl Into<String>) -> BotResult<MessageId> {
        Ok(state.chat_client.say(self.channel_id, &text.into()).await?)
    }

    pub async fn send(&self, state: &AppState, item: &dyn Renderable) -> BotResult<MessageId> {
        Ok(state.chat_client.send_message(self.channel_id, render(item, self.can_embed)).await?)
    }
}
