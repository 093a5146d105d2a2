//! Fixtures shared by the unit tests: a recording chat client, an in-memory
//! database and message builders.

use std::sync::{atomic::{AtomicU64, Ordering}, Arc, Mutex};

use async_trait::async_trait;
use serenity::all::Permissions;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};

use crate::bot::{chat_event::chat_event::{ChatEvent, ChatUser, MemberContext, ReactionEvent}, commands::{loader::CommandLoader, registry::CommandRegistry}, db::{initialize_database, settings::SettingsStore, ChannelId, GuildId, MessageId, UserId}, dispatcher::context::InvocationContext, handler::handler::{ChatClient, ChatError, ChatResult}, parser::parser::Tokens, render::OutgoingMessage, state::def::{AppState, BotConfig}};

pub const GUILD: GuildId = GuildId::new(100);
pub const CHANNEL: ChannelId = ChannelId::new(200);
pub const AUTHOR: UserId = UserId::new(300);
pub const OPERATOR: UserId = UserId::new(1);

/// Captures every outbound call instead of talking to Discord.
#[derive(Default)]
pub struct RecordingClient {
    next_id: AtomicU64,
    sent: Mutex<Vec<(MessageId, OutgoingMessage)>>,
    edits: Mutex<Vec<(MessageId, OutgoingMessage)>>,
    deleted: Mutex<Vec<MessageId>>,
    reactions: Mutex<Vec<(MessageId, String)>>,
    removed: Mutex<Vec<(MessageId, String, UserId)>>,
    cleared: Mutex<Vec<MessageId>>,
    reaction_failure: Mutex<Option<ChatError>>,
    edit_failure: Mutex<Option<ChatError>>,
}

impl RecordingClient {
    pub fn fail_reactions_with(&self, error: ChatError) {
        *self.reaction_failure.lock().unwrap() = Some(error);
    }

    pub fn fail_edits_with(&self, error: ChatError) {
        *self.edit_failure.lock().unwrap() = Some(error);
    }

    pub fn sent(&self) -> Vec<(MessageId, OutgoingMessage)> {
        self.sent.lock().unwrap().clone()
    }

    /// Sent messages as text; cards are flattened.
    pub fn sent_texts(&self) -> Vec<String> {
        self.sent()
            .into_iter()
            .map(|(_, message)| match message {
                OutgoingMessage::Text(text) => text,
                OutgoingMessage::Card(card) => card.to_plain_text(),
            })
            .collect()
    }

    pub fn edits(&self) -> Vec<(MessageId, OutgoingMessage)> {
        self.edits.lock().unwrap().clone()
    }

    pub fn deleted(&self) -> Vec<MessageId> {
        self.deleted.lock().unwrap().clone()
    }

    pub fn reactions(&self) -> Vec<(MessageId, String)> {
        self.reactions.lock().unwrap().clone()
    }

    pub fn removed(&self) -> Vec<(MessageId, String, UserId)> {
        self.removed.lock().unwrap().clone()
    }

    pub fn cleared(&self) -> Vec<MessageId> {
        self.cleared.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatClient for RecordingClient {
    async fn send_message(&self, _channel: ChannelId, message: OutgoingMessage) -> ChatResult<MessageId> {
        let id = MessageId::new(1000 + self.next_id.fetch_add(1, Ordering::SeqCst));
        self.sent.lock().unwrap().push((id, message));
        Ok(id)
    }

    async fn edit_message(&self, _channel: ChannelId, message_id: MessageId, message: OutgoingMessage) -> ChatResult<()> {
        if let Some(error) = self.edit_failure.lock().unwrap().clone() {
            return Err(error);
        }
        self.edits.lock().unwrap().push((message_id, message));
        Ok(())
    }

    async fn delete_message(&self, _channel: ChannelId, message_id: MessageId) -> ChatResult<()> {
        self.deleted.lock().unwrap().push(message_id);
        Ok(())
    }

    async fn add_reaction(&self, _channel: ChannelId, message_id: MessageId, emoji: &str) -> ChatResult<()> {
        if let Some(error) = self.reaction_failure.lock().unwrap().clone() {
            return Err(error);
        }
        self.reactions.lock().unwrap().push((message_id, emoji.to_string()));
        Ok(())
    }

    async fn remove_reaction(&self, _channel: ChannelId, message_id: MessageId, emoji: &str, user: UserId) -> ChatResult<()> {
        self.removed.lock().unwrap().push((message_id, emoji.to_string(), user));
        Ok(())
    }

    async fn clear_reactions(&self, _channel: ChannelId, message_id: MessageId) -> ChatResult<()> {
        self.cleared.lock().unwrap().push(message_id);
        Ok(())
    }
}

/// One connection that never expires, so the in-memory database lives as
/// long as the pool.
pub async fn memory_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    initialize_database(&pool).await.unwrap();
    pool
}

pub fn test_config() -> BotConfig {
    BotConfig { operators: [OPERATOR].into_iter().collect(), ..BotConfig::default() }
}

pub async fn test_state_with(registry: CommandRegistry) -> (Arc<AppState>, Arc<RecordingClient>) {
    test_state_with_loader(registry, None).await
}

pub async fn test_state_with_loader(registry: CommandRegistry, loader: Option<CommandLoader>) -> (Arc<AppState>, Arc<RecordingClient>) {
    let client = Arc::new(RecordingClient::default());
    let config = test_config();
    let settings = SettingsStore::new(memory_pool().await, config.limits.clone());
    let state = AppState::new(config, client.clone(), settings, registry, loader);
    (Arc::new(state), client)
}

pub fn guild_member(permissions: Permissions, bot_permissions: Permissions) -> MemberContext {
    MemberContext { roles: Vec::new(), permissions, bot_permissions }
}

/// A regular member: can talk, and the bot can embed and react.
fn default_member() -> MemberContext {
    guild_member(
        Permissions::SEND_MESSAGES | Permissions::READ_MESSAGE_HISTORY,
        Permissions::SEND_MESSAGES | Permissions::EMBED_LINKS | Permissions::ADD_REACTIONS | Permissions::MANAGE_MESSAGES,
    )
}

pub fn guild_message(text: &str) -> ChatEvent {
    ChatEvent {
        message_id: MessageId::new(1),
        channel_id: CHANNEL,
        guild_id: Some(GUILD),
        author: ChatUser { id: AUTHOR, name: "kuma".into(), bot: false },
        member: Some(default_member()),
        message: text.to_string(),
    }
}

pub fn dm_message(text: &str) -> ChatEvent {
    ChatEvent { guild_id: None, member: None, ..guild_message(text) }
}

pub fn reaction(message_id: MessageId, user_id: UserId, emoji: &str) -> ReactionEvent {
    ReactionEvent { message_id, channel_id: CHANNEL, user_id, emoji: emoji.to_string() }
}

/// An invocation of `warn` with the `!` prefix.
pub fn context(in_guild: bool, args: &[&str]) -> InvocationContext {
    let event = if in_guild { guild_message("!warn") } else { dm_message("!warn") };
    let tokens = Tokens {
        command: Some("warn".into()),
        args: args.iter().map(|a| a.to_string()).collect(),
        ..Tokens::default()
    };
    InvocationContext::new(&event, "!".into(), "warn".into(), "warn".into(), tokens)
}
