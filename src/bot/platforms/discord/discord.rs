use std::sync::Arc;

use async_trait::async_trait;
use serenity::{all::{self as sy, CreateEmbed, CreateEmbedFooter, CreateMessage, EditMessage, Http, ReactionType}, http::HttpError};

use crate::bot::{db::{ChannelId, MessageId, UserId}, handler::handler::{ChatClient, ChatError, ChatResult}, render::{Card, OutgoingMessage}};

/// Discord JSON error codes that mean "not allowed here".
const MISSING_ACCESS: isize = 50001;
const MISSING_PERMISSIONS: isize = 50013;
const REACTION_BLOCKED: isize = 90001;
/// ... and "that no longer exists".
const UNKNOWN_CHANNEL: isize = 10003;
const UNKNOWN_MESSAGE: isize = 10008;

pub struct DiscordClient {
    http: Arc<Http>,
}

impl DiscordClient {
    pub fn new(http: Arc<Http>) -> Self {
        Self { http }
    }

    fn http(&self) -> &Http {
        &self.http
    }
}

pub fn classify_error(error: serenity::Error) -> ChatError {
    match &error {
        serenity::Error::Http(HttpError::UnsuccessfulRequest(response)) => {
            classify_response(response.status_code.as_u16(), response.error.code, &response.error.message)
        }
        _ => ChatError::Other(error.to_string()),
    }
}

pub fn classify_response(status: u16, code: isize, message: &str) -> ChatError {
    let message = message.to_string();
    match (status, code) {
        (429, _) => ChatError::RateLimited(message),
        (_, MISSING_ACCESS | MISSING_PERMISSIONS | REACTION_BLOCKED) => ChatError::PermissionDenied(message),
        (_, UNKNOWN_CHANNEL | UNKNOWN_MESSAGE) => ChatError::NotFound(message),
        (403, _) => ChatError::PermissionDenied(message),
        (404, _) => ChatError::NotFound(message),
        _ => ChatError::Other(format!("HTTP {status} ({code}): {message}")),
    }
}

pub fn to_embed(card: &Card) -> CreateEmbed {
    let mut embed = CreateEmbed::new();
    if let Some(title) = &card.title {
        embed = embed.title(title);
    }
    if let Some(url) = &card.url {
        embed = embed.url(url);
    }
    if let Some(description) = &card.description {
        embed = embed.description(description);
    }
    for field in &card.fields {
        embed = embed.field(&field.name, &field.value, field.inline);
    }
    if let Some(color) = card.color {
        embed = embed.color(color);
    }
    if let Some(thumbnail) = &card.thumbnail {
        embed = embed.thumbnail(thumbnail);
    }
    if let Some(footer) = &card.footer {
        embed = embed.footer(CreateEmbedFooter::new(footer));
    }
    embed
}

fn channel(id: ChannelId) -> sy::ChannelId {
    sy::ChannelId::new(id.get())
}

fn message(id: MessageId) -> sy::MessageId {
    sy::MessageId::new(id.get())
}

fn emoji(raw: &str) -> ReactionType {
    ReactionType::Unicode(raw.to_string())
}

#[async_trait]
impl ChatClient for DiscordClient {
    async fn send_message(&self, channel_id: ChannelId, outgoing: OutgoingMessage) -> ChatResult<MessageId> {
        let builder = match &outgoing {
            OutgoingMessage::Text(text) => CreateMessage::new().content(text),
            OutgoingMessage::Card(card) => CreateMessage::new().embed(to_embed(card)),
        };
        let sent = channel(channel_id).send_message(self.http(), builder).await.map_err(classify_error)?;
        Ok(MessageId::new(sent.id.get()))
    }

    async fn edit_message(&self, channel_id: ChannelId, message_id: MessageId, outgoing: OutgoingMessage) -> ChatResult<()> {
        let builder = match &outgoing {
            OutgoingMessage::Text(text) => EditMessage::new().content(text).embeds(Vec::new()),
            OutgoingMessage::Card(card) => EditMessage::new().content("").embed(to_embed(card)),
        };
        channel(channel_id)
            .edit_message(self.http(), message(message_id), builder)
            .await
            .map_err(classify_error)?;
        Ok(())
    }

    async fn delete_message(&self, channel_id: ChannelId, message_id: MessageId) -> ChatResult<()> {
        self.http
            .delete_message(channel(channel_id), message(message_id), None)
            .await
            .map_err(classify_error)
    }

    async fn add_reaction(&self, channel_id: ChannelId, message_id: MessageId, raw: &str) -> ChatResult<()> {
        self.http
            .create_reaction(channel(channel_id), message(message_id), &emoji(raw))
            .await
            .map_err(classify_error)
    }

    async fn remove_reaction(&self, channel_id: ChannelId, message_id: MessageId, raw: &str, user: UserId) -> ChatResult<()> {
        self.http
            .delete_reaction(channel(channel_id), message(message_id), sy::UserId::new(user.get()), &emoji(raw))
            .await
            .map_err(classify_error)
    }

    async fn clear_reactions(&self, channel_id: ChannelId, message_id: MessageId) -> ChatResult<()> {
        self.http
            .delete_message_reactions(channel(channel_id), message(message_id))
            .await
            .map_err(classify_error)
    }
}
