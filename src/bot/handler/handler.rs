use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, error, info};

use crate::bot::{chat_event::chat_event::{ChatEvent, GatewayEvent}, db::{ChannelId, MessageId, UserId}, dispatcher::dispatcher::{dispatch_message, Dispatch}, render::OutgoingMessage, state::def::AppState};

pub type ChatResult<T> = Result<T, ChatError>;

/// Failure classes of outbound gateway calls. Handlers treat all of them as
/// non-fatal; pagination uses the class to decide whether to degrade.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ChatError {
    #[error("missing permissions: {0}")]
    PermissionDenied(String),
    #[error("rate limited: {0}")]
    RateLimited(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("{0}")]
    Other(String),
}

impl ChatError {
    /// True for failures that mean "the bot cannot do this here", as opposed
    /// to an unexpected fault.
    pub fn is_known_denial(&self) -> bool {
        matches!(self, ChatError::PermissionDenied(_) | ChatError::RateLimited(_) | ChatError::NotFound(_))
    }
}

#[async_trait]
pub trait ChatClient: Send + Sync {
    async fn send_message(&self, channel: ChannelId, message: OutgoingMessage) -> ChatResult<MessageId>;

    async fn edit_message(&self, channel: ChannelId, message_id: MessageId, message: OutgoingMessage) -> ChatResult<()>;

    async fn delete_message(&self, channel: ChannelId, message_id: MessageId) -> ChatResult<()>;

    async fn add_reaction(&self, channel: ChannelId, message_id: MessageId, emoji: &str) -> ChatResult<()>;

    async fn remove_reaction(&self, channel: ChannelId, message_id: MessageId, emoji: &str, user: UserId) -> ChatResult<()>;

    async fn clear_reactions(&self, channel: ChannelId, message_id: MessageId) -> ChatResult<()>;

    async fn say(&self, channel: ChannelId, text: &str) -> ChatResult<MessageId> {
        self.send_message(channel, OutgoingMessage::Text(text.to_string())).await
    }
}

pub async fn handle_event(event: GatewayEvent, state: Arc<AppState>) {
    match event {
        GatewayEvent::Ready { bot_user } => {
            if state.bot_user.set(bot_user).is_err() {
                debug!("Gateway resumed as {bot_user}");
            } else {
                info!("Connected as {bot_user}");
            }
        }
        GatewayEvent::ReactionAdd(reaction) => {
            if !state.collectors.publish_reaction(reaction) {
                debug!("Reaction on a message without a collector");
            }
        }
        GatewayEvent::Message(message) => {
            let Some(message) = state.collectors.offer_message(message) else {
                return;
            };

            // Never hold up the event loop; the channel's worker keeps its
            // messages in arrival order.
            let queues = state.dispatch_queues.clone();
            queues.push(message, move |message| handle_message(message, state.clone()));
        }
    }
}

async fn handle_message(message: ChatEvent, state: Arc<AppState>) {
    match dispatch_message(state, message).await {
        Ok(Dispatch::Failed) => debug!("Command failed; user was notified"),
        Ok(_) => {}
        Err(e) => error!("Dispatch error: {e:?}"),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::bot::{commands::{commands::{handler, CommandDefinition}, registry::CommandRegistry}, dispatcher::context::InvocationContext, pagination::session::PaginationSession, replies::Replies, testing::{dm_message, reaction, test_state_with, AUTHOR, CHANNEL}};

    #[test]
    fn known_denials_are_the_expected_classes() {
        assert!(ChatError::PermissionDenied("x".into()).is_known_denial());
        assert!(ChatError::RateLimited("x".into()).is_known_denial());
        assert!(ChatError::NotFound("x".into()).is_known_denial());
        assert!(!ChatError::Other("x".into()).is_known_denial());
    }

    #[tokio::test]
    async fn ready_records_the_bot_user_once() {
        let (state, _) = test_state_with(CommandRegistry::new()).await;
        handle_event(GatewayEvent::Ready { bot_user: UserId::new(9) }, state.clone()).await;
        handle_event(GatewayEvent::Ready { bot_user: UserId::new(10) }, state.clone()).await;
        assert_eq!(state.bot_user.get(), Some(&UserId::new(9)));
    }

    #[tokio::test]
    async fn stray_reactions_are_dropped() {
        let (state, client) = test_state_with(CommandRegistry::new()).await;
        handle_event(GatewayEvent::ReactionAdd(reaction(MessageId::new(1), AUTHOR, "▶")), state).await;
        assert!(client.sent().is_empty());
    }

    #[tokio::test]
    async fn commands_typed_during_a_jump_prompt_still_run() {
        let mut registry = CommandRegistry::new();
        let ping = handler(|ctx: InvocationContext, state: Arc<AppState>| async move {
            ctx.say(&state, Replies::pong()).await?;
            Ok(())
        });
        registry.register(CommandDefinition::new("ping", "general").handler(ping)).unwrap();
        let (state, client) = test_state_with(registry).await;

        let prompt = tokio::spawn({
            let state = state.clone();
            async move { state.collectors.await_reply(CHANNEL, AUTHOR, Duration::from_secs(30), PaginationSession::is_jump_answer).await }
        });
        tokio::time::sleep(Duration::from_millis(10)).await;

        handle_event(GatewayEvent::Message(dm_message("!ping")), state.clone()).await;
        handle_event(GatewayEvent::Message(dm_message("2")), state.clone()).await;
        assert_eq!(prompt.await.unwrap().unwrap().message, "2");

        for _ in 0..100 {
            if !client.sent().is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(client.sent_texts(), [Replies::pong()]);
        assert!(client.deleted().is_empty());
    }
}
