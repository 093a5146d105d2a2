use std::{sync::Arc, time::Duration};

use dashmap::DashMap;
use tokio::sync::{mpsc, oneshot};

use crate::bot::{chat_event::chat_event::{ChatEvent, ReactionEvent}, db::{ChannelId, MessageId, UserId}};

/// Routes gateway events to whoever is waiting on them: reactions by message,
/// replies by (channel, user).
#[derive(Default)]
pub struct CollectorHub {
    reactions: DashMap<MessageId, mpsc::UnboundedSender<ReactionEvent>>,
    replies: DashMap<(ChannelId, UserId), ReplyWaiter>,
}

struct ReplyWaiter {
    accepts: Box<dyn Fn(&str) -> bool + Send + Sync>,
    tx: oneshot::Sender<ChatEvent>,
}

/// Receives reactions on one message until dropped.
pub struct ReactionSubscription {
    hub: Arc<CollectorHub>,
    message_id: MessageId,
    receiver: mpsc::UnboundedReceiver<ReactionEvent>,
}

impl ReactionSubscription {
    pub async fn recv(&mut self) -> Option<ReactionEvent> {
        self.receiver.recv().await
    }
}

impl Drop for ReactionSubscription {
    fn drop(&mut self) {
        self.hub.reactions.remove(&self.message_id);
    }
}

impl CollectorHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(self: &Arc<Self>, message_id: MessageId) -> ReactionSubscription {
        let (tx, receiver) = mpsc::unbounded_channel();
        self.reactions.insert(message_id, tx);
        ReactionSubscription { hub: self.clone(), message_id, receiver }
    }

    /// `false` if nobody is watching that message.
    pub fn publish_reaction(&self, event: ReactionEvent) -> bool {
        match self.reactions.get(&event.message_id) {
            Some(tx) => tx.send(event).is_ok(),
            None => false,
        }
    }

    /// Waits for the next message `user` sends in `channel` whose text
    /// `accepts` takes. Other messages pass by untouched. A newer wait for
    /// the same pair replaces this one.
    pub async fn await_reply(
        &self,
        channel: ChannelId,
        user: UserId,
        timeout: Duration,
        accepts: impl Fn(&str) -> bool + Send + Sync + 'static,
    ) -> Option<ChatEvent> {
        let (tx, rx) = oneshot::channel();
        self.replies.insert((channel, user), ReplyWaiter { accepts: Box::new(accepts), tx });

        match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(event)) => Some(event),
            _ => {
                self.replies.remove_if(&(channel, user), |_, waiter| waiter.tx.is_closed());
                None
            }
        }
    }

    /// Hands the message to a pending `await_reply` that accepts it. Returns
    /// it back when nobody claimed it, so it can be dispatched as usual.
    pub fn offer_message(&self, event: ChatEvent) -> Option<ChatEvent> {
        let key = (event.channel_id, event.author.id);
        let Some((_, waiter)) = self.replies.remove_if(&key, |_, waiter| (waiter.accepts)(&event.message)) else {
            return Some(event);
        };
        waiter.tx.send(event).err()
    }

    pub fn watched_messages(&self) -> usize {
        self.reactions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bot::testing::{guild_message, reaction, AUTHOR, CHANNEL};

    #[tokio::test]
    async fn reactions_reach_the_subscriber_until_it_drops() {
        let hub = Arc::new(CollectorHub::new());
        let watched = MessageId::new(5);

        let mut subscription = hub.subscribe(watched);
        assert!(hub.publish_reaction(reaction(watched, AUTHOR, "▶")));
        assert!(!hub.publish_reaction(reaction(MessageId::new(6), AUTHOR, "▶")));
        assert_eq!(subscription.recv().await.unwrap().emoji, "▶");

        drop(subscription);
        assert_eq!(hub.watched_messages(), 0);
        assert!(!hub.publish_reaction(reaction(watched, AUTHOR, "▶")));
    }

    #[tokio::test]
    async fn pending_reply_claims_the_next_message() {
        let hub = Arc::new(CollectorHub::new());
        let waiter = tokio::spawn({
            let hub = hub.clone();
            async move { hub.await_reply(CHANNEL, AUTHOR, Duration::from_secs(30), |text| text.trim().parse::<u32>().is_ok()).await }
        });
        tokio::task::yield_now().await;
        while hub.replies.is_empty() {
            tokio::task::yield_now().await;
        }

        // Chatter the waiter does not want is handed back and the wait goes on.
        assert!(hub.offer_message(guild_message("!ping")).is_some());
        assert!(hub.offer_message(guild_message("3")).is_none());
        assert_eq!(waiter.await.unwrap().unwrap().message, "3");
        // Nothing waits any more, so messages pass through.
        assert!(hub.offer_message(guild_message("!ping")).is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn reply_wait_times_out_and_cleans_up() {
        let hub = CollectorHub::new();
        assert!(hub.await_reply(CHANNEL, AUTHOR, Duration::from_secs(30), |_| true).await.is_none());
        assert!(hub.replies.is_empty());
        assert!(hub.offer_message(guild_message("3")).is_some());
    }
}
