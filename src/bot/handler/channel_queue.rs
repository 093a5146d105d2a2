use std::{future::Future, sync::Arc, time::Duration};

use dashmap::DashMap;
use tokio::sync::mpsc;
use tracing::debug;

use crate::bot::{chat_event::chat_event::ChatEvent, db::ChannelId};

/// A channel's worker exits after this long without messages.
const IDLE: Duration = Duration::from_secs(60);

/// One worker per active channel: a channel's messages are dispatched in the
/// order they arrived, while different channels run side by side.
#[derive(Default)]
pub struct ChannelQueues {
    senders: DashMap<ChannelId, mpsc::UnboundedSender<ChatEvent>>,
}

impl ChannelQueues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues `event` behind the earlier messages of its channel, starting a
    /// worker that runs `work` if the channel has none.
    pub fn push<F, Fut>(self: &Arc<Self>, event: ChatEvent, work: F)
    where
        F: Fn(ChatEvent) -> Fut + Clone + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let channel = event.channel_id;
        // The entry guard is held across the send so an idle worker cannot
        // leave in between.
        let mut entry = self.senders.entry(channel).or_insert_with(|| self.spawn_worker(channel, work.clone()));

        if let Err(mpsc::error::SendError(event)) = entry.send(event) {
            debug!("Dispatch worker for {channel} died; starting a new one");
            *entry = self.spawn_worker(channel, work);
            if entry.send(event).is_err() {
                debug!("Dropped a message for {channel}");
            }
        }
    }

    pub fn active_channels(&self) -> usize {
        self.senders.len()
    }

    fn spawn_worker<F, Fut>(self: &Arc<Self>, channel: ChannelId, work: F) -> mpsc::UnboundedSender<ChatEvent>
    where
        F: Fn(ChatEvent) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let queues = self.clone();

        tokio::spawn(async move {
            loop {
                match tokio::time::timeout(IDLE, rx.recv()).await {
                    Ok(Some(event)) => work(event).await,
                    Ok(None) => break,
                    // Only leave with nothing queued; `push` holds the entry
                    // while it sends.
                    Err(_) => {
                        if queues.senders.remove_if(&channel, |_, _| rx.is_empty()).is_some() {
                            break;
                        }
                    }
                }
            }
            debug!("Dispatch worker for {channel} stopped");
        });

        tx
    }
}
