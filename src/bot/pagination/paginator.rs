use std::sync::Arc;

use tokio::{sync::mpsc, task::JoinHandle, time::{sleep_until, Instant}};
use tracing::{debug, warn};

use crate::bot::{chat_event::chat_event::ReactionEvent, commands::commands::BotResult, db::MessageId, dispatcher::context::InvocationContext, handler::handler::ChatError, pagination::{collector::ReactionSubscription, session::{EndReason, Navigation, PaginationSession, Step}}, render::{render, Card, OutgoingMessage}, replies::Replies, state::def::{AppState, BotError}};

pub struct PaginatedReply {
    pub message_id: MessageId,
    /// `None` when there was only one page or the controls could not be
    /// attached.
    pub session: Option<JoinHandle<EndReason>>,
}

/// Sends the first page and, for more than one page, attaches the controls
/// and starts a session in the background.
pub async fn send_paginated(state: &Arc<AppState>, ctx: &InvocationContext, pages: Vec<Card>) -> BotResult<PaginatedReply> {
    let page_count = pages.len();
    if page_count == 0 {
        return Err(BotError::Custom("tried to paginate zero pages".into()));
    }

    let pages: Vec<OutgoingMessage> = if page_count == 1 {
        pages.iter().map(|page| render(page, ctx.can_embed)).collect()
    } else {
        pages
            .into_iter()
            .enumerate()
            .map(|(i, page)| render(&page.footer(Replies::page_footer(i + 1, page_count)), ctx.can_embed))
            .collect()
    };

    let client = &state.chat_client;
    let message_id = client.send_message(ctx.channel_id, pages[0].clone()).await?;
    if page_count == 1 {
        return Ok(PaginatedReply { message_id, session: None });
    }

    // Subscribe first so early clicks are not lost.
    let subscription = state.collectors.subscribe(message_id);
    for nav in Navigation::ALL {
        if let Err(e) = client.add_reaction(ctx.channel_id, message_id, nav.emoji()).await {
            if e.is_known_denial() {
                debug!("Sending {message_id} without page controls: {e}");
                return Ok(PaginatedReply { message_id, session: None });
            }
            return Err(e.into());
        }
    }

    let driver = Driver {
        state: state.clone(),
        session: PaginationSession::new(message_id, ctx.channel_id, ctx.author.id, page_count),
        pages,
        subscription,
    };
    Ok(PaginatedReply { message_id, session: Some(tokio::spawn(driver.run())) })
}

struct Driver {
    state: Arc<AppState>,
    session: PaginationSession,
    pages: Vec<OutgoingMessage>,
    subscription: ReactionSubscription,
}

impl Driver {
    async fn run(mut self) -> EndReason {
        let timeout = self.state.config.pagination_timeout;
        let (jump_tx, mut jump_rx) = mpsc::channel::<Option<String>>(1);
        let mut deadline = Instant::now() + timeout;

        let reason = loop {
            let step = tokio::select! {
                event = self.subscription.recv() => match event {
                    Some(event) => self.on_reaction(event).await,
                    None => break EndReason::Stop,
                },
                Some(reply) = jump_rx.recv() => self.session.finish_jump(reply.as_deref()),
                _ = sleep_until(deadline) => break self.session.expire(),
            };

            match step {
                Step::Ignored => continue,
                Step::Unchanged => {}
                Step::Show(page) => {
                    if let Err(reason) = self.show(page).await {
                        break reason;
                    }
                }
                Step::PromptJump => self.prompt_jump(jump_tx.clone()),
                Step::End(reason) => break reason,
            }
            deadline = Instant::now() + timeout;
        };

        debug!("Pagination on {} ended: {reason}", self.session.message_id);
        if let Err(e) = self.state.chat_client.clear_reactions(self.session.channel_id, self.session.message_id).await {
            debug!("Could not clear reactions on {}: {e}", self.session.message_id);
        }
        reason
    }

    async fn on_reaction(&mut self, event: ReactionEvent) -> Step {
        if self.state.bot_user.get() == Some(&event.user_id) {
            return Step::Ignored;
        }

        let nav = Navigation::from_emoji(&event.emoji);
        let owner = event.user_id == self.session.owner;
        let step = match nav {
            Some(nav) => self.session.apply(event.user_id, nav),
            None => Step::Ignored,
        };

        // Strangers' reactions go away; the owner's go away once handled so
        // the same button can be pressed again.
        let handled_by_owner = owner && nav.is_some() && !matches!(step, Step::End(_));
        if !owner || handled_by_owner {
            self.remove(&event).await;
        }
        step
    }

    /// Fails when the message can no longer be edited at all.
    async fn show(&mut self, page: usize) -> Result<(), EndReason> {
        let Some(message) = self.pages.get(page - 1) else {
            return Ok(());
        };
        let client = &self.state.chat_client;
        match client.edit_message(self.session.channel_id, self.session.message_id, message.clone()).await {
            Ok(()) => Ok(()),
            Err(e @ (ChatError::NotFound(_) | ChatError::PermissionDenied(_))) => {
                debug!("Pagination message {} is gone: {e}", self.session.message_id);
                Err(self.session.abandon())
            }
            Err(e) => {
                warn!("Could not turn {} to page {page}: {e}", self.session.message_id);
                Ok(())
            }
        }
    }

    async fn remove(&self, event: &ReactionEvent) {
        let client = &self.state.chat_client;
        if let Err(e) = client.remove_reaction(event.channel_id, event.message_id, &event.emoji, event.user_id).await {
            debug!("Could not remove reaction on {}: {e}", event.message_id);
        }
    }

    /// Asks for a page number in the background; the answer comes back on
    /// `answer`, `None` on timeout.
    fn prompt_jump(&self, answer: mpsc::Sender<Option<String>>) {
        let state = self.state.clone();
        let channel = self.session.channel_id;
        let owner = self.session.owner;
        let page_count = self.session.page_count();

        tokio::spawn(async move {
            let client = &state.chat_client;
            let prompt = match client.say(channel, &Replies::jump_prompt(page_count)).await {
                Ok(prompt) => Some(prompt),
                Err(e) => {
                    debug!("Could not ask for a page number in {channel}: {e}");
                    None
                }
            };
            let reply = state
                .collectors
                .await_reply(channel, owner, state.config.jump_timeout, PaginationSession::is_jump_answer)
                .await;

            if let Some(prompt) = prompt {
                if let Err(e) = client.delete_message(channel, prompt).await {
                    debug!("Could not delete jump prompt {prompt}: {e}");
                }
            }
            if let Some(reply) = &reply {
                if let Err(e) = client.delete_message(channel, reply.message_id).await {
                    debug!("Could not delete jump answer {}: {e}", reply.message_id);
                }
            }
            if answer.send(reply.map(|r| r.message)).await.is_err() {
                debug!("Jump answer arrived after the session ended");
            }
        });
    }
}
