use std::fmt;

use crate::bot::db::{ChannelId, MessageId, UserId};

/// Reaction controls, in the order they are attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    First,
    Previous,
    Next,
    Last,
    Stop,
    Jump,
}

impl Navigation {
    pub const ALL: [Navigation; 6] =
        [Navigation::First, Navigation::Previous, Navigation::Next, Navigation::Last, Navigation::Stop, Navigation::Jump];

    pub fn emoji(self) -> &'static str {
        match self {
            Navigation::First => "⏮",
            Navigation::Previous => "◀",
            Navigation::Next => "▶",
            Navigation::Last => "⏭",
            Navigation::Stop => "⏹",
            Navigation::Jump => "🔢",
        }
    }

    /// Discord may append a variation selector to some of these.
    pub fn from_emoji(emoji: &str) -> Option<Self> {
        let emoji = emoji.trim_end_matches('\u{FE0F}');
        Self::ALL.into_iter().find(|nav| nav.emoji() == emoji)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    Stop,
    Timeout,
    /// The message was deleted or the bot lost access to it.
    Gone,
}

impl fmt::Display for EndReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EndReason::Stop => write!(f, "stop"),
            EndReason::Timeout => write!(f, "timeout"),
            EndReason::Gone => write!(f, "gone"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Active(usize),
    AwaitingJumpInput,
    Ended(EndReason),
}

/// What the driver has to do after feeding the session an input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Not the owner's, or the session is busy or over.
    Ignored,
    /// Accepted, but the page stays the same.
    Unchanged,
    Show(usize),
    PromptJump,
    End(EndReason),
}

/// Page browsing state for one message. Pages are 1-based.
#[derive(Debug, Clone)]
pub struct PaginationSession {
    pub message_id: MessageId,
    pub channel_id: ChannelId,
    pub owner: UserId,
    page_count: usize,
    page: usize,
    busy: bool,
    ended: Option<EndReason>,
}

impl PaginationSession {
    pub fn new(message_id: MessageId, channel_id: ChannelId, owner: UserId, page_count: usize) -> Self {
        Self { message_id, channel_id, owner, page_count: page_count.max(1), page: 1, busy: false, ended: None }
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_count(&self) -> usize {
        self.page_count
    }

    pub fn state(&self) -> SessionState {
        match (self.ended, self.busy) {
            (Some(reason), _) => SessionState::Ended(reason),
            (None, true) => SessionState::AwaitingJumpInput,
            (None, false) => SessionState::Active(self.page),
        }
    }

    pub fn apply(&mut self, user: UserId, nav: Navigation) -> Step {
        if user != self.owner || self.busy || self.ended.is_some() {
            return Step::Ignored;
        }

        match nav {
            Navigation::First => self.move_to(1),
            Navigation::Previous => self.move_to(self.page.saturating_sub(1).max(1)),
            Navigation::Next => self.move_to((self.page + 1).min(self.page_count)),
            Navigation::Last => self.move_to(self.page_count),
            Navigation::Stop => {
                self.ended = Some(EndReason::Stop);
                Step::End(EndReason::Stop)
            }
            Navigation::Jump => {
                self.busy = true;
                Step::PromptJump
            }
        }
    }

    /// Ends a jump prompt. `None` means the prompt timed out. Anything that is
    /// not a page number in range leaves the page alone.
    pub fn finish_jump(&mut self, reply: Option<&str>) -> Step {
        if !self.busy || self.ended.is_some() {
            return Step::Ignored;
        }
        self.busy = false;

        match reply.and_then(|r| r.trim().parse::<usize>().ok()) {
            Some(page) if (1..=self.page_count).contains(&page) => self.move_to(page),
            _ => Step::Unchanged,
        }
    }

    pub fn expire(&mut self) -> EndReason {
        *self.ended.get_or_insert(EndReason::Timeout)
    }

    pub fn abandon(&mut self) -> EndReason {
        *self.ended.get_or_insert(EndReason::Gone)
    }

    /// Numbers are answers to a jump prompt, even out of range ones.
    pub fn is_jump_answer(text: &str) -> bool {
        text.trim().parse::<usize>().is_ok()
    }

    fn move_to(&mut self, page: usize) -> Step {
        if page == self.page {
            Step::Unchanged
        } else {
            self.page = page;
            Step::Show(page)
        }
    }
}
