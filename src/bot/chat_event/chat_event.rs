use serenity::all::Permissions;

use crate::bot::db::{ChannelId, GuildId, MessageId, RoleId, UserId};

/// Everything the gateway layer hands to the bot.
#[derive(Debug, Clone)]
pub enum GatewayEvent {
    /// The gateway session is up; carries the bot's own user id.
    Ready { bot_user: UserId },
    Message(ChatEvent),
    ReactionAdd(ReactionEvent),
}

#[derive(Debug, Clone)]
pub struct ChatEvent {
    pub message_id: MessageId,
    pub channel_id: ChannelId,
    /// `None` for direct messages.
    pub guild_id: Option<GuildId>,
    pub author: ChatUser,
    pub member: Option<MemberContext>,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct ChatUser {
    pub id: UserId,
    pub name: String,
    pub bot: bool,
}

/// Permission context of a guild message, resolved once by the gateway layer.
#[derive(Debug, Clone)]
pub struct MemberContext {
    pub roles: Vec<RoleId>,
    pub permissions: Permissions,
    pub bot_permissions: Permissions,
}

#[derive(Debug, Clone)]
pub struct ReactionEvent {
    pub message_id: MessageId,
    pub channel_id: ChannelId,
    pub user_id: UserId,
    pub emoji: String,
}

impl ChatEvent {
    pub fn is_guild(&self) -> bool {
        self.guild_id.is_some()
    }

    /// Cards need `EMBED_LINKS` in guild channels; direct messages always
    /// render them.
    pub fn can_embed(&self) -> bool {
        match &self.member {
            Some(member) => member.bot_permissions.embed_links(),
            None => !self.is_guild(),
        }
    }
}
