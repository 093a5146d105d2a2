use async_trait::async_trait;
use serenity::all::{self as sy, Context, EventHandler, GatewayIntents, GuildChannel, Message, Permissions, Reaction, ReactionType, Ready};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, warn};

use crate::bot::{chat_event::chat_event::{ChatEvent, ChatUser, GatewayEvent, MemberContext, ReactionEvent}, commands::commands::BotResult, db::{ChannelId, GuildId, MessageId, RoleId, UserId}};

pub fn intents() -> GatewayIntents {
    GatewayIntents::GUILDS
        | GatewayIntents::GUILD_MEMBERS
        | GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::GUILD_MESSAGE_REACTIONS
        | GatewayIntents::DIRECT_MESSAGES
        | GatewayIntents::DIRECT_MESSAGE_REACTIONS
        | GatewayIntents::MESSAGE_CONTENT
}

/// Turns serenity callbacks into crate events. All real work happens on the
/// receiving side of `events`.
pub struct DiscordHandler {
    events: UnboundedSender<GatewayEvent>,
}

impl DiscordHandler {
    pub fn new(events: UnboundedSender<GatewayEvent>) -> Self {
        Self { events }
    }

    fn forward(&self, event: GatewayEvent) {
        if self.events.send(event).is_err() {
            warn!("Event loop is gone; dropping gateway event");
        }
    }
}

#[async_trait]
impl EventHandler for DiscordHandler {
    async fn ready(&self, _ctx: Context, ready: Ready) {
        self.forward(GatewayEvent::Ready { bot_user: UserId::new(ready.user.id.get()) });
    }

    async fn message(&self, ctx: Context, msg: Message) {
        let member = msg.guild_id.map(|guild_id| member_context(&ctx, &msg, guild_id));
        self.forward(GatewayEvent::Message(map_message(&msg, member)));
    }

    async fn reaction_add(&self, _ctx: Context, reaction: Reaction) {
        let Some(user_id) = reaction.user_id else {
            return;
        };
        let emoji = match &reaction.emoji {
            ReactionType::Unicode(raw) => raw.clone(),
            other => other.to_string(),
        };
        self.forward(GatewayEvent::ReactionAdd(ReactionEvent {
            message_id: MessageId::new(reaction.message_id.get()),
            channel_id: ChannelId::new(reaction.channel_id.get()),
            user_id: UserId::new(user_id.get()),
            emoji,
        }));
    }
}

pub fn map_message(msg: &Message, member: Option<MemberContext>) -> ChatEvent {
    ChatEvent {
        message_id: MessageId::new(msg.id.get()),
        channel_id: ChannelId::new(msg.channel_id.get()),
        guild_id: msg.guild_id.map(|g| GuildId::new(g.get())),
        author: ChatUser { id: UserId::new(msg.author.id.get()), name: msg.author.name.clone(), bot: msg.author.bot },
        member,
        message: msg.content.clone(),
    }
}

/// Channel permissions of the author and of the bot, read from the cache.
/// An uncached guild yields no permissions rather than a guess.
fn member_context(ctx: &Context, msg: &Message, guild_id: sy::GuildId) -> MemberContext {
    let roles: Vec<RoleId> = msg
        .member
        .as_ref()
        .map(|m| m.roles.iter().map(|r| RoleId::new(r.get())).collect())
        .unwrap_or_default();
    let bot_id = ctx.cache.current_user().id;

    let Some(guild) = ctx.cache.guild(guild_id) else {
        debug!("Guild {guild_id} is not cached; treating permissions as empty");
        return MemberContext { roles, permissions: Permissions::empty(), bot_permissions: Permissions::empty() };
    };

    // Threads inherit their parent's overwrites.
    let channel: Option<&GuildChannel> = guild.channels.get(&msg.channel_id).or_else(|| {
        let parent = guild.threads.iter().find(|t| t.id == msg.channel_id)?.parent_id?;
        guild.channels.get(&parent)
    });
    let Some(channel) = channel else {
        return MemberContext { roles, permissions: Permissions::empty(), bot_permissions: Permissions::empty() };
    };

    let permissions = msg
        .member
        .as_deref()
        .map(|member| guild.partial_member_permissions_in(channel, msg.author.id, member))
        .unwrap_or_else(Permissions::empty);
    let bot_permissions = guild
        .members
        .get(&bot_id)
        .map(|bot| guild.user_permissions_in(channel, bot))
        .unwrap_or_else(Permissions::empty);

    MemberContext { roles, permissions, bot_permissions }
}

pub async fn build_discord_client(token: &str, events: UnboundedSender<GatewayEvent>) -> BotResult<serenity::Client> {
    Ok(serenity::Client::builder(token, intents()).event_handler(DiscordHandler::new(events)).await?)
}
