use std::sync::Arc;

use crate::bot::{commands::commands::{BotResult, Check}, db::{parse_channel_id, parse_role_id, GuildId}, dispatcher::context::InvocationContext, replies::Replies, state::def::{AppState, BotError}};

/// Every settings command is guild-only in its manifest; this turns a
/// misconfigured one into a reply instead of a panic.
fn guild(ctx: &InvocationContext) -> BotResult<GuildId> {
    ctx.guild_id.ok_or_else(|| BotError::Chat(Replies::guild_only()))
}

fn first_arg(ctx: &InvocationContext) -> BotResult<&str> {
    ctx.arg(0).ok_or_else(|| BotError::Chat(Replies::usage(&ctx.usage_line(&ctx.qualified_name()))))
}

/// Manage Server, a moderator role, or a bot operator.
pub async fn moderator(ctx: InvocationContext, state: Arc<AppState>) -> BotResult<Check> {
    if state.is_operator(ctx.author.id) {
        return Ok(Check::Pass);
    }
    let (Some(guild), Some(member)) = (ctx.guild_id, &ctx.member) else {
        return Ok(Check::Reject(Replies::moderator_required()));
    };
    if member.permissions.administrator() || member.permissions.manage_guild() {
        return Ok(Check::Pass);
    }

    let mod_roles = state.settings.get(guild).await?.mod_roles;
    if member.roles.iter().any(|role| mod_roles.contains(role)) {
        Ok(Check::Pass)
    } else {
        Ok(Check::Reject(Replies::moderator_required()))
    }
}

pub async fn prefix_add(ctx: InvocationContext, state: Arc<AppState>) -> BotResult<()> {
    let prefixes = state.settings.add_prefix(guild(&ctx)?, first_arg(&ctx)?).await?;
    ctx.say(&state, Replies::prefixes_updated(&prefixes, &state.config.default_prefix)).await?;
    Ok(())
}

pub async fn prefix_remove(ctx: InvocationContext, state: Arc<AppState>) -> BotResult<()> {
    let prefixes = state.settings.remove_prefix(guild(&ctx)?, first_arg(&ctx)?).await?;
    ctx.say(&state, Replies::prefixes_updated(&prefixes, &state.config.default_prefix)).await?;
    Ok(())
}

pub async fn prefix_list(ctx: InvocationContext, state: Arc<AppState>) -> BotResult<()> {
    let prefixes = state.settings.prefixes(guild(&ctx)?).await?;
    ctx.say(&state, Replies::prefix_list(&prefixes, &state.config.default_prefix)).await?;
    Ok(())
}

pub async fn modrole_add(ctx: InvocationContext, state: Arc<AppState>) -> BotResult<()> {
    let raw = first_arg(&ctx)?;
    let role = parse_role_id(raw).ok_or_else(|| BotError::Chat(Replies::not_a_role(raw)))?;
    let roles = state.settings.add_mod_role(guild(&ctx)?, role).await?;
    ctx.say(&state, Replies::mod_roles(&roles)).await?;
    Ok(())
}

pub async fn modrole_remove(ctx: InvocationContext, state: Arc<AppState>) -> BotResult<()> {
    let raw = first_arg(&ctx)?;
    let role = parse_role_id(raw).ok_or_else(|| BotError::Chat(Replies::not_a_role(raw)))?;
    let roles = state.settings.remove_mod_role(guild(&ctx)?, role).await?;
    ctx.say(&state, Replies::mod_roles(&roles)).await?;
    Ok(())
}

pub async fn modrole_list(ctx: InvocationContext, state: Arc<AppState>) -> BotResult<()> {
    let roles = state.settings.get(guild(&ctx)?).await?.mod_roles;
    ctx.say(&state, Replies::mod_roles(&roles)).await?;
    Ok(())
}

pub async fn logchannel_show(ctx: InvocationContext, state: Arc<AppState>) -> BotResult<()> {
    let channel = state.settings.get(guild(&ctx)?).await?.log_channel;
    ctx.say(&state, Replies::log_channel(channel)).await?;
    Ok(())
}

pub async fn logchannel_set(ctx: InvocationContext, state: Arc<AppState>) -> BotResult<()> {
    let raw = first_arg(&ctx)?;
    let channel = parse_channel_id(raw).ok_or_else(|| BotError::Chat(Replies::not_a_channel(raw)))?;
    state.settings.set_log_channel(guild(&ctx)?, Some(channel)).await?;
    ctx.say(&state, Replies::log_channel_set(channel)).await?;
    Ok(())
}

pub async fn logchannel_clear(ctx: InvocationContext, state: Arc<AppState>) -> BotResult<()> {
    state.settings.set_log_channel(guild(&ctx)?, None).await?;
    ctx.say(&state, Replies::log_channel_cleared()).await?;
    Ok(())
}
