use std::sync::Arc;

use tracing::{error, warn};

use crate::bot::{chat_event::chat_event::ChatEvent, commands::commands::{BotResult, CommandSpec}, dispatcher::{context::InvocationContext, router::{route, Target}}, parser::parser::{resolve_prefix, tokenize}, permissions::permissions::{evaluate, GateOutcome}, replies::Replies, state::def::{AppState, BotError}};

/// Which path a message took through the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// No prefix matched, or the author is a bot.
    NotCommand,
    /// Prefixed, but no command by that name.
    Unknown,
    Rejected,
    Silenced,
    Completed,
    /// The handler failed; the user has been told.
    Failed,
}

/// A handler's result, sorted into what the user should see.
#[derive(Debug)]
pub enum Outcome {
    Ok,
    UserFacing(String),
    Internal(BotError),
}

impl From<BotResult<()>> for Outcome {
    fn from(result: BotResult<()>) -> Self {
        match result {
            Ok(()) => Outcome::Ok,
            Err(BotError::Chat(message)) => Outcome::UserFacing(message),
            Err(e) => Outcome::Internal(e),
        }
    }
}

pub async fn dispatch_message(state: Arc<AppState>, event: ChatEvent) -> BotResult<Dispatch> {
    if event.author.bot {
        return Ok(Dispatch::NotCommand);
    }

    let prefixes = prefixes_for(&state, &event).await?;
    let Some(prefix) = resolve_prefix(&event.message, &prefixes, state.bot_user.get().copied()) else {
        return Ok(Dispatch::NotCommand);
    };
    let Some(tokens) = tokenize(&event.message, &prefix) else {
        return Ok(Dispatch::NotCommand);
    };
    let Some(invoked) = tokens.command.clone() else {
        return Ok(Dispatch::Unknown);
    };
    // Clone out of the lock so a reload never waits on a running handler.
    let Some(command) = state.registry.read().await.resolve(&invoked) else {
        return Ok(Dispatch::Unknown);
    };

    let mut ctx = InvocationContext::new(&event, prefix, invoked, command.name.clone(), tokens);

    if let Some(stop) = run_gate(&command.spec, &ctx, &state).await {
        return Ok(stop);
    }

    let target = route(&command, &mut ctx);
    if let Target::Subcommand(sub) = target {
        if let Some(stop) = run_gate(&sub.spec, &ctx, &state).await {
            return Ok(stop);
        }
    }

    let Some(handler) = target.spec().handler.clone() else {
        let subcommands: Vec<&str> = command.subcommands.keys().map(String::as_str).collect();
        let usage = Replies::group_usage(&ctx.usage_line(&command.spec.usage), &subcommands);
        send_or_log(&state, &ctx, &usage).await;
        return Ok(Dispatch::Rejected);
    };

    let outcome = Outcome::from(handler(ctx.clone(), state.clone()).await);
    Ok(deliver(outcome, &ctx, &state).await)
}

async fn prefixes_for(state: &AppState, event: &ChatEvent) -> BotResult<Vec<String>> {
    let custom = match event.guild_id {
        Some(guild) => state.settings.prefixes(guild).await?,
        None => Vec::new(),
    };
    if custom.is_empty() {
        Ok(vec![state.config.default_prefix.clone()])
    } else {
        Ok(custom)
    }
}

/// `None` means carry on. Starts the cooldown on approval.
async fn run_gate(spec: &CommandSpec, ctx: &InvocationContext, state: &Arc<AppState>) -> Option<Dispatch> {
    match evaluate(spec, ctx, state).await {
        Ok(GateOutcome::Approved) => {
            state.cooldowns.start(&spec.key, ctx.author.id, spec.cooldown);
            None
        }
        Ok(GateOutcome::Rejected(message)) => {
            send_or_log(state, ctx, &message).await;
            Some(Dispatch::Rejected)
        }
        Ok(GateOutcome::Silent) => Some(Dispatch::Silenced),
        Err(e) => Some(deliver(Outcome::Internal(e), ctx, state).await),
    }
}

async fn deliver(outcome: Outcome, ctx: &InvocationContext, state: &AppState) -> Dispatch {
    match outcome {
        Outcome::Ok => Dispatch::Completed,
        Outcome::UserFacing(message) => {
            send_or_log(state, ctx, &message).await;
            Dispatch::Failed
        }
        Outcome::Internal(e) => {
            error!(command = %ctx.qualified_name(), user = %ctx.author.id, channel = %ctx.channel_id, "Command failed: {e:?}");
            send_or_log(state, ctx, &Replies::internal_failure()).await;
            Dispatch::Failed
        }
    }
}

async fn send_or_log(state: &AppState, ctx: &InvocationContext, text: &str) {
    if let Err(e) = state.chat_client.say(ctx.channel_id, text).await {
        warn!("Could not reply in {}: {e}", ctx.channel_id);
    }
}
