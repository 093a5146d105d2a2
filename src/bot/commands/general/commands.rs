use std::sync::Arc;

use crate::bot::{commands::commands::{BotResult, CommandDefinition, CommandSpec}, dispatcher::context::InvocationContext, pagination::paginator::send_paginated, render::Card, replies::Replies, state::def::{AppState, BotError}};

pub async fn ping(ctx: InvocationContext, state: Arc<AppState>) -> BotResult<()> {
    ctx.say(&state, Replies::pong()).await?;
    Ok(())
}

/// `help` pages through every category; `help <command> [sub]` describes one
/// command. Operators can pass `--all` to see hidden commands too.
pub async fn help(ctx: InvocationContext, state: Arc<AppState>) -> BotResult<()> {
    let show_hidden = ctx.has_flag("all") && state.is_operator(ctx.author.id);

    let Some(name) = ctx.arg(0) else {
        let pages = overview_pages(&ctx, &state, show_hidden).await;
        if pages.is_empty() {
            return Err(BotError::Chat(Replies::no_commands()));
        }
        send_paginated(&state, &ctx, pages).await?;
        return Ok(());
    };

    let command = state
        .registry
        .read()
        .await
        .resolve(name)
        .filter(|c| show_hidden || is_listed(&c.spec))
        .ok_or_else(|| BotError::Chat(Replies::unknown_command(name)))?;

    let card = match ctx.arg(1).and_then(|sub| command.subcommand_named(sub)) {
        Some(sub) => spec_card(&ctx, &sub.spec, &sub.spec.key).title(ctx.usage_line(&sub.spec.key)),
        None => command_card(&ctx, &command),
    };
    ctx.send(&state, &card).await?;
    Ok(())
}

fn is_listed(spec: &CommandSpec) -> bool {
    spec.enabled && !spec.protected
}

async fn overview_pages(ctx: &InvocationContext, state: &AppState, show_hidden: bool) -> Vec<Card> {
    let categories = state.registry.read().await.categories();

    categories
        .into_iter()
        .filter_map(|(category, commands)| {
            let lines: Vec<String> = commands
                .iter()
                .filter(|c| show_hidden || is_listed(&c.spec))
                .map(|c| format!("`{}` {}", ctx.usage_line(&c.name), c.spec.description))
                .collect();
            if lines.is_empty() {
                return None;
            }
            Some(
                Card::new()
                    .title(format!("📚 {}", capitalize(&category)))
                    .description(format!("{}\n\n{}", lines.join("\n"), help_hint(ctx))),
            )
        })
        .collect()
}

fn help_hint(ctx: &InvocationContext) -> String {
    format!("Use `{}` for details on one command.", ctx.usage_line("help <command>"))
}

fn command_card(ctx: &InvocationContext, command: &CommandDefinition) -> Card {
    let mut card = spec_card(ctx, &command.spec, &command.name).title(ctx.usage_line(&command.name));

    if !command.aliases.is_empty() {
        card = card.field("Aliases", command.aliases.join(", "), true);
    }
    if !command.subcommands.is_empty() {
        let subs: Vec<String> = command
            .subcommands
            .values()
            .map(|s| format!("`{}` {}", s.name, s.spec.description))
            .collect();
        card = card.field("Subcommands", subs.join("\n"), false);
    }
    card
}

fn spec_card(ctx: &InvocationContext, spec: &CommandSpec, name: &str) -> Card {
    let description = if spec.description.is_empty() { name.to_string() } else { spec.description.clone() };
    let mut card = Card::new()
        .description(description)
        .field("Usage", format!("`{}`", ctx.usage_line(&spec.usage)), false);

    if !spec.flags.is_empty() {
        let flags: Vec<String> = spec.flags.iter().map(|f| format!("`--{}` {}", f.name, f.description)).collect();
        card = card.field("Flags", flags.join("\n"), false);
    }
    if !spec.cooldown.is_zero() {
        card = card.field("Cooldown", format!("{}s", spec.cooldown.as_secs()), true);
    }

    let mut requirements = Vec::new();
    if spec.guild_only {
        requirements.push("Server only".to_string());
    }
    if !spec.member_permissions.is_empty() {
        requirements.push(format!("You need: {}", spec.member_permissions.get_permission_names().join(", ")));
    }
    if !spec.bot_permissions.is_empty() {
        requirements.push(format!("I need: {}", spec.bot_permissions.get_permission_names().join(", ")));
    }
    if spec.precondition.is_some() {
        requirements.push("Extra checks apply".to_string());
    }
    if !requirements.is_empty() {
        card = card.field("Requirements", requirements.join("\n"), false);
    }
    card
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
