use std::sync::Arc;

use serenity::all::Permissions;
use tracing::debug;

use crate::bot::{commands::commands::{BotResult, Check, CommandSpec, GateCheck}, dispatcher::context::InvocationContext, replies::Replies, state::def::AppState};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateOutcome {
    Approved,
    /// Refused; the text goes back to the user.
    Rejected(String),
    /// Refused without a reply.
    Silent,
}

/// Runs a command's checks in its configured order; the first failure wins.
/// Approval does not start the cooldown, the dispatcher does that.
pub async fn evaluate(spec: &CommandSpec, ctx: &InvocationContext, state: &Arc<AppState>) -> BotResult<GateOutcome> {
    let operator = state.is_operator(ctx.author.id);

    for check in &spec.gate_order {
        let outcome = match check {
            GateCheck::Enabled => silent_unless(spec.enabled || operator),
            GateCheck::Protected => silent_unless(!spec.protected || operator),
            GateCheck::GuildOnly => {
                if spec.guild_only && ctx.guild_id.is_none() {
                    GateOutcome::Rejected(Replies::guild_only())
                } else {
                    GateOutcome::Approved
                }
            }
            GateCheck::ArgCount => {
                if ctx.args.len() < spec.required_args {
                    GateOutcome::Rejected(Replies::usage(&ctx.usage_line(&spec.usage)))
                } else {
                    GateOutcome::Approved
                }
            }
            GateCheck::MemberPermissions => match missing(spec.member_permissions, member_permissions(ctx)) {
                Some(names) => GateOutcome::Rejected(Replies::missing_member_permissions(&names)),
                None => GateOutcome::Approved,
            },
            GateCheck::BotPermissions => match missing(spec.bot_permissions, bot_permissions(ctx)) {
                Some(names) => GateOutcome::Rejected(Replies::missing_bot_permissions(&names)),
                None => GateOutcome::Approved,
            },
            GateCheck::Cooldown => match state.cooldowns.remaining(&spec.key, ctx.author.id) {
                Some(remaining) if !operator => GateOutcome::Rejected(Replies::cooldown(remaining)),
                _ => GateOutcome::Approved,
            },
            GateCheck::Precondition => match &spec.precondition {
                Some(precondition) => match precondition(ctx.clone(), state.clone()).await? {
                    Check::Pass => GateOutcome::Approved,
                    Check::Reject(message) => GateOutcome::Rejected(message),
                    Check::Silent => GateOutcome::Silent,
                },
                None => GateOutcome::Approved,
            },
        };

        if outcome != GateOutcome::Approved {
            debug!("Gate stopped `{}` for {} at {:?}", spec.key, ctx.author.id, check);
            return Ok(outcome);
        }
    }

    Ok(GateOutcome::Approved)
}

fn silent_unless(allowed: bool) -> GateOutcome {
    if allowed {
        GateOutcome::Approved
    } else {
        GateOutcome::Silent
    }
}

/// `None` outside guilds: there is no member to check.
fn member_permissions(ctx: &InvocationContext) -> Option<Permissions> {
    ctx.guild_id?;
    Some(ctx.member.as_ref().map_or(Permissions::empty(), |m| m.permissions))
}

fn bot_permissions(ctx: &InvocationContext) -> Option<Permissions> {
    ctx.guild_id?;
    Some(ctx.member.as_ref().map_or(Permissions::empty(), |m| m.bot_permissions))
}

fn missing(required: Permissions, held: Option<Permissions>) -> Option<Vec<&'static str>> {
    let held = held?;
    if held.administrator() {
        return None;
    }
    let lacking = required.difference(held);
    (!lacking.is_empty()).then(|| lacking.get_permission_names())
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::bot::{commands::{commands::precondition, registry::CommandRegistry}, db::UserId, testing::{context, guild_member, test_state_with, OPERATOR}};

    async fn state() -> Arc<AppState> {
        test_state_with(CommandRegistry::new()).await.0
    }

    fn spec(f: impl FnOnce(&mut CommandSpec)) -> CommandSpec {
        let mut spec = CommandSpec::new("warn");
        spec.usage = "warn <user> [reason]".into();
        f(&mut spec);
        spec
    }

    #[tokio::test]
    async fn plain_command_is_approved() {
        let state = state().await;
        let ctx = context(true, &[]);
        assert_eq!(evaluate(&spec(|_| {}), &ctx, &state).await.unwrap(), GateOutcome::Approved);
    }

    #[tokio::test]
    async fn too_few_args_are_rejected_with_usage() {
        let state = state().await;
        let ctx = context(true, &[]);
        let outcome = evaluate(&spec(|s| s.required_args = 1), &ctx, &state).await.unwrap();
        assert_eq!(outcome, GateOutcome::Rejected(Replies::usage("!warn <user> [reason]")));
    }

    #[tokio::test]
    async fn guild_only_wins_over_arg_count_in_dms() {
        let state = state().await;
        let ctx = context(false, &[]);
        let outcome = evaluate(&spec(|s| { s.required_args = 1; s.guild_only = true; }), &ctx, &state).await.unwrap();
        assert_eq!(outcome, GateOutcome::Rejected(Replies::guild_only()));
    }

    #[tokio::test]
    async fn disabled_and_protected_are_silent_for_regular_users() {
        let state = state().await;
        let ctx = context(true, &[]);
        assert_eq!(evaluate(&spec(|s| s.enabled = false), &ctx, &state).await.unwrap(), GateOutcome::Silent);
        assert_eq!(evaluate(&spec(|s| s.protected = true), &ctx, &state).await.unwrap(), GateOutcome::Silent);

        let mut op = context(true, &[]);
        op.author.id = OPERATOR;
        assert_eq!(evaluate(&spec(|s| s.enabled = false), &op, &state).await.unwrap(), GateOutcome::Approved);
        assert_eq!(evaluate(&spec(|s| s.protected = true), &op, &state).await.unwrap(), GateOutcome::Approved);
    }

    #[tokio::test]
    async fn member_and_bot_permissions_have_distinct_messages() {
        let state = state().await;
        let mut ctx = context(true, &[]);
        ctx.member = Some(guild_member(Permissions::SEND_MESSAGES, Permissions::SEND_MESSAGES));

        let member = evaluate(&spec(|s| s.member_permissions = Permissions::KICK_MEMBERS), &ctx, &state).await.unwrap();
        assert_eq!(member, GateOutcome::Rejected(Replies::missing_member_permissions(&["Kick Members"])));

        let bot = evaluate(&spec(|s| s.bot_permissions = Permissions::KICK_MEMBERS), &ctx, &state).await.unwrap();
        assert_eq!(bot, GateOutcome::Rejected(Replies::missing_bot_permissions(&["Kick Members"])));
    }

    #[tokio::test]
    async fn administrators_hold_every_permission() {
        let state = state().await;
        let mut ctx = context(true, &[]);
        ctx.member = Some(guild_member(Permissions::ADMINISTRATOR, Permissions::all()));
        let outcome = evaluate(&spec(|s| s.member_permissions = Permissions::BAN_MEMBERS), &ctx, &state).await.unwrap();
        assert_eq!(outcome, GateOutcome::Approved);
    }

    #[tokio::test]
    async fn permissions_are_not_checked_in_dms() {
        let state = state().await;
        let ctx = context(false, &[]);
        let outcome = evaluate(&spec(|s| s.member_permissions = Permissions::BAN_MEMBERS), &ctx, &state).await.unwrap();
        assert_eq!(outcome, GateOutcome::Approved);
    }

    #[tokio::test]
    async fn cooldown_rejects_inside_the_window_only() {
        let state = state().await;
        tokio::time::pause();
        let ctx = context(true, &[]);
        let spec = spec(|s| s.cooldown = Duration::from_secs(10));

        assert_eq!(evaluate(&spec, &ctx, &state).await.unwrap(), GateOutcome::Approved);
        state.cooldowns.start(&spec.key, ctx.author.id, spec.cooldown);
        assert!(matches!(evaluate(&spec, &ctx, &state).await.unwrap(), GateOutcome::Rejected(_)));

        let mut other = ctx.clone();
        other.author.id = UserId::new(777);
        assert_eq!(evaluate(&spec, &other, &state).await.unwrap(), GateOutcome::Approved);

        tokio::time::advance(Duration::from_secs(10)).await;
        assert_eq!(evaluate(&spec, &ctx, &state).await.unwrap(), GateOutcome::Approved);
    }

    #[tokio::test]
    async fn precondition_runs_last_and_maps_its_result() {
        let state = state().await;
        let ctx = context(true, &["x"]);

        let reject = spec(|s| s.precondition = Some(precondition(|_, _| async { Ok(Check::Reject("nope".into())) })));
        assert_eq!(evaluate(&reject, &ctx, &state).await.unwrap(), GateOutcome::Rejected("nope".into()));

        let silent = spec(|s| s.precondition = Some(precondition(|_, _| async { Ok(Check::Silent) })));
        assert_eq!(evaluate(&silent, &ctx, &state).await.unwrap(), GateOutcome::Silent);

        // An earlier failure means the precondition never runs.
        let guarded = spec(|s| {
            s.required_args = 2;
            s.precondition = Some(precondition(|_, _| async {
                if true {
                    panic!("precondition must not run");
                }
                Ok(Check::Pass)
            }));
        });
        assert!(matches!(evaluate(&guarded, &ctx, &state).await.unwrap(), GateOutcome::Rejected(_)));
    }

    #[tokio::test]
    async fn custom_order_changes_which_rejection_wins() {
        let state = state().await;
        let ctx = context(false, &[]);
        let spec = spec(|s| {
            s.required_args = 1;
            s.guild_only = true;
            s.gate_order = vec![GateCheck::ArgCount, GateCheck::GuildOnly];
        });
        assert_eq!(evaluate(&spec, &ctx, &state).await.unwrap(), GateOutcome::Rejected(Replies::usage("!warn <user> [reason]")));
    }
}
