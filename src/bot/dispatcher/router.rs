use crate::bot::{commands::commands::{CommandDefinition, CommandSpec, SubcommandDefinition}, dispatcher::context::InvocationContext};

/// What an invocation ends up running.
#[derive(Debug, Clone, Copy)]
pub enum Target<'a> {
    Command(&'a CommandDefinition),
    Subcommand(&'a SubcommandDefinition),
}

impl<'a> Target<'a> {
    pub fn spec(&self) -> &'a CommandSpec {
        match self {
            Target::Command(command) => &command.spec,
            Target::Subcommand(sub) => &sub.spec,
        }
    }
}

/// If the first argument names a subcommand it is consumed and the
/// subcommand becomes the target; otherwise the arguments are left alone.
/// A subcommand name always beats reading the token as an argument.
pub fn route<'a>(command: &'a CommandDefinition, ctx: &mut InvocationContext) -> Target<'a> {
    let Some(sub) = ctx.args.first().and_then(|first| command.subcommand_named(first)) else {
        return Target::Command(command);
    };

    ctx.args.remove(0);
    ctx.subcommand = Some(sub.name.clone());
    Target::Subcommand(sub)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bot::{commands::commands::SubcommandDefinition, testing::context};

    fn command() -> CommandDefinition {
        CommandDefinition::new("prefix", "settings")
            .subcommand(SubcommandDefinition::new("prefix", "add"))
            .subcommand(SubcommandDefinition::new("prefix", "view"))
    }

    #[test]
    fn first_token_naming_a_subcommand_routes() {
        let command = command();
        let mut ctx = context(true, &["VIEW", "extra"]);
        ctx.command = "prefix".into();
        let target = route(&command, &mut ctx);

        assert!(matches!(target, Target::Subcommand(sub) if sub.name == "view"));
        assert_eq!(target.spec().key, "prefix view");
        assert_eq!(ctx.args, ["extra"]);
        assert_eq!(ctx.subcommand.as_deref(), Some("view"));
        assert_eq!(ctx.qualified_name(), "prefix view");
        assert!(format!("{target:?}").contains("key: \"prefix view\""));
    }

    #[test]
    fn anything_else_stays_with_the_parent() {
        let command = command();
        let mut ctx = context(true, &["remove", "view"]);
        assert!(matches!(route(&command, &mut ctx), Target::Command(_)));
        assert_eq!(ctx.args, ["remove", "view"]);

        let mut empty = context(true, &[]);
        assert!(matches!(route(&command, &mut empty), Target::Command(_)));
    }
}
