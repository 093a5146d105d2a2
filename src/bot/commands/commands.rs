use std::{collections::{BTreeMap, HashMap}, future::Future, sync::Arc, time::Duration};

use futures::future::BoxFuture;
use serde::Deserialize;
use serenity::all::Permissions;

use crate::bot::{dispatcher::context::InvocationContext, state::def::{AppState, BotError}};

pub type BotResult<T> = Result<T, BotError>;

pub type CommandHandler = Arc<dyn Fn(InvocationContext, Arc<AppState>) -> BoxFuture<'static, BotResult<()>> + Send + Sync>;

pub type Precondition = Arc<dyn Fn(InvocationContext, Arc<AppState>) -> BoxFuture<'static, BotResult<Check>> + Send + Sync>;

/// Compiled handlers, looked up by the key a manifest names.
pub type HandlerTable = HashMap<String, CommandHandler>;
pub type PreconditionTable = HashMap<String, Precondition>;

/// Result of a custom precondition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Check {
    Pass,
    Reject(String),
    /// Reject without a reply; the precondition did its own messaging.
    Silent,
}

pub fn handler<F, Fut>(f: F) -> CommandHandler
where
    F: Fn(InvocationContext, Arc<AppState>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = BotResult<()>> + Send + 'static,
{
    Arc::new(move |ctx: InvocationContext, state: Arc<AppState>| -> BoxFuture<'static, BotResult<()>> { Box::pin(f(ctx, state)) })
}

pub fn precondition<F, Fut>(f: F) -> Precondition
where
    F: Fn(InvocationContext, Arc<AppState>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = BotResult<Check>> + Send + 'static,
{
    Arc::new(move |ctx: InvocationContext, state: Arc<AppState>| -> BoxFuture<'static, BotResult<Check>> { Box::pin(f(ctx, state)) })
}

/// One step of the gate. The order a command evaluates them in is part of its
/// definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateCheck {
    Enabled,
    Protected,
    GuildOnly,
    ArgCount,
    MemberPermissions,
    BotPermissions,
    Cooldown,
    Precondition,
}

pub const DEFAULT_GATE_ORDER: [GateCheck; 8] = [
    GateCheck::Enabled,
    GateCheck::Protected,
    GateCheck::GuildOnly,
    GateCheck::ArgCount,
    GateCheck::MemberPermissions,
    GateCheck::BotPermissions,
    GateCheck::Cooldown,
    GateCheck::Precondition,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlagKind {
    Text,
    Number,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FlagSpec {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub kind: Option<FlagKind>,
}

/// The part shared by commands and subcommands: requirements plus behaviour.
#[derive(Clone)]
pub struct CommandSpec {
    /// Cooldown and log key. `parent sub` for subcommands.
    pub key: String,
    pub description: String,
    pub usage: String,
    pub required_args: usize,
    pub enabled: bool,
    pub guild_only: bool,
    pub protected: bool,
    pub member_permissions: Permissions,
    pub bot_permissions: Permissions,
    pub precondition: Option<Precondition>,
    pub cooldown: Duration,
    pub flags: Vec<FlagSpec>,
    pub gate_order: Vec<GateCheck>,
    /// `None` for commands that only group subcommands.
    pub handler: Option<CommandHandler>,
}

impl CommandSpec {
    pub fn new(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            usage: key.clone(),
            key,
            description: String::new(),
            required_args: 0,
            enabled: true,
            guild_only: false,
            protected: false,
            member_permissions: Permissions::empty(),
            bot_permissions: Permissions::empty(),
            precondition: None,
            cooldown: Duration::ZERO,
            flags: Vec::new(),
            gate_order: DEFAULT_GATE_ORDER.to_vec(),
            handler: None,
        }
    }
}

#[derive(Clone)]
pub struct CommandDefinition {
    pub name: String,
    pub aliases: Vec<String>,
    pub category: String,
    pub spec: CommandSpec,
    pub subcommands: BTreeMap<String, SubcommandDefinition>,
}

#[derive(Clone)]
pub struct SubcommandDefinition {
    pub name: String,
    pub parent: String,
    pub spec: CommandSpec,
}

impl CommandDefinition {
    pub fn new(name: impl Into<String>, category: impl Into<String>) -> Self {
        let name = name.into().to_lowercase();
        Self {
            spec: CommandSpec::new(name.clone()),
            name,
            aliases: Vec::new(),
            category: category.into().to_lowercase(),
            subcommands: BTreeMap::new(),
        }
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into().to_lowercase());
        self
    }

    pub fn handler(mut self, handler: CommandHandler) -> Self {
        self.spec.handler = Some(handler);
        self
    }

    pub fn configure(mut self, f: impl FnOnce(&mut CommandSpec)) -> Self {
        f(&mut self.spec);
        self
    }

    pub fn subcommand(mut self, sub: SubcommandDefinition) -> Self {
        self.attach(sub);
        self
    }

    /// Attaches a subcommand, fixing up its parent and key.
    pub fn attach(&mut self, mut sub: SubcommandDefinition) {
        sub.parent = self.name.clone();
        sub.spec.key = format!("{} {}", self.name, sub.name);
        self.subcommands.insert(sub.name.clone(), sub);
    }

    pub fn subcommand_named(&self, token: &str) -> Option<&SubcommandDefinition> {
        self.subcommands.get(&token.to_lowercase())
    }

    /// The name and every alias, each of which resolves to this command.
    pub fn lookup_keys(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.name.as_str()).chain(self.aliases.iter().map(String::as_str))
    }
}

impl SubcommandDefinition {
    pub fn new(parent: impl Into<String>, name: impl Into<String>) -> Self {
        let parent = parent.into().to_lowercase();
        let name = name.into().to_lowercase();
        Self { spec: CommandSpec::new(format!("{parent} {name}")), parent, name }
    }

    pub fn handler(mut self, handler: CommandHandler) -> Self {
        self.spec.handler = Some(handler);
        self
    }

    pub fn configure(mut self, f: impl FnOnce(&mut CommandSpec)) -> Self {
        f(&mut self.spec);
        self
    }
}

impl std::fmt::Debug for CommandDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandDefinition")
            .field("name", &self.name)
            .field("aliases", &self.aliases)
            .field("category", &self.category)
            .field("subcommands", &self.subcommands.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl std::fmt::Debug for SubcommandDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubcommandDefinition")
            .field("name", &self.name)
            .field("parent", &self.parent)
            .field("key", &self.spec.key)
            .finish()
    }
}

/// Registers a handler under `category.name` in a table.
#[macro_export]
macro_rules! register {
    ($table:expr, $key:expr => $func:expr) => {
        $table.insert($key.to_string(), $crate::bot::commands::commands::handler($func));
    };
}
