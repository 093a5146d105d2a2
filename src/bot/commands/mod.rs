use std::path::PathBuf;

use once_cell::sync::Lazy;

use crate::bot::commands::{commands::{HandlerTable, PreconditionTable}, loader::CommandLoader};

pub mod commands;
pub mod general;
pub mod loader;
pub mod owner;
pub mod registry;
pub mod search;
pub mod settings;

/// Every compiled handler, keyed `category.command[.sub]`.
pub static BUILTIN_HANDLERS: Lazy<HandlerTable> = Lazy::new(|| {
    let mut table = HandlerTable::new();
    general::register(&mut table);
    settings::register(&mut table);
    owner::register(&mut table);
    search::register(&mut table);
    table
});

pub static BUILTIN_PRECONDITIONS: Lazy<PreconditionTable> = Lazy::new(|| {
    let mut table = PreconditionTable::new();
    settings::register_preconditions(&mut table);
    table
});

pub fn builtin_loader(root: impl Into<PathBuf>) -> CommandLoader {
    CommandLoader::new(root, BUILTIN_HANDLERS.clone(), BUILTIN_PRECONDITIONS.clone())
}
