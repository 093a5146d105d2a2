use crate::{bot::commands::commands::HandlerTable, register};

pub mod commands;

pub fn register(table: &mut HandlerTable) {
    register!(table, "general.ping" => commands::ping);
    register!(table, "general.help" => commands::help);
}
