use crate::{bot::commands::commands::HandlerTable, register};

pub mod commands;

pub fn register(table: &mut HandlerTable) {
    register!(table, "owner.reload" => commands::reload);
}
