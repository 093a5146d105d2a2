use crate::{bot::commands::commands::{precondition, HandlerTable, PreconditionTable}, register};

pub mod commands;

pub fn register(table: &mut HandlerTable) {
    register!(table, "settings.prefix.add" => commands::prefix_add);
    register!(table, "settings.prefix.remove" => commands::prefix_remove);
    register!(table, "settings.prefix.list" => commands::prefix_list);
    register!(table, "settings.modrole.add" => commands::modrole_add);
    register!(table, "settings.modrole.remove" => commands::modrole_remove);
    register!(table, "settings.modrole.list" => commands::modrole_list);
    register!(table, "settings.logchannel" => commands::logchannel_show);
    register!(table, "settings.logchannel.set" => commands::logchannel_set);
    register!(table, "settings.logchannel.clear" => commands::logchannel_clear);
}

pub fn register_preconditions(table: &mut PreconditionTable) {
    table.insert("moderator".to_string(), precondition(commands::moderator));
}
