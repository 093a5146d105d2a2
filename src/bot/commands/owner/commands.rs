use std::sync::Arc;

use crate::bot::{commands::{commands::BotResult, loader::LoadError}, dispatcher::context::InvocationContext, render::{Card, Renderable}, replies::Replies, runtime::command_lifecycle::{reload_all, reload_category, ReloadSummary}, state::def::{AppState, BotError}};

/// `reload [category]`: re-reads command manifests from disk.
pub async fn reload(ctx: InvocationContext, state: Arc<AppState>) -> BotResult<()> {
    let result = match ctx.arg(0) {
        Some(category) => reload_category(state.clone(), category).await,
        None => reload_all(state.clone()).await,
    };

    let summary = match result {
        Ok(summary) => summary,
        Err(BotError::Load(LoadError::UnknownCategory(name))) => return Err(BotError::Chat(Replies::unknown_category(&name))),
        Err(BotError::Registry(e)) => return Err(BotError::Chat(Replies::reload_rejected(&e.to_string()))),
        Err(e) => return Err(e),
    };

    ctx.send(&state, &summary).await?;
    Ok(())
}

impl Renderable for ReloadSummary {
    fn to_card(&self) -> Card {
        let loaded: Vec<String> = self.categories.iter().map(|(name, count)| format!("`{name}`: {count} commands")).collect();
        let mut card = Card::new().title("♻️ Commands reloaded").description(if loaded.is_empty() {
            "Nothing was loaded.".to_string()
        } else {
            loaded.join("\n")
        });

        if !self.failures.is_empty() {
            card = card.field(format!("Skipped ({})", self.failures.len()), self.failures.join("\n"), false);
        }
        card
    }
}
