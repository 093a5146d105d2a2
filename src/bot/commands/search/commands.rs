use std::sync::Arc;

use crate::{api::urban::{self, Definition}, bot::{commands::commands::BotResult, dispatcher::context::InvocationContext, pagination::paginator::send_paginated, render::{Card, Renderable}, replies::Replies, state::def::{AppState, BotError}}};

pub const MAX_DEFINITIONS: usize = 10;

/// `define <term>`: Urban Dictionary, one definition per page.
pub async fn define(ctx: InvocationContext, state: Arc<AppState>) -> BotResult<()> {
    let term = ctx.rest(0);
    let definitions = urban::define(&term).await?;

    let pages = definition_pages(&definitions, ctx.has_flag("first"));
    if pages.is_empty() {
        return Err(BotError::Chat(Replies::no_definitions(&term)));
    }
    send_paginated(&state, &ctx, pages).await?;
    Ok(())
}

pub fn definition_pages(definitions: &[Definition], first_only: bool) -> Vec<Card> {
    let limit = if first_only { 1 } else { MAX_DEFINITIONS };
    definitions.iter().take(limit).map(Renderable::to_card).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn definition(word: &str) -> Definition {
        Definition {
            word: word.to_string(),
            definition: format!("about {word}"),
            example: String::new(),
            author: String::new(),
            permalink: format!("https://example.invalid/{word}"),
            thumbs_up: 0,
            thumbs_down: 0,
            written_on: None,
        }
    }

    #[test]
    fn pages_are_capped_and_first_flag_keeps_one() {
        let definitions: Vec<Definition> = (0..15).map(|i| definition(&format!("w{i}"))).collect();
        assert_eq!(definition_pages(&definitions, false).len(), MAX_DEFINITIONS);

        let first = definition_pages(&definitions, true);
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].title.as_deref(), Some("w0"));
        assert!(definition_pages(&[], false).is_empty());
    }
}
