use std::time::Duration;

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

use crate::bot::{commands::commands::BotResult, render::{Card, Renderable}, state::def::BotError};

const DEFINE_URL: &str = "https://api.urbandictionary.com/v0/define";
const URBAN_COLOR: u32 = 0x0013_4FE6;

static HTTP: Lazy<reqwest::Client> = Lazy::new(|| {
    reqwest::Client::builder()
        .user_agent(concat!("kumabot/", env!("CARGO_PKG_VERSION")))
        .timeout(Duration::from_secs(10))
        .build()
        .unwrap_or_default()
});

lazy_static::lazy_static! {
    /// `[word]` marks a cross reference on the site.
    static ref CROSS_REFERENCE: Regex = Regex::new(r"\[([^\[\]]+)\]").unwrap();
}

#[derive(Debug, Deserialize)]
struct DefineResponse {
    #[serde(default)]
    list: Vec<Definition>,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Definition {
    pub word: String,
    pub definition: String,
    #[serde(default)]
    pub example: String,
    #[serde(default)]
    pub author: String,
    pub permalink: String,
    #[serde(default)]
    pub thumbs_up: u32,
    #[serde(default)]
    pub thumbs_down: u32,
    pub written_on: Option<String>,
}

/// Definitions for `term`, best voted first.
pub async fn define(term: &str) -> BotResult<Vec<Definition>> {
    let res = HTTP.get(DEFINE_URL).query(&[("term", term)]).send().await?;

    if !res.status().is_success() {
        return Err(BotError::Custom(format!("Urban Dictionary answered {}", res.status())));
    }

    parse_definitions(&res.text().await?)
}

pub fn parse_definitions(body: &str) -> BotResult<Vec<Definition>> {
    let mut list = serde_json::from_str::<DefineResponse>(body)?.list;
    list.sort_by(|a, b| b.thumbs_up.cmp(&a.thumbs_up));
    Ok(list)
}

impl Definition {
    pub fn written_date(&self) -> Option<String> {
        let raw = self.written_on.as_deref()?;
        let written = DateTime::parse_from_rfc3339(raw).ok()?;
        Some(written.with_timezone(&Utc).format("%Y-%m-%d").to_string())
    }
}

fn clean(text: &str) -> String {
    CROSS_REFERENCE.replace_all(text.trim(), "$1").replace("\r\n", "\n")
}

impl Renderable for Definition {
    fn to_card(&self) -> Card {
        let mut card = Card::new()
            .title(self.word.clone())
            .url(self.permalink.clone())
            .description(clean(&self.definition))
            .color(URBAN_COLOR);

        if !self.example.trim().is_empty() {
            card = card.field("Example", format!("*{}*", clean(&self.example)), false);
        }
        card = card
            .field("Votes", format!("👍 {}  👎 {}", self.thumbs_up, self.thumbs_down), true)
            .field("Author", if self.author.is_empty() { "anonymous".to_string() } else { self.author.clone() }, true);
        if let Some(date) = self.written_date() {
            card = card.field("Written", date, true);
        }
        card
    }
}
