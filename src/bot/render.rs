use std::fmt::Write as _;

/// Discord rejects plain messages longer than this.
pub const MAX_MESSAGE_LEN: usize = 2000;
pub const MAX_DESCRIPTION_LEN: usize = 4096;
pub const MAX_FIELD_LEN: usize = 1024;

pub const DEFAULT_COLOR: u32 = 0x00FF_B6C1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutgoingMessage {
    Text(String),
    Card(Card),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Card {
    pub title: Option<String>,
    pub url: Option<String>,
    pub description: Option<String>,
    pub fields: Vec<CardField>,
    pub color: Option<u32>,
    pub thumbnail: Option<String>,
    pub footer: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

impl Card {
    pub fn new() -> Self {
        Self { color: Some(DEFAULT_COLOR), ..Self::default() }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(truncate(&description.into(), MAX_DESCRIPTION_LEN));
        self
    }

    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>, inline: bool) -> Self {
        self.fields.push(CardField {
            name: name.into(),
            value: truncate(&value.into(), MAX_FIELD_LEN),
            inline,
        });
        self
    }

    pub fn color(mut self, color: u32) -> Self {
        self.color = Some(color);
        self
    }

    pub fn thumbnail(mut self, url: impl Into<String>) -> Self {
        self.thumbnail = Some(url.into());
        self
    }

    pub fn footer(mut self, footer: impl Into<String>) -> Self {
        self.footer = Some(footer.into());
        self
    }

    /// Text fallback for channels where the bot cannot embed.
    pub fn to_plain_text(&self) -> String {
        let mut out = String::new();
        if let Some(title) = &self.title {
            let _ = writeln!(out, "**{title}**");
        }
        if let Some(description) = &self.description {
            let _ = writeln!(out, "{description}");
        }
        for field in &self.fields {
            let _ = writeln!(out, "__{}__\n{}", field.name, field.value);
        }
        if let Some(url) = &self.url {
            let _ = writeln!(out, "<{url}>");
        }
        if let Some(footer) = &self.footer {
            let _ = writeln!(out, "*{footer}*");
        }
        truncate(out.trim_end(), MAX_MESSAGE_LEN)
    }
}

/// Something a handler can show either as a card or as plain text.
pub trait Renderable: Send + Sync {
    fn to_card(&self) -> Card;

    fn to_plain_text(&self) -> String {
        self.to_card().to_plain_text()
    }
}

impl Renderable for Card {
    fn to_card(&self) -> Card {
        self.clone()
    }
}

impl Renderable for String {
    fn to_card(&self) -> Card {
        Card::new().description(self.clone())
    }

    fn to_plain_text(&self) -> String {
        truncate(self, MAX_MESSAGE_LEN)
    }
}

pub fn render(item: &dyn Renderable, can_embed: bool) -> OutgoingMessage {
    if can_embed {
        OutgoingMessage::Card(item.to_card())
    } else {
        OutgoingMessage::Text(item.to_plain_text())
    }
}

/// Cuts at a char boundary and marks the cut with an ellipsis.
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max.saturating_sub(1)).collect();
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_fallback_keeps_every_part() {
        let card = Card::new()
            .title("Title")
            .description("Body")
            .field("Aliases", "a, b", true)
            .footer("Page 1/2");

        let text = card.to_plain_text();
        assert!(text.starts_with("**Title**"));
        assert!(text.contains("Body"));
        assert!(text.contains("__Aliases__\na, b"));
        assert!(text.ends_with("*Page 1/2*"));
    }

    #[test]
    fn render_follows_the_embed_capability() {
        let reply = "hi".to_string();
        assert_eq!(render(&reply, false), OutgoingMessage::Text("hi".into()));
        assert!(matches!(render(&reply, true), OutgoingMessage::Card(_)));
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("héllo", 3), "hé…");
        assert_eq!(truncate("ok", 3), "ok");
    }
}
