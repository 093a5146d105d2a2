use std::collections::HashMap;

use regex::Regex;

use crate::bot::db::UserId;

lazy_static::lazy_static! {
    static ref FLAG_TOKEN: Regex = Regex::new(r"^--([A-Za-z]{2,})(?:=(.*))?$").unwrap();
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlagValue {
    Switch,
    Value(String),
}

pub type Flags = HashMap<String, FlagValue>;

/// A message split into command name, positional arguments and flags.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Tokens {
    /// `None` when the message was only a prefix.
    pub command: Option<String>,
    pub args: Vec<String>,
    pub flags: Flags,
}

/// Picks the prefix a message was written with. The bot mention always
/// counts; otherwise `prefixes` are tried in order.
pub fn resolve_prefix(content: &str, prefixes: &[String], bot_id: Option<UserId>) -> Option<String> {
    if let Some(id) = bot_id {
        for mention in [format!("<@{id}>"), format!("<@!{id}>")] {
            if content.starts_with(&mention) {
                return Some(mention);
            }
        }
    }

    prefixes
        .iter()
        .find(|prefix| !prefix.is_empty() && strip_prefix(content, prefix).is_some())
        .cloned()
}

/// Letters in a prefix match either case, so `K!` works for `k!`.
pub fn strip_prefix<'a>(content: &'a str, prefix: &str) -> Option<&'a str> {
    let head = content.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix).then(|| &content[prefix.len()..])
}

/// Strips `prefix` and splits the rest. Returns `None` if `content` does not
/// start with `prefix`.
pub fn tokenize(content: &str, prefix: &str) -> Option<Tokens> {
    let rest = strip_prefix(content, prefix)?;
    let mut words = rest.split_whitespace();

    let Some(command) = words.next() else {
        return Some(Tokens::default());
    };

    let (args, flags) = split_flags(words);
    Some(Tokens { command: Some(command.to_lowercase()), args, flags })
}

/// Moves every `--name` / `--name=value` token into the flag map, keeping the
/// order of what is left.
pub fn split_flags<'a>(words: impl IntoIterator<Item = &'a str>) -> (Vec<String>, Flags) {
    let mut args = Vec::new();
    let mut flags = Flags::new();

    for word in words {
        match FLAG_TOKEN.captures(word) {
            Some(caps) => {
                let name = caps[1].to_lowercase();
                let value = caps.get(2).map_or(FlagValue::Switch, |v| FlagValue::Value(v.as_str().to_string()));
                flags.insert(name, value);
            }
            None => args.push(word.to_string()),
        }
    }

    (args, flags)
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn flags(pairs: &[(&str, Option<&str>)]) -> Flags {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.map_or(FlagValue::Switch, |v| FlagValue::Value(v.to_string()))))
            .collect()
    }

    #[rstest]
    #[case("!foo --bar --baz=qux hello world")]
    #[case("!foo hello --bar world --baz=qux")]
    #[case("!foo hello world --baz=qux --bar")]
    #[case("!FOO   --BAR hello\t--baz=qux  world")]
    fn flags_come_out_wherever_they_are(#[case] input: &str) {
        let tokens = tokenize(input, "!").unwrap();
        assert_eq!(tokens.command.as_deref(), Some("foo"));
        assert_eq!(tokens.args, ["hello", "world"]);
        assert_eq!(tokens.flags, flags(&[("bar", None), ("baz", Some("qux"))]));
    }

    #[rstest]
    #[case("--x")]
    #[case("-bar")]
    #[case("--b4r")]
    #[case("--")]
    fn near_misses_stay_positional(#[case] word: &str) {
        let tokens = tokenize(&format!("!cmd {word}"), "!").unwrap();
        assert_eq!(tokens.args, [word]);
        assert!(tokens.flags.is_empty());
    }

    #[test]
    fn flag_values_keep_their_case_and_may_be_empty() {
        let tokens = tokenize("!cmd --Page=Two --note=", "!").unwrap();
        assert_eq!(tokens.flags, flags(&[("page", Some("Two")), ("note", Some(""))]));
    }

    #[rstest]
    #[case("!")]
    #[case("!   ")]
    fn bare_prefix_has_no_command(#[case] input: &str) {
        assert_eq!(tokenize(input, "!").unwrap(), Tokens::default());
    }

    #[test]
    fn wrong_prefix_is_not_a_command() {
        assert_eq!(tokenize("?ping", "!"), None);
        assert_eq!(tokenize("", "!"), None);
    }

    #[test]
    fn mention_prefix_is_recognised() {
        let bot = Some(UserId::new(42));
        let prefixes = vec!["!".to_string()];

        let prefix = resolve_prefix("<@!42> ping now", &prefixes, bot).unwrap();
        assert_eq!(prefix, "<@!42>");
        let tokens = tokenize("<@!42> ping now", &prefix).unwrap();
        assert_eq!(tokens.command.as_deref(), Some("ping"));
        assert_eq!(tokens.args, ["now"]);

        assert_eq!(resolve_prefix("<@42>ping", &prefixes, bot).as_deref(), Some("<@42>"));
        assert_eq!(resolve_prefix("<@43> ping", &prefixes, bot), None);
    }

    #[test]
    fn configured_prefixes_are_tried_in_order_and_ignore_case() {
        let prefixes = vec!["k!".to_string(), "k".to_string()];
        assert_eq!(resolve_prefix("K!help", &prefixes, None).as_deref(), Some("k!"));
        assert_eq!(resolve_prefix("khelp", &prefixes, None).as_deref(), Some("k"));
        assert_eq!(resolve_prefix("help", &prefixes, None), None);
    }

    #[test]
    fn multibyte_content_does_not_panic() {
        assert_eq!(resolve_prefix("é", &["!!".to_string()], None), None);
        assert_eq!(tokenize("ü", "!"), None);
    }
}
