use std::sync::OnceLock;

use anyhow::Result;
use async_trait::async_trait;
use regex::Regex;
use url::form_urlencoded;

use handler_core::{Handler, Message, Responder};

const MAX_TERM_CHARS: usize = 100;

static EMOJI_REGEX: OnceLock<Regex> = OnceLock::new();
static CHAT_LINK_REGEX: OnceLock<Regex> = OnceLock::new();

fn get_emoji_regex() -> &'static Regex {
    EMOJI_REGEX.get_or_init(|| Regex::new(r":[[:alnum:]_+\-]+:").unwrap())
}

/// User and channel references such as `<@U123>` or `<#C42|general>`.
fn get_chat_link_regex() -> &'static Regex {
    CHAT_LINK_REGEX.get_or_init(|| Regex::new(r"(?i)<(?:@u|#c)[0-9a-z]+(?:\|[^>]*)?>").unwrap())
}

/// Points people asking for "library for X" at package search engines.
#[derive(Debug, Clone)]
pub struct SearchForLibrary {
    prefixes: Vec<String>,
}

impl SearchForLibrary {
    pub fn new<I, S>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            prefixes: prefixes.into_iter().map(Into::into).collect(),
        }
    }

    fn search_term(&self, msg: &Message) -> Option<String> {
        let prefix = self
            .prefixes
            .iter()
            .find(|p| msg.text().starts_with(p.as_str()))?;
        let rest = msg.body_after_prefix(prefix)?;
        clean_term(rest)
    }
}

impl Default for SearchForLibrary {
    fn default() -> Self {
        Self::new(["library for", "library in go for", "go library for"])
    }
}

/// Strips chat markup and emoji, trims `?;., ` and rejects empty or
/// overlong terms.
pub fn clean_term(raw: &str) -> Option<String> {
    let without_links = get_chat_link_regex().replace_all(raw, "");
    let without_emoji = get_emoji_regex().replace_all(&without_links, "");
    let term = without_emoji.trim_matches(|c: char| matches!(c, '?' | ';' | '.' | ',' | ' '));
    let len = term.chars().count();
    if len == 0 || len > MAX_TERM_CHARS {
        return None;
    }
    Some(term.to_owned())
}

pub fn search_reply(term: &str) -> String {
    let escaped: String = form_urlencoded::byte_serialize(term.as_bytes()).collect();
    format!(
        "You can try to look here: <https://godoc.org/?q={escaped}> or here <http://go-search.org/search?q={escaped}>"
    )
}

#[async_trait]
impl Handler for SearchForLibrary {
    fn id(&self) -> &'static str {
        "library-search"
    }

    async fn handle(&self, msg: &Message, responder: &dyn Responder) -> Result<()> {
        let Some(term) = self.search_term(msg) else {
            return Ok(());
        };
        responder.respond(&search_reply(&term)).await
    }
}
