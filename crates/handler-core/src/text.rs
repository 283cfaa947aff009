//! Text normalization and directedness classification.

use crate::message::{BotIdentity, MessageEvent};

fn is_address_separator(c: char) -> bool {
    c.is_whitespace() || c == ':'
}

/// Lower-cases `raw`, trims it and removes any leading mention or alias
/// tokens together with the separators that follow them.
///
/// Never fails, and `normalize(normalize(x)) == normalize(x)`.
pub fn normalize(raw: &str, identity: &BotIdentity) -> String {
    strip_address(&raw.to_lowercase(), identity)
}

/// Like [`normalize`] but keeps the original casing.
pub fn strip_address(text: &str, identity: &BotIdentity) -> String {
    let mut rest = text.trim();
    while let Some(after) = identity
        .tokens()
        .find_map(|token| strip_prefix_ignore_case(rest, token))
    {
        rest = after.trim_matches(is_address_separator);
    }
    rest.to_owned()
}

/// True when the message addresses the bot by mention or alias, or arrives
/// on a direct-message channel.
pub fn is_directed(event: &MessageEvent, identity: &BotIdentity) -> bool {
    let lowered = event.text.trim().to_lowercase();
    identity.tokens().any(|token| lowered.starts_with(token)) || event.is_direct_channel()
}

pub(crate) fn strip_prefix_ignore_case<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    let head = text.get(..prefix.len())?;
    if head.eq_ignore_ascii_case(prefix) {
        text.get(prefix.len()..)
    } else {
        None
    }
}
