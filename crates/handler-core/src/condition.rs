//! Match predicates used by the table-driven handlers.
//!
//! Each predicate reads a specific view of the message. Rules choose
//! deliberately: `exact` and `has_prefix` look at the normalized text,
//! `contains` at the raw text.

use crate::message::Message;

pub type Condition = fn(&Message, &[String]) -> bool;

/// Normalized text equals one of the candidates.
pub fn exact(msg: &Message, candidates: &[String]) -> bool {
    candidates.iter().any(|c| msg.text() == c)
}

/// Raw text contains one of the candidates.
pub fn contains(msg: &Message, candidates: &[String]) -> bool {
    candidates.iter().any(|c| msg.raw().contains(c.as_str()))
}

/// Normalized text contains one of the candidates.
pub fn contains_normalized(msg: &Message, candidates: &[String]) -> bool {
    candidates.iter().any(|c| msg.text().contains(c.as_str()))
}

/// Normalized text starts with one of the candidates.
pub fn has_prefix(msg: &Message, candidates: &[String]) -> bool {
    candidates.iter().any(|c| msg.text().starts_with(c.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{BotIdentity, MessageEvent};

    fn msg(text: &str) -> Message {
        let ev = MessageEvent {
            text: text.to_owned(),
            channel: "C1".to_owned(),
            user: "U1".to_owned(),
            ..MessageEvent::default()
        };
        Message::new(ev, &BotIdentity::new("UBOT", "gopher"))
    }

    fn list(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_owned()).collect()
    }

    #[test]
    fn exact_is_whole_string() {
        let version = list(&["version"]);
        assert!(exact(&msg("gopher Version"), &version));
        assert!(!exact(&msg("version please"), &version));
        assert!(!exact(&msg("the version"), &version));
    }

    #[test]
    fn contains_reads_raw_text() {
        assert!(contains(&msg("I love bbq"), &list(&["bbq"])));
        assert!(!contains(&msg("I love BBQ"), &list(&["bbq"])));
        assert!(contains_normalized(&msg("I love BBQ"), &list(&["bbq"])));
    }

    #[test]
    fn prefix_reads_normalized_text() {
        let prefixes = list(&["xkcd:"]);
        assert!(has_prefix(&msg("<@UBOT> XKCD:927"), &prefixes));
        assert!(!has_prefix(&msg("see xkcd:927"), &prefixes));
        assert!(!has_prefix(&msg("anything"), &[]));
    }
}
