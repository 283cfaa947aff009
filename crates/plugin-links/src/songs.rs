use std::sync::OnceLock;

use anyhow::Result;
use async_trait::async_trait;
use regex::Regex;

use handler_core::{Handler, Message, Responder};

static NOLINK_REGEX: OnceLock<Regex> = OnceLock::new();
static SONG_LINK_REGEX: OnceLock<Regex> = OnceLock::new();

fn get_nolink_regex() -> &'static Regex {
    NOLINK_REGEX.get_or_init(|| Regex::new(r"(?i)(nolink|song\.link)").unwrap())
}

fn get_song_link_regex() -> &'static Regex {
    SONG_LINK_REGEX.get_or_init(|| {
        Regex::new(r"(?i)(?:https?://)?(open\.spotify\.com/|spotify:|soundcloud\.com/|tidal\.com/)[^>\s]+")
            .unwrap()
    })
}

/// Rewrites every music-service link in `text` to a song.link URL, one per
/// line, in order of appearance. `None` when there is nothing to rewrite or
/// the author opted out.
pub fn song_links(text: &str) -> Option<String> {
    if get_nolink_regex().is_match(text) {
        return None;
    }
    let links: Vec<String> = get_song_link_regex()
        .find_iter(text)
        .map(|m| format!("<https://song.link/{}>", m.as_str()))
        .collect();
    if links.is_empty() {
        None
    } else {
        Some(links.join("\n"))
    }
}

/// Replies in thread with cross-platform links for shared songs.
#[derive(Debug, Clone, Copy, Default)]
pub struct Songs;

#[async_trait]
impl Handler for Songs {
    fn id(&self) -> &'static str {
        "songs"
    }

    async fn handle(&self, msg: &Message, responder: &dyn Responder) -> Result<()> {
        let Some(reply) = song_links(msg.raw()) else {
            return Ok(());
        };
        responder.respond_in_thread(&reply).await
    }
}
