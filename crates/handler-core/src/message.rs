use serde::Deserialize;

use crate::text;

/// The bot's own identity on the workspace, used to recognise messages
/// addressed to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotIdentity {
    id: String,
    alias: String,
    mention: String,
}

impl BotIdentity {
    pub fn new(id: impl Into<String>, alias: impl Into<String>) -> Self {
        let id = id.into();
        let mention = format!("<@{id}>").to_lowercase();
        Self {
            id,
            alias: alias.into().trim().to_lowercase(),
            mention,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Lower-cased alias token, e.g. `gopher`.
    pub fn alias(&self) -> &str {
        &self.alias
    }

    /// Lower-cased mention token, e.g. `<@u1xk0cwsz>`.
    pub fn mention_token(&self) -> &str {
        &self.mention
    }

    pub(crate) fn tokens(&self) -> impl Iterator<Item = &str> {
        [self.mention.as_str(), self.alias.as_str()]
            .into_iter()
            .filter(|t| !t.is_empty())
    }
}

/// A file attached to a message, as announced in the event payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SharedFile {
    pub id: String,
    #[serde(default)]
    pub filetype: String,
    #[serde(default)]
    pub name: String,
}

/// Inbound message event, in the shape the chat platform delivers it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct MessageEvent {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub channel: String,
    #[serde(default)]
    pub user: String,
    #[serde(default, rename = "ts")]
    pub timestamp: String,
    #[serde(default, rename = "thread_ts")]
    pub thread_timestamp: Option<String>,
    #[serde(default)]
    pub bot_id: Option<String>,
    #[serde(default)]
    pub subtype: Option<String>,
    #[serde(default)]
    pub files: Vec<SharedFile>,
    #[serde(default)]
    pub upload: bool,
}

impl MessageEvent {
    /// True when the event was produced by a bot (including this one) or has
    /// no human author.
    pub fn is_bot_originated(&self) -> bool {
        self.bot_id.as_deref().is_some_and(|id| !id.is_empty())
            || self.user.is_empty()
            || self.subtype.as_deref() == Some("bot_message")
    }

    /// Direct-message channel ids start with `D`.
    pub fn is_direct_channel(&self) -> bool {
        self.channel.starts_with('D')
    }
}

/// Member-joined-team event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct JoinEvent {
    pub user_id: String,
    #[serde(default)]
    pub user_name: String,
}

/// One inbound message, classified. Built once per event and read-only
/// afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    event: MessageEvent,
    text: String,
    body: String,
    directed: bool,
}

impl Message {
    pub fn new(event: MessageEvent, identity: &BotIdentity) -> Self {
        let text = text::normalize(&event.text, identity);
        let body = text::strip_address(event.text.trim(), identity);
        let directed = text::is_directed(&event, identity);
        Self {
            event,
            text,
            body,
            directed,
        }
    }

    pub const fn event(&self) -> &MessageEvent {
        &self.event
    }

    /// Raw text as received.
    pub fn raw(&self) -> &str {
        &self.event.text
    }

    /// Lower-cased text with the leading address removed.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Text with the leading address removed, original casing kept.
    pub fn body(&self) -> &str {
        &self.body
    }

    pub const fn is_directed(&self) -> bool {
        self.directed
    }

    pub fn channel(&self) -> &str {
        &self.event.channel
    }

    pub fn user(&self) -> &str {
        &self.event.user
    }

    /// The part of [`Self::body`] following `prefix`, matched
    /// case-insensitively. Falls back to the normalized text when the two
    /// disagree on byte offsets.
    pub fn body_after_prefix(&self, prefix: &str) -> Option<&str> {
        text::strip_prefix_ignore_case(&self.body, prefix)
            .or_else(|| self.text.strip_prefix(prefix))
    }
}
