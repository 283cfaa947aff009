//! Test doubles shared by the handler crates.

use std::sync::{Mutex, PoisonError};

use anyhow::{Result, bail};
use async_trait::async_trait;

use crate::{BotIdentity, JoinResponder, Message, MessageEvent, Notifier, Responder};

/// One recorded responder call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Respond(String),
    Unfurled(String),
    Thread(String),
    Attachment { text: String, attachment: String },
    Private(String),
    PrivateAttachment { text: String, attachment: String },
    React(String),
}

/// Records every call. A failing recorder records nothing and errors.
#[derive(Debug, Default)]
pub struct RecordingResponder {
    actions: Mutex<Vec<Action>>,
    fail: bool,
}

impl RecordingResponder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            actions: Mutex::default(),
            fail: true,
        }
    }

    pub fn actions(&self) -> Vec<Action> {
        self.actions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn record(&self, action: Action) -> Result<()> {
        if self.fail {
            bail!("responder unavailable");
        }
        self.actions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(action);
        Ok(())
    }
}

#[async_trait]
impl Responder for RecordingResponder {
    async fn respond(&self, text: &str) -> Result<()> {
        self.record(Action::Respond(text.to_owned()))
    }

    async fn respond_unfurled(&self, text: &str) -> Result<()> {
        self.record(Action::Unfurled(text.to_owned()))
    }

    async fn respond_in_thread(&self, text: &str) -> Result<()> {
        self.record(Action::Thread(text.to_owned()))
    }

    async fn respond_with_attachment(&self, text: &str, attachment: &str) -> Result<()> {
        self.record(Action::Attachment {
            text: text.to_owned(),
            attachment: attachment.to_owned(),
        })
    }

    async fn respond_private(&self, text: &str) -> Result<()> {
        self.record(Action::Private(text.to_owned()))
    }

    async fn respond_private_with_attachment(&self, text: &str, attachment: &str) -> Result<()> {
        self.record(Action::PrivateAttachment {
            text: text.to_owned(),
            attachment: attachment.to_owned(),
        })
    }

    async fn react(&self, reaction: &str) -> Result<()> {
        self.record(Action::React(reaction.to_owned()))
    }
}

#[async_trait]
impl JoinResponder for RecordingResponder {
    async fn respond_private(&self, text: &str) -> Result<()> {
        self.record(Action::Private(text.to_owned()))
    }
}

/// Records notifications and answers with a fixed delivery result.
#[derive(Debug)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<String>>,
    delivered: bool,
}

impl RecordingNotifier {
    pub const fn new(delivered: bool) -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            delivered,
        }
    }

    pub fn sent(&self) -> Vec<String> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, text: &str) -> bool {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(text.to_owned());
        self.delivered
    }
}

pub fn identity() -> BotIdentity {
    BotIdentity::new("U1XK0CWSZ", "gopher")
}

pub fn event(text: &str, channel: &str) -> MessageEvent {
    MessageEvent {
        text: text.to_owned(),
        channel: channel.to_owned(),
        user: "U0TESTER".to_owned(),
        timestamp: "1500000000.000100".to_owned(),
        ..MessageEvent::default()
    }
}

/// A message posted to a public channel.
pub fn message(text: &str) -> Message {
    Message::new(event(text, "C0GENERAL"), &identity())
}

/// A message posted to a direct-message channel.
pub fn direct_message(text: &str) -> Message {
    Message::new(event(text, "D0DIRECT"), &identity())
}
