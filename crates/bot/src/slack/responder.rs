use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tracing::{info, warn};

use handler_core::{JoinResponder, MessageEvent, Notifier, Responder};
use plugin_playground::{FileFetcher, FileInfo};

use super::api::{PostMessage, SlackApi};

/// Answers one message event through the Web API.
#[derive(Debug, Clone)]
pub(crate) struct SlackResponder {
    api: Arc<SlackApi>,
    channel: String,
    user: String,
    timestamp: String,
    thread_timestamp: Option<String>,
}

impl SlackResponder {
    pub(crate) fn new(api: Arc<SlackApi>, event: &MessageEvent) -> Self {
        Self {
            api,
            channel: event.channel.clone(),
            user: event.user.clone(),
            timestamp: event.timestamp.clone(),
            thread_timestamp: event.thread_timestamp.clone(),
        }
    }

    fn reply<'a>(&'a self, text: &'a str) -> PostMessage<'a> {
        PostMessage::new(&self.channel, text).in_thread(self.thread_timestamp.as_deref())
    }
}

#[async_trait]
impl Responder for SlackResponder {
    async fn respond(&self, text: &str) -> Result<()> {
        self.api.post_message(&self.reply(text)).await
    }

    async fn respond_unfurled(&self, text: &str) -> Result<()> {
        self.api.post_message(&self.reply(text).unfurled(true)).await
    }

    async fn respond_in_thread(&self, text: &str) -> Result<()> {
        let thread = self
            .thread_timestamp
            .as_deref()
            .unwrap_or(&self.timestamp);
        self.api
            .post_message(&PostMessage::new(&self.channel, text).in_thread(Some(thread)))
            .await
    }

    async fn respond_with_attachment(&self, text: &str, attachment: &str) -> Result<()> {
        self.api
            .post_message(&self.reply(text).attachment(attachment))
            .await
    }

    async fn respond_private(&self, text: &str) -> Result<()> {
        self.api
            .post_message(&PostMessage::new(&self.user, text))
            .await
    }

    async fn respond_private_with_attachment(&self, text: &str, attachment: &str) -> Result<()> {
        self.api
            .post_message(&PostMessage::new(&self.user, text).attachment(attachment))
            .await
    }

    async fn react(&self, reaction: &str) -> Result<()> {
        self.api
            .add_reaction(&self.channel, &self.timestamp, reaction)
            .await
    }
}

/// Direct messages a member who just joined.
#[derive(Debug, Clone)]
pub(crate) struct SlackJoinResponder {
    api: Arc<SlackApi>,
    user_id: String,
}

impl SlackJoinResponder {
    pub(crate) fn new(api: Arc<SlackApi>, user_id: &str) -> Self {
        Self {
            api,
            user_id: user_id.to_owned(),
        }
    }
}

#[async_trait]
impl JoinResponder for SlackJoinResponder {
    async fn respond_private(&self, text: &str) -> Result<()> {
        self.api
            .post_message(&PostMessage::new(&self.user_id, text))
            .await
    }
}

/// Posts notifications to a fixed channel.
#[derive(Debug, Clone)]
pub(crate) struct SlackNotifier {
    api: Arc<SlackApi>,
    channel: String,
}

impl SlackNotifier {
    pub(crate) fn new(api: Arc<SlackApi>, channel: &str) -> Self {
        Self {
            api,
            channel: channel.to_owned(),
        }
    }
}

#[async_trait]
impl Notifier for SlackNotifier {
    async fn notify(&self, text: &str) -> bool {
        match self
            .api
            .post_message(&PostMessage::new(&self.channel, text))
            .await
        {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, channel = %self.channel, "Notification failed");
                false
            }
        }
    }
}

/// Uploaded files, read with the bot token.
#[derive(Debug, Clone)]
pub(crate) struct SlackFiles {
    api: Arc<SlackApi>,
}

impl SlackFiles {
    pub(crate) const fn new(api: Arc<SlackApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl FileFetcher for SlackFiles {
    async fn file_info(&self, id: &str) -> Result<FileInfo> {
        self.api.file_info(id).await
    }

    async fn download(&self, info: &FileInfo) -> Result<Vec<u8>> {
        self.api.download(&info.download_url).await
    }
}

/// Logs what would have been sent. Used in dev mode.
#[derive(Debug, Clone, Default)]
pub(crate) struct DryRun {
    channel: String,
    user: String,
}

impl DryRun {
    pub(crate) fn new(channel: &str, user: &str) -> Self {
        Self {
            channel: channel.to_owned(),
            user: user.to_owned(),
        }
    }

    fn log(&self, action: &str, text: &str) {
        info!(action, channel = %self.channel, user = %self.user, text, "Dry run");
    }
}

#[async_trait]
impl Responder for DryRun {
    async fn respond(&self, text: &str) -> Result<()> {
        self.log("respond", text);
        Ok(())
    }

    async fn respond_unfurled(&self, text: &str) -> Result<()> {
        self.log("respond_unfurled", text);
        Ok(())
    }

    async fn respond_in_thread(&self, text: &str) -> Result<()> {
        self.log("respond_in_thread", text);
        Ok(())
    }

    async fn respond_with_attachment(&self, text: &str, attachment: &str) -> Result<()> {
        self.log("respond_with_attachment", &format!("{text}\n{attachment}"));
        Ok(())
    }

    async fn respond_private(&self, text: &str) -> Result<()> {
        self.log("respond_private", text);
        Ok(())
    }

    async fn respond_private_with_attachment(&self, text: &str, attachment: &str) -> Result<()> {
        self.log("respond_private_with_attachment", &format!("{text}\n{attachment}"));
        Ok(())
    }

    async fn react(&self, reaction: &str) -> Result<()> {
        self.log("react", reaction);
        Ok(())
    }
}

#[async_trait]
impl Notifier for DryRun {
    async fn notify(&self, text: &str) -> bool {
        self.log("notify", text);
        true
    }
}
