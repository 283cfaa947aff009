use anyhow::{Context as _, Result, anyhow, bail};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;
use tracing::debug;

use plugin_playground::FileInfo;

pub(crate) const SLACK_API: &str = "https://slack.com/api";

/// Who the bot token belongs to, as reported by `auth.test`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub(crate) struct AuthInfo {
    pub(crate) user_id: String,
    #[serde(default)]
    pub(crate) user: String,
}

#[derive(Debug, Clone, Serialize)]
struct Attachment<'a> {
    text: &'a str,
}

/// One `chat.postMessage` call.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct PostMessage<'a> {
    pub(crate) channel: &'a str,
    pub(crate) text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) thread_ts: Option<&'a str>,
    pub(crate) unfurl_links: bool,
    pub(crate) unfurl_media: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    attachments: Vec<Attachment<'a>>,
}

impl<'a> PostMessage<'a> {
    pub(crate) const fn new(channel: &'a str, text: &'a str) -> Self {
        Self {
            channel,
            text,
            thread_ts: None,
            unfurl_links: false,
            unfurl_media: false,
            attachments: Vec::new(),
        }
    }

    #[must_use]
    pub(crate) const fn in_thread(mut self, thread_ts: Option<&'a str>) -> Self {
        self.thread_ts = thread_ts;
        self
    }

    #[must_use]
    pub(crate) const fn unfurled(mut self, unfurl: bool) -> Self {
        self.unfurl_links = unfurl;
        self.unfurl_media = unfurl;
        self
    }

    #[must_use]
    pub(crate) fn attachment(mut self, text: &'a str) -> Self {
        self.attachments.push(Attachment { text });
        self
    }
}

/// Thin Slack Web API client. Every call fails on a transport error, a
/// non-200 status or an `"ok": false` body.
#[derive(Debug, Clone)]
pub(crate) struct SlackApi {
    http: Client,
    base: String,
    bot_token: String,
    app_token: String,
}

impl SlackApi {
    pub(crate) fn new(http: Client, bot_token: &str, app_token: &str) -> Self {
        Self {
            http,
            base: SLACK_API.to_owned(),
            bot_token: bot_token.to_owned(),
            app_token: app_token.to_owned(),
        }
    }

    #[must_use]
    pub(crate) fn with_base(mut self, base: &str) -> Self {
        base.trim_end_matches('/').clone_into(&mut self.base);
        self
    }

    fn url(&self, method: &str) -> String {
        format!("{}/{method}", self.base)
    }

    async fn decode<T: DeserializeOwned>(method: &str, resp: reqwest::Response) -> Result<T> {
        let status = resp.status();
        if status != StatusCode::OK {
            bail!("{method} returned {status}");
        }
        let body: Value = resp
            .json()
            .await
            .with_context(|| format!("decoding {method} response"))?;
        if body["ok"].as_bool() != Some(true) {
            let err = body["error"].as_str().unwrap_or("unknown");
            bail!("{method} failed: {err}");
        }
        serde_json::from_value(body).with_context(|| format!("unexpected {method} response"))
    }

    async fn post<T: DeserializeOwned>(
        &self,
        method: &str,
        token: &str,
        body: &(impl Serialize + Sync),
    ) -> Result<T> {
        let resp = self
            .http
            .post(self.url(method))
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .with_context(|| format!("calling {method}"))?;
        Self::decode(method, resp).await
    }

    pub(crate) async fn auth_test(&self) -> Result<AuthInfo> {
        self.post("auth.test", &self.bot_token, &serde_json::json!({}))
            .await
    }

    pub(crate) async fn post_message(&self, message: &PostMessage<'_>) -> Result<()> {
        let _: Value = self
            .post("chat.postMessage", &self.bot_token, message)
            .await?;
        debug!(channel = %message.channel, "Posted message");
        Ok(())
    }

    pub(crate) async fn add_reaction(
        &self,
        channel: &str,
        timestamp: &str,
        name: &str,
    ) -> Result<()> {
        let body = serde_json::json!({
            "channel": channel,
            "timestamp": timestamp,
            "name": name,
        });
        let _: Value = self.post("reactions.add", &self.bot_token, &body).await?;
        Ok(())
    }

    pub(crate) async fn file_info(&self, id: &str) -> Result<FileInfo> {
        #[derive(Deserialize)]
        struct FilesInfo {
            file: FileInfo,
        }

        let resp = self
            .http
            .get(self.url("files.info"))
            .bearer_auth(&self.bot_token)
            .query(&[("file", id)])
            .send()
            .await
            .context("calling files.info")?;
        let info: FilesInfo = Self::decode("files.info", resp).await?;
        Ok(info.file)
    }

    /// Fetches a private file with the bot token.
    pub(crate) async fn download(&self, url: &str) -> Result<Vec<u8>> {
        let resp = self
            .http
            .get(url)
            .bearer_auth(&self.bot_token)
            .send()
            .await
            .context("downloading file")?;
        let status = resp.status();
        if status != StatusCode::OK {
            bail!("file download returned {status}");
        }
        let bytes = resp.bytes().await.context("reading file body")?;
        Ok(bytes.to_vec())
    }

    /// Asks for a Socket Mode WebSocket URL using the app-level token.
    pub(crate) async fn open_connection(&self) -> Result<String> {
        let body: Value = self
            .post("apps.connections.open", &self.app_token, &serde_json::json!({}))
            .await?;
        body["url"]
            .as_str()
            .map(str::to_owned)
            .ok_or_else(|| anyhow!("no url in apps.connections.open response"))
    }
}

#[cfg(test)]
mod tests {
    use httpmock::prelude::*;
    use serde_json::json;

    use super::*;

    fn api(server: &MockServer) -> SlackApi {
        SlackApi::new(Client::new(), "xoxb-test", "xapp-test").with_base(&server.base_url())
    }

    #[tokio::test]
    async fn auth_test_returns_bot_user() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/auth.test")
                    .header("authorization", "Bearer xoxb-test");
                then.status(200)
                    .json_body(json!({"ok": true, "user_id": "UBOT", "user": "gopher"}));
            })
            .await;

        let info = api(&server).auth_test().await.unwrap();
        assert_eq!(info.user_id, "UBOT");
        assert_eq!(info.user, "gopher");
    }

    #[tokio::test]
    async fn not_ok_is_an_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/auth.test");
                then.status(200)
                    .json_body(json!({"ok": false, "error": "invalid_auth"}));
            })
            .await;

        let err = api(&server).auth_test().await.unwrap_err();
        assert!(err.to_string().contains("invalid_auth"));
    }

    #[tokio::test]
    async fn post_message_sends_thread_and_attachment() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/chat.postMessage")
                    .json_body(json!({
                        "channel": "C1",
                        "text": "hi",
                        "thread_ts": "1.0",
                        "unfurl_links": false,
                        "unfurl_media": false,
                        "attachments": [{"text": "more"}],
                    }));
                then.status(200).json_body(json!({"ok": true, "ts": "2.0"}));
            })
            .await;

        let msg = PostMessage::new("C1", "hi")
            .in_thread(Some("1.0"))
            .attachment("more");
        api(&server).post_message(&msg).await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn reactions_use_bot_token() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/reactions.add")
                    .header("authorization", "Bearer xoxb-test")
                    .json_body(json!({"channel": "C1", "timestamp": "1.0", "name": "gopher"}));
                then.status(200).json_body(json!({"ok": true}));
            })
            .await;

        api(&server).add_reaction("C1", "1.0", "gopher").await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn file_info_and_download() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/files.info").query_param("file", "F1");
                then.status(200).json_body(json!({
                    "ok": true,
                    "file": {
                        "id": "F1",
                        "lines": 12,
                        "pretty_type": "Go",
                        "url_private_download": server.url("/download/F1"),
                    }
                }));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/download/F1")
                    .header("authorization", "Bearer xoxb-test");
                then.status(200).body("package main\n");
            })
            .await;

        let api = api(&server);
        let info = api.file_info("F1").await.unwrap();
        assert_eq!(info.lines, 12);
        let body = api.download(&info.download_url).await.unwrap();
        assert_eq!(body, b"package main\n");
    }

    #[tokio::test]
    async fn open_connection_uses_app_token() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/apps.connections.open")
                    .header("authorization", "Bearer xapp-test");
                then.status(200)
                    .json_body(json!({"ok": true, "url": "wss://example.test/link"}));
            })
            .await;

        assert_eq!(
            api(&server).open_connection().await.unwrap(),
            "wss://example.test/link"
        );
    }
}
