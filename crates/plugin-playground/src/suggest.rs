use core::{fmt, time::Duration};
use std::sync::Arc;

use anyhow::{Context as _, Result};
use async_trait::async_trait;
use tracing::{debug, info};

use handler_core::{Handler, Message, Responder, SharedFile};

use crate::{FileFetcher, Playground};

const UPLOAD_TIP: &str = "Hello. I've noticed you uploaded a Go file. To facilitate collaboration and make \
this easier for others to share back the snippet, please consider using: \
<https://play.golang.org>. If you wish to not link against the playground, please use \
\"nolink\" in the message. Thank you.";

const LONG_TEXT_TIP: &str = "Hello. I've noticed you've written a large block of text (more than 9 lines). \
To make the conversation easier to follow the conversation and facilitate collaboration, \
please consider using: <https://play.golang.org> if you shared code. If you wish to not \
link against the playground, please start the message with \"nolink\". Thank you.";

/// Uploads the platform needs a moment before file info is available.
const UPLOAD_SETTLE: Duration = Duration::from_secs(1);

fn is_code_file(file: &SharedFile) -> bool {
    matches!(file.filetype.as_str(), "go" | "text")
}

/// Shares long messages and uploaded code files to the playground, posts the
/// link and privately nudges the author to use the playground next time.
pub struct SuggestPlayground {
    playground: Playground,
    files: Arc<dyn FileFetcher>,
    max_lines: usize,
    upload_delay: Duration,
}

impl SuggestPlayground {
    pub fn new(playground: Playground, files: Arc<dyn FileFetcher>) -> Self {
        Self {
            playground,
            files,
            max_lines: 9,
            upload_delay: UPLOAD_SETTLE,
        }
    }

    #[must_use]
    pub const fn max_lines(mut self, max_lines: usize) -> Self {
        self.max_lines = max_lines;
        self
    }

    #[must_use]
    pub const fn upload_delay(mut self, delay: Duration) -> Self {
        self.upload_delay = delay;
        self
    }

    async fn share_uploads(&self, msg: &Message, responder: &dyn Responder) -> Result<()> {
        tokio::time::sleep(self.upload_delay).await;

        let mut shared = 0_usize;
        for file in msg.event().files.iter().filter(|f| is_code_file(f)) {
            let info = self
                .files
                .file_info(&file.id)
                .await
                .with_context(|| format!("getting file info for {}", file.id))?;
            if !info.is_shareable() {
                debug!(file = %file.id, lines = info.lines, kind = %info.pretty_type, "Not sharing upload");
                continue;
            }
            let body = self
                .files
                .download(&info)
                .await
                .with_context(|| format!("downloading file {}", file.id))?;
            let link = self.playground.share(body).await?;
            responder
                .respond(&format!("The above code in playground: <{link}>"))
                .await?;
            shared += 1;
        }

        if shared > 0 {
            info!(user = %msg.user(), files = shared, "Shared uploads to playground");
            responder.respond_private(UPLOAD_TIP).await?;
        }
        Ok(())
    }

    async fn share_text(&self, msg: &Message, responder: &dyn Responder) -> Result<()> {
        let link = self.playground.share(msg.raw().to_owned()).await?;
        info!(user = %msg.user(), "Shared long message to playground");
        responder
            .respond(&format!("The above code in playground: <{link}>"))
            .await?;
        responder.respond_private(LONG_TEXT_TIP).await
    }
}

impl fmt::Debug for SuggestPlayground {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SuggestPlayground")
            .field("playground", &self.playground)
            .field("max_lines", &self.max_lines)
            .field("upload_delay", &self.upload_delay)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Handler for SuggestPlayground {
    fn id(&self) -> &'static str {
        "playground"
    }

    async fn handle(&self, msg: &Message, responder: &dyn Responder) -> Result<()> {
        if msg.raw().contains("nolink") {
            return Ok(());
        }
        if msg.event().files.iter().any(is_code_file) {
            return self.share_uploads(msg, responder).await;
        }
        if msg.raw().lines().count() > self.max_lines {
            return self.share_text(msg, responder).await;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use anyhow::anyhow;
    use handler_core::{
        MessageEvent,
        testing::{Action, RecordingResponder, event, identity, message},
    };
    use httpmock::prelude::*;

    use super::*;
    use crate::{FileInfo, client::LINK_PREFIX};

    #[derive(Debug, Default)]
    struct FakeFiles {
        infos: HashMap<String, FileInfo>,
        contents: HashMap<String, Vec<u8>>,
    }

    impl FakeFiles {
        fn with(mut self, id: &str, lines: u32, kind: &str, body: &str) -> Self {
            self.infos.insert(
                id.to_owned(),
                FileInfo {
                    id: id.to_owned(),
                    lines,
                    pretty_type: kind.to_owned(),
                    download_url: format!("https://files/{id}"),
                },
            );
            self.contents
                .insert(format!("https://files/{id}"), body.as_bytes().to_vec());
            self
        }
    }

    #[async_trait]
    impl FileFetcher for FakeFiles {
        async fn file_info(&self, id: &str) -> Result<FileInfo> {
            self.infos
                .get(id)
                .cloned()
                .ok_or_else(|| anyhow!("file_not_found"))
        }

        async fn download(&self, info: &FileInfo) -> Result<Vec<u8>> {
            self.contents
                .get(&info.download_url)
                .cloned()
                .ok_or_else(|| anyhow!("missing content"))
        }
    }

    fn handler(server: &MockServer, files: FakeFiles) -> SuggestPlayground {
        let playground = Playground::with_endpoint(
            reqwest::Client::new(),
            &server.url("/share"),
            LINK_PREFIX,
        );
        SuggestPlayground::new(playground, Arc::new(files)).upload_delay(Duration::ZERO)
    }

    fn upload(text: &str, files: &[(&str, &str)]) -> Message {
        let ev = MessageEvent {
            files: files
                .iter()
                .map(|(id, kind)| SharedFile {
                    id: (*id).to_owned(),
                    filetype: (*kind).to_owned(),
                    name: String::new(),
                })
                .collect(),
            upload: true,
            ..event(text, "C0GENERAL")
        };
        Message::new(ev, &identity())
    }

    fn lines(n: usize) -> String {
        (0..n).map(|i| format!("line {i}")).collect::<Vec<_>>().join("\n")
    }

    #[tokio::test]
    async fn long_text_is_shared() {
        let server = MockServer::start_async().await;
        let text = lines(10);
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/share").body(text.as_str());
                then.status(200).body("abc");
            })
            .await;
        let responder = RecordingResponder::new();

        handler(&server, FakeFiles::default())
            .handle(&message(&text), &responder)
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(
            responder.actions(),
            vec![
                Action::Respond("The above code in playground: <https://play.golang.org/p/abc>".to_owned()),
                Action::Private(LONG_TEXT_TIP.to_owned()),
            ]
        );
    }

    #[tokio::test]
    async fn short_or_opted_out_text_is_ignored() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/share");
                then.status(200).body("abc");
            })
            .await;
        let responder = RecordingResponder::new();
        let suggest = handler(&server, FakeFiles::default());

        suggest.handle(&message(&lines(9)), &responder).await.unwrap();
        let opted_out = format!("nolink\n{}", lines(20));
        suggest.handle(&message(&opted_out), &responder).await.unwrap();

        mock.assert_hits_async(0).await;
        assert!(responder.actions().is_empty());
    }

    #[tokio::test]
    async fn uploaded_go_file_is_shared() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/share").body("package main\n");
                then.status(200).body("up1");
            })
            .await;
        let files = FakeFiles::default()
            .with("F1", 12, "Go", "package main\n")
            .with("F2", 3, "Go", "tiny");
        let responder = RecordingResponder::new();

        handler(&server, files)
            .handle(&upload("have a look", &[("F1", "go"), ("F2", "go"), ("F3", "png")]), &responder)
            .await
            .unwrap();

        mock.assert_hits_async(1).await;
        assert_eq!(
            responder.actions(),
            vec![
                Action::Respond("The above code in playground: <https://play.golang.org/p/up1>".to_owned()),
                Action::Private(UPLOAD_TIP.to_owned()),
            ]
        );
    }

    #[tokio::test]
    async fn plain_text_upload_is_not_shared() {
        let server = MockServer::start_async().await;
        let files = FakeFiles::default().with("F1", 40, "Plain Text", "notes");
        let responder = RecordingResponder::new();

        handler(&server, files)
            .handle(&upload("", &[("F1", "text")]), &responder)
            .await
            .unwrap();

        assert!(responder.actions().is_empty());
    }

    #[tokio::test]
    async fn playground_failure_posts_nothing() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/share");
                then.status(503);
            })
            .await;
        let responder = RecordingResponder::new();

        let result = handler(&server, FakeFiles::default())
            .handle(&message(&lines(12)), &responder)
            .await;

        assert!(result.is_err());
        assert!(responder.actions().is_empty());
    }

    #[tokio::test]
    async fn missing_file_info_is_an_error() {
        let server = MockServer::start_async().await;
        let responder = RecordingResponder::new();

        let result = handler(&server, FakeFiles::default())
            .handle(&upload("", &[("F9", "go")]), &responder)
            .await;

        assert!(result.is_err());
        assert!(responder.actions().is_empty());
    }
}
