use anyhow::Result;
use async_trait::async_trait;

use handler_core::{Handler, Message, Responder, condition::has_prefix};

/// Expands shorthand like `d/net/http` into a documentation link.
#[derive(Debug, Clone)]
pub struct LinkToGoDoc {
    prefixes: Vec<String>,
    url_prefix: String,
}

impl LinkToGoDoc {
    pub fn new(match_prefix: &str, url_prefix: &str) -> Self {
        Self {
            prefixes: vec![match_prefix.to_owned()],
            url_prefix: url_prefix.to_owned(),
        }
    }

    /// `ghd/owner/repo` → the GitHub package docs.
    pub fn github() -> Self {
        Self::new("ghd/", "https://godoc.org/github.com/")
    }

    /// `d/path` → the package docs.
    pub fn stdlib() -> Self {
        Self::new("d/", "https://godoc.org/")
    }

    fn link(&self, msg: &Message) -> Option<String> {
        if !has_prefix(msg, &self.prefixes) {
            return None;
        }
        let rest = msg.body_after_prefix(&self.prefixes[0])?;
        let path = rest.split(' ').next().unwrap_or_default();
        if path.is_empty() {
            return None;
        }
        Some(format!("<{}{path}>", self.url_prefix))
    }
}

#[async_trait]
impl Handler for LinkToGoDoc {
    fn id(&self) -> &'static str {
        "godoc"
    }

    async fn handle(&self, msg: &Message, responder: &dyn Responder) -> Result<()> {
        let Some(link) = self.link(msg) else {
            return Ok(());
        };
        responder.respond(&link).await
    }
}
