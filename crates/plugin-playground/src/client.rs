use anyhow::{Context as _, Result, bail};
use reqwest::{
    Body, Client, StatusCode,
    header::{CONTENT_TYPE, USER_AGENT},
};
use tracing::debug;

pub const SHARE_URL: &str = "https://play.golang.org/share";
pub const LINK_PREFIX: &str = "https://play.golang.org/p/";
pub const BOT_USER_AGENT: &str = "Gophers Slack bot";

/// Client for the playground's snippet sharing endpoint.
#[derive(Debug, Clone)]
pub struct Playground {
    http: Client,
    share_url: String,
    link_prefix: String,
}

impl Playground {
    pub fn new(http: Client) -> Self {
        Self::with_endpoint(http, SHARE_URL, LINK_PREFIX)
    }

    pub fn with_endpoint(http: Client, share_url: &str, link_prefix: &str) -> Self {
        Self {
            http,
            share_url: share_url.to_owned(),
            link_prefix: link_prefix.to_owned(),
        }
    }

    /// Uploads `body` and returns the public link to the snippet.
    pub async fn share(&self, body: impl Into<Body> + Send) -> Result<String> {
        let content_type = format!("{}; charset=UTF-8", mime::APPLICATION_WWW_FORM_URLENCODED);
        let resp = self
            .http
            .post(&self.share_url)
            .header(CONTENT_TYPE, content_type)
            .header(USER_AGENT, BOT_USER_AGENT)
            .body(body)
            .send()
            .await
            .context("posting snippet to playground")?;

        let status = resp.status();
        if status != StatusCode::OK {
            bail!("got non-200 response from playground: {status}");
        }
        let id = resp
            .text()
            .await
            .context("reading playground response")?;
        let link = format!("{}{}", self.link_prefix, id.trim());
        debug!(link = %link, "Shared snippet");
        Ok(link)
    }
}
