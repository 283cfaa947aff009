//! Announces the Go Time podcast when its live stream starts.

use std::sync::Arc;

use anyhow::{Context as _, Result, bail};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, de::DeserializeOwned};
use time::{Duration, OffsetDateTime};
use tracing::{debug, info, warn};

use handler_core::Notifier;

pub const STATUS_URL: &str = "https://changelog.com/live/status";
pub const COUNTDOWN_URL: &str = "https://changelog.com/slack/countdown/gotime";
pub const LIVE_TEXT: &str = ":tada: GoTimeFM is now live :tada:";

#[derive(Debug, Deserialize)]
struct LiveStatus {
    #[serde(default)]
    streaming: bool,
}

#[derive(Debug, Deserialize)]
struct Countdown {
    #[serde(with = "time::serde::rfc3339")]
    data: OffsetDateTime,
}

/// Polls the live status and notifies at most once a day.
///
/// The status endpoint reports any show streaming, so a notification also
/// requires the next scheduled episode to start within `variance` of now.
pub struct GoTime {
    http: Client,
    status_url: String,
    countdown_url: String,
    variance: Duration,
    notifier: Arc<dyn Notifier>,
    text: String,
    last_notified: Option<OffsetDateTime>,
}

impl GoTime {
    pub fn new(http: Client, variance: Duration, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            http,
            status_url: STATUS_URL.to_owned(),
            countdown_url: COUNTDOWN_URL.to_owned(),
            variance,
            notifier,
            text: LIVE_TEXT.to_owned(),
            last_notified: None,
        }
    }

    #[must_use]
    pub fn with_urls(
        mut self,
        status_url: impl Into<String>,
        countdown_url: impl Into<String>,
    ) -> Self {
        self.status_url = status_url.into();
        self.countdown_url = countdown_url.into();
        self
    }

    pub const fn last_notified(&self) -> Option<OffsetDateTime> {
        self.last_notified
    }

    /// Returns whether a notification went out.
    pub async fn poll(&mut self, now: OffsetDateTime) -> Result<bool> {
        if let Some(last) = self.last_notified
            && last > now - Duration::DAY
        {
            return Ok(false);
        }

        let status: LiveStatus = self.get(&self.status_url).await?;
        if !status.streaming {
            return Ok(false);
        }

        let countdown: Countdown = self.get(&self.countdown_url).await?;
        let start = countdown.data;
        if now < start - self.variance || now > start + self.variance {
            debug!(%start, "Stream is live but no episode is scheduled now");
            return Ok(false);
        }

        if !self.notifier.notify(&self.text).await {
            warn!("Could not announce live stream");
            return Ok(false);
        }
        self.last_notified = Some(now);
        Ok(true)
    }

    async fn get<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let resp = self
            .http
            .get(url)
            .send()
            .await
            .with_context(|| format!("requesting {url}"))?;
        let status = resp.status();
        if status != StatusCode::OK {
            bail!("non-200 status from {url}: {status}");
        }
        resp.json()
            .await
            .with_context(|| format!("decoding response from {url}"))
    }

    /// Polls every `every` forever. Failed polls are logged and skipped.
    pub async fn run(mut self, every: core::time::Duration) {
        let mut ticker = tokio::time::interval(every);
        loop {
            ticker.tick().await;
            match self.poll(OffsetDateTime::now_utc()).await {
                Ok(true) => info!("Announced live stream"),
                Ok(false) => {}
                Err(e) => warn!(error = %e, "Live stream poll failed"),
            }
        }
    }
}

impl core::fmt::Debug for GoTime {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("GoTime")
            .field("status_url", &self.status_url)
            .field("countdown_url", &self.countdown_url)
            .field("variance", &self.variance)
            .field("last_notified", &self.last_notified)
            .finish_non_exhaustive()
    }
}
