use core::time::Duration;
use std::sync::Arc;

use anyhow::{Context as _, Result, bail};
use reqwest::{Client, StatusCode, header};
use time::OffsetDateTime;
use tracing::{debug, error, info, warn};

use handler_core::{Notifier, RetryPolicy};

use crate::{Store, StoredChangeset, changeset};

/// Latest merged changes, newest first.
pub const CHANGES_URL: &str =
    "https://go-review.googlesource.com/changes/?q=status:merged&O=12&n=100";

const USER_AGENT: &str = "Gophers Slack bot";

/// Periodically looks for newly merged changes and announces them.
pub struct GerritPoller {
    store: Arc<dyn Store>,
    http: Client,
    url: String,
    notifier: Arc<dyn Notifier>,
    last_number: Option<u64>,
}

impl GerritPoller {
    /// Resumes from the most recently crawled changeset in `store`.
    pub async fn new(
        store: Arc<dyn Store>,
        http: Client,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self> {
        let last_number = store
            .latest_number()
            .await
            .context("loading last crawled changeset")?;
        if let Some(n) = last_number {
            info!(changeset = n, "Resuming changeset poller");
        }
        Ok(Self {
            store,
            http,
            url: CHANGES_URL.to_owned(),
            notifier,
            last_number,
        })
    }

    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub const fn last_number(&self) -> Option<u64> {
        self.last_number
    }

    /// Runs one poll and returns how many changesets were announced.
    pub async fn poll(&mut self) -> Result<usize> {
        let resp = self
            .http
            .get(&self.url)
            .header(header::USER_AGENT, USER_AGENT)
            .send()
            .await
            .context("requesting merged changes")?;
        if resp.status() != StatusCode::OK {
            bail!("change list returned {}", resp.status());
        }
        let body = resp.text().await.context("reading change list")?;
        let changes = changeset::unseen(changeset::parse_changes(&body)?, self.last_number);

        let mut announced = 0;
        for change in changes.iter().rev() {
            let crawled = self
                .store
                .exists(change.number)
                .await
                .with_context(|| format!("checking changeset {}", change.number))?;
            if crawled {
                debug!(changeset = change.number, "Already crawled");
                continue;
            }

            let stored = StoredChangeset::crawled(change, OffsetDateTime::now_utc());
            let summary = stored.summary();
            self.store
                .put(stored)
                .await
                .with_context(|| format!("saving changeset {}", change.number))?;

            if !self.notifier.notify(&summary).await {
                warn!(changeset = change.number, "Could not announce changeset");
                break;
            }
            self.last_number = Some(change.number);
            announced += 1;
        }
        Ok(announced)
    }

    /// Polls every `every` until failures exceed `policy.max_failures`.
    pub async fn run(mut self, every: Duration, policy: RetryPolicy) -> Result<()> {
        let mut ticker = tokio::time::interval(every);
        let mut failures = 0_u32;
        loop {
            ticker.tick().await;
            loop {
                match self.poll().await {
                    Ok(n) => {
                        if n > 0 {
                            info!(announced = n, "Announced new changesets");
                        }
                        failures = 0;
                        break;
                    }
                    Err(e) => {
                        failures += 1;
                        if policy.exhausted(failures) {
                            error!(error = %e, failures, "Changeset poller giving up");
                            return Err(e.context("changeset poller failed too many times"));
                        }
                        let delay = policy.backoff(failures);
                        warn!(error = %e, failures, ?delay, "Changeset poll failed, retrying");
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }
    }
}

impl core::fmt::Debug for GerritPoller {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("GerritPoller")
            .field("url", &self.url)
            .field("last_number", &self.last_number)
            .finish_non_exhaustive()
    }
}
