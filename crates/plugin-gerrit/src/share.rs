use std::{collections::HashSet, sync::Arc};

use anyhow::Result;
use async_trait::async_trait;
use tracing::{info, warn};

use handler_core::{Handler, Message, Notifier, Responder};

use crate::{Store, StoredChangeset};

const PREFIX: &str = "share cl";

/// `share cl <n> [<n>...]`: rebroadcasts stored changesets to the public
/// changeset channel. Only the private changeset channel and admins may
/// use it.
pub struct ShareChangeset {
    store: Arc<dyn Store>,
    public: Arc<dyn Notifier>,
    private_channel: Option<String>,
    admins: HashSet<String>,
}

impl ShareChangeset {
    pub fn new(store: Arc<dyn Store>, public: Arc<dyn Notifier>) -> Self {
        Self {
            store,
            public,
            private_channel: None,
            admins: HashSet::new(),
        }
    }

    #[must_use]
    pub fn private_channel(mut self, channel: impl Into<String>) -> Self {
        self.private_channel = Some(channel.into());
        self
    }

    #[must_use]
    pub fn admins<I, S>(mut self, admins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.admins = admins.into_iter().map(Into::into).collect();
        self
    }

    fn is_authorized(&self, msg: &Message) -> bool {
        self.private_channel.as_deref() == Some(msg.channel()) || self.admins.contains(msg.user())
    }

    async fn share_one(&self, token: &str, responder: &dyn Responder) -> Result<()> {
        let Ok(number) = token.parse::<u64>() else {
            return responder
                .respond_private(&format!("Could not share CL {token}, please try again"))
                .await;
        };
        let stored = match self.store.get(number).await {
            Ok(Some(stored)) => stored,
            Ok(None) => {
                return responder
                    .respond_private(&format!("Could not share CL {token}, please try again"))
                    .await;
            }
            Err(e) => {
                warn!(error = %e, changeset = number, "Could not load changeset");
                return responder
                    .respond_private(&format!("Could not share CL {token}, please try again"))
                    .await;
            }
        };
        if stored.shared {
            return responder
                .respond_private(&format!("Already shared CL {number}"))
                .await;
        }

        if !self.public.notify(&stored.summary()).await {
            return responder
                .respond_private(&format!("Could not share CL {token}, please try again"))
                .await;
        }
        info!(changeset = number, "Shared changeset");
        self.store
            .put(StoredChangeset {
                shared: true,
                ..stored
            })
            .await
    }
}

impl core::fmt::Debug for ShareChangeset {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ShareChangeset")
            .field("private_channel", &self.private_channel)
            .field("admins", &self.admins)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Handler for ShareChangeset {
    fn id(&self) -> &'static str {
        "share-cl"
    }

    async fn handle(&self, msg: &Message, responder: &dyn Responder) -> Result<()> {
        let Some(args) = msg.body_after_prefix(PREFIX) else {
            return Ok(());
        };
        if !self.is_authorized(msg) {
            info!(user = %msg.user(), channel = %msg.channel(), "Unauthorized share request");
            return responder
                .respond_private("You are not authorized to share CLs")
                .await;
        }

        for token in args
            .split_whitespace()
            .map(|t| t.trim_matches(','))
            .filter(|t| !t.is_empty())
        {
            self.share_one(token, responder).await?;
        }
        Ok(())
    }
}
