use core::fmt;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tracing::{debug, warn};

use crate::{Handler, Message, Odds, RandomSource, Responder, ThreadRandom};

/// Runs every child, in registration order, on every message. A failing
/// child is logged and the remaining children still run.
#[derive(Default, Clone)]
pub struct Linear {
    handlers: Vec<Arc<dyn Handler>>,
}

impl Linear {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, handler: impl Handler + 'static) -> Self {
        self.handlers.push(Arc::new(handler));
        self
    }

    pub fn push(&mut self, handler: Arc<dyn Handler>) {
        self.handlers.push(handler);
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    pub fn ids(&self) -> Vec<&'static str> {
        self.handlers.iter().map(|h| h.id()).collect()
    }
}

impl fmt::Debug for Linear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Linear")
            .field("handlers", &self.ids())
            .finish()
    }
}

#[async_trait]
impl Handler for Linear {
    fn id(&self) -> &'static str {
        "linear"
    }

    async fn handle(&self, msg: &Message, responder: &dyn Responder) -> Result<()> {
        for handler in &self.handlers {
            if let Err(e) = handler.handle(msg, responder).await {
                warn!(error = %e, handler = handler.id(), channel = %msg.channel(), "Handler failed");
            }
        }
        Ok(())
    }
}

/// Forwards only messages addressed to the bot.
pub struct WhenDirected {
    inner: Arc<dyn Handler>,
}

impl WhenDirected {
    pub fn new(inner: impl Handler + 'static) -> Self {
        Self {
            inner: Arc::new(inner),
        }
    }
}

impl fmt::Debug for WhenDirected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("WhenDirected").field(&self.inner.id()).finish()
    }
}

#[async_trait]
impl Handler for WhenDirected {
    fn id(&self) -> &'static str {
        self.inner.id()
    }

    async fn handle(&self, msg: &Message, responder: &dyn Responder) -> Result<()> {
        if !msg.is_directed() {
            return Ok(());
        }
        self.inner.handle(msg, responder).await
    }
}

/// Forwards a message when a single draw from the random source hits the
/// configured odds.
pub struct WithProbability {
    inner: Arc<dyn Handler>,
    odds: Odds,
    source: Arc<dyn RandomSource>,
}

impl WithProbability {
    pub fn new(inner: impl Handler + 'static) -> Self {
        Self {
            inner: Arc::new(inner),
            odds: Odds::default(),
            source: Arc::new(ThreadRandom),
        }
    }

    #[must_use]
    pub const fn odds(mut self, odds: Odds) -> Self {
        self.odds = odds;
        self
    }

    #[must_use]
    pub fn source(mut self, source: Arc<dyn RandomSource>) -> Self {
        self.source = source;
        self
    }
}

impl fmt::Debug for WithProbability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WithProbability")
            .field("inner", &self.inner.id())
            .field("odds", &self.odds)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Handler for WithProbability {
    fn id(&self) -> &'static str {
        self.inner.id()
    }

    async fn handle(&self, msg: &Message, responder: &dyn Responder) -> Result<()> {
        if !self.odds.hit(self.source.as_ref()) {
            return Ok(());
        }
        debug!(handler = self.inner.id(), "Probability gate fired");
        self.inner.handle(msg, responder).await
    }
}
