pub mod combinator;
pub mod condition;
pub mod dispatcher;
pub mod message;
pub mod random;
pub mod retry;
pub mod text;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

use anyhow::Result;
use async_trait::async_trait;

pub use combinator::{Linear, WhenDirected, WithProbability};
pub use dispatcher::{Dispatcher, Outcome};
pub use message::{BotIdentity, JoinEvent, Message, MessageEvent, SharedFile};
pub use random::{Odds, RandomSource, SeededRandom, ThreadRandom};
pub use retry::RetryPolicy;

/// Reply capabilities available while handling one message.
///
/// Every operation targets the conversation the message came from, or its
/// author for the private variants.
#[async_trait]
pub trait Responder: Send + Sync {
    async fn respond(&self, text: &str) -> Result<()>;
    /// Reply with link previews enabled.
    async fn respond_unfurled(&self, text: &str) -> Result<()>;
    /// Reply in the message's thread with link previews disabled.
    async fn respond_in_thread(&self, text: &str) -> Result<()>;
    async fn respond_with_attachment(&self, text: &str, attachment: &str) -> Result<()>;
    async fn respond_private(&self, text: &str) -> Result<()>;
    async fn respond_private_with_attachment(&self, text: &str, attachment: &str) -> Result<()>;
    async fn react(&self, reaction: &str) -> Result<()>;
}

/// Reply capabilities for a team join: only a private note to the newcomer.
#[async_trait]
pub trait JoinResponder: Send + Sync {
    async fn respond_private(&self, text: &str) -> Result<()>;
}

/// One unit of message behaviour. Implementations check their own
/// applicability and return `Ok(())` when the message is not for them.
#[async_trait]
pub trait Handler: Send + Sync {
    fn id(&self) -> &'static str;
    async fn handle(&self, msg: &Message, responder: &dyn Responder) -> Result<()>;
}

#[async_trait]
pub trait JoinHandler: Send + Sync {
    fn id(&self) -> &'static str;
    async fn handle(&self, event: &JoinEvent, responder: &dyn JoinResponder) -> Result<()>;
}

/// Posts a notification somewhere; returns whether it was delivered. Pollers
/// only advance their own state on `true`.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, text: &str) -> bool;
}
