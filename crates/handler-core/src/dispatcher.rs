use core::fmt;
use std::sync::Arc;

use tracing::{debug, trace, warn};

use crate::{
    BotIdentity, Handler, JoinEvent, JoinHandler, JoinResponder, Message, MessageEvent, Responder,
};

/// Where a message event is in its trip through the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Filtering,
    Normalizing,
    Classifying,
    Dispatching,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Filtering => "filtering",
            Self::Normalizing => "normalizing",
            Self::Classifying => "classifying",
            Self::Dispatching => "dispatching",
        })
    }
}

/// What happened to one inbound event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Bot-originated; no handler ran.
    Dropped,
    /// The root handler ran once.
    Dispatched { directed: bool },
}

/// Turns raw events into [`Message`]s and hands them to the root handler.
#[derive(Clone)]
pub struct Dispatcher {
    identity: BotIdentity,
    root: Arc<dyn Handler>,
    join: Option<Arc<dyn JoinHandler>>,
}

impl Dispatcher {
    pub fn new(identity: BotIdentity, root: Arc<dyn Handler>) -> Self {
        Self {
            identity,
            root,
            join: None,
        }
    }

    #[must_use]
    pub fn with_join_handler(mut self, join: Arc<dyn JoinHandler>) -> Self {
        self.join = Some(join);
        self
    }

    pub const fn identity(&self) -> &BotIdentity {
        &self.identity
    }

    pub async fn dispatch(&self, event: MessageEvent, responder: &dyn Responder) -> Outcome {
        trace!(stage = %Stage::Filtering, channel = %event.channel, ts = %event.timestamp);
        if event.is_bot_originated() {
            trace!(channel = %event.channel, "Dropping bot-originated event");
            return Outcome::Dropped;
        }

        trace!(stage = %Stage::Normalizing);
        let msg = Message::new(event, &self.identity);

        trace!(stage = %Stage::Classifying, directed = msg.is_directed());
        debug!(
            channel = %msg.channel(),
            user = %msg.user(),
            directed = msg.is_directed(),
            text = %msg.text(),
            "Dispatching message"
        );

        trace!(stage = %Stage::Dispatching, root = self.root.id());
        if let Err(e) = self.root.handle(&msg, responder).await {
            warn!(error = %e, handler = self.root.id(), "Handler failed");
        }
        Outcome::Dispatched {
            directed: msg.is_directed(),
        }
    }

    /// Runs the join handler, if one is registered. Returns whether it ran.
    pub async fn dispatch_join(&self, event: &JoinEvent, responder: &dyn JoinResponder) -> bool {
        let Some(join) = &self.join else {
            return false;
        };
        debug!(user = %event.user_id, "Dispatching team join");
        if let Err(e) = join.handle(event, responder).await {
            warn!(error = %e, handler = join.id(), user = %event.user_id, "Join handler failed");
        }
        true
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("identity", &self.identity)
            .field("root", &self.root.id())
            .field("join", &self.join.as_ref().map(|j| j.id()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use core::sync::atomic::{AtomicUsize, Ordering};

    use anyhow::Result;
    use async_trait::async_trait;

    use super::*;
    use crate::testing::{Action, RecordingResponder, event, identity};

    #[derive(Debug, Default)]
    struct Counter(AtomicUsize);

    #[async_trait]
    impl Handler for Counter {
        fn id(&self) -> &'static str {
            "counter"
        }

        async fn handle(&self, _msg: &Message, _responder: &dyn Responder) -> Result<()> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[derive(Debug)]
    struct Greeter;

    #[async_trait]
    impl JoinHandler for Greeter {
        fn id(&self) -> &'static str {
            "greeter"
        }

        async fn handle(&self, event: &JoinEvent, responder: &dyn JoinResponder) -> Result<()> {
            responder.respond_private(&format!("hi {}", event.user_name)).await
        }
    }

    #[tokio::test]
    async fn bot_events_invoke_no_handlers() {
        let counter = Arc::new(Counter::default());
        let dispatcher = Dispatcher::new(identity(), Arc::clone(&counter) as Arc<dyn Handler>);
        let responder = RecordingResponder::new();

        let mut from_bot = event("version", "C1");
        from_bot.bot_id = Some("B42".to_owned());
        let mut anonymous = event("version", "C1");
        anonymous.user.clear();
        let mut bot_subtype = event("version", "C1");
        bot_subtype.subtype = Some("bot_message".to_owned());

        for ev in [from_bot, anonymous, bot_subtype] {
            assert_eq!(dispatcher.dispatch(ev, &responder).await, Outcome::Dropped);
        }
        assert_eq!(counter.0.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn root_runs_exactly_once() {
        let counter = Arc::new(Counter::default());
        let dispatcher = Dispatcher::new(identity(), Arc::clone(&counter) as Arc<dyn Handler>);
        let responder = RecordingResponder::new();

        let outcome = dispatcher.dispatch(event("gopher version", "C1"), &responder).await;
        assert_eq!(outcome, Outcome::Dispatched { directed: true });
        let outcome = dispatcher.dispatch(event("hello", "C1"), &responder).await;
        assert_eq!(outcome, Outcome::Dispatched { directed: false });
        assert_eq!(counter.0.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn join_events_reach_join_handler() {
        let counter = Arc::new(Counter::default());
        let bare = Dispatcher::new(identity(), Arc::clone(&counter) as Arc<dyn Handler>);
        let responder = RecordingResponder::new();
        let join = JoinEvent {
            user_id: "U7".to_owned(),
            user_name: "ada".to_owned(),
        };
        assert!(!bare.dispatch_join(&join, &responder).await);

        let dispatcher = bare.with_join_handler(Arc::new(Greeter));
        assert!(dispatcher.dispatch_join(&join, &responder).await);
        assert_eq!(
            responder.actions(),
            vec![Action::Private("hi ada".to_owned())]
        );
    }
}
