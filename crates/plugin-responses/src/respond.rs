use anyhow::Result;
use async_trait::async_trait;

use handler_core::{
    Handler, Message, Responder,
    condition::{self, Condition},
};

fn owned<I, S>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    items.into_iter().map(Into::into).collect()
}

/// Replies with fixed text when the condition matches.
#[derive(Debug, Clone)]
pub struct Respond {
    condition: Condition,
    triggers: Vec<String>,
    response: String,
}

impl Respond {
    pub fn when_exact<I, S>(triggers: I, response: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            condition: condition::exact,
            triggers: owned(triggers),
            response: response.into(),
        }
    }

    pub fn when_contains<I, S>(triggers: I, response: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            condition: condition::contains,
            triggers: owned(triggers),
            response: response.into(),
        }
    }
}

#[async_trait]
impl Handler for Respond {
    fn id(&self) -> &'static str {
        "respond"
    }

    async fn handle(&self, msg: &Message, responder: &dyn Responder) -> Result<()> {
        if !(self.condition)(msg, &self.triggers) {
            return Ok(());
        }
        responder.respond(&self.response).await
    }
}

/// Adds emoji reactions when the condition matches.
#[derive(Debug, Clone)]
pub struct React {
    condition: Condition,
    triggers: Vec<String>,
    reactions: Vec<String>,
}

impl React {
    fn build<I, S>(condition: Condition, trigger: &str, reactions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            condition,
            triggers: vec![trigger.to_owned()],
            reactions: owned(reactions),
        }
    }

    /// Raw text contains `trigger`.
    pub fn when_contains<I, S>(trigger: &str, reactions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::build(condition::contains, trigger, reactions)
    }

    /// Normalized text contains `trigger`.
    pub fn when_mentions<I, S>(trigger: &str, reactions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::build(condition::contains_normalized, trigger, reactions)
    }

    pub fn when_has_prefix<I, S>(trigger: &str, reactions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::build(condition::has_prefix, trigger, reactions)
    }
}

#[async_trait]
impl Handler for React {
    fn id(&self) -> &'static str {
        "react"
    }

    async fn handle(&self, msg: &Message, responder: &dyn Responder) -> Result<()> {
        if !(self.condition)(msg, &self.triggers) {
            return Ok(());
        }
        for reaction in &self.reactions {
            responder.react(reaction).await?;
        }
        Ok(())
    }
}
