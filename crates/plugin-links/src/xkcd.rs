use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use tracing::debug;

use handler_core::{Handler, Message, Responder, condition::has_prefix};

pub fn default_aliases() -> HashMap<String, u32> {
    HashMap::from([
        ("standards".to_owned(), 927),
        ("compiling".to_owned(), 303),
        ("optimization".to_owned(), 1691),
    ])
}

/// Links a comic by number or by alias, e.g. `xkcd:standards`.
#[derive(Debug, Clone)]
pub struct Xkcd {
    prefixes: Vec<String>,
    aliases: HashMap<String, u32>,
}

impl Xkcd {
    pub fn new(aliases: HashMap<String, u32>) -> Self {
        Self {
            prefixes: vec!["xkcd:".to_owned()],
            aliases: aliases
                .into_iter()
                .map(|(name, id)| (name.to_lowercase(), id))
                .collect(),
        }
    }

    fn comic(&self, msg: &Message) -> Option<u32> {
        if !has_prefix(msg, &self.prefixes) {
            return None;
        }
        let key = msg.text().strip_prefix(self.prefixes[0].as_str())?.trim();
        if let Some(id) = self.aliases.get(key) {
            return Some(*id);
        }
        match key.parse() {
            Ok(id) => Some(id),
            Err(e) => {
                debug!(error = %e, input = %key, "Ignoring unparsable xkcd id");
                None
            }
        }
    }
}

impl Default for Xkcd {
    fn default() -> Self {
        Self::new(default_aliases())
    }
}

#[async_trait]
impl Handler for Xkcd {
    fn id(&self) -> &'static str {
        "xkcd"
    }

    async fn handle(&self, msg: &Message, responder: &dyn Responder) -> Result<()> {
        let Some(id) = self.comic(msg) else {
            return Ok(());
        };
        responder
            .respond_unfurled(&format!("<https://xkcd.com/{id}/>"))
            .await
    }
}
