use anyhow::{Context as _, Result};
use serde::Deserialize;

/// Gerrit prefixes JSON responses with this to defeat XSSI.
const XSSI_PREFIX: &str = ")]}'";

/// One merged change as listed by the review server.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Changeset {
    pub project: String,
    #[serde(default)]
    pub change_id: String,
    #[serde(rename = "_number")]
    pub number: u64,
    pub subject: String,
    #[serde(default)]
    pub branch: String,
}

impl Changeset {
    pub fn link(&self) -> String {
        format!("https://golang.org/cl/{}/", self.number)
    }

    /// Subject, tagged with the project unless it is the main repository.
    pub fn message(&self) -> String {
        if self.project == "go" {
            self.subject.clone()
        } else {
            format!("[{}] {}", self.project, self.subject)
        }
    }
}

/// Parses a change list response, newest change first.
pub fn parse_changes(body: &str) -> Result<Vec<Changeset>> {
    let json = body.trim_start().strip_prefix(XSSI_PREFIX).unwrap_or(body);
    serde_json::from_str(json).context("decoding change list")
}

/// Drops `last_seen` and everything older from a newest-first list.
pub fn unseen(mut changes: Vec<Changeset>, last_seen: Option<u64>) -> Vec<Changeset> {
    if let Some(last) = last_seen
        && let Some(idx) = changes.iter().position(|c| c.number == last)
    {
        changes.truncate(idx);
    }
    changes
}
