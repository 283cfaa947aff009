use std::{
    collections::BTreeMap,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use anyhow::{Context as _, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tokio::sync::RwLock;

use crate::Changeset;

/// A changeset the poller has seen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredChangeset {
    pub number: u64,
    pub url: String,
    pub message: String,
    #[serde(with = "time::serde::rfc3339")]
    pub crawled_at: OffsetDateTime,
    #[serde(default)]
    pub shared: bool,
}

impl StoredChangeset {
    pub fn crawled(change: &Changeset, at: OffsetDateTime) -> Self {
        Self {
            number: change.number,
            url: change.link(),
            message: change.message(),
            crawled_at: at,
            shared: false,
        }
    }

    /// `[<n>] <message>: <url>`
    pub fn summary(&self) -> String {
        format!("[{}] {}: {}", self.number, self.message, self.url)
    }
}

/// Persistence for seen changesets, keyed by number.
#[async_trait]
pub trait Store: Send + Sync {
    /// Number of the most recently crawled changeset, if any.
    async fn latest_number(&self) -> Result<Option<u64>>;
    async fn exists(&self, number: u64) -> Result<bool>;
    async fn get(&self, number: u64) -> Result<Option<StoredChangeset>>;
    /// Inserts or replaces.
    async fn put(&self, changeset: StoredChangeset) -> Result<()>;
}

type Entries = BTreeMap<u64, StoredChangeset>;

fn latest(entries: &Entries) -> Option<u64> {
    entries
        .values()
        .max_by_key(|c| (c.crawled_at, c.number))
        .map(|c| c.number)
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<Entries>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn latest_number(&self) -> Result<Option<u64>> {
        Ok(latest(&*self.entries.read().await))
    }

    async fn exists(&self, number: u64) -> Result<bool> {
        Ok(self.entries.read().await.contains_key(&number))
    }

    async fn get(&self, number: u64) -> Result<Option<StoredChangeset>> {
        Ok(self.entries.read().await.get(&number).cloned())
    }

    async fn put(&self, changeset: StoredChangeset) -> Result<()> {
        self.entries
            .write()
            .await
            .insert(changeset.number, changeset);
        Ok(())
    }
}

/// Keeps every entry in memory and rewrites a JSON file on each change.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    entries: RwLock<Entries>,
}

impl JsonFileStore {
    /// Loads `path` if it exists; a missing file starts an empty store.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let entries = match tokio::fs::read_to_string(&path).await {
            Ok(data) => {
                let list: Vec<StoredChangeset> = serde_json::from_str(&data)
                    .with_context(|| format!("parsing changeset store at {}", path.display()))?;
                list.into_iter().map(|c| (c.number, c)).collect()
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Entries::new(),
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("reading changeset store at {}", path.display()));
            }
        };
        Ok(Self {
            path,
            entries: RwLock::new(entries),
        })
    }

    async fn persist(&self, entries: &Entries) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        let list: Vec<&StoredChangeset> = entries.values().collect();
        let data = serde_json::to_string_pretty(&list)?;
        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, data)
            .await
            .with_context(|| format!("writing {}", tmp.display()))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .with_context(|| format!("replacing {}", self.path.display()))?;
        Ok(())
    }
}

#[async_trait]
impl Store for JsonFileStore {
    async fn latest_number(&self) -> Result<Option<u64>> {
        Ok(latest(&*self.entries.read().await))
    }

    async fn exists(&self, number: u64) -> Result<bool> {
        Ok(self.entries.read().await.contains_key(&number))
    }

    async fn get(&self, number: u64) -> Result<Option<StoredChangeset>> {
        Ok(self.entries.read().await.get(&number).cloned())
    }

    /// Memory only changes once the file has been written.
    async fn put(&self, changeset: StoredChangeset) -> Result<()> {
        let mut entries = self.entries.write().await;
        let mut next = entries.clone();
        next.insert(changeset.number, changeset);
        self.persist(&next).await?;
        *entries = next;
        Ok(())
    }
}
