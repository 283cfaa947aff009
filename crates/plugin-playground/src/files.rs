use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;

/// Metadata the chat platform keeps about an uploaded file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct FileInfo {
    pub id: String,
    #[serde(default)]
    pub lines: u32,
    #[serde(default)]
    pub pretty_type: String,
    #[serde(default, rename = "url_private_download")]
    pub download_url: String,
}

impl FileInfo {
    /// Worth sharing: real code of at least six lines.
    pub fn is_shareable(&self) -> bool {
        self.lines >= 6 && self.pretty_type != "Plain Text"
    }
}

/// Access to uploaded files.
#[async_trait]
pub trait FileFetcher: Send + Sync {
    async fn file_info(&self, id: &str) -> Result<FileInfo>;
    async fn download(&self, info: &FileInfo) -> Result<Vec<u8>>;
}
