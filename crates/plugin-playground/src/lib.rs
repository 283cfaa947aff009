//! Sharing code snippets through the Go playground.

pub mod client;
pub mod files;
pub mod suggest;

pub use client::Playground;
pub use files::{FileFetcher, FileInfo};
pub use suggest::SuggestPlayground;
