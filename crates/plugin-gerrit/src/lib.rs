//! Merged changesets from the Go code review server: polling, storage and
//! the `share cl` command.

pub mod changeset;
pub mod poller;
pub mod share;
pub mod store;

pub use changeset::Changeset;
pub use poller::{CHANGES_URL, GerritPoller};
pub use share::ShareChangeset;
pub use store::{JsonFileStore, MemoryStore, Store, StoredChangeset};
