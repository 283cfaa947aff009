//! Handlers that answer with links.

pub mod godoc;
pub mod library;
pub mod songs;
pub mod xkcd;

pub use godoc::LinkToGoDoc;
pub use library::SearchForLibrary;
pub use songs::Songs;
pub use xkcd::Xkcd;
