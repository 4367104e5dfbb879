//! Catalog models
//!
//! Every model is shared as `Arc<T>` once it is in the catalog, so the same
//! artist reached from two albums is the same value.

mod album;
mod artist;
mod playlist;
mod track;

pub use album::Album;
pub use artist::Artist;
pub use playlist::Playlist;
pub use track::Track;
