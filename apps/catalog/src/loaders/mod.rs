//! DataLoader implementations for the catalog
//!
//! Each loader batches many id lookups into a single catalog query. They are
//! wrapped in [`BatchLoader`](keyfetch_fetching::BatchLoader) and registered
//! with a factory, so every request gets its own instances.
//!
//! There are two types of loaders:
//! - Single-entity loaders: one record per id
//! - Collection loaders: `Vec` of related records per parent id

mod album;
mod albums_by_artist;
mod artist;
mod track;
mod tracks_by_album;

pub use album::AlbumLoader;
pub use albums_by_artist::AlbumsByArtistLoader;
pub use artist::ArtistLoader;
pub use track::TrackLoader;
pub use tracks_by_album::TracksByAlbumLoader;
