//! Albums-by-Artist DataLoader for batched fetching

use async_graphql::dataloader::Loader;
use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::Arc;
use uuid::Uuid;

use crate::catalog::Catalog;
use crate::models::Album;

/// DataLoader for batching albums-by-artist lookups
#[derive(Clone)]
pub struct AlbumsByArtistLoader {
    catalog: Catalog,
}

impl AlbumsByArtistLoader {
    pub fn new(catalog: Catalog) -> Self {
        Self { catalog }
    }
}

impl Loader<Uuid> for AlbumsByArtistLoader {
    type Value = Vec<Arc<Album>>;
    type Error = Infallible;

    async fn load(&self, keys: &[Uuid]) -> Result<HashMap<Uuid, Self::Value>, Self::Error> {
        let albums = self.catalog.albums_by_artists(keys);

        let mut result: HashMap<Uuid, Self::Value> = HashMap::new();
        for album in albums {
            result.entry(album.artist_id).or_default().push(album);
        }

        // Ensure all requested keys have an entry (even if empty)
        for key in keys {
            result.entry(*key).or_default();
        }

        Ok(result)
    }
}
