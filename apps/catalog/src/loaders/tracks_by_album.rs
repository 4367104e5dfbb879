//! Tracks-by-Album DataLoader for batched fetching
//!
//! This loader batches multiple album ID lookups into a single catalog query,
//! returning all tracks for each album. This solves the N+1 problem when
//! loading tracks for multiple albums.

use async_graphql::dataloader::Loader;
use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::Arc;
use uuid::Uuid;

use crate::catalog::Catalog;
use crate::models::Track;

/// DataLoader for batching tracks-by-album lookups
#[derive(Clone)]
pub struct TracksByAlbumLoader {
    catalog: Catalog,
}

impl TracksByAlbumLoader {
    pub fn new(catalog: Catalog) -> Self {
        Self { catalog }
    }
}

impl Loader<Uuid> for TracksByAlbumLoader {
    type Value = Vec<Arc<Track>>;
    type Error = Infallible;

    async fn load(&self, keys: &[Uuid]) -> Result<HashMap<Uuid, Self::Value>, Self::Error> {
        let tracks = self.catalog.tracks_by_albums(keys);

        // Group tracks by album_id
        let mut result: HashMap<Uuid, Self::Value> = HashMap::new();
        for track in tracks {
            if let Some(album_id) = track.album_id {
                result.entry(album_id).or_default().push(track);
            }
        }

        for key in keys {
            result.entry(*key).or_default();
        }

        Ok(result)
    }
}
