//! Track DataLoader for batched fetching
//!
//! Playlists reference tracks by id; this loader resolves every track of
//! every playlist in the request with one catalog query.

use async_graphql::dataloader::Loader;
use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::Arc;
use uuid::Uuid;

use crate::catalog::Catalog;
use crate::models::Track;

/// DataLoader for batching track lookups
#[derive(Clone)]
pub struct TrackLoader {
    catalog: Catalog,
}

impl TrackLoader {
    pub fn new(catalog: Catalog) -> Self {
        Self { catalog }
    }
}

impl Loader<Uuid> for TrackLoader {
    type Value = Arc<Track>;
    type Error = Infallible;

    async fn load(&self, keys: &[Uuid]) -> Result<HashMap<Uuid, Self::Value>, Self::Error> {
        let tracks = self.catalog.tracks(keys);

        Ok(tracks.into_iter().map(|t| (t.id, t)).collect())
    }
}
