//! Artist DataLoader for batched fetching
//!
//! This loader batches multiple artist ID lookups into a single catalog query,
//! solving the N+1 problem when loading artists for multiple albums or tracks.

use async_graphql::dataloader::Loader;
use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::Arc;
use uuid::Uuid;

use crate::catalog::Catalog;
use crate::models::Artist;

/// DataLoader for batching artist lookups
#[derive(Clone)]
pub struct ArtistLoader {
    catalog: Catalog,
}

impl ArtistLoader {
    pub fn new(catalog: Catalog) -> Self {
        Self { catalog }
    }
}

impl Loader<Uuid> for ArtistLoader {
    type Value = Arc<Artist>;
    type Error = Infallible;

    async fn load(&self, keys: &[Uuid]) -> Result<HashMap<Uuid, Self::Value>, Self::Error> {
        let artists = self.catalog.artists(keys);

        Ok(artists.into_iter().map(|a| (a.id, a)).collect())
    }
}
