//! Album DataLoader for batched fetching

use async_graphql::dataloader::Loader;
use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::Arc;
use uuid::Uuid;

use crate::catalog::Catalog;
use crate::models::Album;

/// DataLoader for batching album lookups
#[derive(Clone)]
pub struct AlbumLoader {
    catalog: Catalog,
}

impl AlbumLoader {
    pub fn new(catalog: Catalog) -> Self {
        Self { catalog }
    }
}

impl Loader<Uuid> for AlbumLoader {
    type Value = Arc<Album>;
    type Error = Infallible;

    async fn load(&self, keys: &[Uuid]) -> Result<HashMap<Uuid, Self::Value>, Self::Error> {
        let albums = self.catalog.albums(keys);

        Ok(albums.into_iter().map(|a| (a.id, a)).collect())
    }
}
