//! Album model

use keyfetch_fetching::Entity;
use serde::Serialize;
use uuid::Uuid;

/// Album record
#[derive(Debug, Clone, Serialize)]
pub struct Album {
    pub id: Uuid,
    pub title: String,

    /// Primary artist
    pub artist_id: Uuid,

    pub release_year: Option<i32>,
}

impl Entity for Album {
    const TYPE_NAME: &'static str = "Album";
}
