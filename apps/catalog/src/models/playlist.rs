//! Playlist model

use keyfetch_fetching::Entity;
use serde::Serialize;
use uuid::Uuid;

/// A user playlist
///
/// Track ids are kept in play order and may repeat.
#[derive(Debug, Clone, Serialize)]
pub struct Playlist {
    pub id: Uuid,
    pub name: String,
    pub track_ids: Vec<Uuid>,
}

impl Entity for Playlist {
    const TYPE_NAME: &'static str = "Playlist";
}
