//! Track model

use keyfetch_fetching::Entity;
use serde::Serialize;
use uuid::Uuid;

/// Track record
#[derive(Debug, Clone, Serialize)]
pub struct Track {
    /// Unique track identifier
    pub id: Uuid,

    /// Track title
    pub title: String,

    /// Album this track belongs to
    pub album_id: Option<Uuid>,

    /// Performing artist
    pub artist_id: Uuid,

    /// Duration in milliseconds
    pub duration_ms: i32,

    /// Position on the album
    pub track_number: Option<i32>,
}

impl Entity for Track {
    const TYPE_NAME: &'static str = "Track";
}

impl Track {
    /// Duration formatted as `m:ss`
    pub fn formatted_duration(&self) -> String {
        let seconds = self.duration_ms / 1000;
        format!("{}:{:02}", seconds / 60, seconds % 60)
    }
}
