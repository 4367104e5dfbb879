//! Artist model

use keyfetch_fetching::Entity;
use serde::Serialize;
use uuid::Uuid;

/// Artist record
#[derive(Debug, Clone, Serialize)]
pub struct Artist {
    /// Unique artist identifier
    pub id: Uuid,

    /// Artist name
    pub name: String,

    /// Sort name for alphabetical ordering
    pub sort_name: Option<String>,

    /// Genre tags
    pub genres: Vec<String>,
}

impl Entity for Artist {
    const TYPE_NAME: &'static str = "Artist";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_artist_serialization() {
        let artist = Artist {
            id: Uuid::new_v4(),
            name: "Test Artist".to_string(),
            sort_name: Some("Artist, Test".to_string()),
            genres: vec!["Rock".to_string(), "Alternative".to_string()],
        };

        let json = serde_json::to_value(&artist).unwrap();
        assert_eq!(json["name"], "Test Artist");
        assert_eq!(json["genres"][1], "Alternative");
    }
}
