//! In-memory music catalog
//!
//! The catalog stands in for a database: it is immutable once built and
//! counts every lookup the loaders make, so the effect of batching can be
//! observed.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use uuid::Uuid;

use crate::models::{Album, Artist, Playlist, Track};

#[derive(Debug, Default)]
struct CatalogInner {
    artists: HashMap<Uuid, Arc<Artist>>,
    albums: HashMap<Uuid, Arc<Album>>,
    tracks: HashMap<Uuid, Arc<Track>>,
    playlists: Vec<Arc<Playlist>>,
    featured: Vec<Uuid>,
    queries: AtomicUsize,
}

/// Shared handle to the catalog
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    inner: Arc<CatalogInner>,
}

impl Catalog {
    pub fn builder() -> CatalogBuilder {
        CatalogBuilder::default()
    }

    /// Artists with the given ids
    pub fn artists(&self, ids: &[Uuid]) -> Vec<Arc<Artist>> {
        self.record_query();
        ids.iter()
            .filter_map(|id| self.inner.artists.get(id).cloned())
            .collect()
    }

    /// Albums with the given ids
    pub fn albums(&self, ids: &[Uuid]) -> Vec<Arc<Album>> {
        self.record_query();
        ids.iter()
            .filter_map(|id| self.inner.albums.get(id).cloned())
            .collect()
    }

    /// Tracks with the given ids
    pub fn tracks(&self, ids: &[Uuid]) -> Vec<Arc<Track>> {
        self.record_query();
        ids.iter()
            .filter_map(|id| self.inner.tracks.get(id).cloned())
            .collect()
    }

    /// Albums whose primary artist is one of `artist_ids`, oldest first
    pub fn albums_by_artists(&self, artist_ids: &[Uuid]) -> Vec<Arc<Album>> {
        self.record_query();
        let mut albums: Vec<_> = self
            .inner
            .albums
            .values()
            .filter(|album| artist_ids.contains(&album.artist_id))
            .cloned()
            .collect();
        albums.sort_by(|a, b| {
            a.release_year
                .cmp(&b.release_year)
                .then_with(|| a.title.cmp(&b.title))
        });
        albums
    }

    /// Tracks on any of `album_ids`, in track number order
    pub fn tracks_by_albums(&self, album_ids: &[Uuid]) -> Vec<Arc<Track>> {
        self.record_query();
        let mut tracks: Vec<_> = self
            .inner
            .tracks
            .values()
            .filter(|track| {
                track
                    .album_id
                    .is_some_and(|album_id| album_ids.contains(&album_id))
            })
            .cloned()
            .collect();
        tracks.sort_by_key(|track| track.track_number);
        tracks
    }

    /// Albums highlighted on the front page
    pub fn featured(&self) -> &[Uuid] {
        &self.inner.featured
    }

    pub fn playlists(&self) -> &[Arc<Playlist>] {
        &self.inner.playlists
    }

    /// Number of lookups made so far
    pub fn query_count(&self) -> usize {
        self.inner.queries.load(Ordering::SeqCst)
    }

    fn record_query(&self) {
        self.inner.queries.fetch_add(1, Ordering::SeqCst);
    }

    /// A small catalog for the demo and tests
    pub fn sample() -> Self {
        let mut builder = Self::builder();

        let radiohead = builder.artist("Radiohead", Some("Radiohead"), &["Alternative", "Rock"]);
        let portishead = builder.artist("Portishead", Some("Portishead"), &["Trip Hop"]);

        let ok_computer = builder.album("OK Computer", radiohead, Some(1997));
        let kid_a = builder.album("Kid A", radiohead, Some(2000));
        let dummy = builder.album("Dummy", portishead, Some(1994));

        let airbag = builder.track("Airbag", ok_computer, radiohead, 284_000, 1);
        let paranoid = builder.track("Paranoid Android", ok_computer, radiohead, 387_000, 2);
        builder.track("Everything in Its Right Place", kid_a, radiohead, 251_000, 1);
        let idioteque = builder.track("Idioteque", kid_a, radiohead, 309_000, 8);
        let mysterons = builder.track("Mysterons", dummy, portishead, 302_000, 1);
        let glory_box = builder.track("Glory Box", dummy, portishead, 306_000, 11);

        builder.playlist(
            "Late Night",
            &[glory_box, paranoid, mysterons, paranoid, idioteque],
        );
        builder.playlist("Openers", &[airbag, mysterons]);

        builder.feature(&[ok_computer, dummy, kid_a, ok_computer]);
        builder.build()
    }
}

/// Builder for [`Catalog`]
#[derive(Debug, Default)]
pub struct CatalogBuilder {
    inner: CatalogInner,
}

impl CatalogBuilder {
    /// Add an artist, returning its id
    pub fn artist(&mut self, name: &str, sort_name: Option<&str>, genres: &[&str]) -> Uuid {
        let artist = Artist {
            id: Uuid::new_v4(),
            name: name.to_string(),
            sort_name: sort_name.map(str::to_string),
            genres: genres.iter().map(|genre| genre.to_string()).collect(),
        };
        let id = artist.id;
        self.inner.artists.insert(id, Arc::new(artist));
        id
    }

    /// Add an album, returning its id
    pub fn album(&mut self, title: &str, artist_id: Uuid, release_year: Option<i32>) -> Uuid {
        let album = Album {
            id: Uuid::new_v4(),
            title: title.to_string(),
            artist_id,
            release_year,
        };
        let id = album.id;
        self.inner.albums.insert(id, Arc::new(album));
        id
    }

    /// Add an album track, returning its id
    pub fn track(
        &mut self,
        title: &str,
        album_id: Uuid,
        artist_id: Uuid,
        duration_ms: i32,
        track_number: i32,
    ) -> Uuid {
        let track = Track {
            id: Uuid::new_v4(),
            title: title.to_string(),
            album_id: Some(album_id),
            artist_id,
            duration_ms,
            track_number: Some(track_number),
        };
        let id = track.id;
        self.inner.tracks.insert(id, Arc::new(track));
        id
    }

    /// Add a track that is not on any album
    pub fn single(&mut self, title: &str, artist_id: Uuid, duration_ms: i32) -> Uuid {
        let track = Track {
            id: Uuid::new_v4(),
            title: title.to_string(),
            album_id: None,
            artist_id,
            duration_ms,
            track_number: None,
        };
        let id = track.id;
        self.inner.tracks.insert(id, Arc::new(track));
        id
    }

    /// Add a playlist, returning its id
    pub fn playlist(&mut self, name: &str, track_ids: &[Uuid]) -> Uuid {
        let playlist = Playlist {
            id: Uuid::new_v4(),
            name: name.to_string(),
            track_ids: track_ids.to_vec(),
        };
        let id = playlist.id;
        self.inner.playlists.push(Arc::new(playlist));
        id
    }

    /// Append albums to the featured list
    pub fn feature(&mut self, album_ids: &[Uuid]) {
        self.inner.featured.extend_from_slice(album_ids);
    }

    pub fn build(self) -> Catalog {
        Catalog {
            inner: Arc::new(self.inner),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookups_return_shared_records() {
        let mut builder = Catalog::builder();
        let artist = builder.artist("Test Artist", None, &[]);
        let catalog = builder.build();

        let first = catalog.artists(&[artist]);
        let second = catalog.artists(&[artist, Uuid::new_v4()]);

        assert_eq!(second.len(), 1);
        assert!(Arc::ptr_eq(&first[0], &second[0]));
        assert_eq!(catalog.query_count(), 2);
    }

    #[test]
    fn test_tracks_by_albums_are_ordered() {
        let mut builder = Catalog::builder();
        let artist = builder.artist("Test Artist", None, &[]);
        let album = builder.album("Test Album", artist, None);
        builder.track("Second", album, artist, 1_000, 2);
        builder.track("First", album, artist, 1_000, 1);
        builder.single("Loose", artist, 1_000);
        let catalog = builder.build();

        let titles: Vec<_> = catalog
            .tracks_by_albums(&[album])
            .iter()
            .map(|track| track.title.clone())
            .collect();

        assert_eq!(titles, vec!["First", "Second"]);
    }

    #[test]
    fn test_sample_catalog() {
        let catalog = Catalog::sample();

        assert_eq!(catalog.featured().len(), 4);
        assert_eq!(catalog.playlists().len(), 2);
        assert_eq!(catalog.albums(catalog.featured()).len(), 4);
    }
}
