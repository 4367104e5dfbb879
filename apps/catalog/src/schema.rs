//! Catalog schema definition
//!
//! Relationship fields resolve to ids and hand them to a batching loader:
//! - `Album.artist`, `Track.artist`, `Track.album` load one record per id
//! - `Album.tracks`, `Artist.albums` load a collection per id
//! - `Query.featuredAlbums`, `Playlist.tracks` turn id lists into distinct records

use std::sync::Arc;

use async_graphql::dataloader::Loader;
use keyfetch_fetching::{
    BatchLoader, Entity, FetchError, FetchResult, FieldDefinition, FieldValue,
    LoaderRegistry, ObjectTypeBuilder, ResolverContext, Schema, SchemaBuilder, SchemaError,
    TypeRef,
};
use keyfetch_shared_config::BatchingConfig;
use uuid::Uuid;

use crate::catalog::Catalog;
use crate::loaders::{
    AlbumLoader, AlbumsByArtistLoader, ArtistLoader, TrackLoader, TracksByAlbumLoader,
};
use crate::middleware::FieldTiming;
use crate::models::{Album, Artist, Playlist, Track};

pub type ArtistBatch = BatchLoader<Uuid, ArtistLoader>;
pub type AlbumBatch = BatchLoader<Uuid, AlbumLoader>;
pub type TrackBatch = BatchLoader<Uuid, TrackLoader>;
pub type AlbumsByArtistBatch = BatchLoader<Uuid, AlbumsByArtistLoader>;
pub type TracksByAlbumBatch = BatchLoader<Uuid, TracksByAlbumLoader>;

/// Build the catalog schema
///
/// Every request created from the schema gets its own loader instances,
/// configured with `batching`.
pub fn build_schema(catalog: Catalog, batching: &BatchingConfig) -> Result<Schema, SchemaError> {
    let registry = LoaderRegistry::new()
        .register_with(batched(&catalog, batching, ArtistLoader::new))
        .register_with(batched(&catalog, batching, AlbumLoader::new))
        .register_with(batched(&catalog, batching, TrackLoader::new))
        .register_with(batched(&catalog, batching, AlbumsByArtistLoader::new))
        .register_with(batched(&catalog, batching, TracksByAlbumLoader::new));

    let query = query_type(&catalog, &registry);
    let artist = artist_type(&registry);
    let album = album_type(&registry);
    let track = track_type(&registry);
    let playlist = playlist_type(&registry);

    SchemaBuilder::new(registry)
        .object(query)
        .object(artist)
        .object(album)
        .object(track)
        .object(playlist)
        .build()
}

/// Factory creating a configured batch loader over the catalog
fn batched<L, F>(
    catalog: &Catalog,
    batching: &BatchingConfig,
    create: F,
) -> impl Fn() -> BatchLoader<Uuid, L> + Send + Sync + 'static
where
    L: Loader<Uuid>,
    F: Fn(Catalog) -> L + Send + Sync + 'static,
{
    let catalog = catalog.clone();
    let batching = batching.clone();
    move || BatchLoader::with_config(create(catalog.clone()), &batching)
}

fn query_type(catalog: &Catalog, registry: &LoaderRegistry) -> ObjectTypeBuilder {
    let featured = catalog.clone();
    let playlists = catalog.clone();

    ObjectTypeBuilder::new("Query")
        .try_field(
            FieldDefinition::new("featuredAlbums", TypeRef::list(TypeRef::named("ID")))
                .resolve_with(move |_| {
                    let ids = ids(featured.featured());
                    async move { Ok(ids) }
                })
                .use_middleware("timing", FieldTiming)
                .and_then(|field| field.use_loader::<AlbumBatch>(registry)),
        )
        .try_field(
            FieldDefinition::new("playlists", TypeRef::list(TypeRef::named(Playlist::TYPE_NAME)))
                .resolve_with(move |_| {
                    let items = FieldValue::list(
                        playlists
                            .playlists()
                            .iter()
                            .map(|playlist| FieldValue::shared(Arc::clone(playlist))),
                    );
                    async move { Ok(items) }
                })
                .use_middleware("timing", FieldTiming),
        )
}

fn artist_type(registry: &LoaderRegistry) -> ObjectTypeBuilder {
    ObjectTypeBuilder::new(Artist::TYPE_NAME)
        .field(from_parent("name", string(), |artist: &Artist| {
            FieldValue::owned_any(artist.name.clone())
        }))
        .field(from_parent(
            "genres",
            TypeRef::list(string()),
            |artist: &Artist| {
                FieldValue::list(artist.genres.iter().cloned().map(FieldValue::owned_any))
            },
        ))
        .try_field(
            from_parent("albums", id(), |artist: &Artist| {
                FieldValue::owned_any(artist.id)
            })
            .use_loader::<AlbumsByArtistBatch>(registry),
        )
}

fn album_type(registry: &LoaderRegistry) -> ObjectTypeBuilder {
    ObjectTypeBuilder::new(Album::TYPE_NAME)
        .field(from_parent("title", string(), |album: &Album| {
            FieldValue::owned_any(album.title.clone())
        }))
        .field(from_parent(
            "releaseYear",
            TypeRef::named("Int"),
            |album: &Album| album.release_year.map_or(FieldValue::Null, FieldValue::owned_any),
        ))
        .try_field(
            from_parent("artist", id(), |album: &Album| {
                FieldValue::owned_any(album.artist_id)
            })
            .use_loader::<ArtistBatch>(registry),
        )
        .try_field(
            from_parent("tracks", id(), |album: &Album| FieldValue::owned_any(album.id))
                .use_loader::<TracksByAlbumBatch>(registry),
        )
}

fn track_type(registry: &LoaderRegistry) -> ObjectTypeBuilder {
    ObjectTypeBuilder::new(Track::TYPE_NAME)
        .field(from_parent("title", string(), |track: &Track| {
            FieldValue::owned_any(track.title.clone())
        }))
        .field(from_parent("duration", string(), |track: &Track| {
            FieldValue::owned_any(track.formatted_duration())
        }))
        // Singles have no album; the null passes through the loader untouched.
        .try_field(
            from_parent("album", id(), |track: &Track| {
                track.album_id.map_or(FieldValue::Null, FieldValue::owned_any)
            })
            .use_loader::<AlbumBatch>(registry),
        )
        .try_field(
            from_parent("artist", id(), |track: &Track| {
                FieldValue::owned_any(track.artist_id)
            })
            .use_loader::<ArtistBatch>(registry),
        )
}

fn playlist_type(registry: &LoaderRegistry) -> ObjectTypeBuilder {
    ObjectTypeBuilder::new(Playlist::TYPE_NAME)
        .field(from_parent("name", string(), |playlist: &Playlist| {
            FieldValue::owned_any(playlist.name.clone())
        }))
        // Each track once, in order of first appearance.
        .try_field(
            from_parent("tracks", TypeRef::list(id()), |playlist: &Playlist| {
                ids(&playlist.track_ids)
            })
            .use_loader::<TrackBatch>(registry),
        )
}

/// A field computed from its parent entity
fn from_parent<T, F>(name: &str, output: TypeRef, project: F) -> FieldDefinition
where
    T: Entity,
    F: Fn(&T) -> FieldValue + Send + Sync + 'static,
{
    FieldDefinition::new(name, output).resolve_with(move |ctx| {
        let value = parent::<T>(&ctx).map(|parent| project(parent.as_ref()));
        async move { value }
    })
}

fn parent<T: Entity>(ctx: &ResolverContext) -> FetchResult<Arc<T>> {
    ctx.parent_as::<T>().ok_or_else(|| {
        FetchError::resolver(format!(
            "`{}` expects a parent of type {}",
            ctx.field_name(),
            T::TYPE_NAME
        ))
    })
}

fn ids(ids: &[Uuid]) -> FieldValue {
    FieldValue::list(ids.iter().copied().map(FieldValue::owned_any))
}

fn id() -> TypeRef {
    TypeRef::named("ID")
}

fn string() -> TypeRef {
    TypeRef::named("String")
}
