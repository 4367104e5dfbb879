//! Catalog report
//!
//! Executes the schema the way a query executor would: sibling fields of an
//! object run concurrently, so their keys land in the same loader batches.

use futures_util::future::try_join_all;
use keyfetch_fetching::{FieldValue, RequestContext, Schema};
use serde_json::{Map, Value};

use crate::error::CatalogResult;
use crate::render::render;

const ALBUM_FIELDS: &[&str] = &["title", "releaseYear", "artist", "tracks"];
const PLAYLIST_FIELDS: &[&str] = &["name", "tracks"];

/// Execute `fields` of one parent concurrently and render them as an object
pub async fn select(
    schema: &Schema,
    request: &RequestContext,
    type_name: &str,
    parent: &FieldValue,
    fields: &[&str],
) -> CatalogResult<Value> {
    let values = try_join_all(
        fields
            .iter()
            .map(|field| schema.execute_field(request, type_name, field, parent.clone())),
    )
    .await?;

    let mut object = Map::with_capacity(fields.len());
    for (field, value) in fields.iter().zip(&values) {
        object.insert(field.to_string(), render(field, value)?);
    }
    Ok(Value::Object(object))
}

/// Execute `fields` for every item of a list result
pub async fn select_each(
    schema: &Schema,
    request: &RequestContext,
    type_name: &str,
    parents: &FieldValue,
    fields: &[&str],
) -> CatalogResult<Value> {
    let parents = parents.as_list().unwrap_or_default();
    let items = try_join_all(
        parents
            .iter()
            .map(|parent| select(schema, request, type_name, parent, fields)),
    )
    .await?;
    Ok(Value::Array(items))
}

/// Featured albums and playlists with their relationships resolved
pub async fn catalog_report(schema: &Schema, request: &RequestContext) -> CatalogResult<Value> {
    let (albums, playlists) = tokio::try_join!(
        schema.execute_field(request, "Query", "featuredAlbums", FieldValue::Null),
        schema.execute_field(request, "Query", "playlists", FieldValue::Null),
    )?;

    let (albums, playlists) = tokio::try_join!(
        select_each(schema, request, "Album", &albums, ALBUM_FIELDS),
        select_each(schema, request, "Playlist", &playlists, PLAYLIST_FIELDS),
    )?;

    tracing::debug!(
        albums = albums.as_array().map_or(0, Vec::len),
        playlists = playlists.as_array().map_or(0, Vec::len),
        "Catalog report rendered"
    );

    let mut report = Map::new();
    report.insert("featuredAlbums".to_string(), albums);
    report.insert("playlists".to_string(), playlists);
    Ok(Value::Object(report))
}
