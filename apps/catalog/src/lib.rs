//! Music catalog demo for keyfetch
//!
//! Wires an in-memory catalog through batched field resolution: relationship
//! fields resolve ids, and async-graphql dataloaders fetch the records in
//! one catalog query per loader and batch.

pub mod catalog;
pub mod config;
pub mod error;
pub mod loaders;
pub mod middleware;
pub mod models;
pub mod render;
pub mod report;
pub mod schema;

pub use catalog::{Catalog, CatalogBuilder};
pub use config::Config;
pub use error::{CatalogError, CatalogResult};
pub use report::catalog_report;
pub use schema::build_schema;
