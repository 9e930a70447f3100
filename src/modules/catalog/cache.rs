//! Typed view over the local key-value store: the persisted-state contract.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use shelf_store::KeyValueStore;

use super::error::CatalogError;
use super::models::{Book, BookRequest, WorkingSet};

/// Book list JSON. Key names are part of the on-disk contract; never rename.
pub const BOOKS_KEY: &str = "our_trees_library_final_v1";
/// Request list JSON.
pub const REQUESTS_KEY: &str = "our_trees_library_requests_final";
/// Plain-text version tag of the last reconciled default set.
pub const VERSION_KEY: &str = "our_trees_db_version";

#[derive(Clone)]
pub struct CatalogCache {
    store: Arc<dyn KeyValueStore>,
}

impl CatalogCache {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Cached books; `Ok(None)` when nothing was ever written.
    pub fn read_books(&self) -> Result<Option<Vec<Book>>, CatalogError> {
        self.read_json(BOOKS_KEY)
    }

    pub fn read_requests(&self) -> Result<Option<Vec<BookRequest>>, CatalogError> {
        self.read_json(REQUESTS_KEY)
    }

    pub fn version_tag(&self) -> Result<Option<String>, CatalogError> {
        Ok(self.store.get(VERSION_KEY)?)
    }

    pub fn write_version_tag(&self, tag: &str) -> Result<(), CatalogError> {
        self.store.set(VERSION_KEY, tag)?;
        tracing::debug!(tag, "version tag stored");
        Ok(())
    }

    pub fn clear_version_tag(&self) -> Result<(), CatalogError> {
        self.store.remove(VERSION_KEY)?;
        Ok(())
    }

    /// Overwrite both lists unconditionally.
    pub fn persist(&self, working_set: &WorkingSet) -> Result<(), CatalogError> {
        self.write_json(BOOKS_KEY, "books", &working_set.books)?;
        self.write_json(REQUESTS_KEY, "requests", &working_set.requests)?;
        tracing::debug!(
            books = working_set.books.len(),
            requests = working_set.requests.len(),
            "working set persisted"
        );
        Ok(())
    }

    fn read_json<T: DeserializeOwned>(&self, key: &'static str) -> Result<Option<T>, CatalogError> {
        match self.store.get(key)? {
            Some(raw) => serde_json::from_str(&raw)
                .map(Some)
                .map_err(|source| CatalogError::CorruptCache { key, source }),
            None => Ok(None),
        }
    }

    fn write_json<T: Serialize>(
        &self,
        key: &'static str,
        what: &'static str,
        value: &T,
    ) -> Result<(), CatalogError> {
        let raw =
            serde_json::to_string(value).map_err(|source| CatalogError::Encode { what, source })?;
        self.store.set(key, &raw)?;
        Ok(())
    }
}
