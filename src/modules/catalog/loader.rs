//! Session start: pick a book snapshot, attach cached requests, reconcile defaults.

use std::sync::Arc;

use async_trait::async_trait;

use super::cache::CatalogCache;
use super::defaults::{default_books, DATA_VERSION};
use super::error::{CatalogError, SnapshotError};
use super::models::{Book, BookRequest, WorkingSet};
use super::reconcile::reconcile;

/// A place a full book list can come from.
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    fn name(&self) -> &'static str;

    async fn fetch(&self) -> Result<Vec<Book>, SnapshotError>;
}

/// Books last mirrored to the local cache.
pub struct CachedSnapshot {
    cache: CatalogCache,
}

impl CachedSnapshot {
    pub fn new(cache: CatalogCache) -> Self {
        Self { cache }
    }
}

#[async_trait]
impl SnapshotSource for CachedSnapshot {
    fn name(&self) -> &'static str {
        "cache"
    }

    async fn fetch(&self) -> Result<Vec<Book>, SnapshotError> {
        self.cache.read_books()?.ok_or(SnapshotError::Missing)
    }
}

/// The factory list compiled into the binary. Never fails.
pub struct BundledDefaults;

#[async_trait]
impl SnapshotSource for BundledDefaults {
    fn name(&self) -> &'static str {
        "defaults"
    }

    async fn fetch(&self) -> Result<Vec<Book>, SnapshotError> {
        Ok(default_books())
    }
}

/// Tries each source in order and builds the initial working set.
pub struct SnapshotLoader {
    sources: Vec<Arc<dyn SnapshotSource>>,
    cache: CatalogCache,
}

impl SnapshotLoader {
    pub fn new(cache: CatalogCache, sources: Vec<Arc<dyn SnapshotSource>>) -> Self {
        Self { sources, cache }
    }

    /// `remote`, then the cache, then the bundled defaults.
    pub fn standard(cache: CatalogCache, remote: Arc<dyn SnapshotSource>) -> Self {
        let sources: Vec<Arc<dyn SnapshotSource>> = vec![
            remote,
            Arc::new(CachedSnapshot::new(cache.clone())),
            Arc::new(BundledDefaults),
        ];
        Self::new(cache, sources)
    }

    /// Always yields a usable working set; any failure degrades to the bundled defaults.
    pub async fn load(&self) -> WorkingSet {
        match self.try_load().await {
            Ok(working_set) => working_set,
            Err(e) => {
                tracing::error!(error = %e, "catalog load failed; using bundled defaults");
                WorkingSet {
                    books: default_books(),
                    requests: Vec::new(),
                }
            }
        }
    }

    async fn try_load(&self) -> Result<WorkingSet, CatalogError> {
        let books = self.first_snapshot().await;
        let requests = self.cached_requests();

        let stored_tag = self.cache.version_tag()?;
        let reconciled = reconcile(books, stored_tag.as_deref(), DATA_VERSION, &default_books());
        if reconciled.tag_updated {
            self.cache.write_version_tag(DATA_VERSION)?;
        }

        Ok(WorkingSet {
            books: reconciled.books,
            requests,
        })
    }

    async fn first_snapshot(&self) -> Vec<Book> {
        for source in &self.sources {
            match source.fetch().await {
                Ok(books) => {
                    tracing::info!(source = source.name(), count = books.len(), "books loaded");
                    return books;
                }
                Err(SnapshotError::Missing) => {
                    tracing::debug!(source = source.name(), "no snapshot; trying next source");
                }
                Err(e) => {
                    tracing::warn!(source = source.name(), error = %e, "snapshot source failed");
                }
            }
        }

        tracing::warn!("every snapshot source failed; using bundled defaults");
        default_books()
    }

    fn cached_requests(&self) -> Vec<BookRequest> {
        match self.cache.read_requests() {
            Ok(requests) => requests.unwrap_or_default(),
            Err(e) => {
                tracing::warn!(error = %e, "ignoring unreadable request cache");
                Vec::new()
            }
        }
    }
}
