use shelf_store::StoreError;
use thiserror::Error;

/// Failures of catalog mutations and cache access.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("book {0} not found")]
    BookNotFound(i64),

    #[error("request {0} not found")]
    RequestNotFound(i64),

    #[error("cached value under '{key}' is corrupt: {source}")]
    CorruptCache {
        key: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode {what}: {source}")]
    Encode {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Why a snapshot source could not supply a book list.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("no snapshot available")]
    Missing,

    #[error("remote snapshot unreachable: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("remote snapshot answered {0}")]
    Status(reqwest::StatusCode),

    #[error("snapshot is malformed: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

/// Failures of the user-initiated resync.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("a sync is already in progress")]
    InFlight,

    #[error("sync endpoint unreachable: {0}")]
    Unreachable(String),

    #[error("sync endpoint answered {0}")]
    Rejected(reqwest::StatusCode),

    #[error("sync succeeded but reloading the catalog failed: {0}")]
    Reload(#[from] CatalogError),
}
