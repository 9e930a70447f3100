pub mod cache;
pub mod defaults;
pub mod error;
pub mod ids;
pub mod loader;
pub mod models;
pub mod notice;
pub mod query;
pub mod reconcile;
pub mod remote;
pub mod routes;
pub mod session;
pub mod sync;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use serde_json::{json, Value};
use shelf_authz::{AdminCredentials, AdminSessions};
use shelf_kernel::settings::Settings;
use shelf_kernel::{InitCtx, Module};
use shelf_store::{FileStore, KeyValueStore};
use tokio::sync::RwLock;

use cache::CatalogCache;
use error::{CatalogError, SyncError};
use loader::{SnapshotLoader, SnapshotSource};
use remote::RemoteLibrary;
use routes::CatalogState;
use session::CatalogSession;
use sync::{SyncEndpoint, SyncTrigger};

/// Runtime handles shared by the HTTP handlers and the CLI.
#[derive(Clone)]
pub struct CatalogServices {
    pub session: Arc<RwLock<CatalogSession>>,
    pub loader: Arc<SnapshotLoader>,
    pub sync: Arc<SyncTrigger>,
}

impl CatalogServices {
    /// File-backed cache and the configured remote library.
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let cache_dir = &settings.catalog.cache_dir;
        let store = FileStore::open(cache_dir)
            .with_context(|| format!("failed to open catalog cache at {}", cache_dir.display()))?;
        let remote = Arc::new(
            RemoteLibrary::new(
                &settings.remote.base_url,
                Duration::from_millis(settings.remote.timeout_ms),
            )
            .context("failed to build remote library client")?,
        );

        Ok(Self::assemble(
            Arc::new(store),
            remote.clone(),
            remote,
            Duration::from_millis(settings.catalog.notice_ttl_ms),
        ))
    }

    pub fn assemble(
        store: Arc<dyn KeyValueStore>,
        snapshot: Arc<dyn SnapshotSource>,
        endpoint: Arc<dyn SyncEndpoint>,
        notice_ttl: Duration,
    ) -> Self {
        let cache = CatalogCache::new(store);
        Self {
            session: Arc::new(RwLock::new(CatalogSession::new(cache.clone(), notice_ttl))),
            loader: Arc::new(SnapshotLoader::standard(cache, snapshot)),
            sync: Arc::new(SyncTrigger::new(endpoint)),
        }
    }

    /// Run the snapshot fallback chain and install the result.
    pub async fn load(&self) -> Result<(), CatalogError> {
        let working_set = self.loader.load().await;
        self.session.write().await.install(working_set)
    }

    /// Ask the remote to refresh, then reload the whole working set.
    /// On failure the current working set is left untouched.
    pub async fn resync(&self) -> Result<(), SyncError> {
        self.sync.trigger().await?;
        let working_set = self.loader.load().await;

        let mut session = self.session.write().await;
        session.install(working_set)?;
        session.post_notice("Library synchronised");
        Ok(())
    }
}

pub struct CatalogModule {
    services: CatalogServices,
    admins: Arc<AdminSessions>,
}

impl CatalogModule {
    pub fn new(services: CatalogServices, admins: Arc<AdminSessions>) -> Self {
        Self { services, admins }
    }

    pub fn services(&self) -> &CatalogServices {
        &self.services
    }
}

#[async_trait]
impl Module for CatalogModule {
    fn name(&self) -> &'static str {
        "catalog"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        self.services
            .load()
            .await
            .context("failed to install the initial working set")?;

        let session = self.services.session.read().await;
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            books = session.books().len(),
            requests = session.requests().len(),
            "catalog module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> axum::Router {
        routes::router(CatalogState {
            services: self.services.clone(),
            admins: self.admins.clone(),
        })
    }

    fn openapi(&self) -> Option<Value> {
        Some(openapi_fragment())
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "catalog module started");
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        self.services
            .session
            .read()
            .await
            .commit()
            .context("failed to flush catalog on shutdown")?;
        tracing::info!(module = self.name(), "catalog module stopped");
        Ok(())
    }
}

/// Create the catalog module from settings
pub fn create_module(settings: &Settings) -> anyhow::Result<Arc<dyn Module>> {
    let services = CatalogServices::from_settings(settings)?;
    let admins = Arc::new(AdminSessions::new(AdminCredentials {
        username: settings.auth.admin_username.clone(),
        password: settings.auth.admin_password.clone(),
    }));
    Ok(Arc::new(CatalogModule::new(services, admins)))
}

fn error_response(description: &str) -> Value {
    json!({
        "description": description,
        "content": {
            "application/json": {
                "schema": { "$ref": "#/components/schemas/ErrorResponse" }
            }
        }
    })
}

fn json_response(description: &str, schema: Value) -> Value {
    json!({
        "description": description,
        "content": { "application/json": { "schema": schema } }
    })
}

fn schema_ref(name: &str) -> Value {
    json!({ "$ref": format!("#/components/schemas/{name}") })
}

fn array_of(name: &str) -> Value {
    json!({ "type": "array", "items": schema_ref(name) })
}

fn admin_operation(summary: &str, mut responses: Value) -> Value {
    responses["401"] = error_response("Admin token missing or expired");
    json!({
        "summary": summary,
        "tags": ["Catalog admin"],
        "parameters": [{
            "name": routes::ADMIN_TOKEN_HEADER,
            "in": "header",
            "required": true,
            "schema": { "type": "string", "format": "uuid" }
        }],
        "responses": responses
    })
}

fn public_operation(summary: &str, responses: Value) -> Value {
    json!({ "summary": summary, "tags": ["Catalog"], "responses": responses })
}

fn id_parameter() -> Value {
    json!({ "name": "id", "in": "path", "required": true, "schema": { "type": "integer" } })
}

fn openapi_fragment() -> Value {
    let mut list_books = public_operation(
        "Search, filter, and sort books",
        json!({
            "200": json_response("Matching books", array_of("Book")),
            "400": error_response("Malformed query")
        }),
    );
    list_books["parameters"] = json!([
        { "name": "search", "in": "query", "schema": { "type": "string" } },
        { "name": "ddc", "in": "query", "schema": { "type": "string", "example": "600" } },
        { "name": "sort_by", "in": "query", "schema": { "type": "string", "enum": ["title", "author", "ddc"] } },
        { "name": "order", "in": "query", "schema": { "type": "string", "enum": ["asc", "desc"] } }
    ]);

    let mut get_book = public_operation(
        "Fetch one book",
        json!({
            "200": json_response("The book", schema_ref("Book")),
            "404": error_response("No such book")
        }),
    );
    get_book["parameters"] = json!([id_parameter()]);

    let mut update_book = admin_operation(
        "Update a book's editable fields",
        json!({
            "200": json_response("Updated book", schema_ref("Book")),
            "404": error_response("No such book"),
            "422": error_response("Required fields missing")
        }),
    );
    update_book["requestBody"] = json!({
        "required": true,
        "content": { "application/json": { "schema": schema_ref("BookForm") } }
    });

    let mut create_book = admin_operation(
        "Add a book",
        json!({
            "201": json_response("Created book", schema_ref("Book")),
            "422": error_response("Required fields missing")
        }),
    );
    create_book["requestBody"] = update_book["requestBody"].clone();

    let mut create_request = public_operation(
        "Submit a book request",
        json!({
            "201": json_response("Recorded request", schema_ref("BookRequest")),
            "422": error_response("Required fields missing")
        }),
    );
    create_request["requestBody"] = json!({
        "required": true,
        "content": { "application/json": { "schema": schema_ref("RequestForm") } }
    });

    json!({
        "paths": {
            "/health": {
                "get": public_operation("Catalog health check", json!({
                    "200": { "description": "OK", "content": { "text/plain": { "schema": { "type": "string" } } } }
                }))
            },
            "/books": { "get": list_books, "post": create_book },
            "/books/featured": {
                "get": public_operation("Featured books in list order", json!({
                    "200": json_response("Featured books", array_of("Book"))
                }))
            },
            "/books/{id}": {
                "get": get_book,
                "put": update_book,
                "delete": admin_operation("Delete a book", json!({
                    "204": { "description": "Deleted, or already absent" }
                }))
            },
            "/categories": {
                "get": public_operation("The ten DDC groups", json!({
                    "200": json_response("Categories", array_of("DdcCategory"))
                }))
            },
            "/requests": {
                "get": public_operation("Pending book requests", json!({
                    "200": json_response("Requests", array_of("BookRequest"))
                })),
                "post": create_request
            },
            "/requests/{id}": {
                "delete": admin_operation("Delete a request", json!({
                    "204": { "description": "Deleted, or already absent" }
                }))
            },
            "/requests/{id}/fulfill": {
                "get": admin_operation("Book form prefilled from a request", json!({
                    "200": json_response("Prefilled form", schema_ref("BookForm")),
                    "404": error_response("No such request")
                }))
            },
            "/notice": {
                "get": public_operation("Current transient notice", json!({
                    "200": json_response("Notice", json!({
                        "type": "object",
                        "properties": { "message": { "type": ["string", "null"] } }
                    }))
                }))
            },
            "/session/login": {
                "post": public_operation("Enter admin mode", json!({
                    "200": json_response("Admin token", json!({
                        "type": "object",
                        "properties": { "token": { "type": "string", "format": "uuid" } }
                    })),
                    "401": error_response("Wrong username or password")
                }))
            },
            "/session/logout": {
                "post": admin_operation("Leave admin mode", json!({
                    "204": { "description": "Token revoked" }
                }))
            },
            "/reset": {
                "post": admin_operation("Restore the bundled book list", json!({
                    "204": { "description": "Books reset; requests kept" }
                }))
            },
            "/sync": {
                "post": admin_operation("Refresh the remote snapshot and reload", json!({
                    "200": json_response("Reloaded counts", schema_ref("SyncSummary")),
                    "409": error_response("A sync is already running"),
                    "502": error_response("Remote sync endpoint failed")
                }))
            },
            "/export": {
                "get": admin_operation("Download a backup of books and requests", json!({
                    "200": json_response("Backup document", schema_ref("ExportDocument"))
                }))
            }
        },
        "components": {
            "schemas": {
                "Book": {
                    "type": "object",
                    "properties": {
                        "id": { "type": "integer" },
                        "title": { "type": "string" },
                        "author": { "type": "string" },
                        "ddc": { "type": "string", "description": "DDC hundreds group, e.g. \"600\"" },
                        "isFeatured": { "type": "boolean" },
                        "status": { "type": "string" },
                        "year": { "type": "string" },
                        "coverUrl": { "type": "string" },
                        "pdfUrl": { "type": "string" }
                    },
                    "required": ["id", "title", "author", "ddc", "status"]
                },
                "BookForm": {
                    "type": "object",
                    "properties": {
                        "title": { "type": "string" },
                        "author": { "type": "string" },
                        "ddc": { "type": "string" },
                        "isFeatured": { "type": "boolean" },
                        "year": { "type": "string" },
                        "coverUrl": { "type": "string" },
                        "pdfUrl": { "type": "string" }
                    },
                    "required": ["title", "author"]
                },
                "BookRequest": {
                    "type": "object",
                    "properties": {
                        "id": { "type": "integer" },
                        "title": { "type": "string" },
                        "author": { "type": "string" },
                        "requester": { "type": "string" },
                        "date": { "type": "string" }
                    },
                    "required": ["id", "title", "author", "requester", "date"]
                },
                "RequestForm": {
                    "type": "object",
                    "properties": {
                        "title": { "type": "string" },
                        "author": { "type": "string" },
                        "requester": { "type": "string" }
                    },
                    "required": ["title", "author", "requester"]
                },
                "DdcCategory": {
                    "type": "object",
                    "properties": {
                        "code": { "type": "string" },
                        "label": { "type": "string" },
                        "iconKey": { "type": "string" },
                        "color": { "type": "string" }
                    }
                },
                "SyncSummary": {
                    "type": "object",
                    "properties": {
                        "books": { "type": "integer" },
                        "requests": { "type": "integer" }
                    }
                },
                "ExportDocument": {
                    "type": "object",
                    "properties": {
                        "books": array_of("Book"),
                        "requests": array_of("BookRequest"),
                        "exportDate": { "type": "string", "format": "date-time" }
                    }
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::defaults::default_books;
    use super::models::Book;
    use super::*;
    use shelf_store::MemoryStore;

    struct NoRemote;

    #[async_trait]
    impl SnapshotSource for NoRemote {
        fn name(&self) -> &'static str {
            "remote"
        }

        async fn fetch(&self) -> Result<Vec<Book>, error::SnapshotError> {
            Err(error::SnapshotError::Missing)
        }
    }

    #[async_trait]
    impl SyncEndpoint for NoRemote {
        async fn request_refresh(&self) -> Result<(), SyncError> {
            Err(SyncError::Unreachable("offline".into()))
        }
    }

    fn services() -> CatalogServices {
        CatalogServices::assemble(
            Arc::new(MemoryStore::new()),
            Arc::new(NoRemote),
            Arc::new(NoRemote),
            Duration::from_secs(3),
        )
    }

    #[tokio::test]
    async fn load_installs_defaults_offline() {
        let services = services();
        services.load().await.unwrap();

        let session = services.session.read().await;
        assert!(session.is_loaded());
        assert_eq!(session.books(), &default_books()[..]);
    }

    #[tokio::test]
    async fn failed_resync_leaves_working_set_alone() {
        let services = services();
        services.load().await.unwrap();
        services.session.write().await.delete_book(1).unwrap();

        let result = services.resync().await;
        assert!(matches!(result, Err(SyncError::Unreachable(_))));
        assert_eq!(services.session.read().await.books().len(), 7);
    }

    #[test]
    fn openapi_fragment_lists_every_route() {
        let fragment = openapi_fragment();
        let paths = fragment["paths"].as_object().unwrap();
        for path in [
            "/books",
            "/books/featured",
            "/books/{id}",
            "/categories",
            "/requests",
            "/requests/{id}",
            "/requests/{id}/fulfill",
            "/notice",
            "/session/login",
            "/session/logout",
            "/reset",
            "/sync",
            "/export",
        ] {
            assert!(paths.contains_key(path), "missing {path}");
        }
        assert!(fragment["paths"]["/sync"]["post"]["responses"]["401"].is_object());
    }
}
