//! HTTP surface of the catalog, mounted under `/api/catalog`.

mod admin;

pub use admin::{Admin, ADMIN_TOKEN_HEADER};

use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;
use shelf_authz::AdminSessions;
use shelf_http::error::AppError;

use super::defaults::DDC_CATEGORIES;
use super::error::{CatalogError, SyncError};
use super::models::{Book, BookRequest, DdcCategory, NewBookForm, NewRequestForm};
use super::query::CatalogQuery;
use super::CatalogServices;

/// Suggested file name for `/export` downloads.
pub const EXPORT_FILENAME: &str = "our_trees_library_backup.json";

#[derive(Clone)]
pub struct CatalogState {
    pub services: CatalogServices,
    pub admins: Arc<AdminSessions>,
}

pub fn router(state: CatalogState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/books", get(list_books).post(create_book))
        .route("/books/featured", get(featured_books))
        .route(
            "/books/{id}",
            get(get_book).put(update_book).delete(delete_book),
        )
        .route("/categories", get(list_categories))
        .route("/requests", get(list_requests).post(create_request))
        .route("/requests/{id}", delete(delete_request))
        .route("/requests/{id}/fulfill", get(fulfill_request))
        .route("/notice", get(current_notice))
        .route("/session/login", post(login))
        .route("/session/logout", post(logout))
        .route("/reset", post(reset_catalog))
        .route("/sync", post(sync_catalog))
        .route("/export", get(export_catalog))
        .with_state(state)
}

impl From<CatalogError> for AppError {
    fn from(error: CatalogError) -> Self {
        match error {
            CatalogError::BookNotFound(_) | CatalogError::RequestNotFound(_) => {
                AppError::not_found(error.to_string())
            }
            other => AppError::Internal(other.into()),
        }
    }
}

impl From<SyncError> for AppError {
    fn from(error: SyncError) -> Self {
        match error {
            SyncError::InFlight => AppError::conflict(error.to_string()),
            SyncError::Unreachable(_) => AppError::bad_gateway("sync_unreachable", error.to_string()),
            SyncError::Rejected(_) => AppError::bad_gateway("sync_rejected", error.to_string()),
            SyncError::Reload(inner) => inner.into(),
        }
    }
}

fn require_fields(missing: Vec<&'static str>) -> Result<(), AppError> {
    if missing.is_empty() {
        return Ok(());
    }
    let details = missing
        .iter()
        .map(|field| json!({ "field": field, "error": "required" }))
        .collect();
    Err(AppError::validation(details, "Please fill in all required fields"))
}

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| AppError::bad_request(rejection.body_text()))
}

async fn health_check() -> &'static str {
    "catalog module is healthy"
}

async fn list_books(
    State(state): State<CatalogState>,
    query: Result<Query<CatalogQuery>, QueryRejection>,
) -> Result<Json<Vec<Book>>, AppError> {
    let Query(query) = query.map_err(|rejection| AppError::bad_request(rejection.body_text()))?;
    let session = state.services.session.read().await;
    Ok(Json(session.list(&query).into_iter().cloned().collect()))
}

async fn featured_books(State(state): State<CatalogState>) -> Json<Vec<Book>> {
    let session = state.services.session.read().await;
    Json(session.featured().into_iter().cloned().collect())
}

async fn get_book(
    State(state): State<CatalogState>,
    Path(id): Path<i64>,
) -> Result<Json<Book>, AppError> {
    let session = state.services.session.read().await;
    session
        .book(id)
        .cloned()
        .map(Json)
        .ok_or_else(|| CatalogError::BookNotFound(id).into())
}

async fn list_categories() -> Json<&'static [DdcCategory]> {
    Json(&DDC_CATEGORIES[..])
}

async fn list_requests(State(state): State<CatalogState>) -> Json<Vec<BookRequest>> {
    Json(state.services.session.read().await.requests().to_vec())
}

async fn create_request(
    State(state): State<CatalogState>,
    payload: Result<Json<NewRequestForm>, JsonRejection>,
) -> Result<(StatusCode, Json<BookRequest>), AppError> {
    let form = body(payload)?;
    require_fields(form.missing_fields())?;
    let request = state.services.session.write().await.add_request(form)?;
    Ok((StatusCode::CREATED, Json(request)))
}

#[derive(Debug, Serialize)]
struct NoticeBody {
    message: Option<String>,
}

async fn current_notice(State(state): State<CatalogState>) -> Json<NoticeBody> {
    let session = state.services.session.read().await;
    Json(NoticeBody {
        message: session.notice().map(str::to_string),
    })
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
}

async fn login(
    State(state): State<CatalogState>,
    payload: Result<Json<LoginForm>, JsonRejection>,
) -> Result<Json<LoginResponse>, AppError> {
    let form = body(payload)?;
    let token = state
        .admins
        .login(&form.username, &form.password)
        .await
        .map_err(|e| AppError::unauthorized(e.to_string()))?;

    state.services.session.write().await.post_notice("Admin mode enabled");
    Ok(Json(LoginResponse {
        token: token.to_string(),
    }))
}

async fn logout(Admin(token): Admin, State(state): State<CatalogState>) -> StatusCode {
    state.admins.logout(token).await;
    state.services.session.write().await.post_notice("Admin mode disabled");
    StatusCode::NO_CONTENT
}

async fn create_book(
    _admin: Admin,
    State(state): State<CatalogState>,
    payload: Result<Json<NewBookForm>, JsonRejection>,
) -> Result<(StatusCode, Json<Book>), AppError> {
    let form = body(payload)?;
    require_fields(form.missing_fields())?;
    let book = state.services.session.write().await.add_book(form)?;
    Ok((StatusCode::CREATED, Json(book)))
}

async fn update_book(
    _admin: Admin,
    State(state): State<CatalogState>,
    Path(id): Path<i64>,
    payload: Result<Json<NewBookForm>, JsonRejection>,
) -> Result<Json<Book>, AppError> {
    let form = body(payload)?;
    require_fields(form.missing_fields())?;
    let book = state.services.session.write().await.update_book(id, form)?;
    Ok(Json(book))
}

async fn delete_book(
    _admin: Admin,
    State(state): State<CatalogState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    state.services.session.write().await.delete_book(id)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn delete_request(
    _admin: Admin,
    State(state): State<CatalogState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    state.services.session.write().await.delete_request(id)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn fulfill_request(
    _admin: Admin,
    State(state): State<CatalogState>,
    Path(id): Path<i64>,
) -> Result<Json<NewBookForm>, AppError> {
    let form = state.services.session.read().await.fulfill_request(id)?;
    Ok(Json(form))
}

async fn reset_catalog(
    _admin: Admin,
    State(state): State<CatalogState>,
) -> Result<StatusCode, AppError> {
    state.services.session.write().await.reset_catalog()?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SyncSummary {
    pub books: usize,
    pub requests: usize,
}

async fn sync_catalog(
    _admin: Admin,
    State(state): State<CatalogState>,
) -> Result<Json<SyncSummary>, AppError> {
    state.services.resync().await?;
    let session = state.services.session.read().await;
    Ok(Json(SyncSummary {
        books: session.books().len(),
        requests: session.requests().len(),
    }))
}

async fn export_catalog(_admin: Admin, State(state): State<CatalogState>) -> impl IntoResponse {
    let mut session = state.services.session.write().await;
    let document = session.export();
    session.post_notice("Backup exported");
    tracing::info!(
        books = document.books.len(),
        requests = document.requests.len(),
        "catalog exported"
    );

    (
        [(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{EXPORT_FILENAME}\""),
        )],
        Json(document),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::catalog::defaults::default_books;
    use crate::modules::catalog::error::SnapshotError;
    use crate::modules::catalog::loader::SnapshotSource;
    use crate::modules::catalog::models::ExportDocument;
    use crate::modules::catalog::sync::SyncEndpoint;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request as HttpRequest;
    use serde::de::DeserializeOwned;
    use shelf_authz::AdminCredentials;
    use shelf_store::MemoryStore;
    use std::time::Duration;
    use tower::ServiceExt;

    struct Offline;

    #[async_trait]
    impl SnapshotSource for Offline {
        fn name(&self) -> &'static str {
            "remote"
        }

        async fn fetch(&self) -> Result<Vec<Book>, SnapshotError> {
            Err(SnapshotError::Missing)
        }
    }

    #[async_trait]
    impl SyncEndpoint for Offline {
        async fn request_refresh(&self) -> Result<(), SyncError> {
            Err(SyncError::Unreachable("connection refused".into()))
        }
    }

    struct Online;

    #[async_trait]
    impl SyncEndpoint for Online {
        async fn request_refresh(&self) -> Result<(), SyncError> {
            Ok(())
        }
    }

    async fn app_with(endpoint: Arc<dyn SyncEndpoint>) -> Router {
        let services = CatalogServices::assemble(
            Arc::new(MemoryStore::new()),
            Arc::new(Offline),
            endpoint,
            Duration::from_secs(3),
        );
        services.load().await.unwrap();
        let admins = Arc::new(AdminSessions::new(AdminCredentials {
            username: "admin".into(),
            password: "ourtrees123".into(),
        }));
        router(CatalogState { services, admins })
    }

    async fn app() -> Router {
        app_with(Arc::new(Offline)).await
    }

    fn get_req(uri: &str) -> HttpRequest<Body> {
        HttpRequest::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn send(method: &str, uri: &str, token: Option<&str>, payload: Option<serde_json::Value>) -> HttpRequest<Body> {
        let mut builder = HttpRequest::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(ADMIN_TOKEN_HEADER, token);
        }
        match payload {
            Some(payload) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(payload.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn read_json<T: DeserializeOwned>(response: axum::response::Response) -> T {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn login_token(app: &Router) -> String {
        let response = app
            .clone()
            .oneshot(send(
                "POST",
                "/session/login",
                None,
                Some(json!({ "username": "admin", "password": "ourtrees123" })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        read_json::<LoginResponse>(response).await.token
    }

    #[tokio::test]
    async fn lists_default_books_sorted_by_title() {
        let app = app().await;
        let response = app.oneshot(get_req("/books")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let books: Vec<Book> = read_json(response).await;
        assert_eq!(books.len(), default_books().len());
        assert_eq!(books[0].title, "API Book");
    }

    #[tokio::test]
    async fn search_and_filter_through_query_string() {
        let app = app().await;
        let response = app
            .clone()
            .oneshot(get_req("/books?search=REACT&sort_by=author&order=desc"))
            .await
            .unwrap();
        let books: Vec<Book> = read_json(response).await;
        assert_eq!(books.len(), 1);
        assert_eq!(books[0].title, "React Book");

        let response = app.oneshot(get_req("/books?ddc=600")).await.unwrap();
        let books: Vec<Book> = read_json(response).await;
        assert_eq!(books.len(), 5);
    }

    #[tokio::test]
    async fn unknown_category_is_a_bad_request() {
        let response = app().await.oneshot(get_req("/books?ddc=999")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn missing_book_is_not_found() {
        let response = app().await.oneshot(get_req("/books/4242")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn categories_cover_all_ten_groups() {
        let response = app().await.oneshot(get_req("/categories")).await.unwrap();
        let categories: Vec<serde_json::Value> = read_json(response).await;
        assert_eq!(categories.len(), 10);
        assert_eq!(categories[6]["code"], "600");
    }

    #[tokio::test]
    async fn patrons_can_request_books_without_admin() {
        let app = app().await;
        let response = app
            .clone()
            .oneshot(send(
                "POST",
                "/requests",
                None,
                Some(json!({ "title": "X", "author": "Y", "requester": "Z" })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = app.clone().oneshot(get_req("/requests")).await.unwrap();
        let requests: Vec<BookRequest> = read_json(response).await;
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].requester, "Z");

        let response = app.oneshot(get_req("/notice")).await.unwrap();
        let notice: serde_json::Value = read_json(response).await;
        assert_eq!(notice["message"], "Book request received");
    }

    #[tokio::test]
    async fn incomplete_request_is_rejected_with_field_details() {
        let response = app()
            .await
            .oneshot(send(
                "POST",
                "/requests",
                None,
                Some(json!({ "title": "X", "author": "" })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let body: serde_json::Value = read_json(response).await;
        let fields: Vec<&str> = body["error"]["details"]
            .as_array()
            .unwrap()
            .iter()
            .map(|d| d["field"].as_str().unwrap())
            .collect();
        assert_eq!(fields, vec!["author", "requester"]);
    }

    #[tokio::test]
    async fn management_requires_admin_token() {
        let app = app().await;
        let payload = json!({ "title": "T", "author": "A" });

        let response = app
            .clone()
            .oneshot(send("POST", "/books", None, Some(payload.clone())))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = app
            .oneshot(send(
                "POST",
                "/books",
                Some("00000000-0000-0000-0000-000000000000"),
                Some(payload),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn wrong_password_is_unauthorized() {
        let response = app()
            .await
            .oneshot(send(
                "POST",
                "/session/login",
                None,
                Some(json!({ "username": "admin", "password": "nope" })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn admin_adds_updates_and_deletes_a_book() {
        let app = app().await;
        let token = login_token(&app).await;

        let response = app
            .clone()
            .oneshot(send(
                "POST",
                "/books",
                Some(&token),
                Some(json!({ "title": "Rust Book", "author": "Ferris", "ddc": "600" })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let created: Book = read_json(response).await;
        assert!(created.is_available());

        let response = app
            .clone()
            .oneshot(send(
                "PUT",
                &format!("/books/{}", created.id),
                Some(&token),
                Some(json!({ "title": "Rust Book, 2e", "author": "Ferris", "ddc": "600" })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let updated: Book = read_json(response).await;
        assert_eq!(updated.id, created.id);
        assert_eq!(updated.title, "Rust Book, 2e");

        let response = app
            .clone()
            .oneshot(send("DELETE", &format!("/books/{}", created.id), Some(&token), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = app.oneshot(get_req("/books")).await.unwrap();
        let books: Vec<Book> = read_json(response).await;
        assert_eq!(books.len(), default_books().len());
    }

    #[tokio::test]
    async fn fulfilling_a_request_prefills_the_form() {
        let app = app().await;
        let token = login_token(&app).await;
        let response = app
            .clone()
            .oneshot(send(
                "POST",
                "/requests",
                None,
                Some(json!({ "title": "Dune", "author": "Herbert", "requester": "Mya" })),
            ))
            .await
            .unwrap();
        let request: BookRequest = read_json(response).await;

        let response = app
            .clone()
            .oneshot(send(
                "GET",
                &format!("/requests/{}/fulfill", request.id),
                Some(&token),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let form: NewBookForm = read_json(response).await;
        assert_eq!(form.title, "Dune");
        assert_eq!(form.author, "Herbert");

        let response = app
            .oneshot(send("GET", "/requests/1/fulfill", Some(&token), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn failed_sync_is_bad_gateway_and_keeps_data() {
        let app = app().await;
        let token = login_token(&app).await;

        let response = app
            .clone()
            .oneshot(send("DELETE", "/books/1", Some(&token), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = app
            .clone()
            .oneshot(send("POST", "/sync", Some(&token), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let body: serde_json::Value = read_json(response).await;
        assert_eq!(body["error"]["code"], "sync_unreachable");

        let response = app.oneshot(get_req("/books")).await.unwrap();
        let books: Vec<Book> = read_json(response).await;
        assert_eq!(books.len(), default_books().len() - 1);
    }

    #[tokio::test]
    async fn successful_sync_reloads_and_reports_counts() {
        let app = app_with(Arc::new(Online)).await;
        let token = login_token(&app).await;

        let response = app
            .oneshot(send("POST", "/sync", Some(&token), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let summary: SyncSummary = read_json(response).await;
        assert_eq!(summary.books, default_books().len());
        assert_eq!(summary.requests, 0);
    }

    #[tokio::test]
    async fn export_is_an_attachment_with_everything() {
        let app = app().await;
        let token = login_token(&app).await;

        let response = app
            .oneshot(send("GET", "/export", Some(&token), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let disposition = response
            .headers()
            .get(header::CONTENT_DISPOSITION)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        assert!(disposition.contains(EXPORT_FILENAME));

        let document: ExportDocument = read_json(response).await;
        assert_eq!(document.books.len(), default_books().len());
        assert!(document.requests.is_empty());
    }

    #[tokio::test]
    async fn reset_restores_defaults_and_logout_revokes() {
        let app = app().await;
        let token = login_token(&app).await;

        for id in 1..=3 {
            app.clone()
                .oneshot(send("DELETE", &format!("/books/{id}"), Some(&token), None))
                .await
                .unwrap();
        }
        let response = app
            .clone()
            .oneshot(send("POST", "/reset", Some(&token), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = app.clone().oneshot(get_req("/books")).await.unwrap();
        let books: Vec<Book> = read_json(response).await;
        assert_eq!(books.len(), default_books().len());

        let response = app
            .clone()
            .oneshot(send("POST", "/session/logout", Some(&token), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = app
            .oneshot(send("POST", "/reset", Some(&token), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
