use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use shelf_http::error::AppError;
use uuid::Uuid;

use super::CatalogState;

/// Header carrying the token issued by `/session/login`.
pub const ADMIN_TOKEN_HEADER: &str = "x-admin-token";

/// Proof that the caller is in admin mode. Handlers that take it are admin-only.
#[derive(Debug, Clone, Copy)]
pub struct Admin(pub Uuid);

impl FromRequestParts<CatalogState> for Admin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &CatalogState,
    ) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(ADMIN_TOKEN_HEADER)
            .and_then(|value| value.to_str().ok());

        state.admins.authorize(raw).await.map(Admin).map_err(|e| {
            tracing::debug!(path = %parts.uri.path(), "admin route refused");
            AppError::unauthorized(e.to_string())
        })
    }
}
