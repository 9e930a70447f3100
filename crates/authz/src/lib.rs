//! Admin-mode guard for catalog management.
//!
//! A single configured admin account logs in and receives an opaque token.
//! This gates the management surface; it is not a security boundary.

use std::collections::HashSet;

use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("invalid username or password")]
    InvalidCredentials,

    #[error("admin token missing or expired")]
    NotLoggedIn,
}

/// Username/password pair for the admin account.
#[derive(Debug, Clone)]
pub struct AdminCredentials {
    pub username: String,
    pub password: String,
}

/// Issued admin tokens for the running session.
#[derive(Debug)]
pub struct AdminSessions {
    credentials: AdminCredentials,
    tokens: RwLock<HashSet<Uuid>>,
}

impl AdminSessions {
    pub fn new(credentials: AdminCredentials) -> Self {
        Self {
            credentials,
            tokens: RwLock::new(HashSet::new()),
        }
    }

    /// Check credentials and issue a fresh token.
    pub async fn login(&self, username: &str, password: &str) -> Result<Uuid, AuthError> {
        if username != self.credentials.username || password != self.credentials.password {
            tracing::warn!(username, "admin login rejected");
            return Err(AuthError::InvalidCredentials);
        }

        let token = Uuid::new_v4();
        self.tokens.write().await.insert(token);
        tracing::info!(username, "admin logged in");
        Ok(token)
    }

    /// Revoke a token. Returns whether it was live.
    pub async fn logout(&self, token: Uuid) -> bool {
        let removed = self.tokens.write().await.remove(&token);
        if removed {
            tracing::info!("admin logged out");
        }
        removed
    }

    pub async fn is_authorized(&self, token: Uuid) -> bool {
        self.tokens.read().await.contains(&token)
    }

    /// Accept a raw header value; anything unparsable is treated as logged out.
    pub async fn authorize(&self, raw_token: Option<&str>) -> Result<Uuid, AuthError> {
        let token = raw_token
            .and_then(|raw| Uuid::parse_str(raw.trim()).ok())
            .ok_or(AuthError::NotLoggedIn)?;
        if self.is_authorized(token).await {
            Ok(token)
        } else {
            Err(AuthError::NotLoggedIn)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sessions() -> AdminSessions {
        AdminSessions::new(AdminCredentials {
            username: "admin".into(),
            password: "secret".into(),
        })
    }

    #[tokio::test]
    async fn login_issues_a_token_that_authorizes() {
        let sessions = sessions();
        let token = sessions.login("admin", "secret").await.unwrap();

        assert!(sessions.is_authorized(token).await);
        assert_eq!(
            sessions.authorize(Some(&token.to_string())).await,
            Ok(token)
        );
    }

    #[tokio::test]
    async fn wrong_password_is_rejected() {
        let sessions = sessions();
        assert_eq!(
            sessions.login("admin", "nope").await,
            Err(AuthError::InvalidCredentials)
        );
    }

    #[tokio::test]
    async fn logout_revokes_the_token() {
        let sessions = sessions();
        let token = sessions.login("admin", "secret").await.unwrap();

        assert!(sessions.logout(token).await);
        assert!(!sessions.logout(token).await);
        assert_eq!(
            sessions.authorize(Some(&token.to_string())).await,
            Err(AuthError::NotLoggedIn)
        );
    }

    #[tokio::test]
    async fn garbage_tokens_are_not_logged_in() {
        let sessions = sessions();
        assert_eq!(sessions.authorize(None).await, Err(AuthError::NotLoggedIn));
        assert_eq!(
            sessions.authorize(Some("not-a-uuid")).await,
            Err(AuthError::NotLoggedIn)
        );
    }
}
