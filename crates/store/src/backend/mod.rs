//! Backend collaborator boundary.
//!
//! The store delegates catalog retrieval and authentication to a hosted
//! backend. The boundary is expressed as two traits so the store can be
//! driven by the production REST client or a test double:
//!
//! - [`CatalogApi`] - read-only product and category listings
//! - [`AuthApi`] - registration, login, logout, and session lookup
//!
//! [`RestBackend`] implements both against the hosted service's REST surface
//! (PostgREST data API + GoTrue auth API).

mod cache;
mod rest;

pub use rest::RestBackend;

use thiserror::Error;

use jersey_shop_core::EmailError;

use crate::models::{Category, Product, User};

/// Errors from the backend's data API.
#[derive(Debug, Error)]
pub enum BackendError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Backend returned a non-success status.
    #[error("backend returned {status}: {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Error body, truncated.
        message: String,
    },
}

/// Errors from the backend's auth API.
///
/// Returned as structured results from the store's `sign_up`/`sign_in`;
/// never surfaced as panics.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format, rejected before the network call.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    /// Wrong email/password combination.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// An account with this email already exists.
    #[error("email already registered")]
    EmailTaken,

    /// Password rejected by the auth backend.
    #[error("password validation failed: {0}")]
    WeakPassword(String),

    /// Transport or protocol failure.
    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Read-only catalog collaborator.
#[allow(async_fn_in_trait)] // driven from a single task; Send bounds are left to implementors
pub trait CatalogApi {
    /// Fetch the full product collection.
    async fn list_products(&self) -> Result<Vec<Product>, BackendError>;

    /// Fetch the full category collection.
    async fn list_categories(&self) -> Result<Vec<Category>, BackendError>;
}

/// Authentication collaborator.
#[allow(async_fn_in_trait)] // driven from a single task; Send bounds are left to implementors
pub trait AuthApi {
    /// Register a new account and start a session for it.
    async fn register(
        &self,
        email: &str,
        password: &str,
        full_name: &str,
    ) -> Result<User, AuthError>;

    /// Log in with email and password.
    async fn login(&self, email: &str, password: &str) -> Result<User, AuthError>;

    /// End the current session.
    async fn logout(&self) -> Result<(), AuthError>;

    /// Return the principal of an existing session, if one is live.
    async fn current_session(&self) -> Result<Option<User>, AuthError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_error_display() {
        let err = BackendError::Status {
            status: 503,
            message: "service unavailable".to_string(),
        };
        assert_eq!(err.to_string(), "backend returned 503: service unavailable");
    }

    #[test]
    fn test_auth_error_display() {
        assert_eq!(
            AuthError::InvalidCredentials.to_string(),
            "invalid credentials"
        );
        assert_eq!(AuthError::EmailTaken.to_string(), "email already registered");
        assert_eq!(
            AuthError::WeakPassword("too short".to_string()).to_string(),
            "password validation failed: too short"
        );
    }
}
