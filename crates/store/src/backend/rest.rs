//! REST backend client implementation.
//!
//! Talks to the hosted backend's REST surface: a PostgREST-style data API
//! for catalog reads and a GoTrue-style auth API for sessions. Catalog
//! listings are cached with `moka` (5-minute TTL); auth calls never are.

use std::sync::{Arc, RwLock};
use std::time::Duration;

use chrono::{DateTime, Utc};
use secrecy::ExposeSecret;
use serde::Deserialize;
use tracing::debug;
use uuid::Uuid;

use jersey_shop_core::{CategoryId, Email, ProductId};

use moka::future::Cache;

use crate::config::BackendConfig;
use crate::models::{Category, Product, User};

use super::cache::{CacheKey, CacheValue};
use super::{AuthApi, AuthError, BackendError, CatalogApi};

/// How long catalog listings stay cached.
const CATALOG_CACHE_TTL: Duration = Duration::from_secs(300);

/// How much of an error body to keep in error messages.
const ERROR_BODY_LIMIT: usize = 200;

// =============================================================================
// RestBackend
// =============================================================================

/// Client for the hosted backend's REST API.
///
/// Implements both [`CatalogApi`] and [`AuthApi`]. Cheaply cloneable via
/// `Arc`. Holds the current session's access token internally: set on
/// login/register, cleared on logout.
#[derive(Clone)]
pub struct RestBackend {
    inner: Arc<RestBackendInner>,
}

struct RestBackendInner {
    client: reqwest::Client,
    data_endpoint: String,
    auth_endpoint: String,
    anon_key: String,
    timeout: Option<Duration>,
    cache: Cache<CacheKey, CacheValue>,
    access_token: RwLock<Option<String>>,
}

impl RestBackend {
    /// Create a new REST backend client.
    #[must_use]
    pub fn new(config: &BackendConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(8)
            .time_to_live(CATALOG_CACHE_TTL)
            .build();

        let base = config.base_url.trim_end_matches('/');
        let data_endpoint = format!("{base}/rest/v1");
        let auth_endpoint = format!("{base}/auth/v1");

        Self {
            inner: Arc::new(RestBackendInner {
                client: reqwest::Client::new(),
                data_endpoint,
                auth_endpoint,
                anon_key: config.anon_key.expose_secret().to_string(),
                timeout: config.timeout,
                cache,
                access_token: RwLock::new(None),
            }),
        }
    }

    /// Current access token, falling back to the anonymous key.
    fn bearer_token(&self) -> String {
        self.session_token()
            .unwrap_or_else(|| self.inner.anon_key.clone())
    }

    /// Current session token, if a session is live.
    fn session_token(&self) -> Option<String> {
        // A poisoned lock means a panic elsewhere; treat as no session
        self.inner
            .access_token
            .read()
            .ok()
            .and_then(|guard| guard.clone())
    }

    fn set_session_token(&self, token: Option<String>) {
        if let Ok(mut guard) = self.inner.access_token.write() {
            *guard = token;
        }
    }

    /// Build a request with the backend's standard headers applied.
    fn request(&self, method: reqwest::Method, url: String) -> reqwest::RequestBuilder {
        let mut builder = self
            .inner
            .client
            .request(method, url)
            .header("apikey", &self.inner.anon_key)
            .bearer_auth(self.bearer_token());

        if let Some(timeout) = self.inner.timeout {
            builder = builder.timeout(timeout);
        }

        builder
    }

    /// Fetch a full table from the data API.
    async fn fetch_table<Row: serde::de::DeserializeOwned>(
        &self,
        table: &str,
    ) -> Result<Vec<Row>, BackendError> {
        let url = format!("{}/{table}?select=*", self.inner.data_endpoint);
        let response = self.request(reqwest::Method::GET, url).send().await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(status_error(status, &body));
        }

        Ok(serde_json::from_str(&body)?)
    }

    /// POST a JSON body to the auth API and return the raw response.
    async fn auth_post(
        &self,
        path: &str,
        body: Option<&serde_json::Value>,
    ) -> Result<reqwest::Response, BackendError> {
        let url = format!("{}{path}", self.inner.auth_endpoint);
        let mut builder = self.request(reqwest::Method::POST, url);
        if let Some(body) = body {
            builder = builder.json(body);
        }
        Ok(builder.send().await?)
    }
}

// =============================================================================
// CatalogApi
// =============================================================================

impl CatalogApi for RestBackend {
    async fn list_products(&self) -> Result<Vec<Product>, BackendError> {
        if let Some(CacheValue::Products(products)) =
            self.inner.cache.get(&CacheKey::Products).await
        {
            debug!("products served from cache");
            return Ok(products);
        }

        let rows: Vec<ProductRow> = self.fetch_table("products").await?;
        let products: Vec<Product> = rows.into_iter().map(Product::from).collect();

        self.inner
            .cache
            .insert(CacheKey::Products, CacheValue::Products(products.clone()))
            .await;

        Ok(products)
    }

    async fn list_categories(&self) -> Result<Vec<Category>, BackendError> {
        if let Some(CacheValue::Categories(categories)) =
            self.inner.cache.get(&CacheKey::Categories).await
        {
            debug!("categories served from cache");
            return Ok(categories);
        }

        let rows: Vec<CategoryRow> = self.fetch_table("categories").await?;
        let categories: Vec<Category> = rows.into_iter().map(Category::from).collect();

        self.inner
            .cache
            .insert(
                CacheKey::Categories,
                CacheValue::Categories(categories.clone()),
            )
            .await;

        Ok(categories)
    }
}

// =============================================================================
// AuthApi
// =============================================================================

impl AuthApi for RestBackend {
    async fn register(
        &self,
        email: &str,
        password: &str,
        full_name: &str,
    ) -> Result<User, AuthError> {
        let email = Email::parse(email)?;

        let body = serde_json::json!({
            "email": email.as_str(),
            "password": password,
            "data": { "full_name": full_name },
        });

        // The backend auto-confirms signups, so /signup returns a session
        // just like /token does
        let response = self.auth_post("/signup", Some(&body)).await?;
        let status = response.status();
        let text = response.text().await.map_err(BackendError::from)?;

        if !status.is_success() {
            return Err(signup_error(status, &text));
        }

        let session: SessionResponse =
            serde_json::from_str(&text).map_err(BackendError::from)?;
        self.set_session_token(Some(session.access_token));

        Ok(session.user.try_into()?)
    }

    async fn login(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let email = Email::parse(email)?;

        let body = serde_json::json!({
            "email": email.as_str(),
            "password": password,
        });

        let response = self
            .auth_post("/token?grant_type=password", Some(&body))
            .await?;
        let status = response.status();
        let text = response.text().await.map_err(BackendError::from)?;

        if !status.is_success() {
            // The auth API answers 400 for any bad email/password pair
            if status == reqwest::StatusCode::BAD_REQUEST
                || status == reqwest::StatusCode::UNAUTHORIZED
            {
                return Err(AuthError::InvalidCredentials);
            }
            return Err(status_error(status, &text).into());
        }

        let session: SessionResponse =
            serde_json::from_str(&text).map_err(BackendError::from)?;
        self.set_session_token(Some(session.access_token));

        Ok(session.user.try_into()?)
    }

    async fn logout(&self) -> Result<(), AuthError> {
        let had_session = self.session_token().is_some();

        // Drop the token regardless of what the backend says; a failed
        // logout must not leave the client acting authenticated
        let result = if had_session {
            let response = self.auth_post("/logout", None).await?;
            let status = response.status();
            if status.is_success() || status == reqwest::StatusCode::UNAUTHORIZED {
                Ok(())
            } else {
                let text = response.text().await.map_err(BackendError::from)?;
                Err(status_error(status, &text).into())
            }
        } else {
            Ok(())
        };

        self.set_session_token(None);
        result
    }

    async fn current_session(&self) -> Result<Option<User>, AuthError> {
        let Some(token) = self.session_token() else {
            return Ok(None);
        };

        let url = format!("{}/user", self.inner.auth_endpoint);
        let mut builder = self
            .inner
            .client
            .get(url)
            .header("apikey", &self.inner.anon_key)
            .bearer_auth(token);
        if let Some(timeout) = self.inner.timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder.send().await.map_err(BackendError::from)?;
        let status = response.status();

        // An expired or revoked token is an absent session, not an error
        if status == reqwest::StatusCode::UNAUTHORIZED {
            self.set_session_token(None);
            return Ok(None);
        }

        let text = response.text().await.map_err(BackendError::from)?;
        if !status.is_success() {
            return Err(status_error(status, &text).into());
        }

        let row: UserRow = serde_json::from_str(&text).map_err(BackendError::from)?;
        Ok(Some(row.try_into()?))
    }
}

// =============================================================================
// Wire rows and conversions
// =============================================================================

/// Product row as returned by the data API.
#[derive(Debug, Deserialize)]
struct ProductRow {
    id: ProductId,
    name: String,
    price: rust_decimal::Decimal,
    image: String,
    category: String,
    stock: i32,
    #[serde(default)]
    rating: Option<f32>,
    #[serde(default)]
    reviews: Option<i32>,
    #[serde(default)]
    sizes: Option<Vec<String>>,
    #[serde(default)]
    description: Option<String>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            price: row.price,
            image: row.image,
            category: row.category,
            stock: row.stock,
            rating: row.rating,
            reviews: row.reviews,
            sizes: row.sizes.unwrap_or_default(),
            description: row.description,
        }
    }
}

/// Category row as returned by the data API.
#[derive(Debug, Deserialize)]
struct CategoryRow {
    id: CategoryId,
    name: String,
    image: String,
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            image: row.image,
        }
    }
}

/// Session payload returned by `/signup` and `/token`.
#[derive(Debug, Deserialize)]
struct SessionResponse {
    access_token: String,
    user: UserRow,
}

/// User payload as returned by the auth API.
#[derive(Debug, Deserialize)]
struct UserRow {
    id: Uuid,
    email: String,
    #[serde(default)]
    user_metadata: Option<UserMetadata>,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct UserMetadata {
    #[serde(default)]
    full_name: Option<String>,
}

impl TryFrom<UserRow> for User {
    type Error = AuthError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            email: Email::parse(&row.email)?,
            full_name: row.user_metadata.and_then(|m| m.full_name),
            created_at: row.created_at,
        })
    }
}

/// Error body shape used by the auth API (fields vary by endpoint).
#[derive(Debug, Deserialize, Default)]
struct AuthErrorBody {
    #[serde(default)]
    error_description: Option<String>,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl AuthErrorBody {
    fn detail(&self) -> Option<&str> {
        self.error_description
            .as_deref()
            .or(self.msg.as_deref())
            .or(self.message.as_deref())
    }
}

/// Build a [`BackendError::Status`] from a non-success response.
fn status_error(status: reqwest::StatusCode, body: &str) -> BackendError {
    BackendError::Status {
        status: status.as_u16(),
        message: body.chars().take(ERROR_BODY_LIMIT).collect(),
    }
}

/// Map a failed `/signup` response to an [`AuthError`].
fn signup_error(status: reqwest::StatusCode, body: &str) -> AuthError {
    let parsed: AuthErrorBody = serde_json::from_str(body).unwrap_or_default();
    let detail = parsed.detail().unwrap_or("").to_lowercase();

    if detail.contains("already registered") || detail.contains("already exists") {
        return AuthError::EmailTaken;
    }
    if detail.contains("password") {
        return AuthError::WeakPassword(detail);
    }

    status_error(status, body).into()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use rust_decimal::dec;

    #[test]
    fn test_product_row_conversion() {
        let json = r#"{
            "id": 1,
            "name": "Home Jersey",
            "price": "49.99",
            "image": "/images/home.jpg",
            "category": "jerseys",
            "stock": 12,
            "sizes": ["S", "M", "L"]
        }"#;
        let row: ProductRow = serde_json::from_str(json).unwrap();
        let product = Product::from(row);

        assert_eq!(product.id, ProductId::new(1));
        assert_eq!(product.price, dec!(49.99));
        assert_eq!(product.sizes, vec!["S", "M", "L"]);
        assert!(product.rating.is_none());
        assert!(product.description.is_none());
    }

    #[test]
    fn test_user_row_conversion() {
        let json = r#"{
            "id": "4b1a6e8e-7e5e-4f3a-9a1e-2c3d4e5f6a7b",
            "email": "fan@example.com",
            "user_metadata": { "full_name": "Jordan Fan" },
            "created_at": "2025-01-15T10:00:00Z"
        }"#;
        let row: UserRow = serde_json::from_str(json).unwrap();
        let user = User::try_from(row).unwrap();

        assert_eq!(user.email.as_str(), "fan@example.com");
        assert_eq!(user.full_name.as_deref(), Some("Jordan Fan"));
    }

    #[test]
    fn test_user_row_rejects_invalid_email() {
        let json = r#"{
            "id": "4b1a6e8e-7e5e-4f3a-9a1e-2c3d4e5f6a7b",
            "email": "not-an-email",
            "created_at": "2025-01-15T10:00:00Z"
        }"#;
        let row: UserRow = serde_json::from_str(json).unwrap();
        assert!(matches!(
            User::try_from(row),
            Err(AuthError::InvalidEmail(_))
        ));
    }

    #[test]
    fn test_signup_error_mapping() {
        let body = r#"{"msg": "User already registered"}"#;
        assert!(matches!(
            signup_error(reqwest::StatusCode::UNPROCESSABLE_ENTITY, body),
            AuthError::EmailTaken
        ));

        let body = r#"{"msg": "Password should be at least 6 characters"}"#;
        assert!(matches!(
            signup_error(reqwest::StatusCode::UNPROCESSABLE_ENTITY, body),
            AuthError::WeakPassword(_)
        ));

        let body = "upstream exploded";
        assert!(matches!(
            signup_error(reqwest::StatusCode::INTERNAL_SERVER_ERROR, body),
            AuthError::Backend(BackendError::Status { status: 500, .. })
        ));
    }

    #[test]
    fn test_status_error_truncates_body() {
        let long_body = "x".repeat(1000);
        let BackendError::Status { message, .. } =
            status_error(reqwest::StatusCode::BAD_GATEWAY, &long_body)
        else {
            panic!("expected status error");
        };
        assert_eq!(message.len(), ERROR_BODY_LIMIT);
    }
}
