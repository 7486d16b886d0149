//! Test support for Jersey Shop integration tests.
//!
//! Provides [`MockBackend`], a programmable in-process implementation of the
//! store's backend traits, plus fixtures for catalog and user records. The
//! integration tests drive a real `SessionStore` against this mock and real
//! storage implementations; no network or hosted backend is involved.

#![allow(clippy::expect_used)] // test support crate

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;
use rust_decimal::Decimal;
use uuid::Uuid;

use jersey_shop_core::{CategoryId, Email, ProductId};
use jersey_shop_store::backend::{AuthApi, AuthError, BackendError, CatalogApi};
use jersey_shop_store::models::{Category, Product, User};

// =============================================================================
// Fixtures
// =============================================================================

/// Build a catalog product with the given id, price, and category.
#[must_use]
pub fn product(id: i32, name: &str, price: Decimal, category: &str) -> Product {
    Product {
        id: ProductId::new(id),
        name: name.to_string(),
        price,
        image: format!("/images/{id}.jpg"),
        category: category.to_string(),
        stock: 10,
        rating: None,
        reviews: None,
        sizes: vec!["S".to_string(), "M".to_string(), "XL".to_string()],
        description: None,
    }
}

/// Build a category record.
#[must_use]
pub fn category(id: i32, name: &str) -> Category {
    Category {
        id: CategoryId::new(id),
        name: name.to_string(),
        image: format!("/images/categories/{id}.jpg"),
    }
}

/// Build a user record for the given email address.
///
/// # Panics
///
/// Panics if `email` is not a valid address.
#[must_use]
pub fn user(email: &str, full_name: Option<&str>) -> User {
    User {
        id: Uuid::new_v4(),
        email: Email::parse(email).expect("fixture email must be valid"),
        full_name: full_name.map(String::from),
        created_at: Utc::now(),
    }
}

// =============================================================================
// MockBackend
// =============================================================================

#[derive(Default)]
struct MockState {
    products: Vec<Product>,
    categories: Vec<Category>,
    accounts: HashMap<String, (String, User)>,
    session: Option<User>,
    fail_catalog: bool,
    fail_logout: bool,
    fail_session_lookup: bool,
    product_fetches: u32,
    category_fetches: u32,
    logout_calls: u32,
}

/// Programmable backend double.
///
/// Clones share state, so a test can keep a handle for assertions while the
/// store owns another.
#[derive(Clone, Default)]
pub struct MockBackend {
    state: Arc<Mutex<MockState>>,
}

impl MockBackend {
    /// Create an empty mock with no catalog, accounts, or session.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().expect("mock backend state poisoned")
    }

    /// Set the product collection served by `list_products`.
    #[must_use]
    pub fn with_products(self, products: Vec<Product>) -> Self {
        self.lock().products = products;
        self
    }

    /// Set the category collection served by `list_categories`.
    #[must_use]
    pub fn with_categories(self, categories: Vec<Category>) -> Self {
        self.lock().categories = categories;
        self
    }

    /// Register a known account that `login` will accept.
    #[must_use]
    pub fn with_account(self, email: &str, password: &str, account: User) -> Self {
        self.lock()
            .accounts
            .insert(email.to_string(), (password.to_string(), account));
        self
    }

    /// Pre-establish a live session, as if a previous page session signed in.
    #[must_use]
    pub fn with_session(self, account: User) -> Self {
        self.lock().session = Some(account);
        self
    }

    /// Make catalog calls fail with a 503 until reset.
    pub fn set_catalog_failing(&self, failing: bool) {
        self.lock().fail_catalog = failing;
    }

    /// Make `logout` fail at the transport level.
    pub fn set_logout_failing(&self, failing: bool) {
        self.lock().fail_logout = failing;
    }

    /// Make `current_session` fail at the transport level.
    pub fn set_session_lookup_failing(&self, failing: bool) {
        self.lock().fail_session_lookup = failing;
    }

    /// Replace the product collection mid-test.
    pub fn set_products(&self, products: Vec<Product>) {
        self.lock().products = products;
    }

    /// The principal the backend currently considers signed in.
    #[must_use]
    pub fn session(&self) -> Option<User> {
        self.lock().session.clone()
    }

    /// How many times `list_products` has been called.
    #[must_use]
    pub fn product_fetches(&self) -> u32 {
        self.lock().product_fetches
    }

    /// How many times `list_categories` has been called.
    #[must_use]
    pub fn category_fetches(&self) -> u32 {
        self.lock().category_fetches
    }

    /// How many times `logout` has been called.
    #[must_use]
    pub fn logout_calls(&self) -> u32 {
        self.lock().logout_calls
    }
}

fn unavailable() -> BackendError {
    BackendError::Status {
        status: 503,
        message: "service unavailable".to_string(),
    }
}

impl CatalogApi for MockBackend {
    async fn list_products(&self) -> Result<Vec<Product>, BackendError> {
        let mut state = self.lock();
        state.product_fetches += 1;
        if state.fail_catalog {
            return Err(unavailable());
        }
        Ok(state.products.clone())
    }

    async fn list_categories(&self) -> Result<Vec<Category>, BackendError> {
        let mut state = self.lock();
        state.category_fetches += 1;
        if state.fail_catalog {
            return Err(unavailable());
        }
        Ok(state.categories.clone())
    }
}

impl AuthApi for MockBackend {
    async fn register(
        &self,
        email: &str,
        password: &str,
        full_name: &str,
    ) -> Result<User, AuthError> {
        let parsed = Email::parse(email)?;

        let mut state = self.lock();
        if state.accounts.contains_key(email) {
            return Err(AuthError::EmailTaken);
        }
        if password.len() < 6 {
            return Err(AuthError::WeakPassword(
                "password must be at least 6 characters".to_string(),
            ));
        }

        let account = User {
            id: Uuid::new_v4(),
            email: parsed,
            full_name: Some(full_name.to_string()),
            created_at: Utc::now(),
        };
        state
            .accounts
            .insert(email.to_string(), (password.to_string(), account.clone()));
        state.session = Some(account.clone());

        Ok(account)
    }

    async fn login(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let mut state = self.lock();

        let Some((stored_password, account)) = state.accounts.get(email) else {
            return Err(AuthError::InvalidCredentials);
        };
        if stored_password != password {
            return Err(AuthError::InvalidCredentials);
        }

        let account = account.clone();
        state.session = Some(account.clone());
        Ok(account)
    }

    async fn logout(&self) -> Result<(), AuthError> {
        let mut state = self.lock();
        state.logout_calls += 1;
        if state.fail_logout {
            return Err(AuthError::Backend(unavailable()));
        }
        state.session = None;
        Ok(())
    }

    async fn current_session(&self) -> Result<Option<User>, AuthError> {
        let state = self.lock();
        if state.fail_session_lookup {
            return Err(AuthError::Backend(unavailable()));
        }
        Ok(state.session.clone())
    }
}
