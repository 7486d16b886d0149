//! The session & cart store.
//!
//! `SessionStore` is the single source of truth for cart contents, cached
//! catalog data, and the authenticated user. It is explicitly constructed
//! and dependency-injected: the application root owns it and UI consumers
//! read its fields and invoke its operations; nothing mutates the state
//! except the operations below.
//!
//! All operations take `&mut self`, so a store handle has exactly one
//! mutator at a time. Async operations suspend only while awaiting the
//! backend collaborator and resume on the same logical task.

use rust_decimal::Decimal;

use jersey_shop_core::ProductId;

use crate::backend::{AuthApi, AuthError, CatalogApi};
use crate::models::{CartKeyPolicy, CartLine, CartSelection, Category, Product, User};
use crate::persist::{PersistedSession, SessionStorage};

/// Page-session-wide state container for the storefront.
///
/// Generic over the backend collaborator `B` (see [`CatalogApi`] and
/// [`AuthApi`]) and the durable storage `S` (see [`SessionStorage`]), so the
/// core can be exercised in isolation with test doubles.
pub struct SessionStore<B, S> {
    backend: B,
    storage: S,
    key_policy: CartKeyPolicy,
    products: Vec<Product>,
    categories: Vec<Category>,
    cart: Vec<CartLine>,
    loading: bool,
    user: Option<User>,
}

// =============================================================================
// Construction and queries
// =============================================================================

impl<B, S: SessionStorage> SessionStore<B, S> {
    /// Construct a store, rehydrating `{cart, user}` from durable storage.
    ///
    /// Catalog caches and the loading flag always start empty/false. A
    /// missing, corrupt, or incompatible stored session degrades to an empty
    /// one with a warning; construction never fails.
    pub fn restore(backend: B, storage: S, key_policy: CartKeyPolicy) -> Self {
        let session = match storage.load() {
            Ok(Some(session)) => session,
            Ok(None) => PersistedSession::default(),
            Err(e) => {
                tracing::warn!(error = %e, "failed to load persisted session, starting empty");
                PersistedSession::default()
            }
        };

        Self {
            backend,
            storage,
            key_policy,
            products: Vec::new(),
            categories: Vec::new(),
            cart: session.cart,
            loading: false,
            user: session.user,
        }
    }

    /// Cached product collection.
    #[must_use]
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    /// Cached category collection.
    #[must_use]
    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    /// Current cart contents, in insertion order.
    #[must_use]
    pub fn cart(&self) -> &[CartLine] {
        &self.cart
    }

    /// Whether a product fetch is in flight.
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.loading
    }

    /// The authenticated principal, if signed in.
    #[must_use]
    pub const fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    /// The identity policy this store merges cart lines with.
    #[must_use]
    pub const fn key_policy(&self) -> CartKeyPolicy {
        self.key_policy
    }

    /// Sum of `price × quantity` across all cart lines.
    #[must_use]
    pub fn cart_total(&self) -> Decimal {
        self.cart.iter().map(CartLine::line_total).sum()
    }

    /// Total number of units in the cart (navbar badge).
    #[must_use]
    pub fn cart_item_count(&self) -> u32 {
        self.cart.iter().map(|line| line.quantity).sum()
    }

    /// Cached products belonging to the given category.
    #[must_use]
    pub fn products_in_category(&self, category: &str) -> Vec<&Product> {
        self.products
            .iter()
            .filter(|p| p.category == category)
            .collect()
    }

    // =========================================================================
    // Cart mutations (synchronous, fully ordered by call order)
    // =========================================================================

    /// Add a selection to the cart.
    ///
    /// If a line with the same identity key already exists, its quantity is
    /// incremented by the incoming quantity (default 1); otherwise a new
    /// line is appended, preserving insertion order.
    pub fn add_to_cart(&mut self, selection: CartSelection) {
        let existing = self
            .cart
            .iter_mut()
            .find(|line| self.key_policy.merges_with(line, &selection));

        if let Some(line) = existing {
            line.quantity += selection.effective_quantity();
        } else {
            self.cart.push(selection.into_line());
        }

        self.persist();
    }

    /// Remove every cart line for the given product.
    ///
    /// Removing a product that is not in the cart is a no-op.
    pub fn remove_from_cart(&mut self, id: ProductId) {
        let before = self.cart.len();
        self.cart.retain(|line| line.id != id);

        if self.cart.len() != before {
            self.persist();
        }
    }

    /// Set the quantity of every cart line for the given product.
    ///
    /// The quantity is clamped at a minimum of 0; a clamped value of 0
    /// behaves as [`remove_from_cart`](Self::remove_from_cart). Updating a
    /// product that is not in the cart is a no-op.
    pub fn update_quantity(&mut self, id: ProductId, quantity: i64) {
        let quantity = u32::try_from(quantity.max(0)).unwrap_or(u32::MAX);

        if quantity == 0 {
            self.remove_from_cart(id);
            return;
        }

        let mut changed = false;
        for line in self.cart.iter_mut().filter(|line| line.id == id) {
            line.quantity = quantity;
            changed = true;
        }

        if changed {
            self.persist();
        }
    }

    /// Empty the cart.
    pub fn clear_cart(&mut self) {
        self.cart.clear();
        self.persist();
    }

    /// Replace the user directly, bypassing the auth backend.
    ///
    /// Used for optimistic local profile edits; the backend is not informed.
    pub fn set_user(&mut self, user: Option<User>) {
        self.user = user;
        self.persist();
    }

    /// Write the durable projection through to storage.
    ///
    /// Storage failures are logged, never propagated: a broken storage
    /// degrades persistence, not the live session.
    fn persist(&self) {
        let session = PersistedSession {
            cart: self.cart.clone(),
            user: self.user.clone(),
        };

        if let Err(e) = self.storage.save(&session) {
            tracing::error!(error = %e, "failed to persist session");
        }
    }
}

// =============================================================================
// Catalog operations
// =============================================================================

impl<B: CatalogApi, S: SessionStorage> SessionStore<B, S> {
    /// Fetch the full product collection from the catalog backend.
    ///
    /// Sets the loading flag for the duration of the call. On failure the
    /// cached products are left unchanged and the error is logged; it is
    /// never surfaced to the caller.
    pub async fn fetch_products(&mut self) {
        self.loading = true;

        match self.backend.list_products().await {
            Ok(products) => self.products = products,
            Err(e) => tracing::error!(error = %e, "failed to fetch products"),
        }

        self.loading = false;
    }

    /// Fetch the full category collection from the catalog backend.
    ///
    /// Same failure policy as [`fetch_products`](Self::fetch_products),
    /// without the loading flag.
    pub async fn fetch_categories(&mut self) {
        match self.backend.list_categories().await {
            Ok(categories) => self.categories = categories,
            Err(e) => tracing::error!(error = %e, "failed to fetch categories"),
        }
    }
}

// =============================================================================
// Auth operations
// =============================================================================

impl<B: AuthApi, S: SessionStorage> SessionStore<B, S> {
    /// Register a new account.
    ///
    /// On success the returned principal becomes the store's user. On
    /// failure the previous user (usually absent) is left unchanged.
    ///
    /// # Errors
    ///
    /// Returns the backend's [`AuthError`] as a structured result; never
    /// panics.
    pub async fn sign_up(
        &mut self,
        email: &str,
        password: &str,
        full_name: &str,
    ) -> Result<User, AuthError> {
        let user = self.backend.register(email, password, full_name).await?;

        self.user = Some(user.clone());
        self.persist();

        Ok(user)
    }

    /// Log in with email and password.
    ///
    /// Same contract as [`sign_up`](Self::sign_up).
    ///
    /// # Errors
    ///
    /// Returns the backend's [`AuthError`] as a structured result.
    pub async fn sign_in(&mut self, email: &str, password: &str) -> Result<User, AuthError> {
        let user = self.backend.login(email, password).await?;

        self.user = Some(user.clone());
        self.persist();

        Ok(user)
    }

    /// End the session.
    ///
    /// The user and cart are cleared regardless of whether the backend's
    /// logout succeeds; a logout failure is logged only.
    pub async fn sign_out(&mut self) {
        if let Err(e) = self.backend.logout().await {
            tracing::error!(error = %e, "sign out failed at the auth backend");
        }

        self.user = None;
        self.cart.clear();
        self.persist();
    }

    /// Mirror an existing backend session into the store.
    ///
    /// Sets the user when a live session exists, clears a stale persisted
    /// user when none does. Invoked once per process lifetime, at startup.
    /// Lookup failures are logged and leave the user unchanged.
    pub async fn check_session(&mut self) {
        match self.backend.current_session().await {
            Ok(session_user) => {
                self.user = session_user;
                self.persist();
            }
            Err(e) => tracing::error!(error = %e, "session check failed"),
        }
    }
}
