//! Jersey Shop session & cart store.
//!
//! Single source of truth for cart contents, cached catalog data, and the
//! authenticated user for the lifetime of a page session. Catalog retrieval
//! and authentication are delegated to an external hosted backend; the
//! `{cart, user}` projection of the state is persisted to durable
//! client-side storage and rehydrated at startup.
//!
//! # Example
//!
//! ```rust,ignore
//! use jersey_shop_store::backend::RestBackend;
//! use jersey_shop_store::config::StoreConfig;
//! use jersey_shop_store::persist::JsonFileStorage;
//! use jersey_shop_store::store::SessionStore;
//!
//! let config = StoreConfig::from_env()?;
//! let backend = RestBackend::new(&config.backend);
//! let storage = JsonFileStorage::new(&config.session_file);
//!
//! let mut store = SessionStore::restore(backend, storage, config.cart_key_policy);
//! store.check_session().await;
//! store.fetch_products().await;
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod backend;
pub mod config;
pub mod models;
pub mod persist;
pub mod store;
