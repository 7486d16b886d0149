//! Domain types for the session & cart store.
//!
//! These are validated domain objects, separate from the backend's wire
//! row types (see [`crate::backend`]).

pub mod cart;
pub mod catalog;
pub mod user;

pub use cart::{CartKeyPolicy, CartLine, CartSelection};
pub use catalog::{Category, Product};
pub use user::User;
