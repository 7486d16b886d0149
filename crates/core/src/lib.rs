//! Jersey Shop Core - Shared types library.
//!
//! This crate provides common types used across the Jersey Shop components:
//! - `store` - Session & cart state container for the storefront client
//! - `integration-tests` - Black-box scenario tests
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients. This keeps
//! it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs and validated emails

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
