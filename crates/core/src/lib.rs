//! Catalog Core - Shared types library.
//!
//! This crate provides the domain types used across all catalog components:
//! - `client` - Remote resource client and synchronization store
//! - `cli` - Terminal front-end driving the store
//! - `integration-tests` - Mock backend and end-to-end tests
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients, no runtime. This keeps it lightweight and allows it to be used
//! anywhere, including inside the mock backend.
//!
//! # Modules
//!
//! - [`types`] - Ids, products, comments, form validation and store status

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
