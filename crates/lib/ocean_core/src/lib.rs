//! # ocean_core
//!
//! Core domain logic for Ocean Insight: identities, credentials, owned
//! resources, the pagination and filter builder, and the storage ports.

pub mod auth;
pub mod migrate;
pub mod models;
pub mod query;
pub mod store;
pub mod uuid;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
