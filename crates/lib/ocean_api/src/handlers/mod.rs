//! Request handlers.
//!
//! Handlers unpack the request, call into [`crate::services`] and wrap the
//! result in an [`crate::envelope::ApiResponse`].

pub mod admin;
pub mod auth;
pub mod collections;
pub mod events;
pub mod health;
pub mod resources;
