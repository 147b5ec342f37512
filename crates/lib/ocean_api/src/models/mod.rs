//! Request payloads and response views.
//!
//! Payloads derive `Validate`; string fields default to empty so a missing
//! field is reported alongside every other violation rather than as a
//! deserialization error.

pub mod admin;
pub mod auth;
pub mod collection;
pub mod event;
pub mod resource;
