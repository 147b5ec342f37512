//! Domain models.
//!
//! These are internal domain models. Request payloads live with the HTTP
//! handlers; the serialized forms here are what responses carry.

pub mod auth;
pub mod collection;
pub mod event;
pub mod identity;
pub mod log;
pub mod resource;

use serde::Serialize;

/// Denormalized `{id, name, email}` view of an identity, embedded in
/// responses that reference an owner or participant.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct UserSummary {
    pub id: String,
    pub name: String,
    pub email: String,
}

/// Error returned when a stored or submitted enum value is unknown.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind}: {value}")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

impl UnknownVariant {
    pub(crate) fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}
