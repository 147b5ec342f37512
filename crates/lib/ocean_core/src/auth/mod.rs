//! Authentication primitives.
//!
//! Provides the token service (signed access + refresh credentials),
//! password hashing, and random token generation for reset tickets and
//! share links.

pub mod jwt;
pub mod password;
pub mod tickets;

use thiserror::Error;

/// Authentication errors.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    CredentialError,

    /// Malformed, tampered, expired, or wrong-kind token. Deliberately
    /// carries no detail about which.
    #[error("Invalid or expired token")]
    TokenInvalid,

    #[error("Token error: {0}")]
    TokenError(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
