//! Credential models: token claims, token pairs and password-reset tickets.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::identity::Role;

/// Which half of a credential pair a token is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// JWT claims embedded in access and refresh tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject: the identity id (standard JWT `sub` claim).
    pub sub: String,
    pub email: String,
    /// Role at issuance. May be stale until the next refresh.
    pub role: Role,
    pub kind: TokenKind,
    /// Expiry (unix timestamp).
    pub exp: i64,
    /// Issued at (unix timestamp).
    pub iat: i64,
}

/// Access + refresh token pair handed to clients.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Single-use password reset ticket.
#[derive(Debug, Clone)]
pub struct PasswordResetTicket {
    pub id: String,
    pub user_id: String,
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub used: bool,
    pub created_at: DateTime<Utc>,
}

impl PasswordResetTicket {
    /// A ticket can be redeemed iff it is unused and not yet expired.
    pub fn is_usable(&self, now: DateTime<Utc>) -> bool {
        !self.used && self.expires_at > now
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn ticket(used: bool, expires_in: Duration) -> PasswordResetTicket {
        let now = Utc::now();
        PasswordResetTicket {
            id: "t1".into(),
            user_id: "u1".into(),
            token: "tok".into(),
            expires_at: now + expires_in,
            used,
            created_at: now,
        }
    }

    #[test]
    fn fresh_unused_ticket_is_usable() {
        assert!(ticket(false, Duration::hours(1)).is_usable(Utc::now()));
    }

    #[test]
    fn used_or_expired_ticket_is_not_usable() {
        assert!(!ticket(true, Duration::hours(1)).is_usable(Utc::now()));
        assert!(!ticket(false, Duration::seconds(-1)).is_usable(Utc::now()));
    }
}
