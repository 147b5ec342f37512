//! Random tokens for password-reset tickets and share links.

use chrono::{DateTime, Duration, Utc};
use rand::distr::Alphanumeric;
use rand::{Rng, rng};

use crate::models::auth::PasswordResetTicket;
use crate::uuid::new_id;

/// Length of generated reset and share tokens.
pub const TOKEN_LENGTH: usize = 64;

/// Reset tickets expire one hour after issuance.
pub const RESET_TICKET_TTL_SECS: i64 = 60 * 60;

/// Generate a cryptographically random alphanumeric token.
pub fn random_token(len: usize) -> String {
    rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

/// Build a fresh, unused reset ticket for a user.
pub fn new_reset_ticket(user_id: &str, now: DateTime<Utc>) -> PasswordResetTicket {
    PasswordResetTicket {
        id: new_id(),
        user_id: user_id.to_string(),
        token: random_token(TOKEN_LENGTH),
        expires_at: now + Duration::seconds(RESET_TICKET_TTL_SECS),
        used: false,
        created_at: now,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_tokens_have_requested_length_and_differ() {
        let a = random_token(TOKEN_LENGTH);
        let b = random_token(TOKEN_LENGTH);
        assert_eq!(a.len(), TOKEN_LENGTH);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(a, b);
    }

    #[test]
    fn new_ticket_expires_in_an_hour() {
        let now = Utc::now();
        let ticket = new_reset_ticket("u1", now);
        assert_eq!(ticket.expires_at - now, Duration::hours(1));
        assert!(ticket.is_usable(now));
        assert!(!ticket.is_usable(now + Duration::hours(2)));
    }
}
