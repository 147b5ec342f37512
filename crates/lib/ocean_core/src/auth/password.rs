//! Password policy and bcrypt hashing.

use super::AuthError;

/// bcrypt work factor for stored credentials.
pub const BCRYPT_COST: u32 = 10;

/// Characters that satisfy the "special character" rule.
pub const PASSWORD_SPECIALS: &str = "!@#$%^&*";

/// Composition rule: an uppercase letter, a digit and one of
/// [`PASSWORD_SPECIALS`]. Length is checked separately.
pub fn meets_policy(password: &str) -> bool {
    let mut upper = false;
    let mut digit = false;
    let mut special = false;
    for c in password.chars() {
        upper |= c.is_ascii_uppercase();
        digit |= c.is_ascii_digit();
        special |= PASSWORD_SPECIALS.contains(c);
    }
    upper && digit && special
}

pub fn hash_password(password: &str) -> Result<String, AuthError> {
    bcrypt::hash(password, BCRYPT_COST).map_err(|e| AuthError::Internal(format!("bcrypt hash: {e}")))
}

/// Check `password` against a stored hash. A malformed stored hash is an
/// internal error, not a mismatch.
pub fn verify_password(password: &str, stored: &str) -> Result<bool, AuthError> {
    bcrypt::verify(password, stored).map_err(|e| AuthError::Internal(format!("bcrypt verify: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify() {
        let hash = hash_password("Abc12345!").unwrap();
        assert_ne!(hash, "Abc12345!");
        assert!(verify_password("Abc12345!", &hash).unwrap());
        assert!(!verify_password("abc12345!", &hash).unwrap());
    }

    #[test]
    fn corrupt_hash_is_an_error() {
        assert!(verify_password("Abc12345!", "not-a-hash").is_err());
    }

    #[test]
    fn policy_needs_all_three_classes() {
        assert!(meets_policy("Abc12345!"));
        assert!(!meets_policy("abc12345!"));
        assert!(!meets_policy("Abcdefgh!"));
        assert!(!meets_policy("Abc123456"));
    }
}
