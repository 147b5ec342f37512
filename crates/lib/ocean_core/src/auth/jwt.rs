//! JWT token generation and verification.

use std::time::Duration as StdDuration;

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use tracing::debug;

use super::AuthError;
use crate::models::auth::{TokenClaims, TokenKind, TokenPair};
use crate::models::identity::Identity;

/// Default access token lifetime: 1 hour.
pub const DEFAULT_ACCESS_TTL: StdDuration = StdDuration::from_secs(60 * 60);

/// Default refresh token lifetime: 7 days.
pub const DEFAULT_REFRESH_TTL: StdDuration = StdDuration::from_secs(7 * 24 * 60 * 60);

/// Issues and verifies HS256 credential pairs.
///
/// Stateless: validity is signature + expiry + kind only.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenService {
    pub fn new(secret: &[u8], access_ttl: StdDuration, refresh_ttl: StdDuration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            access_ttl: to_chrono(access_ttl),
            refresh_ttl: to_chrono(refresh_ttl),
        }
    }

    /// Issue an access + refresh pair for the identity's current claims.
    pub fn issue(&self, identity: &Identity) -> Result<TokenPair, AuthError> {
        Ok(TokenPair {
            access_token: self.sign(identity, TokenKind::Access, self.access_ttl)?,
            refresh_token: self.sign(identity, TokenKind::Refresh, self.refresh_ttl)?,
        })
    }

    fn sign(&self, identity: &Identity, kind: TokenKind, ttl: Duration) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = TokenClaims {
            sub: identity.id.clone(),
            email: identity.email.clone(),
            role: identity.role,
            kind,
            exp: now.checked_add_signed(ttl).map_or(i64::MAX, |t| t.timestamp()),
            iat: now.timestamp(),
        };
        self.encode_claims(&claims)
    }

    /// Sign arbitrary claims.
    pub fn encode_claims(&self, claims: &TokenClaims) -> Result<String, AuthError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .map_err(|e| AuthError::TokenError(format!("jwt encode: {e}")))
    }

    /// Verify a token of the expected kind, returning its claims.
    pub fn verify(&self, token: &str, expected: TokenKind) -> Result<TokenClaims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 0;
        let claims = decode::<TokenClaims>(token, &self.decoding, &validation)
            .map_err(|e| {
                debug!(error = %e, "token rejected");
                AuthError::TokenInvalid
            })?
            .claims;
        if claims.kind != expected {
            debug!(?expected, actual = ?claims.kind, "token kind mismatch");
            return Err(AuthError::TokenInvalid);
        }
        Ok(claims)
    }
}

fn to_chrono(d: StdDuration) -> Duration {
    Duration::from_std(d).unwrap_or(Duration::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::identity::Role;

    fn identity() -> Identity {
        let now = Utc::now();
        Identity {
            id: "user-1".into(),
            name: "Ada".into(),
            email: "ada@example.com".into(),
            password_hash: String::new(),
            role: Role::Educator,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    fn service(secret: &str) -> TokenService {
        TokenService::new(secret.as_bytes(), DEFAULT_ACCESS_TTL, DEFAULT_REFRESH_TTL)
    }

    #[test]
    fn issued_tokens_verify_with_their_own_kind() {
        let svc = service("s3cret-key");
        let pair = svc.issue(&identity()).unwrap();

        let access = svc.verify(&pair.access_token, TokenKind::Access).unwrap();
        assert_eq!(access.sub, "user-1");
        assert_eq!(access.email, "ada@example.com");
        assert_eq!(access.role, Role::Educator);

        let refresh = svc.verify(&pair.refresh_token, TokenKind::Refresh).unwrap();
        assert!(refresh.exp > access.exp);
    }

    #[test]
    fn tokens_are_not_interchangeable() {
        let svc = service("s3cret-key");
        let pair = svc.issue(&identity()).unwrap();
        assert!(matches!(
            svc.verify(&pair.refresh_token, TokenKind::Access),
            Err(AuthError::TokenInvalid)
        ));
        assert!(matches!(
            svc.verify(&pair.access_token, TokenKind::Refresh),
            Err(AuthError::TokenInvalid)
        ));
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let pair = service("one").issue(&identity()).unwrap();
        assert!(service("two").verify(&pair.access_token, TokenKind::Access).is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let svc = service("s3cret-key");
        let now = Utc::now().timestamp();
        let token = svc
            .encode_claims(&TokenClaims {
                sub: "user-1".into(),
                email: "ada@example.com".into(),
                role: Role::User,
                kind: TokenKind::Access,
                exp: now - 10,
                iat: now - 3600,
            })
            .unwrap();
        assert!(matches!(
            svc.verify(&token, TokenKind::Access),
            Err(AuthError::TokenInvalid)
        ));
    }

    #[test]
    fn garbage_is_rejected() {
        let svc = service("s3cret-key");
        assert!(svc.verify("not.a.jwt", TokenKind::Access).is_err());
        assert!(svc.verify("", TokenKind::Access).is_err());
    }
}
