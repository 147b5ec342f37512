//! Authentication middleware: Bearer token extraction and verification.

use axum::extract::{FromRequestParts, Request, State};
use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::middleware::Next;
use axum::response::Response;
use ocean_core::models::auth::TokenKind;
use ocean_core::models::identity::Role;
use tracing::debug;

use crate::AppState;
use crate::error::AppError;

/// The authenticated caller, attached to request extensions by
/// [`require_auth`].
///
/// `role` is the role embedded in the access token and may be stale;
/// role-gated routes re-check the live role via [`super::authz`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    pub id: String,
    pub email: String,
    pub role: Role,
}

/// Extract the token from exactly `Bearer <token>`.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    (scheme == "Bearer" && !token.is_empty() && !token.contains(' ')).then_some(token)
}

/// Axum middleware: verifies the access token, confirms the subject still
/// exists and is active, and injects [`AuthContext`].
///
/// Every failure yields the same generic 401.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(request.headers()).ok_or_else(|| {
        debug!("missing or malformed authorization header");
        AppError::unauthenticated()
    })?;

    let claims = state
        .tokens
        .verify(token, TokenKind::Access)
        .map_err(|_| AppError::unauthenticated())?;

    match state.store.find_user_by_id(&claims.sub).await? {
        Some(identity) if identity.is_active => {}
        _ => {
            debug!(user_id = %claims.sub, "token subject missing or inactive");
            return Err(AppError::unauthenticated());
        }
    }

    let ctx = AuthContext {
        id: claims.sub,
        email: claims.email,
        role: claims.role,
    };
    request.extensions_mut().insert(ctx.clone());

    let mut response = next.run(request).await;
    // Lets the outer request logger attribute the request.
    response.extensions_mut().insert(ctx);
    Ok(response)
}

impl<S: Send + Sync> FromRequestParts<S> for AuthContext {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .ok_or_else(AppError::unauthenticated)
    }
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    fn headers(value: &str) -> HeaderMap {
        let mut h = HeaderMap::new();
        h.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        h
    }

    #[test]
    fn accepts_exact_bearer_form() {
        assert_eq!(bearer_token(&headers("Bearer abc.def.ghi")), Some("abc.def.ghi"));
    }

    #[test]
    fn rejects_malformed_headers() {
        assert_eq!(bearer_token(&HeaderMap::new()), None);
        assert_eq!(bearer_token(&headers("Bearer")), None);
        assert_eq!(bearer_token(&headers("Bearer ")), None);
        assert_eq!(bearer_token(&headers("bearer abc")), None);
        assert_eq!(bearer_token(&headers("Basic abc")), None);
        assert_eq!(bearer_token(&headers("Bearer a b")), None);
    }
}
