//! Account flows: registration, login, refresh, password reset.

use chrono::Utc;
use ocean_core::auth::AuthError;
use ocean_core::auth::jwt::TokenService;
use ocean_core::auth::password::{hash_password, verify_password};
use ocean_core::auth::tickets::new_reset_ticket;
use ocean_core::models::auth::{TokenKind, TokenPair};
use ocean_core::models::identity::{Identity, IdentityPatch, NewIdentity, Role, normalize_email};
use ocean_core::store::{Store, StoreError};
use tracing::{debug, info};

use crate::error::{AppError, AppResult};
use crate::mailer::{EmailMessage, Mailer, deliver};
use crate::models::auth::{AuthPayload, RegisterRequest};

const USER_EXISTS: &str = "User already exists";
const INVALID_RESET: &str = "Invalid or expired reset token";

fn payload(user: Identity, pair: TokenPair) -> AuthPayload {
    AuthPayload {
        user,
        access_token: pair.access_token,
        refresh_token: pair.refresh_token,
    }
}

/// Create a `User` account, issue tokens and send the welcome email.
pub async fn register(
    store: &dyn Store,
    tokens: &TokenService,
    mailer: &dyn Mailer,
    frontend_url: &str,
    req: RegisterRequest,
) -> AppResult<AuthPayload> {
    let email = normalize_email(&req.email);
    if store.find_user_by_email(&email).await?.is_some() {
        return Err(AppError::Conflict(USER_EXISTS.into()));
    }

    let password_hash = hash_password(&req.password)?;
    let user = store
        .create_user(NewIdentity {
            name: req.name.trim().to_string(),
            email,
            password_hash,
            role: Role::User,
        })
        .await
        .map_err(|e| match e {
            // Lost a race with a concurrent registration.
            StoreError::Conflict(_) => AppError::Conflict(USER_EXISTS.into()),
            other => other.into(),
        })?;

    let pair = tokens.issue(&user)?;
    info!(user_id = %user.id, "user registered");

    let login_link = format!("{frontend_url}/login");
    deliver(mailer, EmailMessage::welcome(&user.email, &user.name, &login_link)).await;

    Ok(payload(user, pair))
}

/// Verify credentials. Unknown email, wrong password and deactivated
/// accounts are indistinguishable to the caller.
pub async fn login(
    store: &dyn Store,
    tokens: &TokenService,
    email: &str,
    password: &str,
) -> AppResult<AuthPayload> {
    let user = store
        .find_user_by_email(&normalize_email(email))
        .await?
        .ok_or(AuthError::CredentialError)?;

    if !verify_password(password, &user.password_hash)? || !user.is_active {
        debug!(user_id = %user.id, "login rejected");
        return Err(AuthError::CredentialError.into());
    }

    let pair = tokens.issue(&user)?;
    info!(user_id = %user.id, "user logged in");
    Ok(payload(user, pair))
}

/// Exchange a refresh token for a fresh pair.
///
/// Claims are re-derived from the current identity record, so a role change
/// shows up in the new access token.
pub async fn refresh(
    store: &dyn Store,
    tokens: &TokenService,
    refresh_token: &str,
) -> AppResult<TokenPair> {
    let claims = tokens.verify(refresh_token, TokenKind::Refresh)?;
    let user = store
        .find_user_by_id(&claims.sub)
        .await?
        .filter(|u| u.is_active)
        .ok_or(AuthError::TokenInvalid)?;
    Ok(tokens.issue(&user)?)
}

/// Start a password reset. Always succeeds so callers cannot probe for
/// registered addresses.
pub async fn forgot_password(
    store: &dyn Store,
    mailer: &dyn Mailer,
    frontend_url: &str,
    email: &str,
) -> AppResult<()> {
    let Some(user) = store
        .find_user_by_email(&normalize_email(email))
        .await?
        .filter(|u| u.is_active)
    else {
        debug!("password reset requested for unknown address");
        return Ok(());
    };

    let ticket = new_reset_ticket(&user.id, Utc::now());
    let link = format!("{frontend_url}/reset-password?token={}", ticket.token);
    store.insert_ticket(ticket).await?;
    info!(user_id = %user.id, "password reset ticket issued");

    deliver(mailer, EmailMessage::password_reset(&user.email, &link)).await;
    Ok(())
}

/// Consume a reset ticket and set the new password. A ticket works once.
pub async fn reset_password(store: &dyn Store, token: &str, password: &str) -> AppResult<()> {
    let user_id = store
        .consume_ticket(token, Utc::now())
        .await?
        .ok_or_else(|| AppError::Unauthorized(INVALID_RESET.into()))?;

    let password_hash = hash_password(password)?;
    store
        .update_user(
            &user_id,
            IdentityPatch {
                password_hash: Some(password_hash),
                ..Default::default()
            },
        )
        .await?
        .ok_or_else(|| AppError::Unauthorized(INVALID_RESET.into()))?;

    info!(%user_id, "password reset");
    Ok(())
}

/// The caller's own identity record.
pub async fn me(store: &dyn Store, user_id: &str) -> AppResult<Identity> {
    store
        .find_user_by_id(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use ocean_core::store::{IdentityStore, MemoryStore};

    use super::*;
    use crate::mailer::TracingMailer;

    fn tokens() -> TokenService {
        TokenService::new(b"test-secret", Duration::from_secs(3600), Duration::from_secs(7200))
    }

    fn request(email: &str) -> RegisterRequest {
        serde_json::from_value(serde_json::json!({
            "name": "Ada", "email": email, "password": "Abc12345!"
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn register_then_login() {
        let store = Arc::new(MemoryStore::default());
        let mailer = TracingMailer::new(Default::default());
        let created = register(store.as_ref(), &tokens(), &mailer, "http://f", request("Ada@X.com"))
            .await
            .unwrap();
        assert_eq!(created.user.email, "ada@x.com");
        assert_eq!(created.user.role, Role::User);

        let again = register(store.as_ref(), &tokens(), &mailer, "http://f", request("ada@x.com")).await;
        assert!(matches!(again, Err(AppError::Conflict(_))));

        let logged = login(store.as_ref(), &tokens(), "ADA@x.com", "Abc12345!").await.unwrap();
        assert_eq!(logged.user.id, created.user.id);

        let wrong = login(store.as_ref(), &tokens(), "ada@x.com", "nope").await;
        assert!(matches!(wrong, Err(AppError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn deactivated_accounts_cannot_log_in_or_refresh() {
        let store = MemoryStore::default();
        let mailer = TracingMailer::new(Default::default());
        let created = register(&store, &tokens(), &mailer, "http://f", request("b@x.com"))
            .await
            .unwrap();
        store
            .update_user(
                &created.user.id,
                IdentityPatch {
                    is_active: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let attempt = login(&store, &tokens(), "b@x.com", "Abc12345!").await;
        assert!(matches!(attempt, Err(AppError::Unauthorized(_))));
        let refreshed = refresh(&store, &tokens(), &created.refresh_token).await;
        assert!(matches!(refreshed, Err(AppError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn refresh_rejects_access_tokens() {
        let store = MemoryStore::default();
        let mailer = TracingMailer::new(Default::default());
        let created = register(&store, &tokens(), &mailer, "http://f", request("c@x.com"))
            .await
            .unwrap();
        assert!(refresh(&store, &tokens(), &created.access_token).await.is_err());
        assert!(refresh(&store, &tokens(), &created.refresh_token).await.is_ok());
    }

    #[tokio::test]
    async fn unknown_reset_token_is_rejected() {
        let store = MemoryStore::default();
        let result = reset_password(&store, "missing", "Abc12345!").await;
        assert!(matches!(result, Err(AppError::Unauthorized(_))));
    }
}
