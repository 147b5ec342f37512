//! Authorization checks layered after [`super::auth::require_auth`].

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use ocean_core::models::identity::{Identity, Role};
use ocean_core::store::Store;

use super::auth::AuthContext;
use crate::AppState;
use crate::error::{AppError, AppResult};

fn role_list(allowed: &[Role]) -> String {
    allowed
        .iter()
        .map(Role::as_str)
        .collect::<Vec<_>>()
        .join(" or ")
}

/// Require the caller's *current* role to be in `allowed`.
///
/// The role is re-read from the store rather than trusted from the token,
/// so a demotion takes effect on the next request.
pub async fn require_role(
    store: &dyn Store,
    ctx: &AuthContext,
    allowed: &[Role],
) -> AppResult<Identity> {
    let identity = store
        .find_user_by_id(&ctx.id)
        .await?
        .filter(|i| i.is_active)
        .ok_or_else(AppError::unauthenticated)?;
    if allowed.contains(&identity.role) {
        Ok(identity)
    } else {
        Err(AppError::Forbidden(format!(
            "Access denied. Required role: {}",
            role_list(allowed)
        )))
    }
}

/// Allow the owner, or any caller whose token role is in `allowed`.
pub fn require_owner_or_role(
    ctx: &AuthContext,
    owner_id: &str,
    allowed: &[Role],
    denied: &str,
) -> AppResult<()> {
    if ctx.id == owner_id || allowed.contains(&ctx.role) {
        Ok(())
    } else {
        Err(AppError::Forbidden(denied.to_string()))
    }
}

/// Axum middleware for the admin surface.
pub async fn require_admin(
    State(state): State<AppState>,
    ctx: AuthContext,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    require_role(state.store.as_ref(), &ctx, &[Role::Admin]).await?;
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use ocean_core::models::identity::NewIdentity;
    use ocean_core::store::{IdentityStore, MemoryStore};

    use super::*;

    fn ctx(id: &str, role: Role) -> AuthContext {
        AuthContext {
            id: id.into(),
            email: "a@x.com".into(),
            role,
        }
    }

    #[test]
    fn owner_or_admin() {
        assert!(require_owner_or_role(&ctx("u1", Role::User), "u1", &[Role::Admin], "no").is_ok());
        assert!(require_owner_or_role(&ctx("u2", Role::Admin), "u1", &[Role::Admin], "no").is_ok());
        let err = require_owner_or_role(&ctx("u2", Role::Educator), "u1", &[Role::Admin], "no");
        assert!(matches!(err, Err(AppError::Forbidden(m)) if m == "no"));
    }

    #[tokio::test]
    async fn role_check_uses_live_role() {
        let store = MemoryStore::new();
        let user = store
            .create_user(NewIdentity {
                name: "Ada".into(),
                email: "a@x.com".into(),
                password_hash: "h".into(),
                role: Role::User,
            })
            .await
            .unwrap();

        // Token claims Admin, store says User.
        let stale = ctx(&user.id, Role::Admin);
        let err = require_role(&store, &stale, &[Role::Admin]).await;
        assert!(matches!(err, Err(AppError::Forbidden(m)) if m == "Access denied. Required role: Admin"));

        assert!(require_role(&store, &stale, &[Role::User, Role::Admin]).await.is_ok());
    }

    #[tokio::test]
    async fn unknown_identity_is_unauthenticated() {
        let store = MemoryStore::new();
        let err = require_role(&store, &ctx("ghost", Role::Admin), &[Role::Admin]).await;
        assert!(matches!(err, Err(AppError::Unauthorized(_))));
    }
}
