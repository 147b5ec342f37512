//! Authentication request handlers.

use axum::extract::State;
use ocean_core::models::auth::TokenPair;

use crate::AppState;
use crate::envelope::{ApiResponse, Created};
use crate::error::AppResult;
use crate::extract::ValidatedJson;
use crate::middleware::auth::AuthContext;
use crate::models::auth::{
    AuthPayload, ForgotPasswordRequest, LoginRequest, RefreshRequest, RegisterRequest,
    ResetPasswordRequest, UserPayload,
};
use crate::services::auth;

/// `POST /api/auth/register`
pub async fn register_handler(
    State(state): State<AppState>,
    ValidatedJson(body): ValidatedJson<RegisterRequest>,
) -> AppResult<Created<AuthPayload>> {
    let payload = auth::register(
        state.store.as_ref(),
        &state.tokens,
        state.mailer.as_ref(),
        &state.config.frontend_url,
        body,
    )
    .await?;
    Ok(Created(ApiResponse::ok("User registered successfully", payload)))
}

/// `POST /api/auth/login`
pub async fn login_handler(
    State(state): State<AppState>,
    ValidatedJson(body): ValidatedJson<LoginRequest>,
) -> AppResult<ApiResponse<AuthPayload>> {
    let payload = auth::login(state.store.as_ref(), &state.tokens, &body.email, &body.password).await?;
    Ok(ApiResponse::ok("Login successful", payload))
}

/// `POST /api/auth/refresh`
pub async fn refresh_handler(
    State(state): State<AppState>,
    ValidatedJson(body): ValidatedJson<RefreshRequest>,
) -> AppResult<ApiResponse<TokenPair>> {
    let pair = auth::refresh(state.store.as_ref(), &state.tokens, &body.refresh_token).await?;
    Ok(ApiResponse::ok("Token refreshed", pair))
}

/// `POST /api/auth/forgot-password`. The response never reveals whether
/// the address is registered.
pub async fn forgot_password_handler(
    State(state): State<AppState>,
    ValidatedJson(body): ValidatedJson<ForgotPasswordRequest>,
) -> AppResult<ApiResponse<()>> {
    auth::forgot_password(
        state.store.as_ref(),
        state.mailer.as_ref(),
        &state.config.frontend_url,
        &body.email,
    )
    .await?;
    Ok(ApiResponse::message(
        "If an account exists with that email, a password reset link has been sent",
    ))
}

/// `POST /api/auth/reset-password`
pub async fn reset_password_handler(
    State(state): State<AppState>,
    ValidatedJson(body): ValidatedJson<ResetPasswordRequest>,
) -> AppResult<ApiResponse<()>> {
    auth::reset_password(state.store.as_ref(), &body.token, &body.password).await?;
    Ok(ApiResponse::message("Password reset successfully"))
}

/// `GET /api/auth/me`
pub async fn me_handler(
    State(state): State<AppState>,
    ctx: AuthContext,
) -> AppResult<ApiResponse<UserPayload>> {
    let user = auth::me(state.store.as_ref(), &ctx.id).await?;
    Ok(ApiResponse::ok("User retrieved", UserPayload { user }))
}
