//! # ocean_api
//!
//! HTTP API library for Ocean Insight.

pub mod config;
pub mod envelope;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod mailer;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod validation;

use std::sync::Arc;
use std::time::Instant;

use axum::Router;
use axum::http::{HeaderValue, Method, header};
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post, put};
use ocean_core::auth::jwt::TokenService;
use ocean_core::store::Store;
use sqlx::PgPool;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::config::ApiConfig;
use crate::handlers::{admin, auth, collections, events, health, resources};
use crate::mailer::Mailer;
use crate::middleware::rate_limit::{self, RateLimits};

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub config: ApiConfig,
    pub tokens: TokenService,
    pub mailer: Arc<dyn Mailer>,
    pub limits: RateLimits,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(config: ApiConfig, store: Arc<dyn Store>, mailer: Arc<dyn Mailer>) -> Self {
        let tokens = TokenService::new(
            config.jwt_secret.as_bytes(),
            config.jwt_expiry,
            config.refresh_token_expiry,
        );
        let limits = RateLimits::standard(config.rate_limit_enabled);
        Self {
            store,
            config,
            tokens,
            mailer,
            limits,
            started_at: Instant::now(),
        }
    }
}

/// Run embedded database migrations.
///
/// Delegates to `ocean_core::migrate::migrate()` which owns the migration files.
pub async fn migrate(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    ocean_core::migrate::migrate(pool).await
}

fn cors(frontend_url: &str) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true);
    match HeaderValue::from_str(frontend_url) {
        Ok(origin) => layer.allow_origin(origin),
        Err(_) => {
            warn!(%frontend_url, "FRONTEND_URL is not a valid origin; cross-origin requests disabled");
            layer
        }
    }
}

/// Builds the Axum router with all routes and shared state.
pub fn router(state: AppState) -> Router {
    use crate::routes::*;

    let auth_limit = from_fn_with_state(state.clone(), rate_limit::auth_limit);
    let email_limit = from_fn_with_state(state.clone(), rate_limit::email_limit);
    let search_limit = from_fn_with_state(state.clone(), rate_limit::search_limit);

    // Public routes (no auth required)
    let public = Router::new()
        .route(GET_ROOT, get(health::root_handler))
        .route(GET_HEALTH, get(health::health_handler))
        .route(GET_API_HEALTH, get(health::health_handler))
        .route(
            POST_AUTH_REGISTER,
            post(auth::register_handler).route_layer(auth_limit.clone()),
        )
        .route(
            POST_AUTH_LOGIN,
            post(auth::login_handler).route_layer(auth_limit),
        )
        .route(POST_AUTH_REFRESH, post(auth::refresh_handler))
        .route(
            POST_AUTH_FORGOT_PASSWORD,
            post(auth::forgot_password_handler).route_layer(email_limit),
        )
        .route(POST_AUTH_RESET_PASSWORD, post(auth::reset_password_handler))
        .route(RESOURCES, get(resources::list_handler))
        .route(
            GET_RESOURCES_SEARCH,
            get(resources::search_handler).route_layer(search_limit),
        )
        .route(RESOURCES_ID, get(resources::get_handler))
        .route(GET_COLLECTIONS_PUBLIC_TOKEN, get(collections::shared_handler))
        .route(EVENTS, get(events::list_handler))
        .route(EVENTS_ID, get(events::get_handler));

    // Protected routes (require auth)
    let protected = Router::new()
        .route(GET_AUTH_ME, get(auth::me_handler))
        .route(RESOURCES, post(resources::create_handler))
        .route(
            RESOURCES_ID,
            put(resources::update_handler).delete(resources::delete_handler),
        )
        .route(
            COLLECTIONS,
            get(collections::list_handler).post(collections::create_handler),
        )
        .route(
            COLLECTIONS_ID,
            get(collections::get_handler)
                .put(collections::update_handler)
                .delete(collections::delete_handler),
        )
        .route(POST_COLLECTIONS_ID_ADD, post(collections::add_resource_handler))
        .route(POST_COLLECTIONS_ID_REMOVE, post(collections::remove_resource_handler))
        .route(POST_COLLECTIONS_ID_SHARE, post(collections::share_handler))
        .route(EVENTS, post(events::create_handler))
        .route(
            EVENTS_ID,
            put(events::update_handler).delete(events::delete_handler),
        )
        .route(POST_EVENTS_ID_REGISTER, post(events::register_handler))
        .route(POST_EVENTS_ID_UNREGISTER, post(events::unregister_handler))
        .route_layer(from_fn_with_state(
            state.clone(),
            middleware::auth::require_auth,
        ));

    // Admin routes (auth, then the live Admin role)
    let admin_routes = Router::new()
        .route(GET_ADMIN_DASHBOARD_STATS, get(admin::dashboard_stats_handler))
        .route(GET_ADMIN_USERS, get(admin::list_users_handler))
        .route(PUT_ADMIN_USERS_ID_ROLE, put(admin::update_role_handler))
        .route(PUT_ADMIN_USERS_ID_DEACTIVATE, put(admin::deactivate_user_handler))
        .route(GET_ADMIN_RESOURCES, get(admin::list_resources_handler))
        .route(PUT_ADMIN_RESOURCES_ID_PUBLISH, put(admin::publish_handler))
        .route(PUT_ADMIN_RESOURCES_ID_UNPUBLISH, put(admin::unpublish_handler))
        .route(GET_ADMIN_LOGS, get(admin::logs_handler))
        .route_layer(from_fn_with_state(
            state.clone(),
            middleware::authz::require_admin,
        ))
        .route_layer(from_fn_with_state(
            state.clone(),
            middleware::auth::require_auth,
        ));

    Router::new()
        .merge(public)
        .merge(protected)
        .merge(admin_routes)
        .fallback(health::fallback_handler)
        .layer(from_fn_with_state(state.clone(), rate_limit::general_limit))
        .layer(from_fn_with_state(
            state.clone(),
            middleware::request_log::log_requests,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(cors(&state.config.frontend_url))
        .with_state(state)
}
