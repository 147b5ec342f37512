//! Request activity log.
//!
//! Every request is traced and persisted as a [`LogEntry`]. Persistence is
//! fire-and-forget: failures are logged and never affect the response.

use std::time::Instant;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use chrono::Utc;
use ocean_core::models::log::{LogEntry, LogLevel};
use ocean_core::uuid::new_id;
use tracing::{info, warn};

use super::auth::AuthContext;
use crate::AppState;

pub async fn log_requests(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let started = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let response = next.run(request).await;

    let status = response.status().as_u16();
    let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
    let user_id = response
        .extensions()
        .get::<AuthContext>()
        .map(|ctx| ctx.id.clone());
    let level = if status >= 400 {
        LogLevel::Warn
    } else {
        LogLevel::Info
    };
    let message = format!("{method} {path}");

    match level {
        LogLevel::Warn => warn!(%method, %path, status, duration_ms, user_id = ?user_id, "request"),
        _ => info!(%method, %path, status, duration_ms, user_id = ?user_id, "request"),
    }

    let entry = LogEntry {
        id: new_id(),
        level,
        message,
        user_id,
        endpoint: path,
        status_code: status,
        duration_ms,
        created_at: Utc::now(),
    };
    let store = state.store.clone();
    tokio::spawn(async move {
        if let Err(e) = store.append_log(entry).await {
            warn!(error = %e, "failed to persist request log");
        }
    });

    response
}
