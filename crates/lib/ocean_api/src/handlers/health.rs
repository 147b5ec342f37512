//! Liveness probe and root banner.

use axum::extract::State;
use axum::http::Uri;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sysinfo::{ProcessesToUpdate, System};

use crate::AppState;
use crate::envelope::ApiResponse;
use crate::error::AppError;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryUsage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rss_bytes: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct Health {
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
    /// Seconds since the router was built.
    pub uptime: f64,
    pub memory: MemoryUsage,
    pub store: &'static str,
}

/// Resident set size of this process.
fn resident_bytes() -> Option<u64> {
    let pid = sysinfo::get_current_pid().ok()?;
    let mut sys = System::new();
    sys.refresh_processes(ProcessesToUpdate::Some(&[pid]), true);
    sys.process(pid).map(|p| p.memory())
}

/// `GET /health` and `GET /api/health`
pub async fn health_handler(State(state): State<AppState>) -> ApiResponse<Health> {
    ApiResponse::ok(
        "API is healthy",
        Health {
            status: "OK",
            timestamp: Utc::now(),
            uptime: state.started_at.elapsed().as_secs_f64(),
            memory: MemoryUsage {
                rss_bytes: resident_bytes(),
            },
            store: state.store.backend(),
        },
    )
}

/// `GET /`
pub async fn root_handler() -> ApiResponse<()> {
    ApiResponse::message("Welcome to the Ocean Insight API")
}

/// Envelope 404 for unmatched routes.
pub async fn fallback_handler(uri: Uri) -> AppError {
    AppError::NotFound(format!("Route {} not found", uri.path()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_resident_memory() {
        let rss = resident_bytes().unwrap();
        assert!(rss > 0);
    }
}
