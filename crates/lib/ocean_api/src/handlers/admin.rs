//! Admin request handlers. Mounted behind the live Admin role check.

use std::collections::HashMap;

use axum::extract::{Path, Query, State};
use ocean_core::models::identity::Identity;
use ocean_core::models::log::LogEntry;
use ocean_core::models::resource::Resource;
use ocean_core::query::Paginated;

use crate::AppState;
use crate::envelope::ApiResponse;
use crate::error::AppResult;
use crate::extract::ValidatedJson;
use crate::models::admin::{DashboardStats, UpdateRoleRequest};
use crate::models::resource::ResourceView;
use crate::services::admin;

/// `GET /api/admin/dashboard/stats`
pub async fn dashboard_stats_handler(
    State(state): State<AppState>,
) -> AppResult<ApiResponse<DashboardStats>> {
    let stats = admin::dashboard(state.store.as_ref()).await?;
    Ok(ApiResponse::ok("Dashboard statistics", stats))
}

/// `GET /api/admin/users`
pub async fn list_users_handler(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> AppResult<ApiResponse<Paginated<Identity>>> {
    let page = admin::users(state.store.as_ref(), &params).await?;
    Ok(ApiResponse::ok("Users retrieved", page))
}

/// `PUT /api/admin/users/{userId}/role`
pub async fn update_role_handler(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    ValidatedJson(body): ValidatedJson<UpdateRoleRequest>,
) -> AppResult<ApiResponse<Identity>> {
    let user = admin::set_role(state.store.as_ref(), &user_id, body.role()?).await?;
    Ok(ApiResponse::ok("User role updated", user))
}

/// `PUT /api/admin/users/{userId}/deactivate`
pub async fn deactivate_user_handler(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> AppResult<ApiResponse<Identity>> {
    let user = admin::deactivate(state.store.as_ref(), &user_id).await?;
    Ok(ApiResponse::ok("User deactivated", user))
}

/// `GET /api/admin/resources`
pub async fn list_resources_handler(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> AppResult<ApiResponse<Paginated<ResourceView>>> {
    let page = admin::resources(state.store.as_ref(), &params).await?;
    Ok(ApiResponse::ok("Resources retrieved", page))
}

/// `PUT /api/admin/resources/{id}/publish`
pub async fn publish_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<Resource>> {
    let resource = admin::set_published(state.store.as_ref(), &id, true).await?;
    Ok(ApiResponse::ok("Resource published", resource))
}

/// `PUT /api/admin/resources/{id}/unpublish`
pub async fn unpublish_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<Resource>> {
    let resource = admin::set_published(state.store.as_ref(), &id, false).await?;
    Ok(ApiResponse::ok("Resource unpublished", resource))
}

/// `GET /api/admin/logs`
pub async fn logs_handler(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> AppResult<ApiResponse<Paginated<LogEntry>>> {
    let page = admin::logs(state.store.as_ref(), &params).await?;
    Ok(ApiResponse::ok("Logs retrieved", page))
}
