//! Resource request handlers.

use std::collections::HashMap;

use axum::extract::{Path, Query, State};
use ocean_core::query::Paginated;

use crate::AppState;
use crate::envelope::{ApiResponse, Created};
use crate::error::AppResult;
use crate::extract::ValidatedJson;
use crate::middleware::auth::AuthContext;
use crate::models::resource::{CreateResourceRequest, ResourceView, UpdateResourceRequest};
use crate::services::resources;

/// `GET /api/resources`
pub async fn list_handler(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> AppResult<ApiResponse<Paginated<ResourceView>>> {
    let page = resources::list(state.store.as_ref(), &params).await?;
    Ok(ApiResponse::ok("Resources retrieved", page))
}

/// `GET /api/resources/search`
pub async fn search_handler(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> AppResult<ApiResponse<Paginated<ResourceView>>> {
    let page = resources::search(state.store.as_ref(), &params).await?;
    Ok(ApiResponse::ok("Search results retrieved", page))
}

/// `GET /api/resources/{id}`
pub async fn get_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<ResourceView>> {
    let resource = resources::get(state.store.as_ref(), &id).await?;
    Ok(ApiResponse::ok("Resource retrieved", resource))
}

/// `POST /api/resources`
pub async fn create_handler(
    State(state): State<AppState>,
    ctx: AuthContext,
    ValidatedJson(body): ValidatedJson<CreateResourceRequest>,
) -> AppResult<Created<ResourceView>> {
    let resource = resources::create(state.store.as_ref(), &ctx, body).await?;
    Ok(Created(ApiResponse::ok("Resource created successfully", resource)))
}

/// `PUT /api/resources/{id}`
pub async fn update_handler(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(id): Path<String>,
    ValidatedJson(body): ValidatedJson<UpdateResourceRequest>,
) -> AppResult<ApiResponse<ResourceView>> {
    let resource = resources::update(state.store.as_ref(), &ctx, &id, body).await?;
    Ok(ApiResponse::ok("Resource updated successfully", resource))
}

/// `DELETE /api/resources/{id}`
pub async fn delete_handler(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<()>> {
    resources::delete(state.store.as_ref(), &ctx, &id).await?;
    Ok(ApiResponse::message("Resource deleted successfully"))
}
