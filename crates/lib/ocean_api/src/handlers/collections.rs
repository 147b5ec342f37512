//! Collection request handlers.

use std::collections::HashMap;

use axum::extract::{Path, Query, State};
use ocean_core::models::collection::Collection;
use ocean_core::query::Paginated;

use crate::AppState;
use crate::envelope::{ApiResponse, Created};
use crate::error::AppResult;
use crate::extract::ValidatedJson;
use crate::middleware::auth::AuthContext;
use crate::models::collection::{
    CollectionView, CreateCollectionRequest, MembershipRequest, ShareCollectionRequest, ShareLink,
    UpdateCollectionRequest,
};
use crate::services::collections;

/// `GET /api/collections`
pub async fn list_handler(
    State(state): State<AppState>,
    ctx: AuthContext,
    Query(params): Query<HashMap<String, String>>,
) -> AppResult<ApiResponse<Paginated<Collection>>> {
    let page = collections::list(state.store.as_ref(), &ctx, &params).await?;
    Ok(ApiResponse::ok("Collections retrieved", page))
}

/// `GET /api/collections/{id}`
pub async fn get_handler(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<CollectionView>> {
    let collection = collections::get(state.store.as_ref(), &ctx, &id).await?;
    Ok(ApiResponse::ok("Collection retrieved", collection))
}

/// `GET /api/collections/public/{token}`. No authentication.
pub async fn shared_handler(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> AppResult<ApiResponse<CollectionView>> {
    let collection = collections::get_shared(state.store.as_ref(), &token).await?;
    Ok(ApiResponse::ok("Collection retrieved", collection))
}

/// `POST /api/collections`
pub async fn create_handler(
    State(state): State<AppState>,
    ctx: AuthContext,
    ValidatedJson(body): ValidatedJson<CreateCollectionRequest>,
) -> AppResult<Created<Collection>> {
    let collection = collections::create(state.store.as_ref(), &ctx, body).await?;
    Ok(Created(ApiResponse::ok("Collection created successfully", collection)))
}

/// `PUT /api/collections/{id}`
pub async fn update_handler(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(id): Path<String>,
    ValidatedJson(body): ValidatedJson<UpdateCollectionRequest>,
) -> AppResult<ApiResponse<Collection>> {
    let collection = collections::update(state.store.as_ref(), &ctx, &id, body).await?;
    Ok(ApiResponse::ok("Collection updated successfully", collection))
}

/// `DELETE /api/collections/{id}`
pub async fn delete_handler(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<()>> {
    collections::delete(state.store.as_ref(), &ctx, &id).await?;
    Ok(ApiResponse::message("Collection deleted successfully"))
}

/// `POST /api/collections/{id}/add`
pub async fn add_resource_handler(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(id): Path<String>,
    ValidatedJson(body): ValidatedJson<MembershipRequest>,
) -> AppResult<ApiResponse<CollectionView>> {
    let collection =
        collections::add_resource(state.store.as_ref(), &ctx, &id, &body.resource_id).await?;
    Ok(ApiResponse::ok("Resource added to collection", collection))
}

/// `POST /api/collections/{id}/remove`
pub async fn remove_resource_handler(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(id): Path<String>,
    ValidatedJson(body): ValidatedJson<MembershipRequest>,
) -> AppResult<ApiResponse<CollectionView>> {
    let collection =
        collections::remove_resource(state.store.as_ref(), &ctx, &id, &body.resource_id).await?;
    Ok(ApiResponse::ok("Resource removed from collection", collection))
}

/// `POST /api/collections/{id}/share`
pub async fn share_handler(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(id): Path<String>,
    ValidatedJson(body): ValidatedJson<ShareCollectionRequest>,
) -> AppResult<ApiResponse<ShareLink>> {
    let link = collections::share(
        state.store.as_ref(),
        state.mailer.as_ref(),
        &state.config.frontend_url,
        &ctx,
        &id,
        &body.email,
    )
    .await?;
    Ok(ApiResponse::ok("Collection shared successfully", link))
}
