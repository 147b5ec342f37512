//! Collections: owner-scoped groupings of resources, optionally shared.

use std::collections::HashMap;

use chrono::Utc;
use ocean_core::auth::tickets::{TOKEN_LENGTH, random_token};
use ocean_core::models::collection::{Collection, MembershipChange};
use ocean_core::models::identity::Role;
use ocean_core::query::{Filter, ListQuery, Paginated, SortOrder, build_response};
use ocean_core::store::Store;
use ocean_core::uuid::new_id;
use tracing::info;

use super::pagination;
use super::resources::with_authors;
use crate::error::{AppError, AppResult};
use crate::mailer::{EmailMessage, Mailer, deliver};
use crate::middleware::auth::AuthContext;
use crate::middleware::authz::require_owner_or_role;
use crate::models::collection::{
    CollectionView, CreateCollectionRequest, ShareLink, UpdateCollectionRequest,
};

const NOT_FOUND: &str = "Collection not found";
const DENIED: &str = "Unauthorized";

fn not_found() -> AppError {
    AppError::NotFound(NOT_FOUND.into())
}

/// Resolve owner and member resources. Members that were deleted since
/// are skipped.
async fn view(store: &dyn Store, collection: Collection) -> AppResult<CollectionView> {
    let owner = store
        .find_user_by_id(&collection.owner_id)
        .await?
        .map(|o| o.summary());

    let mut members = Vec::with_capacity(collection.resource_ids.len());
    for id in &collection.resource_ids {
        if let Some(resource) = store.find_resource(id).await? {
            members.push(resource);
        }
    }
    let resources = with_authors(store, members).await?;

    Ok(CollectionView {
        collection,
        owner,
        resources,
    })
}

async fn owned(store: &dyn Store, ctx: &AuthContext, id: &str) -> AppResult<Collection> {
    let collection = store.find_collection(id).await?.ok_or_else(not_found)?;
    require_owner_or_role(ctx, &collection.owner_id, &[Role::Admin], DENIED)?;
    Ok(collection)
}

/// The caller's own collections, newest first.
pub async fn list(
    store: &dyn Store,
    ctx: &AuthContext,
    params: &HashMap<String, String>,
) -> AppResult<Paginated<Collection>> {
    let pagination = pagination(params);
    let filter = Filter::new().eq("userId", ctx.id.as_str());
    let page = store
        .list_collections(&ListQuery::new(filter, SortOrder::newest(), pagination))
        .await?;
    Ok(build_response(page.items, pagination.page, pagination.limit, page.total))
}

/// Public collections are readable by anyone signed in; private ones by
/// their owner only.
pub async fn get(store: &dyn Store, ctx: &AuthContext, id: &str) -> AppResult<CollectionView> {
    let collection = store.find_collection(id).await?.ok_or_else(not_found)?;
    if !collection.is_public && collection.owner_id != ctx.id {
        return Err(AppError::Forbidden(DENIED.into()));
    }
    view(store, collection).await
}

/// Read a collection through its share link. No authentication.
pub async fn get_shared(store: &dyn Store, token: &str) -> AppResult<CollectionView> {
    let collection = store
        .find_collection_by_share_token(token)
        .await?
        .ok_or_else(not_found)?;
    view(store, collection).await
}

pub async fn create(
    store: &dyn Store,
    ctx: &AuthContext,
    req: CreateCollectionRequest,
) -> AppResult<Collection> {
    let now = Utc::now();
    let collection = store
        .insert_collection(Collection {
            id: new_id(),
            owner_id: ctx.id.clone(),
            title: req.title,
            description: req.description,
            resource_ids: Vec::new(),
            is_public: req.is_public,
            share_token: None,
            created_at: now,
            updated_at: now,
        })
        .await?;
    info!(collection_id = %collection.id, user_id = %ctx.id, "collection created");
    Ok(collection)
}

pub async fn update(
    store: &dyn Store,
    ctx: &AuthContext,
    id: &str,
    req: UpdateCollectionRequest,
) -> AppResult<Collection> {
    owned(store, ctx, id).await?;
    store
        .update_collection(id, req.into())
        .await?
        .ok_or_else(not_found)
}

pub async fn delete(store: &dyn Store, ctx: &AuthContext, id: &str) -> AppResult<()> {
    owned(store, ctx, id).await?;
    if !store.delete_collection(id).await? {
        return Err(not_found());
    }
    info!(collection_id = %id, user_id = %ctx.id, "collection deleted");
    Ok(())
}

/// Add a resource. The membership check and insert happen in one store
/// operation, so concurrent adds of the same resource cannot both succeed.
pub async fn add_resource(
    store: &dyn Store,
    ctx: &AuthContext,
    id: &str,
    resource_id: &str,
) -> AppResult<CollectionView> {
    owned(store, ctx, id).await?;
    if store.find_resource(resource_id).await?.is_none() {
        return Err(AppError::NotFound("Resource not found".into()));
    }
    match store.add_collection_resource(id, resource_id).await? {
        MembershipChange::Added(collection) => view(store, collection).await,
        MembershipChange::AlreadyPresent => {
            Err(AppError::BadRequest("Resource already in collection".into()))
        }
        MembershipChange::CollectionMissing => Err(not_found()),
    }
}

/// Remove a resource. Removing one that is not a member succeeds.
pub async fn remove_resource(
    store: &dyn Store,
    ctx: &AuthContext,
    id: &str,
    resource_id: &str,
) -> AppResult<CollectionView> {
    owned(store, ctx, id).await?;
    let collection = store
        .remove_collection_resource(id, resource_id)
        .await?
        .ok_or_else(not_found)?;
    view(store, collection).await
}

/// Email a share link. The share token is generated on first share and
/// reused afterwards.
pub async fn share(
    store: &dyn Store,
    mailer: &dyn Mailer,
    frontend_url: &str,
    ctx: &AuthContext,
    id: &str,
    email: &str,
) -> AppResult<ShareLink> {
    let collection = owned(store, ctx, id).await?;
    let token = store
        .ensure_share_token(id, &random_token(TOKEN_LENGTH))
        .await?
        .ok_or_else(not_found)?;
    let share_link = format!("{frontend_url}/collections/{token}");

    let shared_by = store
        .find_user_by_id(&ctx.id)
        .await?
        .map(|u| u.name)
        .unwrap_or_else(|| "Someone".to_string());
    deliver(
        mailer,
        EmailMessage::collection_shared(email, &shared_by, &collection.title, &share_link),
    )
    .await;
    info!(collection_id = %id, user_id = %ctx.id, "collection shared");

    Ok(ShareLink { share_link })
}
