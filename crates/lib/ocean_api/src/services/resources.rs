//! Resource listing, search and authored CRUD.

use std::collections::HashMap;

use chrono::Utc;
use ocean_core::models::identity::Role;
use ocean_core::models::resource::{
    RESOURCE_FILTERS, RESOURCE_SEARCH_FILTERS, RESOURCE_SORTS, Resource,
};
use ocean_core::query::{
    FilterField, ListQuery, Paginated, SortOrder, build_filter, build_response, resolve_sort,
};
use ocean_core::store::Store;
use ocean_core::uuid::new_id;
use tracing::info;

use super::{pagination, summaries};
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthContext;
use crate::middleware::authz::require_owner_or_role;
use crate::models::resource::{CreateResourceRequest, ResourceView, UpdateResourceRequest};

const NOT_FOUND: &str = "Resource not found";

/// Attach author summaries.
pub(crate) async fn with_authors(
    store: &dyn Store,
    resources: Vec<Resource>,
) -> AppResult<Vec<ResourceView>> {
    let ids: Vec<&str> = resources.iter().map(|r| r.author_id.as_str()).collect();
    let authors = summaries(store, &ids).await?;
    Ok(resources
        .into_iter()
        .map(|resource| ResourceView {
            author: authors.get(&resource.author_id).cloned(),
            resource,
        })
        .collect())
}

async fn with_author(store: &dyn Store, resource: Resource) -> AppResult<ResourceView> {
    let author = store
        .find_user_by_id(&resource.author_id)
        .await?
        .map(|a| a.summary());
    Ok(ResourceView { resource, author })
}

async fn published(
    store: &dyn Store,
    params: &HashMap<String, String>,
    allowed: &[FilterField],
) -> AppResult<Paginated<ResourceView>> {
    let pagination = pagination(params);
    let filter = build_filter(params, allowed).flag("isPublished", true);
    let sort = resolve_sort(
        params.get("sort").map(String::as_str),
        RESOURCE_SORTS,
        SortOrder::newest(),
    );
    let page = store
        .list_resources(&ListQuery::new(filter, sort, pagination))
        .await?;
    let items = with_authors(store, page.items).await?;
    Ok(build_response(items, pagination.page, pagination.limit, page.total))
}

/// Published resources, filtered by grade, type, subject and tag.
pub async fn list(
    store: &dyn Store,
    params: &HashMap<String, String>,
) -> AppResult<Paginated<ResourceView>> {
    published(store, params, RESOURCE_FILTERS).await
}

/// [`list`] plus free-text `query` over title, description and tags.
pub async fn search(
    store: &dyn Store,
    params: &HashMap<String, String>,
) -> AppResult<Paginated<ResourceView>> {
    published(store, params, RESOURCE_SEARCH_FILTERS).await
}

/// Fetch one resource, counting the view.
pub async fn get(store: &dyn Store, id: &str) -> AppResult<ResourceView> {
    let resource = store
        .record_resource_view(id)
        .await?
        .ok_or_else(|| AppError::NotFound(NOT_FOUND.into()))?;
    with_author(store, resource).await
}

/// Create a resource. It stays unpublished until the author or an Admin
/// publishes it.
pub async fn create(
    store: &dyn Store,
    ctx: &AuthContext,
    req: CreateResourceRequest,
) -> AppResult<ResourceView> {
    let now = Utc::now();
    let resource = Resource {
        id: new_id(),
        resource_type: req.resource_type()?,
        grade_level: req.grade_level()?,
        title: req.title,
        description: req.description,
        content: req.content,
        subject: req.subject,
        tags: req.tags,
        media_url: req.media_url,
        thumbnail_url: req.thumbnail_url,
        author_id: ctx.id.clone(),
        views: 0,
        is_published: false,
        created_at: now,
        updated_at: now,
    };
    let resource = store.insert_resource(resource).await?;
    info!(resource_id = %resource.id, author_id = %ctx.id, "resource created");

    with_author(store, resource).await
}

async fn owned(store: &dyn Store, ctx: &AuthContext, id: &str, denied: &str) -> AppResult<Resource> {
    let resource = store
        .find_resource(id)
        .await?
        .ok_or_else(|| AppError::NotFound(NOT_FOUND.into()))?;
    require_owner_or_role(ctx, &resource.author_id, &[Role::Admin], denied)?;
    Ok(resource)
}

/// Update a resource. Author or Admin only.
pub async fn update(
    store: &dyn Store,
    ctx: &AuthContext,
    id: &str,
    req: UpdateResourceRequest,
) -> AppResult<ResourceView> {
    owned(store, ctx, id, "Unauthorized to update this resource").await?;
    let patch = req.into_patch()?;
    let resource = store
        .update_resource(id, patch)
        .await?
        .ok_or_else(|| AppError::NotFound(NOT_FOUND.into()))?;
    info!(resource_id = %id, user_id = %ctx.id, "resource updated");

    with_author(store, resource).await
}

/// Delete a resource. Author or Admin only.
pub async fn delete(store: &dyn Store, ctx: &AuthContext, id: &str) -> AppResult<()> {
    owned(store, ctx, id, "Unauthorized to delete this resource").await?;
    if !store.delete_resource(id).await? {
        return Err(AppError::NotFound(NOT_FOUND.into()));
    }
    info!(resource_id = %id, user_id = %ctx.id, "resource deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use ocean_core::models::identity::NewIdentity;
    use ocean_core::models::resource::ResourcePatch;
    use ocean_core::store::{IdentityStore, MemoryStore, ResourceStore};

    use super::*;

    async fn author(store: &MemoryStore) -> AuthContext {
        let user = store
            .create_user(NewIdentity {
                name: "Ada".into(),
                email: "ada@x.com".into(),
                password_hash: "x".into(),
                role: Role::User,
            })
            .await
            .unwrap();
        AuthContext {
            id: user.id,
            email: user.email,
            role: user.role,
        }
    }

    fn lesson(title: &str) -> CreateResourceRequest {
        serde_json::from_value(serde_json::json!({
            "title": title,
            "description": "Tides, currents and the creatures between them",
            "content": "A full lesson plan on intertidal zones.",
            "type": "Lesson",
            "gradeLevel": "6-8",
            "subject": "Marine Biology",
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn created_resources_are_unpublished() {
        let store = MemoryStore::new();
        let ctx = author(&store).await;
        let view = create(&store, &ctx, lesson("Rock pools")).await.unwrap();
        assert!(!view.resource.is_published);
        assert_eq!(view.author.map(|a| a.name).as_deref(), Some("Ada"));

        let page = list(&store, &HashMap::new()).await.unwrap();
        assert_eq!(page.pagination.total, 0);
    }

    #[tokio::test]
    async fn listing_with_authors_runs_on_spawned_tasks() {
        let store = Arc::new(MemoryStore::new());
        let ctx = author(&store).await;
        let view = create(store.as_ref(), &ctx, lesson("Rock pools")).await.unwrap();
        store
            .update_resource(&view.resource.id, ResourcePatch::publish(true))
            .await
            .unwrap();

        let task_store = store.clone();
        let page = tokio::spawn(async move {
            let params = HashMap::from([("query".to_string(), "rock".to_string())]);
            search(task_store.as_ref(), &params).await
        })
        .await
        .unwrap()
        .unwrap();
        assert_eq!(page.pagination.total, 1);
        assert_eq!(page.data[0].author.as_ref().map(|a| a.name.as_str()), Some("Ada"));

        let id = view.resource.id.clone();
        let fetched = tokio::spawn(async move { get(store.as_ref(), &id).await })
            .await
            .unwrap()
            .unwrap();
        assert_eq!(fetched.resource.views, 1);
    }
}
