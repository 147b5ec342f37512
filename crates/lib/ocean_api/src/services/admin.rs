//! Administrative views over users, resources and the request log.
//!
//! Every function here assumes the caller already passed the live Admin
//! role check.

use std::collections::HashMap;

use ocean_core::models::identity::{Identity, IdentityPatch, Role, USER_FILTERS, USER_SORTS};
use ocean_core::models::log::{LOG_FILTERS, LogEntry};
use ocean_core::models::resource::{ADMIN_RESOURCE_FILTERS, RESOURCE_SORTS, Resource, ResourcePatch};
use ocean_core::query::{
    Filter, ListQuery, Paginated, Pagination, SortOrder, build_filter, build_response,
    normalize_pagination, resolve_sort,
};
use ocean_core::store::Store;
use tracing::info;

use super::pagination;
use super::resources::with_authors;
use crate::error::{AppError, AppResult};
use crate::models::admin::{DashboardStats, RecentActivity, Stats};
use crate::models::resource::ResourceView;

const RECENT_LOGS: u64 = 10;
const RECENT_USERS: u64 = 5;
const RECENT_RESOURCES: u64 = 5;
const DEFAULT_LOG_LIMIT: &str = "20";

fn recent(limit: u64) -> ListQuery {
    ListQuery::new(Filter::new(), SortOrder::newest(), Pagination::first(limit))
}

fn sort_param(params: &HashMap<String, String>) -> Option<&str> {
    params.get("sort").map(String::as_str)
}

/// Totals and the most recent activity.
pub async fn dashboard(store: &dyn Store) -> AppResult<DashboardStats> {
    let everyone = Filter::new();
    let stats = Stats {
        total_users: store.count_users(&everyone).await?,
        total_resources: store.count_resources(&everyone).await?,
        published_resources: store
            .count_resources(&Filter::new().flag("isPublished", true))
            .await?,
        total_events: store.count_events(&everyone).await?,
        active_users: store
            .count_users(&Filter::new().flag("isActive", true))
            .await?,
    };

    let recent_activity = RecentActivity {
        logs: store.list_logs(&recent(RECENT_LOGS)).await?.items,
        users: store.list_users(&recent(RECENT_USERS)).await?.items,
        resources: store.list_resources(&recent(RECENT_RESOURCES)).await?.items,
    };

    Ok(DashboardStats {
        stats,
        recent_activity,
    })
}

/// All users, filtered by `role` and `isActive`.
pub async fn users(
    store: &dyn Store,
    params: &HashMap<String, String>,
) -> AppResult<Paginated<Identity>> {
    let pagination = pagination(params);
    let filter = build_filter(params, USER_FILTERS);
    let sort = resolve_sort(sort_param(params), USER_SORTS, SortOrder::newest());
    let page = store
        .list_users(&ListQuery::new(filter, sort, pagination))
        .await?;
    Ok(build_response(page.items, pagination.page, pagination.limit, page.total))
}

fn user_not_found() -> AppError {
    AppError::NotFound("User not found".into())
}

pub async fn set_role(store: &dyn Store, user_id: &str, role: Role) -> AppResult<Identity> {
    let user = store
        .update_user(
            user_id,
            IdentityPatch {
                role: Some(role),
                ..Default::default()
            },
        )
        .await?
        .ok_or_else(user_not_found)?;
    info!(%user_id, role = role.as_str(), "user role updated");
    Ok(user)
}

pub async fn deactivate(store: &dyn Store, user_id: &str) -> AppResult<Identity> {
    let user = store
        .update_user(
            user_id,
            IdentityPatch {
                is_active: Some(false),
                ..Default::default()
            },
        )
        .await?
        .ok_or_else(user_not_found)?;
    info!(%user_id, "user deactivated");
    Ok(user)
}

/// Every resource, published or not, optionally filtered by `isPublished`.
pub async fn resources(
    store: &dyn Store,
    params: &HashMap<String, String>,
) -> AppResult<Paginated<ResourceView>> {
    let pagination = pagination(params);
    let filter = build_filter(params, ADMIN_RESOURCE_FILTERS);
    let sort = resolve_sort(sort_param(params), RESOURCE_SORTS, SortOrder::newest());
    let page = store
        .list_resources(&ListQuery::new(filter, sort, pagination))
        .await?;
    let items = with_authors(store, page.items).await?;
    Ok(build_response(items, pagination.page, pagination.limit, page.total))
}

pub async fn set_published(store: &dyn Store, id: &str, published: bool) -> AppResult<Resource> {
    let resource = store
        .update_resource(id, ResourcePatch::publish(published))
        .await?
        .ok_or_else(|| AppError::NotFound("Resource not found".into()))?;
    info!(resource_id = %id, published, "resource visibility changed");
    Ok(resource)
}

/// Request log, newest first, filtered by `level` and `userId`.
pub async fn logs(
    store: &dyn Store,
    params: &HashMap<String, String>,
) -> AppResult<Paginated<LogEntry>> {
    let pagination = normalize_pagination(
        params.get("page").map(String::as_str),
        Some(params.get("limit").map_or(DEFAULT_LOG_LIMIT, String::as_str)),
    );
    let filter = build_filter(params, LOG_FILTERS);
    let page = store
        .list_logs(&ListQuery::new(filter, SortOrder::newest(), pagination))
        .await?;
    Ok(build_response(page.items, pagination.page, pagination.limit, page.total))
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use ocean_core::models::identity::NewIdentity;
    use ocean_core::models::log::LogLevel;
    use ocean_core::store::{IdentityStore, LogStore, MemoryStore};

    use super::*;

    async fn user(store: &MemoryStore, email: &str) -> Identity {
        store
            .create_user(NewIdentity {
                name: "Someone".into(),
                email: email.into(),
                password_hash: "x".into(),
                role: Role::User,
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn dashboard_counts_active_users() {
        let store = MemoryStore::default();
        user(&store, "a@x.com").await;
        let b = user(&store, "b@x.com").await;
        deactivate(&store, &b.id).await.unwrap();

        let stats = dashboard(&store).await.unwrap();
        assert_eq!(stats.stats.total_users, 2);
        assert_eq!(stats.stats.active_users, 1);
        assert_eq!(stats.recent_activity.users.len(), 2);
    }

    #[tokio::test]
    async fn logs_default_to_twenty_per_page() {
        let store = MemoryStore::default();
        for i in 0..25 {
            store
                .append_log(LogEntry {
                    id: format!("log-{i:02}"),
                    level: LogLevel::Info,
                    message: "GET /".into(),
                    user_id: None,
                    endpoint: "/".into(),
                    status_code: 200,
                    duration_ms: 1,
                    created_at: Utc::now(),
                })
                .await
                .unwrap();
        }
        let page = logs(&store, &HashMap::new()).await.unwrap();
        assert_eq!(page.data.len(), 20);
        assert_eq!(page.pagination.total, 25);
        assert_eq!(page.pagination.pages, 2);
    }

    #[tokio::test]
    async fn unknown_user_is_not_found() {
        let store = MemoryStore::default();
        let result = set_role(&store, "missing", Role::Admin).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}
