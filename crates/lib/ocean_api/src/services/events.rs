//! Events: public listing, creator-owned CRUD and registration.

use std::collections::HashMap;

use chrono::Utc;
use ocean_core::models::event::{EVENT_FILTERS, EVENT_SORTS, Event, Registration};
use ocean_core::models::identity::Role;
use ocean_core::query::{ListQuery, Paginated, SortOrder, build_filter, build_response, resolve_sort};
use ocean_core::store::Store;
use ocean_core::uuid::new_id;
use tracing::info;

use super::{pagination, summaries};
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthContext;
use crate::middleware::authz::require_owner_or_role;
use crate::models::event::{CreateEventRequest, EventView, UpdateEventRequest};
use crate::validation::parse_date;

fn not_found() -> AppError {
    AppError::NotFound("Event not found".into())
}

async fn view(store: &dyn Store, event: Event) -> AppResult<EventView> {
    let ids: Vec<&str> = std::iter::once(event.created_by.as_str())
        .chain(event.registered_users.iter().map(String::as_str))
        .collect();
    let people = summaries(store, &ids).await?;
    let creator = people.get(&event.created_by).cloned();
    let participants = event
        .registered_users
        .iter()
        .filter_map(|id| people.get(id).cloned())
        .collect();
    Ok(EventView {
        event,
        creator,
        participants,
    })
}

/// Events filtered by `location`, newest first unless `sort` says otherwise.
pub async fn list(
    store: &dyn Store,
    params: &HashMap<String, String>,
) -> AppResult<Paginated<EventView>> {
    let pagination = pagination(params);
    let filter = build_filter(params, EVENT_FILTERS);
    let sort = resolve_sort(
        params.get("sort").map(String::as_str),
        EVENT_SORTS,
        SortOrder::newest(),
    );
    let page = store
        .list_events(&ListQuery::new(filter, sort, pagination))
        .await?;

    let mut items = Vec::with_capacity(page.items.len());
    for event in page.items {
        items.push(view(store, event).await?);
    }
    Ok(build_response(items, pagination.page, pagination.limit, page.total))
}

pub async fn get(store: &dyn Store, id: &str) -> AppResult<EventView> {
    let event = store.find_event(id).await?.ok_or_else(not_found)?;
    view(store, event).await
}

pub async fn create(
    store: &dyn Store,
    ctx: &AuthContext,
    req: CreateEventRequest,
) -> AppResult<EventView> {
    let start_date = parse_date(&req.start_date)
        .ok_or_else(|| AppError::BadRequest("Start date must be a valid ISO 8601 date".into()))?;
    let now = Utc::now();
    let event = store
        .insert_event(Event {
            id: new_id(),
            title: req.title,
            description: req.description,
            start_date,
            end_date: req.end_date.as_deref().and_then(parse_date),
            location: req.location,
            external_link: req.external_link,
            live_stream_link: req.live_stream_link,
            event_image: req.event_image,
            created_by: ctx.id.clone(),
            registered_users: Vec::new(),
            max_participants: req.max_participants,
            created_at: now,
            updated_at: now,
        })
        .await?;
    info!(event_id = %event.id, user_id = %ctx.id, "event created");
    view(store, event).await
}

async fn owned(store: &dyn Store, ctx: &AuthContext, id: &str, denied: &str) -> AppResult<Event> {
    let event = store.find_event(id).await?.ok_or_else(not_found)?;
    require_owner_or_role(ctx, &event.created_by, &[Role::Admin], denied)?;
    Ok(event)
}

/// Update an event. Creator or Admin only.
pub async fn update(
    store: &dyn Store,
    ctx: &AuthContext,
    id: &str,
    req: UpdateEventRequest,
) -> AppResult<EventView> {
    owned(store, ctx, id, "Unauthorized to update this event").await?;
    let event = store
        .update_event(id, req.into())
        .await?
        .ok_or_else(not_found)?;
    info!(event_id = %id, user_id = %ctx.id, "event updated");
    view(store, event).await
}

/// Delete an event. Creator or Admin only.
pub async fn delete(store: &dyn Store, ctx: &AuthContext, id: &str) -> AppResult<()> {
    owned(store, ctx, id, "Unauthorized to delete this event").await?;
    if !store.delete_event(id).await? {
        return Err(not_found());
    }
    info!(event_id = %id, user_id = %ctx.id, "event deleted");
    Ok(())
}

/// Register the caller. Capacity and duplicate checks are part of the same
/// store operation as the insert.
pub async fn register(store: &dyn Store, ctx: &AuthContext, id: &str) -> AppResult<EventView> {
    match store.register_for_event(id, &ctx.id).await? {
        Registration::Registered(event) => {
            info!(event_id = %id, user_id = %ctx.id, "registered for event");
            view(store, event).await
        }
        Registration::AlreadyRegistered => Err(AppError::BadRequest(
            "Already registered for this event".into(),
        )),
        Registration::Full => Err(AppError::BadRequest("Event is full".into())),
        Registration::EventMissing => Err(not_found()),
    }
}

/// Remove the caller's registration. Not being registered is not an error.
pub async fn unregister(store: &dyn Store, ctx: &AuthContext, id: &str) -> AppResult<EventView> {
    let event = store
        .unregister_from_event(id, &ctx.id)
        .await?
        .ok_or_else(not_found)?;
    view(store, event).await
}
