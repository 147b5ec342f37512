//! Event request handlers.

use std::collections::HashMap;

use axum::extract::{Path, Query, State};
use ocean_core::query::Paginated;

use crate::AppState;
use crate::envelope::{ApiResponse, Created};
use crate::error::AppResult;
use crate::extract::ValidatedJson;
use crate::middleware::auth::AuthContext;
use crate::models::event::{CreateEventRequest, EventView, UpdateEventRequest};
use crate::services::events;

/// `GET /api/events`
pub async fn list_handler(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> AppResult<ApiResponse<Paginated<EventView>>> {
    let page = events::list(state.store.as_ref(), &params).await?;
    Ok(ApiResponse::ok("Events retrieved", page))
}

/// `GET /api/events/{id}`
pub async fn get_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<EventView>> {
    let event = events::get(state.store.as_ref(), &id).await?;
    Ok(ApiResponse::ok("Event retrieved", event))
}

/// `POST /api/events`
pub async fn create_handler(
    State(state): State<AppState>,
    ctx: AuthContext,
    ValidatedJson(body): ValidatedJson<CreateEventRequest>,
) -> AppResult<Created<EventView>> {
    let event = events::create(state.store.as_ref(), &ctx, body).await?;
    Ok(Created(ApiResponse::ok("Event created successfully", event)))
}

/// `PUT /api/events/{id}`
pub async fn update_handler(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(id): Path<String>,
    ValidatedJson(body): ValidatedJson<UpdateEventRequest>,
) -> AppResult<ApiResponse<EventView>> {
    let event = events::update(state.store.as_ref(), &ctx, &id, body).await?;
    Ok(ApiResponse::ok("Event updated successfully", event))
}

/// `DELETE /api/events/{id}`
pub async fn delete_handler(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<()>> {
    events::delete(state.store.as_ref(), &ctx, &id).await?;
    Ok(ApiResponse::message("Event deleted successfully"))
}

/// `POST /api/events/{id}/register`
pub async fn register_handler(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<EventView>> {
    let event = events::register(state.store.as_ref(), &ctx, &id).await?;
    Ok(ApiResponse::ok("Registered for event successfully", event))
}

/// `POST /api/events/{id}/unregister`
pub async fn unregister_handler(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<EventView>> {
    let event = events::unregister(state.store.as_ref(), &ctx, &id).await?;
    Ok(ApiResponse::ok("Unregistered from event successfully", event))
}
