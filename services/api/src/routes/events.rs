//! Event handlers

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::{
    error::{ApiError, ApiResult},
    events::{EventDraft, create_event_series},
    middleware::CurrentUser,
    models::{
        PageRequest, Pagination,
        event::{CreateEventRequest, CreatedEvents, Event, EventQuery, UpdateEventRequest},
    },
    state::AppState,
    validation::{
        MAX_DESCRIPTION_CHARS, MAX_TITLE_CHARS, required_text, validate_image, validate_time,
    },
};

const DEFAULT_EVENT_LIMIT: u32 = 20;

/// `GET /events`
pub async fn list_events(
    State(state): State<AppState>,
    Query(query): Query<EventQuery>,
) -> ApiResult<impl IntoResponse> {
    let page = PageRequest::new(query.page, query.limit, DEFAULT_EVENT_LIMIT);

    let (events, total) = state
        .event_repository
        .list(&query, page, state.clock.now())
        .await?;

    Ok(Json(json!({
        "events": events,
        "pagination": Pagination::new(page, total),
    })))
}

/// `GET /events/:id`
pub async fn get_event(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let event = state
        .event_repository
        .record_view(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Event"))?;

    Ok(Json(event))
}

/// `POST /events`
pub async fn create_event(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<CreateEventRequest>,
) -> ApiResult<impl IntoResponse> {
    let draft = EventDraft::from_request(payload, state.clock.now())?;

    info!(
        "User {} creating event {:?} on {}",
        user.id, draft.title, draft.date
    );

    let events = create_event_series(
        &state.event_repository,
        state.clock.as_ref(),
        user.id,
        &draft,
        state.settings.future_event_cap,
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(CreatedEvents {
            created: events.len(),
            events,
        }),
    ))
}

fn apply_changes(mut event: Event, changes: UpdateEventRequest) -> ApiResult<Event> {
    if let Some(title) = changes.title {
        event.title =
            required_text("Title", &title, MAX_TITLE_CHARS).map_err(ApiError::Validation)?;
    }

    if let Some(description) = changes.description {
        event.description = required_text("Description", &description, MAX_DESCRIPTION_CHARS)
            .map_err(ApiError::Validation)?;
    }

    if let Some(category) = changes.category {
        event.category = required_text("Category", &category, 100).map_err(ApiError::Validation)?;
    }

    if let Some(time) = changes.time {
        event.time = validate_time(Some(&time)).map_err(ApiError::Validation)?;
    }

    if let Some(is_online) = changes.is_online {
        event.is_online = is_online;
    }

    if let Some(image) = changes.image {
        let image_type = changes.image_type.or_else(|| event.image_type.clone());
        let (image, image_type) =
            validate_image(Some(&image), image_type.as_deref()).map_err(ApiError::Validation)?;
        event.image = image;
        event.image_type = image_type;
    }

    Ok(event)
}

/// `PUT /events/:id`
pub async fn update_event(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateEventRequest>,
) -> ApiResult<impl IntoResponse> {
    let event = state
        .event_repository
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Event"))?;

    user.ensure_author(event.author_id, "edit this event")?;

    let event = apply_changes(event, payload)?;
    let event = state.event_repository.update(&event).await?;

    Ok(Json(json!({
        "message": "Event updated",
        "event": event,
    })))
}

/// `DELETE /events/:id`
pub async fn delete_event(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let event = state
        .event_repository
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Event"))?;

    user.ensure_author(event.author_id, "delete this event")?;

    state.event_repository.delete_cascade(id).await?;
    info!("User {} deleted event {}", user.0.id, id);

    Ok(Json(json!({ "message": "Event deleted" })))
}
