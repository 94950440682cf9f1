//! Chat message handlers for events and venues

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
    middleware::CurrentUser,
    models::{
        PageRequest, Pagination, Target,
        message::{CreateMessageRequest, Message, MessagePage, MessageQuery},
    },
    state::AppState,
    validation::validate_message,
};

const DEFAULT_MESSAGE_LIMIT: u32 = 20;

/// Key the message limiter counts under: one bucket per (user, target)
fn limiter_key(user_id: Uuid, target: Target) -> String {
    format!("{}:{}:{}", user_id, target.kind, target.id)
}

async fn list(state: &AppState, target: Target, query: MessageQuery) -> ApiResult<MessagePage> {
    if state
        .message_repository
        .target_author(target)
        .await?
        .is_none()
    {
        return Err(ApiError::not_found(target.kind.label()));
    }

    let page = PageRequest::new(query.page, query.limit, DEFAULT_MESSAGE_LIMIT);
    let (messages, total) = state.message_repository.list(target, page).await?;

    Ok(MessagePage {
        messages,
        pagination: Pagination::new(page, total),
    })
}

async fn post(
    state: &AppState,
    user: CurrentUser,
    target: Target,
    payload: CreateMessageRequest,
) -> ApiResult<Message> {
    let content = validate_message(&payload.content, state.settings.message_max_length)
        .map_err(ApiError::Validation)?;

    if let Err(limited) = state
        .message_limiter
        .check(&limiter_key(user.0.id, target))
        .await
    {
        let limit = state.message_limiter.config();
        return Err(ApiError::RateLimited {
            message: format!(
                "Too many messages: at most {} per {} seconds",
                limit.max_events,
                limit.window.num_seconds()
            ),
            retry_after_secs: limited.retry_after.num_seconds().max(1) as u64,
        });
    }

    state
        .message_repository
        .create(target, user.0.id, &user.0.name, &content)
        .await
}

async fn delete(
    state: &AppState,
    user: CurrentUser,
    target: Target,
    message_id: Uuid,
) -> ApiResult<()> {
    let message = state
        .message_repository
        .find_on_target(target, message_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Message"))?;

    let target_author = state
        .message_repository
        .target_author(target)
        .await?
        .ok_or_else(|| ApiError::not_found(target.kind.label()))?;

    if message.user_id != user.0.id {
        user.ensure_author(target_author, "delete this message")?;
    }

    state.message_repository.delete(target, message_id).await?;
    info!("User {} deleted message {}", user.0.id, message_id);

    Ok(())
}

/// `GET /events/:id/messages`
pub async fn list_event_messages(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<MessageQuery>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(list(&state, Target::event(id), query).await?))
}

/// `GET /venues/:id/messages`
pub async fn list_venue_messages(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<MessageQuery>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(list(&state, Target::venue(id), query).await?))
}

/// `POST /events/:id/messages`
pub async fn post_event_message(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<CreateMessageRequest>,
) -> ApiResult<impl IntoResponse> {
    let message = post(&state, user, Target::event(id), payload).await?;
    Ok((StatusCode::CREATED, Json(message)))
}

/// `POST /venues/:id/messages`
pub async fn post_venue_message(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<CreateMessageRequest>,
) -> ApiResult<impl IntoResponse> {
    let message = post(&state, user, Target::venue(id), payload).await?;
    Ok((StatusCode::CREATED, Json(message)))
}

/// `DELETE /events/:id/messages/:message_id`
pub async fn delete_event_message(
    State(state): State<AppState>,
    user: CurrentUser,
    Path((id, message_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<impl IntoResponse> {
    delete(&state, user, Target::event(id), message_id).await?;
    Ok(Json(json!({ "message": "Message deleted" })))
}

/// `DELETE /venues/:id/messages/:message_id`
pub async fn delete_venue_message(
    State(state): State<AppState>,
    user: CurrentUser,
    Path((id, message_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<impl IntoResponse> {
    delete(&state, user, Target::venue(id), message_id).await?;
    Ok(Json(json!({ "message": "Message deleted" })))
}
