//! Vote handlers for events and venues

use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use uuid::Uuid;

use crate::{
    error::{ApiError, ApiResult},
    middleware::CurrentUser,
    models::{Target, vote::{VoteRequest, VoteResponse}},
    state::AppState,
    votes::VoteStats,
};

async fn cast(
    state: &AppState,
    user: CurrentUser,
    target: Target,
    payload: VoteRequest,
) -> ApiResult<VoteResponse> {
    let value = payload
        .vote_value()
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    let (outcome, tally) = state.vote_repository.cast(user.0.id, target, value).await?;

    Ok(VoteResponse {
        message: outcome.message(),
        user_vote: outcome.resulting_vote().map(|v| v.as_i16()),
        stats: VoteStats::from(tally),
    })
}

/// `POST /events/:id/vote`
pub async fn vote_event(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<VoteRequest>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(cast(&state, user, Target::event(id), payload).await?))
}

/// `POST /venues/:id/vote`
pub async fn vote_venue(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<VoteRequest>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(cast(&state, user, Target::venue(id), payload).await?))
}

/// `GET /events/:id/vote`
pub async fn event_votes(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let tally = state.vote_repository.tally(Target::event(id)).await?;
    Ok(Json(VoteStats::from(tally)))
}

/// `GET /venues/:id/vote`
pub async fn venue_votes(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let tally = state.vote_repository.tally(Target::venue(id)).await?;
    Ok(Json(VoteStats::from(tally)))
}
