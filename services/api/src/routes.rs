//! Routes for the content service

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get},
};
use serde_json::json;

use crate::state::AppState;

pub mod cities;
pub mod events;
pub mod messages;
pub mod venues;
pub mod votes;

/// Create the router for the content service
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/cities", get(cities::list_cities).post(cities::create_city))
        .route(
            "/cities/:slug",
            get(cities::get_city)
                .patch(cities::update_city)
                .delete(cities::delete_city),
        )
        .route("/events", get(events::list_events).post(events::create_event))
        .route(
            "/events/:id",
            get(events::get_event)
                .put(events::update_event)
                .delete(events::delete_event),
        )
        .route(
            "/events/:id/vote",
            get(votes::event_votes).post(votes::vote_event),
        )
        .route(
            "/events/:id/messages",
            get(messages::list_event_messages).post(messages::post_event_message),
        )
        .route(
            "/events/:id/messages/:message_id",
            delete(messages::delete_event_message),
        )
        .route("/venues", get(venues::list_venues).post(venues::create_venue))
        .route(
            "/venues/:id",
            get(venues::get_venue)
                .put(venues::update_venue)
                .delete(venues::delete_venue),
        )
        .route(
            "/venues/:id/vote",
            get(votes::venue_votes).post(votes::vote_venue),
        )
        .route(
            "/venues/:id/messages",
            get(messages::list_venue_messages).post(messages::post_venue_message),
        )
        .route(
            "/venues/:id/messages/:message_id",
            delete(messages::delete_venue_message),
        )
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let database = common::database::health_check(&state.db_pool)
        .await
        .unwrap_or(false);

    let status = if database {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(json!({
            "status": if database { "ok" } else { "degraded" },
            "service": "api-service",
            "database": database,
        })),
    )
}
