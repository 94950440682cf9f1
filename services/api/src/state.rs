//! Application state shared across handlers

use common::{clock::Clock, token::TokenService, users::UserDirectory};
use sqlx::PgPool;
use std::sync::Arc;

use crate::{
    config::Settings,
    rate_limiter::RateLimiter,
    repositories::{
        city::CityRepository, event::EventRepository, message::MessageRepository,
        venue::VenueRepository, vote::VoteRepository,
    },
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub settings: Arc<Settings>,
    pub clock: Arc<dyn Clock>,
    pub token_service: Arc<dyn TokenService>,
    pub user_directory: UserDirectory,
    pub city_repository: CityRepository,
    pub event_repository: EventRepository,
    pub venue_repository: VenueRepository,
    pub vote_repository: VoteRepository,
    pub message_repository: MessageRepository,
    pub message_limiter: RateLimiter,
}
