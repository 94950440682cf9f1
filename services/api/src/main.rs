use std::sync::Arc;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;
mod error;
mod events;
mod middleware;
mod models;
mod rate_limiter;
mod recurrence;
mod repositories;
mod routes;
mod slug;
mod state;
mod validation;
mod votes;

use common::{
    clock::{Clock, SystemClock},
    database::{self, DatabaseConfig},
    token::{JwtService, TokenConfig},
    users::UserDirectory,
};

use crate::{
    config::Settings,
    rate_limiter::{RateLimiter, RateLimiterConfig},
    repositories::{
        city::CityRepository, event::EventRepository, message::MessageRepository,
        venue::VenueRepository, vote::VoteRepository,
    },
    state::AppState,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting API service");

    let settings = Settings::from_env()?;

    // Initialize database connection pool
    let db_config = DatabaseConfig::from_env()?;
    let pool = database::init_pool(&db_config).await?;

    // Check database connectivity
    if database::health_check(&pool).await? {
        info!("Database connection successful");
    } else {
        anyhow::bail!("Failed to connect to database");
    }

    database::run_migrations(&pool).await?;

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    // Initialize token service
    let token_config = TokenConfig::from_env()?;
    let token_service = Arc::new(JwtService::new(token_config, clock.clone()));

    let message_limiter = RateLimiter::new(
        RateLimiterConfig {
            max_events: settings.message_rate_limit,
            window: chrono::Duration::seconds(settings.message_rate_window_secs as i64),
        },
        clock.clone(),
    );

    let bind_addr = settings.bind_addr.clone();

    let app_state = AppState {
        db_pool: pool.clone(),
        settings: Arc::new(settings),
        clock,
        token_service,
        user_directory: UserDirectory::new(pool.clone()),
        city_repository: CityRepository::new(pool.clone()),
        event_repository: EventRepository::new(pool.clone()),
        venue_repository: VenueRepository::new(pool.clone()),
        vote_repository: VoteRepository::new(pool.clone()),
        message_repository: MessageRepository::new(pool),
        message_limiter,
    };

    info!("API service initialized successfully");

    // Start the web server
    let app = routes::create_router(app_state);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("API service listening on {}", bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
