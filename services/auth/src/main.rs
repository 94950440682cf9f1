use std::sync::Arc;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod error;
mod middleware;
mod models;
mod repositories;
mod routes;
mod state;
mod validation;

use common::{
    clock::SystemClock,
    database::{self, DatabaseConfig},
    token::{JwtService, TokenConfig},
    users::UserDirectory,
};

use crate::{repositories::UserRepository, state::AppState};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting account service");

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

    // Initialize token service
    let token_config = TokenConfig::from_env()?;
    let token_service = Arc::new(JwtService::new(token_config, Arc::new(SystemClock)));

    let app_state = AppState {
        db_pool: pool.clone(),
        token_service,
        user_directory: UserDirectory::new(pool.clone()),
        user_repository: UserRepository::new(pool),
    };

    info!("Account service initialized successfully");

    // Start the web server
    let app = routes::create_router(app_state);

    let bind_addr = std::env::var("AUTH_BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("Account service listening on {}", bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
