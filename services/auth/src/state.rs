//! Application state shared across handlers

use std::sync::Arc;

use common::{token::TokenService, users::UserDirectory};
use sqlx::PgPool;

use crate::repositories::UserRepository;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub token_service: Arc<dyn TokenService>,
    pub user_directory: UserDirectory,
    pub user_repository: UserRepository,
}
