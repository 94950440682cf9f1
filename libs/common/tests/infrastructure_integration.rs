//! Integration tests for the infrastructure components
//!
//! These tests verify that PostgreSQL is reachable, the schema migrations
//! apply, and the guard resolves a freshly inserted user through the real
//! user directory. They need a running database (`DATABASE_URL`).

use std::sync::Arc;

use common::{
    clock::SystemClock,
    database::{DatabaseConfig, health_check, init_pool, run_migrations},
    guard::authenticate,
    token::{JwtService, TokenConfig, TokenService},
    users::UserDirectory,
};
use chrono::Duration;
use sqlx::Row;
use uuid::Uuid;

#[tokio::test]
#[ignore = "requires a running PostgreSQL instance"]
async fn test_infrastructure_integration() -> Result<(), Box<dyn std::error::Error>> {
    let db_config = DatabaseConfig::from_env()?;
    let pool = init_pool(&db_config).await?;

    assert!(health_check(&pool).await?, "Database health check failed");
    run_migrations(&pool).await?;

    let email = format!("{}@example.com", Uuid::new_v4());
    let row = sqlx::query(
        "INSERT INTO users (email, name, password_hash) VALUES ($1, $2, $3) RETURNING id",
    )
    .bind(&email)
    .bind("Integration")
    .bind("not-a-real-hash")
    .fetch_one(&pool)
    .await?;
    let user_id: Uuid = row.get("id");

    let tokens = JwtService::new(
        TokenConfig {
            secret: "integration-secret".to_string(),
            expiry: Duration::days(30),
        },
        Arc::new(SystemClock),
    );
    let header = format!("Bearer {}", tokens.issue(user_id, &email)?);
    let users = UserDirectory::new(pool.clone());

    let user = authenticate(Some(header.as_str()), &tokens, &users).await?;
    assert_eq!(user.id, user_id);
    assert_eq!(user.email, email);

    // Email uniqueness is case-insensitive
    let duplicate = sqlx::query(
        "INSERT INTO users (email, name, password_hash) VALUES ($1, $2, $3)",
    )
    .bind(email.to_uppercase())
    .bind("Duplicate")
    .bind("not-a-real-hash")
    .execute(&pool)
    .await;
    assert!(matches!(duplicate, Err(ref e) if common::error::is_unique_violation(e)));

    sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(user_id)
        .execute(&pool)
        .await?;

    Ok(())
}
