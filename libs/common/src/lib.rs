//! Common library for the City Affiche services
//!
//! This crate provides the functionality shared by the account and content
//! services: database connectivity and migrations, the clock abstraction,
//! identity token issuance/verification, the authentication guard and the
//! user lookup it relies on.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use common::clock::SystemClock;
//! use common::database::{DatabaseConfig, init_pool};
//! use common::guard::require_auth;
//! use common::token::{JwtService, TokenConfig, TokenService};
//! use common::users::UserDirectory;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let pool = init_pool(&DatabaseConfig::from_env()?).await?;
//!     let tokens = JwtService::new(TokenConfig::from_env()?, Arc::new(SystemClock));
//!     let users = UserDirectory::new(pool);
//!
//!     let token = tokens.issue(uuid::Uuid::new_v4(), "someone@example.com")?;
//!     let header = format!("Bearer {}", token);
//!     match require_auth(Some(header.as_str()), &tokens, &users).await {
//!         Ok(user) => println!("authenticated {}", user.email),
//!         Err(rejection) => println!("{} {}", rejection.status, rejection.error),
//!     }
//!     Ok(())
//! }
//! ```

pub mod clock;
pub mod database;
pub mod error;
pub mod guard;
pub mod token;
pub mod users;
