//! Account service models

pub mod user;

// Re-export for convenience
pub use user::{AuthResponse, LoginRequest, NewUser, RegisterRequest, TokenResponse, User};
