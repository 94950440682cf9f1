//! Account service routes

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
};
use common::{
    guard::{AUTH_REQUIRED_MESSAGE, SESSION_EXPIRED_MESSAGE},
    token::extract_from_header,
    users::AuthUser,
};
use serde_json::json;
use tracing::{info, warn};

use crate::{
    error::{AccountError, AccountResult},
    middleware::{CurrentUser, authorization_header},
    models::{AuthResponse, LoginRequest, NewUser, RegisterRequest, TokenResponse},
    repositories::user::verify_password,
    state::AppState,
    validation::{normalize_email, validate_email, validate_name, validate_password},
};

const BAD_CREDENTIALS: &str = "Invalid email or password";

/// Create the router for the account service
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/me", get(me))
        .route("/auth/refresh", post(refresh_token))
        .route("/auth/logout", post(logout))
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
            "service": "auth-service",
            "database": database,
        })),
    )
}

/// User registration endpoint
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> AccountResult<impl IntoResponse> {
    let email = normalize_email(&payload.email);
    let name = payload.name.trim().to_string();

    validate_email(&email).map_err(AccountError::Validation)?;
    validate_name(&name).map_err(AccountError::Validation)?;
    validate_password(&payload.password).map_err(AccountError::Validation)?;

    info!("Registration attempt for: {}", email);

    let new_user = NewUser {
        email,
        name,
        password: payload.password,
    };
    let user = state.user_repository.create(&new_user).await?;

    let token = state
        .token_service
        .issue(user.id, &user.email)
        .map_err(|e| AccountError::Internal(e.into()))?;

    info!("Registered user {}", user.id);

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            message: "User registered successfully".to_string(),
            user: AuthUser::from(user),
            token,
        }),
    ))
}

/// User login endpoint
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> AccountResult<impl IntoResponse> {
    let email = normalize_email(&payload.email);

    if email.is_empty() || payload.password.is_empty() {
        return Err(AccountError::Validation(
            "Email and password are required".to_string(),
        ));
    }

    info!("Login attempt for user: {}", email);

    let user = state
        .user_repository
        .find_by_email(&email)
        .await?
        .ok_or_else(|| AccountError::Unauthorized(BAD_CREDENTIALS.to_string()))?;

    if !verify_password(&user.password_hash, &payload.password)? {
        warn!("Wrong password for user {}", user.id);
        return Err(AccountError::Unauthorized(BAD_CREDENTIALS.to_string()));
    }

    let token = state
        .token_service
        .issue(user.id, &user.email)
        .map_err(|e| AccountError::Internal(e.into()))?;

    Ok((
        StatusCode::OK,
        Json(AuthResponse {
            message: "Logged in successfully".to_string(),
            user: AuthUser::from(user),
            token,
        }),
    ))
}

/// Current user endpoint
pub async fn me(CurrentUser(user): CurrentUser) -> impl IntoResponse {
    Json(json!({
        "message": "User data retrieved successfully",
        "user": user,
    }))
}

/// Token renewal endpoint
///
/// Issues a new token for the same subject; the presented token stays valid
/// until its own expiry.
pub async fn refresh_token(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    headers: HeaderMap,
) -> AccountResult<impl IntoResponse> {
    let presented = extract_from_header(authorization_header(&headers))
        .ok_or_else(|| AccountError::Unauthorized(AUTH_REQUIRED_MESSAGE.to_string()))?;

    let token = state
        .token_service
        .renew(presented)
        .map_err(|_| AccountError::Unauthorized(SESSION_EXPIRED_MESSAGE.to_string()))?;

    info!("Renewed token for user {}", user.id);

    Ok(Json(TokenResponse {
        token,
        token_type: "Bearer".to_string(),
        expires_in: state.token_service.validity().num_seconds(),
    }))
}

/// Logout endpoint
///
/// Tokens are stateless; the client discards its copy.
pub async fn logout() -> impl IntoResponse {
    Json(json!({ "message": "Logged out successfully" }))
}
