//! Request authentication for protected content routes

use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use common::{guard::require_auth, users::AuthUser};
use uuid::Uuid;

use crate::{error::ApiError, state::AppState};

/// The user behind a verified bearer token
#[derive(Debug, Clone)]
pub struct CurrentUser(pub AuthUser);

impl CurrentUser {
    /// Fail with 403 unless this user is `author_id`
    pub fn ensure_author(&self, author_id: Uuid, action: &str) -> Result<(), ApiError> {
        if self.0.id == author_id {
            Ok(())
        } else {
            Err(ApiError::Forbidden(format!("You are not allowed to {}", action)))
        }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok());

        let user = require_auth(
            header,
            state.token_service.as_ref(),
            &state.user_directory,
        )
        .await?;

        Ok(CurrentUser(user))
    }
}
