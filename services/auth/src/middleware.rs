//! Request authentication for protected account routes

use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
};
use common::{guard::require_auth, users::AuthUser};

use crate::{error::AccountError, state::AppState};

/// Raw `Authorization` header value, if it is valid UTF-8
pub fn authorization_header(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
}

/// The user behind a verified bearer token
#[derive(Debug, Clone)]
pub struct CurrentUser(pub AuthUser);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AccountError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = require_auth(
            authorization_header(&parts.headers),
            state.token_service.as_ref(),
            &state.user_directory,
        )
        .await?;

        Ok(CurrentUser(user))
    }
}
