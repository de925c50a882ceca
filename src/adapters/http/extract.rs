//! Request extractors. Session handling lives in the outer gateway, which
//! authenticates the user and forwards their id in `x-user-id`; handlers
//! here only need that principal.

use axum::{extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use crate::app_error::AppError;

pub const USER_ID_HEADER: &str = "x-user-id";

#[derive(Debug, Clone, Copy)]
pub struct AuthedUser(pub Uuid);

impl<S> FromRequestParts<S> for AuthedUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| Uuid::parse_str(value).ok())
            .map(AuthedUser)
            .ok_or(AppError::Forbidden)
    }
}
