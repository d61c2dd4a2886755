use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use cartwise_core::UserId;

use crate::error::ApiError;

/// Resolved caller principal. The upstream auth middleware terminates the
/// credential exchange and forwards the subject in `x-user-id`; requests
/// without it never reach a handler.
#[derive(Clone, Debug)]
pub struct AuthUser(pub UserId);

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get("x-user-id")
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty());

        match user_id {
            Some(user_id) => Ok(AuthUser(UserId(user_id.to_string()))),
            None => Err(ApiError::unauthorized("Please authenticate")),
        }
    }
}
