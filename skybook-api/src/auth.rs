use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::headers::{authorization::Bearer, Authorization};
use axum_extra::TypedHeader;

use crate::error::AppError;
use crate::state::AppState;
use skybook_shared::User;

/// The resolved caller. Authentication itself happens upstream (the
/// gateway); the bearer token carries the already-verified user name,
/// which we resolve to the internal user record.
pub struct CurrentUser(pub User);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| {
                    AppError::AuthenticationError("Missing bearer token".to_string())
                })?;

        let user = state
            .store
            .find_user_by_name(bearer.token())
            .await
            .map_err(AppError::from)?
            .ok_or_else(|| AppError::AuthenticationError("Unknown user".to_string()))?;

        Ok(CurrentUser(user))
    }
}
