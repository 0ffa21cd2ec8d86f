//! Authentication extractors.
//!
//! A request is authenticated either by the session cookie or by an
//! `Authorization: Token <key>` header carrying a durable API token. The
//! token wins when both are present.

use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
};
use tower_sessions::Session;

use crate::error::AppError;
use crate::models::{CurrentUser, session_keys};
use crate::services::auth::AuthService;
use crate::state::AppState;

/// Scheme prefix of API token headers.
const TOKEN_SCHEME: &str = "Token ";

/// The API token in an `Authorization: Token <key>` header, if any.
#[must_use]
pub fn api_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix(TOKEN_SCHEME))
        .map(str::trim)
        .filter(|key| !key.is_empty())
}

/// Resolve the caller from the API token or the session.
async fn resolve_user(parts: &Parts, state: &AppState) -> Result<Option<CurrentUser>, AppError> {
    if let Some(key) = api_token(&parts.headers) {
        let user = AuthService::new(state.pool())
            .user_for_token(key)
            .await?
            .ok_or_else(|| AppError::Unauthorized("Invalid token".to_string()))?;
        return Ok(Some(CurrentUser::from(&user)));
    }

    let Some(session) = parts.extensions.get::<Session>() else {
        return Ok(None);
    };

    Ok(session
        .get::<CurrentUser>(session_keys::CURRENT_USER)
        .await
        .ok()
        .flatten())
}

/// Extractor that requires an authenticated user.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(RequireAuth(user): RequireAuth) -> impl IntoResponse {
///     format!("Hello, {}!", user.email)
/// }
/// ```
pub struct RequireAuth(pub CurrentUser);

impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        resolve_user(parts, state)
            .await?
            .map(Self)
            .ok_or_else(|| AppError::Unauthorized("Authentication required".to_string()))
    }
}

/// Extractor that requires an authenticated staff user.
pub struct RequireStaff(pub CurrentUser);

impl FromRequestParts<AppState> for RequireStaff {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let RequireAuth(user) = RequireAuth::from_request_parts(parts, state).await?;
        if !user.is_staff {
            return Err(AppError::Forbidden("Staff access required".to_string()));
        }
        Ok(Self(user))
    }
}

/// Extractor that optionally gets the current user.
///
/// An invalid API token is still rejected.
pub struct OptionalAuth(pub Option<CurrentUser>);

impl FromRequestParts<AppState> for OptionalAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(Self(resolve_user(parts, state).await?))
    }
}

/// Log the user into the session, cycling the session id first.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    user: &CurrentUser,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::CURRENT_USER, user).await
}

/// Flush the whole session (logout).
///
/// # Errors
///
/// Returns an error if the session cannot be deleted.
pub async fn clear_current_user(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.flush().await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts_with(auth: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/api/cart");
        if let Some(value) = auth {
            builder = builder.header(AUTHORIZATION, value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_api_token_header() {
        assert_eq!(api_token(&parts_with(Some("Token abc123")).headers), Some("abc123"));
        assert_eq!(api_token(&parts_with(Some("Token   ")).headers), None);
        assert_eq!(api_token(&parts_with(Some("Bearer abc123")).headers), None);
        assert_eq!(api_token(&parts_with(None).headers), None);
    }
}
