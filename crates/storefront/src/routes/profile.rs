//! Profile route handlers.

use axum::{Json, extract::State};
use tracing::instrument;

use crate::db::ProfileRepository;
use crate::db::profiles::ProfileUpdate;
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::user::Profile;
use crate::state::AppState;

/// Longest accepted phone number.
const MAX_PHONE_LENGTH: usize = 20;

/// Show the caller's profile, provisioning it on first access.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Profile>> {
    let profile = ProfileRepository::new(state.pool())
        .get_or_create(user.id)
        .await?;
    Ok(Json(profile))
}

/// Update names, phone and bio.
#[instrument(skip(state, user, update), fields(user_id = %user.id))]
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(update): Json<ProfileUpdate>,
) -> Result<Json<Profile>> {
    if update
        .phone
        .as_deref()
        .is_some_and(|phone| phone.trim().chars().count() > MAX_PHONE_LENGTH)
    {
        return Err(AppError::BadRequest("Phone number is too long".to_string()));
    }

    let profile = ProfileRepository::new(state.pool())
        .update(user.id, &update)
        .await?;
    Ok(Json(profile))
}
