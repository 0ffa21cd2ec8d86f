//! Consultation booking route handlers.
//!
//! Owners create, cancel and reschedule their bookings. Staff confirm and
//! complete them, add therapist notes and recommend products.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::{NaiveDate, Utc};
use tracing::instrument;

use ojasritu_core::{RebookingId, RebookingStatus, UserId};

use crate::db::{RebookingRepository, RepositoryError};
use crate::error::{AppError, Result};
use crate::middleware::{RequireAuth, RequireStaff};
use crate::models::rebooking::{
    NewRebooking, Rebooking, RebookingStatusUpdate, RecommendationsUpdate, RescheduleRequest,
};
use crate::state::AppState;

/// Longest consultation that can be booked.
const MAX_DURATION_MINUTES: i32 = 240;

fn booking_not_found() -> AppError {
    AppError::NotFound("Booking not found".to_string())
}

fn ensure_future(date: NaiveDate) -> Result<()> {
    if date < Utc::now().date_naive() {
        return Err(AppError::BadRequest(
            "Scheduled date cannot be in the past".to_string(),
        ));
    }
    Ok(())
}

fn modifiable_statuses() -> Vec<RebookingStatus> {
    RebookingStatus::ALL
        .iter()
        .copied()
        .filter(|s| s.is_modifiable())
        .collect()
}

/// Apply an owner transition and return the updated booking.
async fn owner_transition(
    state: &AppState,
    id: RebookingId,
    owner: UserId,
    to: RebookingStatus,
    reschedule: Option<RescheduleRequest>,
) -> Result<Rebooking> {
    let repo = RebookingRepository::new(state.pool());
    let applied = repo
        .transition(
            id,
            Some(owner),
            &modifiable_statuses(),
            to,
            reschedule.map(|r| (r.scheduled_date, r.scheduled_time)),
        )
        .await?
        .ok_or_else(booking_not_found)?;

    if !applied {
        return Err(AppError::BadRequest(
            "This booking can no longer be changed".to_string(),
        ));
    }

    repo.get(id, Some(owner)).await?.ok_or_else(booking_not_found)
}

/// List bookings, all of them for staff.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Vec<Rebooking>>> {
    let owner = (!user.is_staff).then_some(user.id);
    let bookings = RebookingRepository::new(state.pool()).list(owner).await?;
    Ok(Json(bookings))
}

/// Request a consultation.
#[instrument(skip(state, user, body), fields(user_id = %user.id))]
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(body): Json<NewRebooking>,
) -> Result<(StatusCode, Json<Rebooking>)> {
    ensure_future(body.scheduled_date)?;
    if body
        .duration_minutes
        .is_some_and(|d| !(1..=MAX_DURATION_MINUTES).contains(&d))
    {
        return Err(AppError::BadRequest(format!(
            "duration_minutes must be between 1 and {MAX_DURATION_MINUTES}"
        )));
    }

    let booking = RebookingRepository::new(state.pool())
        .create(user.id, &body)
        .await?;
    tracing::info!(booking_id = %booking.id, "Consultation requested");
    Ok((StatusCode::CREATED, Json(booking)))
}

/// Show one booking.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<RebookingId>,
) -> Result<Json<Rebooking>> {
    let owner = (!user.is_staff).then_some(user.id);
    RebookingRepository::new(state.pool())
        .get(id, owner)
        .await?
        .map(Json)
        .ok_or_else(booking_not_found)
}

/// Cancel an open booking (owner).
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn cancel(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<RebookingId>,
) -> Result<Json<Rebooking>> {
    let booking = owner_transition(&state, id, user.id, RebookingStatus::Cancelled, None).await?;
    tracing::info!(booking_id = %id, "Consultation cancelled");
    Ok(Json(booking))
}

/// Move an open booking to a new slot (owner).
#[instrument(skip(state, user, body), fields(user_id = %user.id))]
pub async fn reschedule(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<RebookingId>,
    Json(body): Json<RescheduleRequest>,
) -> Result<Json<Rebooking>> {
    ensure_future(body.scheduled_date)?;
    let booking =
        owner_transition(&state, id, user.id, RebookingStatus::Rescheduled, Some(body)).await?;
    tracing::info!(booking_id = %id, "Consultation rescheduled");
    Ok(Json(booking))
}

/// Set status and therapist details (staff).
#[instrument(skip(state, staff, body), fields(staff_id = %staff.id))]
pub async fn update_status(
    State(state): State<AppState>,
    RequireStaff(staff): RequireStaff,
    Path(id): Path<RebookingId>,
    Json(body): Json<RebookingStatusUpdate>,
) -> Result<Json<Rebooking>> {
    let booking = RebookingRepository::new(state.pool())
        .update_status(id, &body)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => booking_not_found(),
            other => other.into(),
        })?;
    Ok(Json(booking))
}

/// Replace recommended products (staff).
#[instrument(skip(state, staff, body), fields(staff_id = %staff.id))]
pub async fn set_recommendations(
    State(state): State<AppState>,
    RequireStaff(staff): RequireStaff,
    Path(id): Path<RebookingId>,
    Json(body): Json<RecommendationsUpdate>,
) -> Result<Json<Rebooking>> {
    let booking = RebookingRepository::new(state.pool())
        .set_recommendations(id, &body.product_ids)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => booking_not_found(),
            other => other.into(),
        })?;
    Ok(Json(booking))
}
