//! Consultation bookings.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use ojasritu_core::{BookingDosha, ConsultationType, ProductId, RebookingId, RebookingStatus, UserId};

/// A consultation booking with its recommended product ids.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Rebooking {
    pub id: RebookingId,
    #[sqlx(rename = "user_id")]
    pub user: UserId,
    pub consultation_type: ConsultationType,
    pub scheduled_date: NaiveDate,
    pub scheduled_time: NaiveTime,
    pub duration_minutes: i32,
    pub health_concerns: String,
    pub current_medications: String,
    pub allergies: String,
    pub dosha_type: BookingDosha,
    pub status: RebookingStatus,
    pub therapist_name: String,
    pub consultation_notes: String,
    pub recommended_products: Vec<ProductId>,
    pub consultation_fee: Decimal,
    pub is_paid: bool,
    pub payment_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Body of `POST /api/rebookings`.
#[derive(Debug, Clone, Deserialize)]
pub struct NewRebooking {
    #[serde(default)]
    pub consultation_type: ConsultationType,
    pub scheduled_date: NaiveDate,
    pub scheduled_time: NaiveTime,
    pub duration_minutes: Option<i32>,
    #[serde(default)]
    pub health_concerns: String,
    #[serde(default)]
    pub current_medications: String,
    #[serde(default)]
    pub allergies: String,
    #[serde(default)]
    pub dosha_type: BookingDosha,
}

/// Body of `POST /api/rebookings/{id}/reschedule`.
#[derive(Debug, Clone, Deserialize)]
pub struct RescheduleRequest {
    pub scheduled_date: NaiveDate,
    pub scheduled_time: NaiveTime,
}

/// Body of `PATCH /api/rebookings/{id}/status` (staff).
#[derive(Debug, Clone, Deserialize)]
pub struct RebookingStatusUpdate {
    pub status: RebookingStatus,
    pub therapist_name: Option<String>,
    pub consultation_notes: Option<String>,
}

/// Body of `PUT /api/rebookings/{id}/recommendations` (staff).
#[derive(Debug, Clone, Deserialize)]
pub struct RecommendationsUpdate {
    pub product_ids: Vec<ProductId>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rebooking_defaults() {
        let body: NewRebooking = serde_json::from_str(
            r#"{"scheduled_date": "2030-01-15", "scheduled_time": "10:30:00"}"#,
        )
        .unwrap();

        assert_eq!(body.consultation_type, ConsultationType::General);
        assert_eq!(body.dosha_type, BookingDosha::default());
        assert!(body.duration_minutes.is_none());
        assert!(body.health_concerns.is_empty());
    }

    #[test]
    fn test_new_rebooking_rejects_unknown_type() {
        let result = serde_json::from_str::<NewRebooking>(
            r#"{"consultation_type": "massage", "scheduled_date": "2030-01-15", "scheduled_time": "10:30:00"}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_status_update_optional_fields() {
        let body: RebookingStatusUpdate =
            serde_json::from_str(r#"{"status": "confirmed", "therapist_name": "Dr. Rao"}"#)
                .unwrap();

        assert_eq!(body.status, RebookingStatus::Confirmed);
        assert_eq!(body.therapist_name.as_deref(), Some("Dr. Rao"));
        assert!(body.consultation_notes.is_none());
    }
}
