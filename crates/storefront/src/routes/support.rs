//! Contact messages and the Gurukul notify-me list.

use axum::{Json, extract::State, http::StatusCode};
use serde_json::{Value, json};
use tracing::instrument;

use ojasritu_core::Email;

use crate::db::SupportRepository;
use crate::error::{AppError, Result};
use crate::middleware::{OptionalAuth, RequireAuth};
use crate::models::support::{ContactMessage, GurukulNotifyRequest, NewContactMessage};
use crate::services::mail::{self, OutgoingEmail};
use crate::state::AppState;

const GURUKUL_THANKS: &str = "Thank you for joining the Ojas Gurukul vision.";

fn parse_email(raw: &str) -> Result<Email> {
    Email::parse(raw).map_err(|_| AppError::BadRequest("Invalid email address".to_string()))
}

/// Contact messages: all of them for staff, otherwise those sent from the
/// caller's email address.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn list_contacts(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Vec<ContactMessage>>> {
    let email = (!user.is_staff).then_some(user.email.as_str());
    let messages = SupportRepository::new(state.pool())
        .list_contacts(email)
        .await?;
    Ok(Json(messages))
}

/// Leave a contact message. Signed-in callers may omit their email.
#[instrument(skip(state, user, body))]
pub async fn create_contact(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    Json(body): Json<NewContactMessage>,
) -> Result<(StatusCode, Json<ContactMessage>)> {
    if body.name.trim().is_empty() || body.message.trim().is_empty() {
        return Err(AppError::BadRequest("name and message are required".to_string()));
    }

    let raw_email = match (body.email.trim(), &user) {
        ("", Some(user)) => user.email.as_str(),
        (given, _) => given,
    };
    let email = parse_email(raw_email)?;

    let message = SupportRepository::new(state.pool())
        .create_contact(&body, email.as_str())
        .await?;
    tracing::info!(contact_id = %message.id, category = %message.category, "Contact message received");
    Ok((StatusCode::CREATED, Json(message)))
}

/// Join the Gurukul notify-me list. New signups get a welcome email.
#[instrument(skip(state, body))]
pub async fn gurukul_notify(
    State(state): State<AppState>,
    Json(body): Json<GurukulNotifyRequest>,
) -> Result<(StatusCode, Json<Value>)> {
    let email = parse_email(&body.email)?;
    let name = body.name.trim();

    let signup = SupportRepository::new(state.pool())
        .upsert_gurukul(name, email.as_str())
        .await?;

    let email_sent = if signup.created {
        let welcome = OutgoingEmail::gurukul_welcome(email.as_str(), name);
        mail::deliver(state.mailer(), "gurukul_welcome_email", welcome)
            .await
            .log()
    } else {
        false
    };

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "created": signup.created,
            "email_sent": email_sent,
            "message": GURUKUL_THANKS,
        })),
    ))
}
