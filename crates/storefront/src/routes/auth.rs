//! Authentication route handlers.
//!
//! Password signup and login, logout, session checks, password reset and
//! Google sign-in. Successful sign-ins both log the session in and return a
//! durable API token.

use axum::{Json, extract::State};
use serde::Deserialize;
use serde_json::{Value, json};
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, Result, clear_sentry_user, set_sentry_user};
use crate::middleware::{
    OptionalAuth, RequireAuth, clear_current_user, issue_csrf_token, set_current_user,
};
use crate::models::{CurrentUser, User};
use crate::services::auth::{AuthService, IdentityError, ResetInput, SignupInput};
use crate::services::mail::{self, OutgoingEmail};
use crate::state::AppState;

/// Response to a forgot-password request, whether or not the email exists.
const RESET_REQUESTED: &str = "If the email exists, a reset link has been sent";

// =============================================================================
// Request Types
// =============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    pub password_confirm: String,
    pub first_name: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    /// Email or username.
    pub email: String,
    pub password: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ResetPasswordRequest {
    pub uid: String,
    pub token: String,
    pub password: String,
    pub password_confirm: String,
}

/// Google sign-in accepts either field name.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct GoogleLoginRequest {
    pub id_token: Option<String>,
    pub credential: Option<String>,
}

// =============================================================================
// Helpers
// =============================================================================

/// Log `user` into the session and return their API token.
async fn start_session(state: &AppState, session: &Session, user: &User) -> Result<String> {
    let auth = AuthService::new(state.pool());

    auth.record_login(user.id).await.log();

    set_current_user(session, &CurrentUser::from(user))
        .await
        .map_err(|e| AppError::Internal(format!("session error: {e}")))?;

    let token = auth.issue_token(user.id).await?;
    set_sentry_user(&user.id, Some(&user.email));
    Ok(token)
}

// =============================================================================
// Handlers
// =============================================================================

/// Issue the CSRF token for this session.
pub async fn csrf(session: Session) -> Result<Json<Value>> {
    let token = issue_csrf_token(&session)
        .await
        .map_err(|e| AppError::Internal(format!("session error: {e}")))?;
    Ok(Json(json!({ "csrftoken": token })))
}

/// Create an account and sign it in.
#[instrument(skip(state, session, body))]
pub async fn signup(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<SignupRequest>,
) -> Result<Json<Value>> {
    let user = AuthService::new(state.pool())
        .signup(&SignupInput {
            email: &body.email,
            password: &body.password,
            password_confirm: &body.password_confirm,
            first_name: &body.first_name,
        })
        .await?;

    let token = start_session(&state, &session, &user).await?;
    tracing::info!(user_id = %user.id, "User signed up");

    Ok(Json(json!({ "success": true, "token": token })))
}

/// Sign in with a password.
#[instrument(skip(state, session, body))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<LoginRequest>,
) -> Result<Json<Value>> {
    let user = AuthService::new(state.pool())
        .login(&body.email, &body.password)
        .await?;

    let token = start_session(&state, &session, &user).await?;
    tracing::info!(user_id = %user.id, "User logged in");

    Ok(Json(json!({
        "success": true,
        "token": token,
        "user": {
            "id": user.id,
            "username": user.username,
            "email": user.email,
            "first_name": user.first_name,
        },
    })))
}

/// Revoke the API token and flush the session.
///
/// Token deletion is best-effort. The session flush is not.
#[instrument(skip(state, session, user), fields(user_id = %user.id))]
pub async fn logout(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Value>> {
    AuthService::new(state.pool())
        .revoke_token(user.id)
        .await
        .log();

    clear_current_user(&session)
        .await
        .map_err(|e| AppError::Internal(format!("failed to flush session: {e}")))?;
    clear_sentry_user();

    Ok(Json(json!({ "success": true })))
}

/// Report whether the caller is signed in.
pub async fn check(OptionalAuth(user): OptionalAuth) -> Json<Value> {
    match user {
        Some(user) => Json(json!({
            "authenticated": true,
            "user": { "id": user.id, "email": user.email, "first_name": user.first_name },
        })),
        None => Json(json!({ "authenticated": false, "user": null })),
    }
}

/// The signed-in user's identity.
pub async fn profile(RequireAuth(user): RequireAuth) -> Json<Value> {
    Json(json!({
        "authenticated": true,
        "user": { "username": user.username, "email": user.email, "first_name": user.first_name },
    }))
}

/// Email a reset link when the account exists.
///
/// The response never reveals whether it does.
#[instrument(skip(state, body))]
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(body): Json<ForgotPasswordRequest>,
) -> Json<Value> {
    match AuthService::new(state.pool())
        .password_reset_link(&body.email, state.reset_tokens())
        .await
    {
        Ok(Some(link)) => {
            let reset_url = format!(
                "{}/reset-password/{}/{}",
                state.config().frontend_url.trim_end_matches('/'),
                link.uid,
                link.token
            );
            let email =
                OutgoingEmail::password_reset(&link.user.email, &link.user.display_name(), &reset_url);
            if mail::deliver(state.mailer(), "password_reset_email", email)
                .await
                .log()
            {
                tracing::info!(user_id = %link.user.id, "Password reset link sent");
            }
        }
        Ok(None) => tracing::debug!("Password reset requested for unknown or passwordless account"),
        Err(e) => tracing::warn!(error = %e, "Password reset lookup failed"),
    }

    Json(json!({ "message": RESET_REQUESTED }))
}

/// Set a new password from a reset link.
#[instrument(skip(state, body))]
pub async fn reset_password(
    State(state): State<AppState>,
    Json(body): Json<ResetPasswordRequest>,
) -> Result<Json<Value>> {
    let user = AuthService::new(state.pool())
        .reset_password(
            &ResetInput {
                uid: &body.uid,
                token: &body.token,
                password: &body.password,
                password_confirm: &body.password_confirm,
            },
            state.reset_tokens(),
        )
        .await?;

    tracing::info!(user_id = %user.id, "Password reset");
    Ok(Json(json!({ "message": "Password has been reset" })))
}

/// Sign in with a Google ID token.
#[instrument(skip(state, session, body))]
pub async fn google(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<GoogleLoginRequest>,
) -> Result<Json<Value>> {
    let id_token = body
        .id_token
        .or(body.credential)
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| AppError::BadRequest("id_token required".to_string()))?;

    let verifier = state.identity().ok_or(IdentityError::NotConfigured)?;
    let identity = verifier.verify(id_token.trim()).await?;

    let user = AuthService::new(state.pool())
        .federated_login(&identity)
        .await?;

    let token = start_session(&state, &session, &user).await?;
    tracing::info!(user_id = %user.id, "User signed in with Google");

    Ok(Json(json!({
        "success": true,
        "token": token,
        "user": { "email": user.email, "id": user.id },
    })))
}
