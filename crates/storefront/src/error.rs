//! Unified error handling with Sentry integration.
//!
//! Every handler returns `Result<T, AppError>`. Errors render as a JSON body
//! `{"error": "<message>"}`. Server-side failures are captured to Sentry and
//! answered with a generic message.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::auth::{AuthError, IdentityError};
use crate::services::chat::ChatError;
use crate::services::checkout::CheckoutError;
use crate::services::payments::PaymentError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Payment gateway operation failed.
    #[error("Payment error: {0}")]
    Payment(#[from] PaymentError),

    /// Identity provider operation failed.
    #[error("Identity error: {0}")]
    Identity(#[from] IdentityError),

    /// Checkout failed.
    #[error("Checkout error: {0}")]
    Checkout(#[from] CheckoutError),

    /// Chatbot request failed.
    #[error("Chat error: {0}")]
    Chat(#[from] ChatError),

    /// Resource not found, or owned by someone else.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Caller may not do this.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Rate limited.
    #[error("Rate limited")]
    RateLimited,

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Database(err) => match err {
                RepositoryError::NotFound => StatusCode::NOT_FOUND,
                RepositoryError::Conflict(_) => StatusCode::BAD_REQUEST,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
                AuthError::Repository(_) | AuthError::PasswordHash => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
                _ => StatusCode::BAD_REQUEST,
            },
            Self::Payment(err) => payment_status(err),
            Self::Identity(err) => match err {
                IdentityError::NotConfigured => StatusCode::INTERNAL_SERVER_ERROR,
                IdentityError::InvalidToken(_) => StatusCode::BAD_REQUEST,
                IdentityError::Unreachable(_) => StatusCode::BAD_GATEWAY,
            },
            Self::Checkout(err) => match err {
                CheckoutError::EmptyCart | CheckoutError::Validation(_) => StatusCode::BAD_REQUEST,
                CheckoutError::OrderNotFound => StatusCode::NOT_FOUND,
                CheckoutError::Payment(err) => payment_status(err),
                CheckoutError::Contention(_) | CheckoutError::Repository(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Chat(err) => match err {
                ChatError::EmptyMessage | ChatError::EmptyAnswers => StatusCode::BAD_REQUEST,
                ChatError::Provider(_) | ChatError::EmptyCompletion => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message shown to the client. Internal details are never exposed.
    #[must_use]
    pub fn client_message(&self) -> String {
        match self {
            Self::Database(RepositoryError::NotFound) => "Not found".to_string(),
            Self::Database(RepositoryError::Conflict(what)) => what.clone(),
            Self::Auth(AuthError::InvalidEmail(_)) => "Invalid email address".to_string(),
            Self::Payment(err) | Self::Checkout(CheckoutError::Payment(err)) => {
                payment_message(err)
            }
            Self::Identity(err) => match err {
                IdentityError::NotConfigured => "Google sign-in is not configured".to_string(),
                IdentityError::InvalidToken(_) => "Invalid or expired token".to_string(),
                IdentityError::Unreachable(_) => "Identity provider unavailable".to_string(),
            },
            Self::NotFound(msg)
            | Self::Unauthorized(msg)
            | Self::Forbidden(msg)
            | Self::BadRequest(msg) => msg.clone(),
            Self::RateLimited => "Too many requests".to_string(),
            _ if self.status().is_server_error() => "Internal server error".to_string(),
            Self::Auth(err) => err.to_string(),
            Self::Checkout(err) => err.to_string(),
            Self::Chat(err) => err.to_string(),
            _ => "Internal server error".to_string(),
        }
    }
}

const fn payment_status(err: &PaymentError) -> StatusCode {
    match err {
        PaymentError::NotConfigured => StatusCode::INTERNAL_SERVER_ERROR,
        PaymentError::Rejected(_) => StatusCode::BAD_REQUEST,
        PaymentError::Unreachable(_) | PaymentError::InvalidResponse(_) => StatusCode::BAD_GATEWAY,
    }
}

/// Gateway failures share one prefix so clients can tell them apart.
///
/// Only the gateway's own rejection text is passed through; transport
/// details stay in the logs.
fn payment_message(err: &PaymentError) -> String {
    let detail = match err {
        PaymentError::NotConfigured => "not configured",
        PaymentError::Rejected(msg) => msg.as_str(),
        PaymentError::Unreachable(_) => "unavailable",
        PaymentError::InvalidResponse(_) => "invalid response",
    };
    format!("Payment gateway error: {detail}")
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "Request rejected");
        }

        (status, Json(json!({ "error": self.client_message() }))).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on logout to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("Order not found".to_string());
        assert_eq!(err.to_string(), "Not found: Order not found");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(status_of(AppError::NotFound("x".into())), StatusCode::NOT_FOUND);
        assert_eq!(status_of(AppError::Unauthorized("x".into())), StatusCode::UNAUTHORIZED);
        assert_eq!(status_of(AppError::Forbidden("x".into())), StatusCode::FORBIDDEN);
        assert_eq!(status_of(AppError::BadRequest("x".into())), StatusCode::BAD_REQUEST);
        assert_eq!(status_of(AppError::RateLimited), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            status_of(AppError::Internal("x".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_auth_error_mapping() {
        assert_eq!(
            AppError::from(AuthError::InvalidCredentials).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::from(AuthError::PasswordMismatch).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::from(AuthError::PasswordMismatch).client_message(),
            "Passwords do not match"
        );
        assert_eq!(
            AppError::from(AuthError::PasswordHash).client_message(),
            "Internal server error"
        );
    }

    #[test]
    fn test_payment_error_mapping() {
        let rejected = AppError::from(PaymentError::Rejected("order_amount invalid".into()));
        assert_eq!(rejected.status(), StatusCode::BAD_REQUEST);
        assert_eq!(rejected.client_message(), "Payment gateway error: order_amount invalid");

        let unreachable = AppError::from(PaymentError::Unreachable("connect timeout".into()));
        assert_eq!(unreachable.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(unreachable.client_message(), "Payment gateway error: unavailable");

        let garbled = AppError::from(PaymentError::InvalidResponse("missing session".into()));
        assert_eq!(garbled.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(garbled.client_message(), "Payment gateway error: invalid response");

        let unconfigured = AppError::from(CheckoutError::Payment(PaymentError::NotConfigured));
        assert_eq!(unconfigured.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(unconfigured.client_message(), "Payment gateway error: not configured");
        assert_eq!(
            AppError::from(CheckoutError::EmptyCart).client_message(),
            "Cart is empty"
        );
    }

    #[test]
    fn test_identity_error_mapping() {
        let invalid = AppError::from(IdentityError::InvalidToken("aud".into()));
        assert_eq!(invalid.status(), StatusCode::BAD_REQUEST);
        assert_eq!(invalid.client_message(), "Invalid or expired token");
        assert_eq!(
            AppError::from(IdentityError::Unreachable("dns".into())).status(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_internal_details_hidden() {
        let err = AppError::Database(RepositoryError::DataCorruption("bad enum".into()));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.client_message(), "Internal server error");
        assert_eq!(
            AppError::from(ChatError::Provider("401".into())).client_message(),
            "Internal server error"
        );
    }
}
