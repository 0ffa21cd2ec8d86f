//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `auth` - Passwords, API tokens, reset links and Google sign-in
//! - `payments` - Payment gateway client and webhook signatures
//! - `checkout` - Order creation and webhook reconciliation
//! - `chat` - Chatbot, dosha analyzer and tips
//! - `mail` - Outbound email
//! - `markdown` - Article and blog rendering
//!
//! Remote collaborators (gateway, identity provider, LLM, SMTP) sit behind
//! traits so tests can swap in fakes.

pub mod auth;
pub mod chat;
pub mod checkout;
pub mod mail;
pub mod markdown;
pub mod payments;

/// Result of a best-effort step.
///
/// Best-effort steps never fail the request. A degraded outcome is logged
/// at warn by [`StepOutcome::log`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub enum StepOutcome {
    Completed,
    Degraded { step: &'static str, reason: String },
}

impl StepOutcome {
    /// Build an outcome from a fallible step.
    pub fn from_result<T, E: std::fmt::Display>(step: &'static str, result: Result<T, E>) -> Self {
        match result {
            Ok(_) => Self::Completed,
            Err(e) => Self::Degraded {
                step,
                reason: e.to_string(),
            },
        }
    }

    #[must_use]
    pub const fn is_completed(&self) -> bool {
        matches!(self, Self::Completed)
    }

    /// Log a degraded outcome and return whether the step completed.
    pub fn log(self) -> bool {
        match self {
            Self::Completed => true,
            Self::Degraded { step, reason } => {
                tracing::warn!(step, %reason, "Best-effort step degraded");
                false
            }
        }
    }
}
