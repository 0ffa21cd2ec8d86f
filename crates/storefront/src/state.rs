//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;
use thiserror::Error;

use crate::config::StorefrontConfig;
use crate::services::auth::{GoogleTokenInfoVerifier, IdTokenVerifier, ResetTokenGenerator};
use crate::services::chat::{ChatCompletion, ChatError, OpenAiClient};
use crate::services::checkout::CheckoutUrls;
use crate::services::mail::{LogMailer, Mailer, SmtpMailer};
use crate::services::payments::{CashfreeGateway, PaymentError, PaymentGateway};

/// Error building the remote service clients.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("payment gateway: {0}")]
    Payment(#[from] PaymentError),
    #[error("identity verifier: {0}")]
    Identity(#[from] reqwest::Error),
    #[error("chat client: {0}")]
    Chat(#[from] ChatError),
    #[error("smtp: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
}

/// Remote collaborators, injected as trait objects.
#[derive(Clone)]
pub struct Services {
    pub gateway: Option<Arc<dyn PaymentGateway>>,
    pub identity: Option<Arc<dyn IdTokenVerifier>>,
    pub mailer: Arc<dyn Mailer>,
    pub chat: Option<Arc<dyn ChatCompletion>>,
}

impl Services {
    /// Build the production clients for whatever is configured.
    ///
    /// # Errors
    ///
    /// Returns an error if a configured client fails to build.
    pub fn from_config(config: &StorefrontConfig) -> Result<Self, StateError> {
        let gateway = match &config.cashfree {
            Some(cf) => Some(Arc::new(CashfreeGateway::new(cf)?) as Arc<dyn PaymentGateway>),
            None => None,
        };

        let identity = match &config.google_client_id {
            Some(client_id) => Some(
                Arc::new(GoogleTokenInfoVerifier::new(client_id.clone())?) as Arc<dyn IdTokenVerifier>
            ),
            None => None,
        };

        let mailer: Arc<dyn Mailer> = match &config.email.smtp {
            Some(smtp) => Arc::new(SmtpMailer::new(smtp, &config.email.from_address)?),
            None => Arc::new(LogMailer),
        };

        let chat = match &config.openai {
            Some(openai) => Some(Arc::new(OpenAiClient::new(openai)?) as Arc<dyn ChatCompletion>),
            None => None,
        };

        Ok(Self {
            gateway,
            identity,
            mailer,
            chat,
        })
    }

    /// No remote services. Mail goes to the log.
    #[must_use]
    pub fn offline() -> Self {
        Self {
            gateway: None,
            identity: None,
            mailer: Arc::new(LogMailer),
            chat: None,
        }
    }
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    pool: PgPool,
    services: Services,
    reset_tokens: ResetTokenGenerator,
}

impl AppState {
    /// Create the application state with production clients.
    ///
    /// # Errors
    ///
    /// Returns an error if a configured client fails to build.
    pub fn new(config: StorefrontConfig, pool: PgPool) -> Result<Self, StateError> {
        let services = Services::from_config(&config)?;
        Ok(Self::with_services(config, pool, services))
    }

    /// Create the application state with explicit collaborators.
    #[must_use]
    pub fn with_services(config: StorefrontConfig, pool: PgPool, services: Services) -> Self {
        let reset_tokens = ResetTokenGenerator::new(config.session_secret.clone());
        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                services,
                reset_tokens,
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// The payment gateway, if configured.
    #[must_use]
    pub fn gateway(&self) -> Option<&dyn PaymentGateway> {
        self.inner.services.gateway.as_deref()
    }

    /// The Google ID token verifier, if configured.
    #[must_use]
    pub fn identity(&self) -> Option<&dyn IdTokenVerifier> {
        self.inner.services.identity.as_deref()
    }

    #[must_use]
    pub fn mailer(&self) -> &dyn Mailer {
        self.inner.services.mailer.as_ref()
    }

    /// The chat completion provider, if configured.
    #[must_use]
    pub fn chat(&self) -> Option<&dyn ChatCompletion> {
        self.inner.services.chat.as_deref()
    }

    #[must_use]
    pub fn reset_tokens(&self) -> &ResetTokenGenerator {
        &self.inner.reset_tokens
    }

    /// URLs handed to the payment gateway.
    #[must_use]
    pub fn checkout_urls(&self) -> CheckoutUrls {
        CheckoutUrls {
            frontend_url: self.inner.config.frontend_url.trim_end_matches('/').to_string(),
            base_url: self.inner.config.base_url.trim_end_matches('/').to_string(),
        }
    }
}
