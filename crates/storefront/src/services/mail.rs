//! Outbound email.
//!
//! Messages are rendered from Askama text and HTML templates and handed to
//! a [`Mailer`]. Production uses SMTP via lettre; without SMTP settings the
//! [`LogMailer`] writes messages to the log instead.

use askama::Template;
use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{MultiPart, SinglePart, header::ContentType},
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use secrecy::ExposeSecret;
use thiserror::Error;
use tracing::info;

use super::StepOutcome;
use crate::config::SmtpConfig;

#[derive(Template)]
#[template(path = "email/password_reset.html")]
struct PasswordResetHtml<'a> {
    name: &'a str,
    reset_url: &'a str,
}

#[derive(Template)]
#[template(path = "email/password_reset.txt")]
struct PasswordResetText<'a> {
    name: &'a str,
    reset_url: &'a str,
}

#[derive(Template)]
#[template(path = "email/gurukul_welcome.html")]
struct GurukulWelcomeHtml<'a> {
    name: &'a str,
}

#[derive(Template)]
#[template(path = "email/gurukul_welcome.txt")]
struct GurukulWelcomeText<'a> {
    name: &'a str,
}

/// Errors that can occur when sending email.
#[derive(Debug, Error)]
pub enum MailError {
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    #[error("Failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    #[error("Template error: {0}")]
    Template(#[from] askama::Error),
}

/// A rendered email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub text: String,
    pub html: String,
}

impl OutgoingEmail {
    /// Password reset link.
    ///
    /// # Errors
    ///
    /// Returns error if a template fails to render.
    pub fn password_reset(to: &str, name: &str, reset_url: &str) -> Result<Self, MailError> {
        Ok(Self {
            to: to.to_string(),
            subject: "Reset your Ojasritu password".to_string(),
            text: PasswordResetText { name, reset_url }.render()?,
            html: PasswordResetHtml { name, reset_url }.render()?,
        })
    }

    /// Welcome note for a Gurukul signup.
    ///
    /// # Errors
    ///
    /// Returns error if a template fails to render.
    pub fn gurukul_welcome(to: &str, name: &str) -> Result<Self, MailError> {
        let name = if name.trim().is_empty() { "friend" } else { name.trim() };
        Ok(Self {
            to: to.to_string(),
            subject: "Welcome to Ojas Gurukul".to_string(),
            text: GurukulWelcomeText { name }.render()?,
            html: GurukulWelcomeHtml { name }.render()?,
        })
    }
}

/// Delivers rendered email.
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Send one message.
    async fn send(&self, email: &OutgoingEmail) -> Result<(), MailError>;
}

/// SMTP delivery over STARTTLS.
#[derive(Clone)]
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
}

impl SmtpMailer {
    /// Create a mailer from SMTP settings.
    ///
    /// # Errors
    ///
    /// Returns error if the relay cannot be configured.
    pub fn new(config: &SmtpConfig, from_address: &str) -> Result<Self, SmtpError> {
        let credentials = Credentials::new(
            config.username.clone(),
            config.password.expose_secret().to_string(),
        );

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)?
            .port(config.port)
            .credentials(credentials)
            .build();

        Ok(Self {
            transport,
            from_address: from_address.to_string(),
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), MailError> {
        let message = Message::builder()
            .from(
                self.from_address
                    .parse()
                    .map_err(|_| MailError::InvalidAddress(self.from_address.clone()))?,
            )
            .to(email
                .to
                .parse()
                .map_err(|_| MailError::InvalidAddress(email.to.clone()))?)
            .subject(email.subject.as_str())
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(email.text.clone()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(email.html.clone()),
                    ),
            )?;

        self.transport.send(message).await?;

        info!(to = %email.to, subject = %email.subject, "Email sent successfully");
        Ok(())
    }
}

/// Render and send a message without failing the caller.
pub async fn deliver(
    mailer: &dyn Mailer,
    step: &'static str,
    email: Result<OutgoingEmail, MailError>,
) -> StepOutcome {
    let result = match email {
        Ok(email) => mailer.send(&email).await,
        Err(e) => Err(e),
    };
    StepOutcome::from_result(step, result)
}

/// Writes messages to the log. Used when SMTP is not configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), MailError> {
        info!(to = %email.to, subject = %email.subject, body = %email.text, "Email not sent (SMTP not configured)");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_password_reset_renders_link() {
        let email = OutgoingEmail::password_reset(
            "asha@example.com",
            "Asha",
            "https://ojasritu.co.in/reset-password/NDI/abc-123",
        )
        .unwrap();
        assert_eq!(email.to, "asha@example.com");
        assert!(email.text.contains("https://ojasritu.co.in/reset-password/NDI/abc-123"));
        assert!(email.html.contains("reset-password"));
        assert!(email.text.contains("Asha"));
    }

    #[test]
    fn test_gurukul_welcome_subject_and_default_name() {
        let email = OutgoingEmail::gurukul_welcome("ravi@example.com", "  ").unwrap();
        assert_eq!(email.subject, "Welcome to Ojas Gurukul");
        assert!(email.text.contains("friend"));
    }

    #[test]
    fn test_html_escapes_name() {
        let email = OutgoingEmail::gurukul_welcome("x@example.com", "<b>Ravi</b>").unwrap();
        assert!(!email.html.contains("<b>Ravi</b>"));
    }

    #[tokio::test]
    async fn test_log_mailer_accepts() {
        let email = OutgoingEmail::gurukul_welcome("ravi@example.com", "Ravi").unwrap();
        assert!(LogMailer.send(&email).await.is_ok());
    }
}
