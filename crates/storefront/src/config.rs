//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STOREFRONT_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `STOREFRONT_BASE_URL` - Public URL of this API (used for the payment notify URL)
//! - `STOREFRONT_SESSION_SECRET` - Session and reset-token signing secret (min 32 chars, high entropy)
//! - `FRONTEND_URL` - Public URL of the single-page front end
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 8000)
//! - `ALLOWED_HOSTS` - Comma-separated host allow list; `.example.com` matches subdomains
//! - `CASHFREE_APP_ID` / `CASHFREE_SECRET_KEY` - Payment gateway credentials
//! - `CASHFREE_ENV` - `TEST` (default) or `PROD`
//! - `GOOGLE_CLIENT_ID` - OAuth client ID accepted in Google ID tokens
//! - `OPENAI_API_KEY` - Chat completion API key (chatbot falls back to canned replies without it)
//! - `OPENAI_MODEL` - Chat model (default: gpt-4o-mini)
//! - `SMTP_HOST`, `SMTP_PORT`, `SMTP_USERNAME`, `SMTP_PASSWORD` - Outbound mail relay
//! - `DEFAULT_FROM_EMAIL` - Sender address (default: no-reply@ojasritu.co.in)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

const MIN_SESSION_SECRET_LENGTH: usize = 32;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;
const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
const DEFAULT_FROM_EMAIL: &str = "Ojasritu Wellness <no-reply@ojasritu.co.in>";

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL of this API, without trailing slash
    pub base_url: String,
    /// Public URL of the front end, without trailing slash
    pub frontend_url: String,
    /// Session signing secret
    pub session_secret: SecretString,
    /// Accepted `Host` header values (empty means any)
    pub allowed_hosts: Vec<String>,
    /// Cashfree payment gateway, if configured
    pub cashfree: Option<CashfreeConfig>,
    /// Google OAuth client ID, if configured
    pub google_client_id: Option<String>,
    /// Chat completion API, if configured
    pub openai: Option<OpenAiConfig>,
    /// Outbound mail settings
    pub email: EmailConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

/// Cashfree environment selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CashfreeEnvironment {
    Sandbox,
    Production,
}

impl CashfreeEnvironment {
    /// Base URL of the Payment Gateway API.
    #[must_use]
    pub const fn base_url(self) -> &'static str {
        match self {
            Self::Sandbox => "https://sandbox.cashfree.com/pg",
            Self::Production => "https://api.cashfree.com/pg",
        }
    }

    fn parse(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("PROD") {
            Self::Production
        } else {
            Self::Sandbox
        }
    }
}

/// Cashfree payment gateway configuration.
///
/// Implements `Debug` manually to redact secret fields.
#[derive(Clone)]
pub struct CashfreeConfig {
    pub app_id: String,
    /// Also the webhook HMAC key.
    pub secret_key: SecretString,
    pub environment: CashfreeEnvironment,
}

impl std::fmt::Debug for CashfreeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CashfreeConfig")
            .field("app_id", &self.app_id)
            .field("secret_key", &"[REDACTED]")
            .field("environment", &self.environment)
            .finish()
    }
}

/// Chat completion API configuration.
#[derive(Clone)]
pub struct OpenAiConfig {
    pub api_key: SecretString,
    pub model: String,
}

impl std::fmt::Debug for OpenAiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiConfig")
            .field("api_key", &"[REDACTED]")
            .field("model", &self.model)
            .finish()
    }
}

/// Outbound mail configuration.
#[derive(Debug, Clone)]
pub struct EmailConfig {
    /// SMTP relay, if configured. Without one, mail is only logged.
    pub smtp: Option<SmtpConfig>,
    pub from_address: String,
}

/// SMTP relay settings.
#[derive(Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: SecretString,
}

impl std::fmt::Debug for SmtpConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("STOREFRONT_DATABASE_URL")?;
        let host = get_env_or_default("STOREFRONT_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("STOREFRONT_HOST".to_string(), e.to_string())
            })?;
        let port = parse_port("STOREFRONT_PORT", &get_env_or_default("STOREFRONT_PORT", "8000"))?;
        let base_url = get_url("STOREFRONT_BASE_URL")?;
        let frontend_url = get_url("FRONTEND_URL")?;
        let session_secret = get_validated_secret("STOREFRONT_SESSION_SECRET")?;
        validate_session_secret(&session_secret, "STOREFRONT_SESSION_SECRET")?;

        let allowed_hosts = parse_allowed_hosts(&get_env_or_default("ALLOWED_HOSTS", ""));

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            frontend_url,
            session_secret,
            allowed_hosts,
            cashfree: CashfreeConfig::from_env()?,
            google_client_id: get_optional_env("GOOGLE_CLIENT_ID"),
            openai: OpenAiConfig::from_env(),
            email: EmailConfig::from_env()?,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether cookies should carry the `Secure` attribute.
    #[must_use]
    pub fn is_https(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

impl CashfreeConfig {
    /// Both credentials must be present for the gateway to be enabled.
    fn from_env() -> Result<Option<Self>, ConfigError> {
        let (Some(app_id), Some(secret)) = (
            get_optional_env("CASHFREE_APP_ID"),
            get_optional_env("CASHFREE_SECRET_KEY"),
        ) else {
            return Ok(None);
        };
        validate_secret_strength(&secret, "CASHFREE_SECRET_KEY")?;

        Ok(Some(Self {
            app_id,
            secret_key: SecretString::from(secret),
            environment: CashfreeEnvironment::parse(&get_env_or_default("CASHFREE_ENV", "TEST")),
        }))
    }
}

impl OpenAiConfig {
    fn from_env() -> Option<Self> {
        get_optional_env("OPENAI_API_KEY").map(|key| Self {
            api_key: SecretString::from(key),
            model: get_env_or_default("OPENAI_MODEL", DEFAULT_OPENAI_MODEL),
        })
    }
}

impl EmailConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let smtp = match get_optional_env("SMTP_HOST") {
            Some(host) => Some(SmtpConfig {
                host,
                port: parse_port("SMTP_PORT", &get_env_or_default("SMTP_PORT", "587"))?,
                username: get_env_or_default("SMTP_USERNAME", ""),
                password: SecretString::from(get_env_or_default("SMTP_PASSWORD", "")),
            }),
            None => None,
        };

        Ok(Self {
            smtp,
            from_address: get_env_or_default("DEFAULT_FROM_EMAIL", DEFAULT_FROM_EMAIL),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable. Empty values count as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Get a required absolute http(s) URL, stripped of any trailing slash.
fn get_url(key: &str) -> Result<String, ConfigError> {
    let raw = get_required_env(key)?;
    normalize_url(key, &raw)
}

fn normalize_url(key: &str, raw: &str) -> Result<String, ConfigError> {
    let parsed = url::Url::parse(raw.trim())
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            "must be an http or https URL".to_string(),
        ));
    }
    Ok(raw.trim().trim_end_matches('/').to_string())
}

fn parse_port(key: &str, value: &str) -> Result<u16, ConfigError> {
    value
        .trim()
        .parse::<u16>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Split a comma-separated host list, lowercased, blanks dropped.
fn parse_allowed_hosts(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|h| h.trim().to_ascii_lowercase())
        .filter(|h| !h.is_empty())
        .collect()
}

/// Validate that a session secret meets minimum length requirements.
fn validate_session_secret(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let value = secret.expose_secret();
    if value.len() < MIN_SESSION_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "must be at least {} characters (got {})",
                MIN_SESSION_SECRET_LENGTH,
                value.len()
            ),
        ));
    }
    Ok(())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.chars().count() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)]
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_shannon_entropy_edges() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
        assert!((shannon_entropy("aaaaaaa") - 0.0).abs() < f64::EPSILON);
        assert!((shannon_entropy("ab") - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_validate_secret_strength() {
        assert!(matches!(
            validate_secret_strength("your-api-key-here", "TEST_VAR"),
            Err(ConfigError::InsecureSecret(_, _))
        ));
        assert!(validate_secret_strength("changeme123", "TEST_VAR").is_err());
        assert!(validate_secret_strength(&"a".repeat(40), "TEST_VAR").is_err());
        assert!(validate_secret_strength("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6", "TEST_VAR").is_ok());
    }

    #[test]
    fn test_validate_session_secret_length() {
        assert!(validate_session_secret(&SecretString::from("short"), "S").is_err());
        assert!(validate_session_secret(&SecretString::from("a".repeat(32)), "S").is_ok());
    }

    #[test]
    fn test_normalize_url() {
        assert_eq!(
            normalize_url("FRONTEND_URL", "https://ojasritu.co.in/").unwrap(),
            "https://ojasritu.co.in"
        );
        assert!(normalize_url("FRONTEND_URL", "ojasritu.co.in").is_err());
        assert!(normalize_url("FRONTEND_URL", "ftp://ojasritu.co.in").is_err());
    }

    #[test]
    fn test_parse_allowed_hosts() {
        assert_eq!(
            parse_allowed_hosts(" api.ojasritu.co.in, .OJASRITU.co.in ,,"),
            vec!["api.ojasritu.co.in", ".ojasritu.co.in"]
        );
        assert!(parse_allowed_hosts("").is_empty());
    }

    #[test]
    fn test_cashfree_environment() {
        assert_eq!(CashfreeEnvironment::parse("prod"), CashfreeEnvironment::Production);
        assert_eq!(CashfreeEnvironment::parse("TEST"), CashfreeEnvironment::Sandbox);
        assert_eq!(CashfreeEnvironment::parse("anything"), CashfreeEnvironment::Sandbox);
        assert_eq!(
            CashfreeEnvironment::Production.base_url(),
            "https://api.cashfree.com/pg"
        );
    }

    #[test]
    fn test_parse_port() {
        assert_eq!(parse_port("P", "8000").unwrap(), 8000);
        assert!(parse_port("P", "eighty").is_err());
        assert!(parse_port("P", "70000").is_err());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let cashfree = CashfreeConfig {
            app_id: "TEST_APP_1234".to_string(),
            secret_key: SecretString::from("cfsk_super_secret_value"),
            environment: CashfreeEnvironment::Sandbox,
        };
        let smtp = SmtpConfig {
            host: "smtp.ojasritu.co.in".to_string(),
            port: 587,
            username: "mailer".to_string(),
            password: SecretString::from("smtp_pass_value"),
        };

        let debug_output = format!("{cashfree:?} {smtp:?}");
        assert!(debug_output.contains("TEST_APP_1234"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("cfsk_super_secret_value"));
        assert!(!debug_output.contains("smtp_pass_value"));
    }
}
