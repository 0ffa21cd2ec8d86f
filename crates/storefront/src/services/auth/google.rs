//! Google ID token verification.
//!
//! Tokens are sent to Google's `tokeninfo` endpoint, which checks the
//! signature. The returned claims are then checked locally: audience,
//! issuer, expiry and a verified email.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::instrument;

/// Google's token introspection endpoint.
pub const TOKENINFO_URL: &str = "https://oauth2.googleapis.com/tokeninfo";

/// Issuers Google uses for ID tokens.
const ALLOWED_ISSUERS: [&str; 2] = ["accounts.google.com", "https://accounts.google.com"];

/// Errors from identity verification.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// No client id is configured.
    #[error("Google sign-in is not configured")]
    NotConfigured,

    /// The token was rejected by the provider or failed a claim check.
    #[error("invalid token: {0}")]
    InvalidToken(String),

    /// The provider could not be reached.
    #[error("identity provider unreachable: {0}")]
    Unreachable(String),
}

/// A verified identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedIdentity {
    /// Lowercased email address.
    pub email: String,
    pub given_name: String,
    pub family_name: String,
}

/// Verifies third-party ID tokens.
#[async_trait]
pub trait IdTokenVerifier: Send + Sync {
    /// Verify a token and return the identity it asserts.
    async fn verify(&self, id_token: &str) -> Result<VerifiedIdentity, IdentityError>;
}

/// Claims returned by `tokeninfo`. Numbers and booleans arrive as strings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokenInfo {
    #[serde(default)]
    pub aud: String,
    #[serde(default)]
    pub iss: String,
    #[serde(default)]
    pub exp: Value,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub email_verified: Value,
    #[serde(default)]
    pub given_name: Option<String>,
    #[serde(default)]
    pub family_name: Option<String>,
}

/// Check `tokeninfo` claims against the configured client id.
///
/// # Errors
///
/// Returns `IdentityError::InvalidToken` naming the first failed check.
pub fn validate_claims(
    info: &TokenInfo,
    client_id: &str,
    now_unix: i64,
) -> Result<VerifiedIdentity, IdentityError> {
    if info.aud != client_id {
        return Err(IdentityError::InvalidToken("audience mismatch".to_string()));
    }
    if !ALLOWED_ISSUERS.contains(&info.iss.as_str()) {
        return Err(IdentityError::InvalidToken("unexpected issuer".to_string()));
    }
    let exp = value_as_i64(&info.exp)
        .ok_or_else(|| IdentityError::InvalidToken("missing expiry".to_string()))?;
    if exp <= now_unix {
        return Err(IdentityError::InvalidToken("token expired".to_string()));
    }
    if !value_as_bool(&info.email_verified) {
        return Err(IdentityError::InvalidToken("email not verified".to_string()));
    }
    let email = info
        .email
        .as_deref()
        .map(|e| e.trim().to_lowercase())
        .filter(|e| !e.is_empty())
        .ok_or_else(|| IdentityError::InvalidToken("email not available".to_string()))?;

    Ok(VerifiedIdentity {
        email,
        given_name: info.given_name.clone().unwrap_or_default(),
        family_name: info.family_name.clone().unwrap_or_default(),
    })
}

fn value_as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

fn value_as_bool(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::String(s) => s.eq_ignore_ascii_case("true"),
        _ => false,
    }
}

/// Verifier backed by Google's `tokeninfo` endpoint.
#[derive(Clone)]
pub struct GoogleTokenInfoVerifier {
    client: reqwest::Client,
    client_id: String,
    endpoint: String,
}

impl GoogleTokenInfoVerifier {
    /// Create a verifier for `client_id`.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(client_id: String) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(8))
            .build()?;
        Ok(Self {
            client,
            client_id,
            endpoint: TOKENINFO_URL.to_string(),
        })
    }
}

#[async_trait]
impl IdTokenVerifier for GoogleTokenInfoVerifier {
    #[instrument(skip(self, id_token))]
    async fn verify(&self, id_token: &str) -> Result<VerifiedIdentity, IdentityError> {
        let url = url::Url::parse_with_params(&self.endpoint, &[("id_token", id_token)])
            .map_err(|e| IdentityError::Unreachable(e.to_string()))?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| IdentityError::Unreachable(e.to_string()))?;

        let status = response.status();
        if status.is_server_error() {
            return Err(IdentityError::Unreachable(format!("tokeninfo returned {status}")));
        }
        if !status.is_success() {
            return Err(IdentityError::InvalidToken(format!("tokeninfo returned {status}")));
        }

        let info: TokenInfo = response
            .json()
            .await
            .map_err(|e| IdentityError::InvalidToken(e.to_string()))?;

        validate_claims(&info, &self.client_id, Utc::now().timestamp())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const CLIENT: &str = "1234.apps.googleusercontent.com";
    const NOW: i64 = 1_760_000_000;

    fn claims() -> TokenInfo {
        serde_json::from_value(serde_json::json!({
            "aud": CLIENT,
            "iss": "https://accounts.google.com",
            "exp": (NOW + 600).to_string(),
            "email": "Seeker@Example.COM",
            "email_verified": "true",
            "given_name": "Asha",
            "family_name": "Verma"
        }))
        .unwrap()
    }

    #[test]
    fn test_valid_claims() {
        let identity = validate_claims(&claims(), CLIENT, NOW).unwrap();
        assert_eq!(identity.email, "seeker@example.com");
        assert_eq!(identity.given_name, "Asha");
        assert_eq!(identity.family_name, "Verma");
    }

    #[test]
    fn test_bare_issuer_and_native_types() {
        let mut info = claims();
        info.iss = "accounts.google.com".to_string();
        info.exp = serde_json::json!(NOW + 5);
        info.email_verified = serde_json::json!(true);
        assert!(validate_claims(&info, CLIENT, NOW).is_ok());
    }

    #[test]
    fn test_rejections() {
        let mut wrong_aud = claims();
        wrong_aud.aud = "other".to_string();
        assert!(matches!(
            validate_claims(&wrong_aud, CLIENT, NOW),
            Err(IdentityError::InvalidToken(_))
        ));

        let mut wrong_iss = claims();
        wrong_iss.iss = "https://evil.example".to_string();
        assert!(validate_claims(&wrong_iss, CLIENT, NOW).is_err());

        let mut expired = claims();
        expired.exp = serde_json::json!(NOW.to_string());
        assert!(validate_claims(&expired, CLIENT, NOW).is_err());

        let mut unverified = claims();
        unverified.email_verified = serde_json::json!("false");
        assert!(validate_claims(&unverified, CLIENT, NOW).is_err());

        let mut no_email = claims();
        no_email.email = None;
        assert!(validate_claims(&no_email, CLIENT, NOW).is_err());
    }
}
