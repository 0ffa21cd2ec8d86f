//! Password reset links.
//!
//! A link carries `uid` (base64url of the decimal user id) and a token of
//! the form `<issued_at base36>-<hex HMAC-SHA256>`. The MAC covers the user
//! id, the current password hash, the last login time and the issue time,
//! so a password change or a new login invalidates every outstanding link.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;

use ojasritu_core::UserId;

use crate::models::User;

type HmacSha256 = Hmac<Sha256>;

/// How long a reset link stays valid.
pub const RESET_TOKEN_TTL_DAYS: i64 = 3;

/// Mints and checks reset tokens with the session secret.
#[derive(Clone)]
pub struct ResetTokenGenerator {
    secret: SecretString,
    ttl: Duration,
}

impl ResetTokenGenerator {
    #[must_use]
    pub fn new(secret: SecretString) -> Self {
        Self {
            secret,
            ttl: Duration::days(RESET_TOKEN_TTL_DAYS),
        }
    }

    /// Encode a user id for the `uid` link segment.
    #[must_use]
    pub fn encode_uid(id: UserId) -> String {
        URL_SAFE_NO_PAD.encode(id.to_string())
    }

    /// Decode a `uid` link segment. Padded input is accepted.
    #[must_use]
    pub fn decode_uid(uid: &str) -> Option<UserId> {
        let bytes = URL_SAFE_NO_PAD.decode(uid.trim_end_matches('=')).ok()?;
        let text = std::str::from_utf8(&bytes).ok()?;
        text.parse::<i32>().ok().map(UserId::new)
    }

    /// Mint a token for `user` issued at `now`.
    ///
    /// Returns `None` for times before the Unix epoch.
    #[must_use]
    pub fn make_token(&self, user: &User, now: DateTime<Utc>) -> Option<String> {
        let issued = u64::try_from(now.timestamp()).ok()?;
        let mac = self.mac(user, issued)?;
        Some(format!(
            "{}-{}",
            to_base36(issued),
            hex::encode(mac.finalize().into_bytes())
        ))
    }

    /// Check a token for `user` at `now`.
    #[must_use]
    pub fn check_token(&self, user: &User, token: &str, now: DateTime<Utc>) -> bool {
        let Some((ts, digest)) = token.split_once('-') else {
            return false;
        };
        let Some(issued) = from_base36(ts) else {
            return false;
        };
        let Ok(digest) = hex::decode(digest) else {
            return false;
        };

        let Ok(issued_secs) = i64::try_from(issued) else {
            return false;
        };
        let age = now.timestamp() - issued_secs;
        if age < 0 || age > self.ttl.num_seconds() {
            return false;
        }

        self.mac(user, issued)
            .is_some_and(|mac| mac.verify_slice(&digest).is_ok())
    }

    fn mac(&self, user: &User, issued: u64) -> Option<HmacSha256> {
        let login = user
            .last_login
            .map(|t| t.timestamp_micros().to_string())
            .unwrap_or_default();
        let state = format!(
            "{}|{}|{}|{}",
            user.id,
            user.password_hash.as_deref().unwrap_or_default(),
            login,
            issued
        );

        let Ok(mut mac) = HmacSha256::new_from_slice(self.secret.expose_secret().as_bytes()) else {
            return None;
        };
        mac.update(state.as_bytes());
        Some(mac)
    }
}

fn to_base36(mut n: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if n == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while n > 0 {
        out.push(DIGITS[(n % 36) as usize]);
        n /= 36;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}

fn from_base36(s: &str) -> Option<u64> {
    if s.is_empty() || s.len() > 13 {
        return None;
    }
    u64::from_str_radix(s, 36).ok()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn generator() -> ResetTokenGenerator {
        ResetTokenGenerator::new(SecretString::from("k3Jd9sLq2Wm8Xv4Tz7Rp1Nc6Hb5Gy0Fa"))
    }

    fn user() -> User {
        User {
            id: UserId::new(42),
            username: "seeker@ojasritu.co.in".to_string(),
            email: "seeker@ojasritu.co.in".to_string(),
            first_name: String::new(),
            last_name: String::new(),
            password_hash: Some("$argon2id$v=19$old".to_string()),
            is_staff: false,
            is_active: true,
            date_joined: Utc::now(),
            last_login: None,
        }
    }

    #[test]
    fn test_uid_roundtrip() {
        let uid = ResetTokenGenerator::encode_uid(UserId::new(42));
        assert_eq!(uid, "NDI");
        assert_eq!(ResetTokenGenerator::decode_uid(&uid), Some(UserId::new(42)));
        assert_eq!(ResetTokenGenerator::decode_uid("NDI="), Some(UserId::new(42)));
        assert_eq!(ResetTokenGenerator::decode_uid("not base64!"), None);
        assert_eq!(ResetTokenGenerator::decode_uid("YWJj"), None);
    }

    #[test]
    fn test_token_valid_until_expiry() {
        let tokens = generator();
        let now = Utc::now();
        let token = tokens.make_token(&user(), now).unwrap();

        assert!(tokens.check_token(&user(), &token, now));
        assert!(tokens.check_token(&user(), &token, now + Duration::days(2)));
        assert!(!tokens.check_token(&user(), &token, now + Duration::days(4)));
        assert!(!tokens.check_token(&user(), &token, now - Duration::hours(1)));
    }

    #[test]
    fn test_token_invalidated_by_password_change_and_login() {
        let tokens = generator();
        let now = Utc::now();
        let token = tokens.make_token(&user(), now).unwrap();

        let mut changed = user();
        changed.password_hash = Some("$argon2id$v=19$new".to_string());
        assert!(!tokens.check_token(&changed, &token, now));

        let mut logged_in = user();
        logged_in.last_login = Some(now);
        assert!(!tokens.check_token(&logged_in, &token, now));
    }

    #[test]
    fn test_token_rejects_garbage_and_other_secret() {
        let tokens = generator();
        let now = Utc::now();
        let token = tokens.make_token(&user(), now).unwrap();

        assert!(!tokens.check_token(&user(), "", now));
        assert!(!tokens.check_token(&user(), "abc", now));
        assert!(!tokens.check_token(&user(), "zz-nothex", now));

        let other = ResetTokenGenerator::new(SecretString::from("Qw8Er5Ty2Ui9Op4As7Df1Gh6Jk3Lz0Xc"));
        assert!(!other.check_token(&user(), &token, now));
    }

    #[test]
    fn test_base36() {
        assert_eq!(to_base36(0), "0");
        assert_eq!(to_base36(35), "z");
        assert_eq!(to_base36(36), "10");
        assert_eq!(from_base36(&to_base36(1_760_000_000)), Some(1_760_000_000));
    }
}
