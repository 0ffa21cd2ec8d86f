//! Webhook signature verification.
//!
//! The gateway signs the raw request body with HMAC-SHA256 keyed by the
//! merchant secret. The digest may arrive base64- or hex-encoded.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Check `signature` against HMAC-SHA256(`secret`, `body`).
///
/// The comparison is constant-time. Empty signatures never verify.
#[must_use]
pub fn verify_signature(secret: &[u8], body: &[u8], signature: &str) -> bool {
    let signature = signature.trim();
    if signature.is_empty() {
        return false;
    }

    let candidates = [STANDARD.decode(signature).ok(), hex::decode(signature).ok()];

    candidates.into_iter().flatten().any(|digest| {
        let Ok(mut mac) = HmacSha256::new_from_slice(secret) else {
            return false;
        };
        mac.update(body);
        mac.verify_slice(&digest).is_ok()
    })
}

/// Base64 HMAC-SHA256 of `body`, as the gateway sends it.
#[must_use]
pub fn sign_base64(secret: &[u8], body: &[u8]) -> String {
    STANDARD.encode(digest(secret, body))
}

/// Hex HMAC-SHA256 of `body`.
#[must_use]
pub fn sign_hex(secret: &[u8], body: &[u8]) -> String {
    hex::encode(digest(secret, body))
}

fn digest(secret: &[u8], body: &[u8]) -> Vec<u8> {
    let Ok(mut mac) = HmacSha256::new_from_slice(secret) else {
        return Vec::new();
    };
    mac.update(body);
    mac.finalize().into_bytes().to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"cf_test_secret_key";
    const BODY: &[u8] = br#"{"order_id":"CF-0011223344556677","payment_status":"SUCCESS"}"#;

    #[test]
    fn test_verifies_both_encodings() {
        assert!(verify_signature(SECRET, BODY, &sign_base64(SECRET, BODY)));
        assert!(verify_signature(SECRET, BODY, &sign_hex(SECRET, BODY)));
        assert!(verify_signature(SECRET, BODY, &sign_hex(SECRET, BODY).to_uppercase()));
    }

    #[test]
    fn test_any_single_bit_flip_fails() {
        let sig_b64 = sign_base64(SECRET, BODY);
        let sig_hex = sign_hex(SECRET, BODY);

        for byte in 0..BODY.len() {
            for bit in 0..8 {
                let mut mutated = BODY.to_vec();
                mutated[byte] ^= 1 << bit;
                assert!(!verify_signature(SECRET, &mutated, &sig_b64));
                assert!(!verify_signature(SECRET, &mutated, &sig_hex));
            }
        }
    }

    #[test]
    fn test_rejects_empty_wrong_secret_and_garbage() {
        assert!(!verify_signature(SECRET, BODY, ""));
        assert!(!verify_signature(SECRET, BODY, "   "));
        assert!(!verify_signature(SECRET, BODY, "not a signature"));
        assert!(!verify_signature(b"other", BODY, &sign_base64(SECRET, BODY)));
        // A truncated digest is not a match
        let sig = sign_hex(SECRET, BODY);
        assert!(!verify_signature(SECRET, BODY, &sig[..32]));
    }
}
