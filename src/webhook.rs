//! Twitter webhook CRC challenge and signature verification
//!
//! Both operations sign with HMAC-SHA256 under the consumer secret and render
//! the digest as `sha256=<base64>`. Signatures cover the raw request body only.

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::{ConfigError, Result};

const SIGNATURE_PREFIX: &str = "sha256=";

/// Header carrying the body signature on webhook POSTs
pub const SIGNATURE_HEADER: &str = "x-twitter-webhooks-signature";

/// Header name used by older account-activity deliveries
pub const LEGACY_SIGNATURE_HEADER: &str = "x-twitter-signature";

/// Stateless verifier bound to one signing secret.
#[derive(Clone)]
pub struct WebhookVerifier {
    secret: Vec<u8>,
}

impl std::fmt::Debug for WebhookVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookVerifier")
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

impl WebhookVerifier {
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        Self {
            secret: secret.as_ref().to_vec(),
        }
    }

    /// `sha256=` + base64 HMAC of `payload`. `None` without a secret.
    fn sign(&self, payload: &[u8]) -> Option<String> {
        if self.secret.is_empty() {
            return None;
        }
        let mut mac = Hmac::<Sha256>::new_from_slice(&self.secret).ok()?;
        mac.update(payload);
        Some(format!(
            "{}{}",
            SIGNATURE_PREFIX,
            BASE64.encode(mac.finalize().into_bytes())
        ))
    }

    /// Response token for a CRC challenge.
    ///
    /// Fails when the token or the secret is empty.
    pub fn handle_challenge(&self, crc_token: &str) -> Result<String> {
        if crc_token.is_empty() {
            return Err(ConfigError::Invalid("Empty crc_token".to_string()).into());
        }
        self.sign(crc_token.as_bytes())
            .ok_or_else(|| ConfigError::Missing("TWITTER_CONSUMER_SECRET").into())
    }

    /// Whether `signature` is the expected signature of `raw_body`.
    ///
    /// A missing header or secret is a mismatch. Compared in constant time.
    pub fn verify_signature(&self, signature: Option<&str>, raw_body: &[u8]) -> bool {
        let Some(signature) = signature.map(str::trim).filter(|s| !s.is_empty()) else {
            return false;
        };
        let Some(expected) = self.sign(raw_body) else {
            return false;
        };
        constant_time_eq(expected.as_bytes(), signature.as_bytes())
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
