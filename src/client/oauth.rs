//! OAuth 1.0a request signing for user-context Twitter calls (posting).

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use hmac::{Hmac, Mac};
use sha1::Sha1;

use crate::config::OAuthCredentials;
use crate::error::{Error, Result};

/// Builds `Authorization: OAuth ...` header values.
pub struct OAuthSigner {
    credentials: OAuthCredentials,
}

impl std::fmt::Debug for OAuthSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthSigner")
            .field("consumer_key", &self.credentials.consumer_key)
            .field("secrets", &"[REDACTED]")
            .finish()
    }
}

impl OAuthSigner {
    pub fn new(credentials: OAuthCredentials) -> Self {
        Self { credentials }
    }

    /// Header for a request at the current time with a fresh nonce.
    ///
    /// `url` excludes the query string; query parameters go in `params`.
    /// JSON bodies are not part of the signature.
    pub fn authorization(
        &self,
        method: &str,
        url: &str,
        params: &[(String, String)],
    ) -> Result<String> {
        let timestamp = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map_err(|e| Error::Other(format!("System clock before epoch: {}", e)))?
            .as_secs();
        let nonce = uuid::Uuid::new_v4().simple().to_string();
        Ok(self.authorization_with(method, url, params, timestamp, &nonce))
    }

    /// Deterministic variant of [`OAuthSigner::authorization`].
    pub fn authorization_with(
        &self,
        method: &str,
        url: &str,
        params: &[(String, String)],
        timestamp: u64,
        nonce: &str,
    ) -> String {
        let oauth_params = vec![
            (
                "oauth_consumer_key".to_string(),
                self.credentials.consumer_key.clone(),
            ),
            ("oauth_nonce".to_string(), nonce.to_string()),
            (
                "oauth_signature_method".to_string(),
                "HMAC-SHA1".to_string(),
            ),
            ("oauth_timestamp".to_string(), timestamp.to_string()),
            (
                "oauth_token".to_string(),
                self.credentials.access_token.clone(),
            ),
            ("oauth_version".to_string(), "1.0".to_string()),
        ];

        let signature = self.signature(method, url, &oauth_params, params);

        let mut header_params = oauth_params;
        header_params.push(("oauth_signature".to_string(), signature));
        header_params.sort();

        let fields = header_params
            .iter()
            .map(|(k, v)| format!("{}=\"{}\"", encode(k), encode(v)))
            .collect::<Vec<_>>()
            .join(", ");

        format!("OAuth {}", fields)
    }

    fn signature(
        &self,
        method: &str,
        url: &str,
        oauth_params: &[(String, String)],
        params: &[(String, String)],
    ) -> String {
        let mut all: Vec<(String, String)> = oauth_params
            .iter()
            .chain(params.iter())
            .map(|(k, v)| (encode(k), encode(v)))
            .collect();
        all.sort();

        let param_string = all
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("&");

        let base = format!(
            "{}&{}&{}",
            method.to_uppercase(),
            encode(url),
            encode(&param_string)
        );
        let key = format!(
            "{}&{}",
            encode(&self.credentials.consumer_secret),
            encode(&self.credentials.access_secret)
        );

        let mut mac = match Hmac::<Sha1>::new_from_slice(key.as_bytes()) {
            Ok(mac) => mac,
            // HMAC accepts keys of any length
            Err(_) => return String::new(),
        };
        mac.update(base.as_bytes());
        BASE64.encode(mac.finalize().into_bytes())
    }
}

/// RFC 3986 percent-encoding
fn encode(s: &str) -> String {
    urlencoding::encode(s).into_owned()
}
