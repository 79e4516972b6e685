//! Error types for DraftGod

use reqwest::StatusCode;
use reqwest::header::HeaderMap;
use std::fmt;
use thiserror::Error;

/// Result type alias for DraftGod operations
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type for the application
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Interactive prompt error: {0}")]
    Dialoguer(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Operation failed: {0}")]
    Other(String),
}

impl From<dialoguer::Error> for Error {
    fn from(err: dialoguer::Error) -> Self {
        Error::Dialoguer(err.to_string())
    }
}

impl Error {
    /// The provider error inside, if this is one.
    pub fn as_api(&self) -> Option<&ApiError> {
        match self {
            Error::Api(err) => Some(err),
            _ => None,
        }
    }

    /// True when the provider rejected the call because of a rate limit.
    pub fn is_rate_limit(&self) -> bool {
        self.as_api().is_some_and(ApiError::is_rate_limit)
    }

    /// True when the provider reported a transient overload.
    pub fn is_overloaded(&self) -> bool {
        self.as_api().is_some_and(ApiError::is_overloaded)
    }

    /// HTTP status this error maps to at the route-handler edge.
    pub fn status_code(&self) -> u16 {
        match self {
            Error::Api(err) => err.status_code(),
            Error::Json(_) => 400,
            _ => 500,
        }
    }
}

/// Upstream service an [`ApiError`] came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Twitter,
    Anthropic,
}

impl Provider {
    pub fn name(self) -> &'static str {
        match self {
            Provider::Twitter => "Twitter",
            Provider::Anthropic => "Anthropic",
        }
    }

    /// Credential a user should check when this provider rejects them
    pub fn credential_hint(self) -> &'static str {
        match self {
            Provider::Twitter => "your Twitter API keys (TWITTER_BEARER_TOKEN)",
            Provider::Anthropic => "ANTHROPIC_API_KEY",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Provider errors, normalized at the call boundary.
///
/// Every non-success response from Twitter or Anthropic is turned into one of
/// these variants by [`ApiError::from_response`], so callers branch on the
/// variant instead of the provider's native error shape.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(
        "{provider} authentication failed. Check {} or run `draftgod init`.",
        .provider.credential_hint()
    )]
    Unauthorized { provider: Provider },

    #[error("Access denied. The configured credentials lack permission for this action.")]
    Forbidden,

    #[error("{}", rate_limit_message(.provider, .reset_at))]
    RateLimited {
        provider: Provider,
        reset_at: Option<i64>,
    },

    #[error("Provider overloaded")]
    Overloaded,

    #[error("Service temporarily unavailable after {attempts} attempts. Please try again in a few moments.")]
    ServiceUnavailable { attempts: u32 },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid API response: {0}")]
    InvalidResponse(String),

    #[error("Provider error {code}: {detail}")]
    Unknown { code: u16, detail: serde_json::Value },
}

fn rate_limit_message(provider: &Provider, reset_at: &Option<i64>) -> String {
    match reset_at.and_then(|ts| chrono::DateTime::from_timestamp(ts, 0)) {
        Some(reset) => format!(
            "{} API rate limit exceeded. Try again after {}.",
            provider,
            reset.with_timezone(&chrono::Local).format("%H:%M:%S")
        ),
        None => format!("{} API rate limit exceeded. Try again later.", provider),
    }
}

impl ApiError {
    /// Normalize a non-success response from `provider`.
    pub fn from_response(
        provider: Provider,
        status: StatusCode,
        headers: &HeaderMap,
        body: &[u8],
    ) -> Self {
        let detail: serde_json::Value = serde_json::from_slice(body).unwrap_or_else(|_| {
            serde_json::Value::String(String::from_utf8_lossy(body).into_owned())
        });

        if is_overload_body(&detail) {
            return ApiError::Overloaded;
        }

        match status.as_u16() {
            401 => ApiError::Unauthorized { provider },
            403 => ApiError::Forbidden,
            404 => ApiError::NotFound(error_message(&detail)),
            429 => ApiError::RateLimited {
                provider,
                reset_at: rate_limit_reset(headers),
            },
            400 | 422 => ApiError::BadRequest(error_message(&detail)),
            503 | 529 => ApiError::Overloaded,
            code => ApiError::Unknown { code, detail },
        }
    }

    pub fn is_rate_limit(&self) -> bool {
        matches!(self, ApiError::RateLimited { .. })
    }

    pub fn is_overloaded(&self) -> bool {
        matches!(self, ApiError::Overloaded)
    }

    /// HTTP status this error maps to at the route-handler edge.
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::Unauthorized { .. } => 401,
            ApiError::Forbidden => 403,
            ApiError::RateLimited { .. } => 429,
            ApiError::Overloaded | ApiError::ServiceUnavailable { .. } => 503,
            ApiError::NotFound(_) => 404,
            ApiError::BadRequest(_) => 400,
            ApiError::Network(_) | ApiError::InvalidResponse(_) => 502,
            ApiError::Unknown { code, .. } if *code >= 400 && *code < 600 => *code,
            ApiError::Unknown { .. } => 500,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Network("Request timed out".to_string())
        } else if err.is_connect() {
            ApiError::Network("Failed to connect to API".to_string())
        } else {
            ApiError::Network(err.to_string())
        }
    }
}

/// Read Twitter's `x-rate-limit-reset` header (epoch seconds).
pub fn rate_limit_reset(headers: &HeaderMap) -> Option<i64> {
    headers
        .get("x-rate-limit-reset")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<i64>().ok())
}

fn is_overload_body(detail: &serde_json::Value) -> bool {
    detail
        .pointer("/error/type")
        .and_then(|v| v.as_str())
        .is_some_and(|t| t == "overloaded_error")
}

/// Pull a human-readable message out of a Twitter or Anthropic error body.
fn error_message(detail: &serde_json::Value) -> String {
    let candidates = [
        "/detail",
        "/errors/0/detail",
        "/errors/0/message",
        "/error/message",
        "/title",
    ];
    candidates
        .iter()
        .find_map(|p| detail.pointer(p).and_then(|v| v.as_str()))
        .map(str::to_string)
        .or_else(|| detail.as_str().map(str::to_string))
        .unwrap_or_else(|| detail.to_string())
}

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found. Run `draftgod init` to set up.")]
    NotFound,

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to save configuration: {0}")]
    SaveError(String),

    #[error("{0} is required but not configured")]
    Missing(&'static str),
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(err: serde_yaml::Error) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}

/// Durable cache errors
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Cache I/O error: {0}")]
    Io(String),

    #[error("Could not determine cache directory")]
    NoHome,

    #[error("Cache serialization error: {0}")]
    Serialization(String),
}
