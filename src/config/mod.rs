//! Configuration management for DraftGod
//!
//! Settings live in `~/.draftgod/config.yaml` and can be overridden from the
//! process environment using the same variable names the web app uses.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::drafts::UserPreferences;
use crate::error::{ConfigError, Result};

pub const DEFAULT_API_HOST: &str = "https://api.twitter.com";
pub const DEFAULT_ANTHROPIC_HOST: &str = "https://api.anthropic.com";
pub const DEFAULT_MODEL: &str = "claude-3-sonnet-20240229";

/// Whether provider calls go to the real APIs or to canned responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderMode {
    Live,
    #[default]
    Mock,
}

impl ProviderMode {
    pub fn is_mock(self) -> bool {
        self == ProviderMode::Mock
    }
}

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Twitter credentials
    #[serde(default)]
    pub twitter: TwitterCredentials,

    /// Anthropic API key for draft generation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anthropic_api_key: Option<String>,

    /// Live or mock provider behavior
    #[serde(default)]
    pub mode: ProviderMode,

    /// Tunables
    #[serde(default)]
    pub preferences: Preferences,

    /// Users seeded into the in-process preference store
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub users: Vec<UserPreferences>,
}

/// Twitter key material. Values are opaque to the access layer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TwitterCredentials {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_secret: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_secret: Option<String>,

    /// App-only bearer token for read calls
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bearer_token: Option<String>,

    /// Webhook signing secret (the app's consumer secret)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub webhook_secret: Option<String>,
}

/// OAuth 1.0a user-context credentials used for posting.
#[derive(Debug, Clone)]
pub struct OAuthCredentials {
    pub consumer_key: String,
    pub consumer_secret: String,
    pub access_token: String,
    pub access_secret: String,
}

/// Tunables with sensible defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Preferences {
    #[serde(default = "default_api_host")]
    pub api_host: String,

    #[serde(default = "default_anthropic_host")]
    pub anthropic_host: String,

    #[serde(default = "default_model")]
    pub model: String,

    /// Number of drafts produced per tweet on the generate path
    #[serde(default = "default_drafts_per_tweet")]
    pub drafts_per_tweet: usize,

    /// Minimum gap between queued Twitter requests
    #[serde(default = "default_request_interval_ms")]
    pub request_interval_ms: u64,

    /// Freshness window for cached user timelines
    #[serde(default = "default_timeline_ttl_hours")]
    pub timeline_ttl_hours: u64,
}

fn default_api_host() -> String {
    DEFAULT_API_HOST.to_string()
}

fn default_anthropic_host() -> String {
    DEFAULT_ANTHROPIC_HOST.to_string()
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_drafts_per_tweet() -> usize {
    3
}

fn default_request_interval_ms() -> u64 {
    crate::client::queue::DEFAULT_REQUEST_INTERVAL.as_millis() as u64
}

fn default_timeline_ttl_hours() -> u64 {
    crate::cache::DEFAULT_TIMELINE_TTL_HOURS
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            api_host: default_api_host(),
            anthropic_host: default_anthropic_host(),
            model: default_model(),
            drafts_per_tweet: default_drafts_per_tweet(),
            request_interval_ms: default_request_interval_ms(),
            timeline_ttl_hours: default_timeline_ttl_hours(),
        }
    }
}

impl Config {
    /// Get the default config file path
    pub fn default_path() -> Result<PathBuf> {
        let home = dirs::home_dir().ok_or(ConfigError::Invalid(
            "Could not determine home directory".to_string(),
        ))?;

        Ok(home.join(".draftgod").join("config.yaml"))
    }

    /// Resolve an optional override path to the file actually used
    pub fn resolve_path(path: Option<&str>) -> Result<PathBuf> {
        match path {
            Some(p) => Ok(PathBuf::from(p)),
            None => Self::default_path(),
        }
    }

    /// Load configuration from a path (or the default location) and apply
    /// environment overrides. A missing file is not an error here: a fully
    /// env-configured deployment needs no file.
    pub fn load_at(path: Option<&str>) -> Result<Self> {
        let path = Self::resolve_path(path)?;
        let mut config = if path.exists() {
            Self::load_from(path)?
        } else {
            Self::default()
        };
        config.apply_env(|name| std::env::var(name).ok());
        Ok(config)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: PathBuf) -> Result<Self> {
        if !path.exists() {
            return Err(ConfigError::NotFound.into());
        }

        let contents = std::fs::read_to_string(&path)?;
        let config: Config = serde_yaml::from_str(&contents).map_err(ConfigError::from)?;

        Ok(config)
    }

    /// Save configuration to a path (or the default location)
    pub fn save_at(&self, path: Option<&str>) -> Result<()> {
        self.save_to(Self::resolve_path(path)?)
    }

    /// Save configuration to a specific path
    pub fn save_to(&self, path: PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents =
            serde_yaml::to_string(self).map_err(|e| ConfigError::SaveError(e.to_string()))?;

        std::fs::write(&path, contents)?;

        // Credentials: owner read/write only
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = std::fs::metadata(&path)?.permissions();
            perms.set_mode(0o600);
            std::fs::set_permissions(&path, perms)?;
        }

        Ok(())
    }

    /// Overlay values from the environment. `lookup` is `std::env::var` in
    /// production and a map in tests.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let creds = &mut self.twitter;
        if let Some(v) = non_empty("TWITTER_API_KEY") {
            creds.api_key = Some(v);
        }
        if let Some(v) = non_empty("TWITTER_API_SECRET") {
            creds.api_secret = Some(v);
        }
        if let Some(v) = non_empty("TWITTER_ACCESS_TOKEN") {
            creds.access_token = Some(v);
        }
        if let Some(v) = non_empty("TWITTER_ACCESS_SECRET") {
            creds.access_secret = Some(v);
        }
        if let Some(v) =
            non_empty("TWITTER_BEARER_TOKEN").or_else(|| non_empty("NEXT_PUBLIC_TWITTER_BEARER_TOKEN"))
        {
            creds.bearer_token = Some(v);
        }
        if let Some(v) = non_empty("TWITTER_CONSUMER_SECRET") {
            creds.webhook_secret = Some(v);
        }
        if let Some(v) = non_empty("ANTHROPIC_API_KEY") {
            self.anthropic_api_key = Some(v);
        }

        // MOCK_TWITTER_API defaults to mock unless explicitly "false";
        // FORCE_REAL_API=true wins over everything.
        if let Some(v) = lookup("MOCK_TWITTER_API") {
            self.mode = if v == "false" {
                ProviderMode::Live
            } else {
                ProviderMode::Mock
            };
        }
        if lookup("FORCE_REAL_API").as_deref() == Some("true") {
            self.mode = ProviderMode::Live;
        }
    }

    pub fn require_bearer_token(&self) -> Result<&str> {
        self.twitter
            .bearer_token
            .as_deref()
            .ok_or_else(|| ConfigError::Missing("TWITTER_BEARER_TOKEN").into())
    }

    pub fn require_webhook_secret(&self) -> Result<&str> {
        self.twitter
            .webhook_secret
            .as_deref()
            .ok_or_else(|| ConfigError::Missing("TWITTER_CONSUMER_SECRET").into())
    }

    pub fn require_anthropic_key(&self) -> Result<&str> {
        self.anthropic_api_key
            .as_deref()
            .ok_or_else(|| ConfigError::Missing("ANTHROPIC_API_KEY").into())
    }

    pub fn require_oauth_credentials(&self) -> Result<OAuthCredentials> {
        let t = &self.twitter;
        Ok(OAuthCredentials {
            consumer_key: t
                .api_key
                .clone()
                .ok_or(ConfigError::Missing("TWITTER_API_KEY"))?,
            consumer_secret: t
                .api_secret
                .clone()
                .ok_or(ConfigError::Missing("TWITTER_API_SECRET"))?,
            access_token: t
                .access_token
                .clone()
                .ok_or(ConfigError::Missing("TWITTER_ACCESS_TOKEN"))?,
            access_secret: t
                .access_secret
                .clone()
                .ok_or(ConfigError::Missing("TWITTER_ACCESS_SECRET"))?,
        })
    }

    pub fn request_interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.preferences.request_interval_ms)
    }

    pub fn timeline_ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(self.preferences.timeline_ttl_hours as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.twitter.bearer_token.is_none());
        assert_eq!(config.mode, ProviderMode::Mock);
        assert_eq!(config.preferences.drafts_per_tweet, 3);
        assert_eq!(config.preferences.request_interval_ms, 1000);
        assert_eq!(config.timeline_ttl(), chrono::Duration::hours(24));
    }

    #[test]
    fn test_env_overrides_credentials() {
        let mut config = Config::default();
        config.apply_env(env(&[
            ("TWITTER_API_KEY", "ck"),
            ("TWITTER_API_SECRET", "cs"),
            ("TWITTER_ACCESS_TOKEN", "at"),
            ("TWITTER_ACCESS_SECRET", "as"),
            ("NEXT_PUBLIC_TWITTER_BEARER_TOKEN", "bearer"),
            ("TWITTER_CONSUMER_SECRET", "s3cret"),
        ]));

        assert_eq!(config.require_bearer_token().unwrap(), "bearer");
        assert_eq!(config.require_webhook_secret().unwrap(), "s3cret");
        let oauth = config.require_oauth_credentials().unwrap();
        assert_eq!(oauth.consumer_key, "ck");
        assert_eq!(oauth.access_secret, "as");
    }

    #[test]
    fn test_mode_selection() {
        let mut config = Config::default();
        config.apply_env(env(&[("MOCK_TWITTER_API", "false")]));
        assert_eq!(config.mode, ProviderMode::Live);

        config.apply_env(env(&[("MOCK_TWITTER_API", "true")]));
        assert_eq!(config.mode, ProviderMode::Mock);

        config.apply_env(env(&[("MOCK_TWITTER_API", "true"), ("FORCE_REAL_API", "true")]));
        assert_eq!(config.mode, ProviderMode::Live);
    }

    #[test]
    fn test_missing_settings_fail_fast() {
        let config = Config::default();
        let err = config.require_webhook_secret().unwrap_err();
        assert!(err.to_string().contains("TWITTER_CONSUMER_SECRET"));

        let err = config.require_oauth_credentials().unwrap_err();
        assert!(err.to_string().contains("TWITTER_API_KEY"));
    }

    #[test]
    fn test_blank_env_values_ignored() {
        let mut config = Config::default();
        config.twitter.bearer_token = Some("from-file".to_string());
        config.apply_env(env(&[("TWITTER_BEARER_TOKEN", "  ")]));
        assert_eq!(config.require_bearer_token().unwrap(), "from-file");
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.yaml");

        let mut config = Config::default();
        config.twitter.bearer_token = Some("bearer".to_string());
        config.mode = ProviderMode::Live;
        config.save_to(path.clone()).unwrap();

        let loaded = Config::load_from(path).unwrap();
        assert_eq!(loaded.twitter.bearer_token.as_deref(), Some("bearer"));
        assert_eq!(loaded.mode, ProviderMode::Live);
        assert_eq!(loaded.preferences.api_host, DEFAULT_API_HOST);
    }

    #[test]
    fn test_load_from_missing_file() {
        let dir = tempdir().unwrap();
        let err = Config::load_from(dir.path().join("nope.yaml")).unwrap_err();
        assert!(err.to_string().contains("draftgod init"));
    }

    #[test]
    fn test_users_section() {
        let yaml = "users:\n  - user_id: u1\n    monitored_accounts: [\"@jack\"]\n    custom_instructions: Be brief.\n";
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.users.len(), 1);
        assert!(config.users[0].monitors("JACK"));
        assert!(config.users[0].style_accounts.is_empty());
        assert_eq!(config.preferences.drafts_per_tweet, 3);
    }
}
