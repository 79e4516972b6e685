//! Twitter API access
//!
//! The [`TwitterApi`] trait is the seam between the access layer and the
//! provider. [`TwitterClient`] talks to the real v2 API, [`CannedTwitterClient`]
//! serves fixed data in mock mode.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;

pub mod canned;
#[cfg(test)]
pub mod fixtures;
#[cfg(test)]
pub mod mock;
pub mod oauth;
pub mod queue;
pub mod rate_limit;
pub mod twitter;

pub use canned::CannedTwitterClient;
#[cfg(test)]
pub use mock::MockTwitterClient;
pub use queue::RequestQueue;
pub use rate_limit::{Endpoint, RateLimitTracker};
pub use twitter::TwitterClient;

/// Twitter API operations used by DraftGod
#[async_trait]
pub trait TwitterApi: Send + Sync {
    /// Look up a single tweet by id
    async fn get_tweet(&self, id: &str) -> Result<Tweet>;

    /// Look up a user by handle. `None` when the account does not exist.
    async fn get_user_by_username(&self, username: &str) -> Result<Option<TwitterUser>>;

    /// Most recent tweets of a user, newest first
    async fn get_user_timeline(&self, username: &str, count: usize) -> Result<Vec<Tweet>>;

    /// Timeline of an already resolved user. Clients that can address a user
    /// by id skip the handle lookup here.
    async fn get_user_tweets(&self, user: &TwitterUser, count: usize) -> Result<Vec<Tweet>> {
        self.get_user_timeline(&user.username, count).await
    }

    /// Post a tweet, optionally as a reply
    async fn post_tweet(&self, text: &str, reply_to: Option<&str>) -> Result<PostedTweet>;

    /// Register a webhook URL and subscribe it to tweet-create events
    async fn register_webhook(&self, url: &str) -> Result<WebhookRegistration>;
}

#[async_trait]
impl<T: TwitterApi + ?Sized> TwitterApi for std::sync::Arc<T> {
    async fn get_tweet(&self, id: &str) -> Result<Tweet> {
        (**self).get_tweet(id).await
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<TwitterUser>> {
        (**self).get_user_by_username(username).await
    }

    async fn get_user_timeline(&self, username: &str, count: usize) -> Result<Vec<Tweet>> {
        (**self).get_user_timeline(username, count).await
    }

    async fn get_user_tweets(&self, user: &TwitterUser, count: usize) -> Result<Vec<Tweet>> {
        (**self).get_user_tweets(user, count).await
    }

    async fn post_tweet(&self, text: &str, reply_to: Option<&str>) -> Result<PostedTweet> {
        (**self).post_tweet(text, reply_to).await
    }

    async fn register_webhook(&self, url: &str) -> Result<WebhookRegistration> {
        (**self).register_webhook(url).await
    }
}

/// A tweet as returned by the provider. Immutable once fetched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tweet {
    pub id: String,

    pub text: String,

    #[serde(default)]
    pub author_id: String,

    pub created_at: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_metrics: Option<PublicMetrics>,
}

impl Tweet {
    /// Likes plus retweets, used to rank style examples
    pub fn engagement(&self) -> u64 {
        self.public_metrics
            .as_ref()
            .map(|m| m.like_count + m.retweet_count)
            .unwrap_or(0)
    }
}

/// Engagement counters on a tweet
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PublicMetrics {
    #[serde(default)]
    pub like_count: u64,

    #[serde(default)]
    pub retweet_count: u64,

    #[serde(default)]
    pub reply_count: u64,

    #[serde(default)]
    pub quote_count: u64,
}

/// Twitter account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TwitterUser {
    pub id: String,

    pub name: String,

    pub username: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_image_url: Option<String>,
}

/// Result of a successful post
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostedTweet {
    pub id: String,

    pub text: String,
}

/// Registered webhook
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookRegistration {
    pub id: String,

    pub url: String,

    #[serde(default)]
    pub valid: bool,
}
