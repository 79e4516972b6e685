//! Mock Twitter API client for testing
//!
//! Configure responses with the builder methods, then hand the mock to the
//! code under test and inspect [`CallCounts`] afterwards.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::Mutex;

use super::fixtures::UserBuilder;
use super::{PostedTweet, Tweet, TwitterApi, TwitterUser, WebhookRegistration};
use crate::error::{ApiError, Provider, Result};

/// Mock API client for testing.
///
/// # Example
/// ```ignore
/// let mock = MockTwitterClient::new()
///     .with_timeline("jack", fixtures::timeline("jack", 5))
///     .await;
///
/// let tweets = mock.get_user_timeline("jack", 5).await?;
/// assert_eq!(tweets.len(), 5);
/// ```
#[derive(Clone, Default)]
pub struct MockTwitterClient {
    /// Tweets returned from get_tweet, by id
    tweets: Arc<Mutex<HashMap<String, Tweet>>>,
    /// Users returned from get_user_by_username, by handle
    users: Arc<Mutex<HashMap<String, TwitterUser>>>,
    /// Timelines returned from get_user_timeline, by handle
    timelines: Arc<Mutex<HashMap<String, Vec<Tweet>>>>,
    /// Error to return on the next call, consumed on first use
    error: Arc<Mutex<Option<ApiError>>>,
    /// Handles whose timeline lookups always fail
    failing_users: Arc<Mutex<HashSet<String>>>,
    /// Rate limit after N total calls (simulates a 429)
    rate_limit_after: Arc<Mutex<Option<usize>>>,
    /// Track number of calls for verification
    call_count: Arc<Mutex<CallCounts>>,
    /// Posted tweets, in order
    posted: Arc<Mutex<Vec<(String, Option<String>)>>>,
}

/// Tracks API call counts for test verification
#[derive(Default, Debug, Clone)]
pub struct CallCounts {
    pub get_tweet: usize,
    pub get_user: usize,
    pub get_timeline: usize,
    pub post_tweet: usize,
    pub register_webhook: usize,
}

impl CallCounts {
    /// Get total number of API calls made.
    pub fn total(&self) -> usize {
        self.get_tweet + self.get_user + self.get_timeline + self.post_tweet + self.register_webhook
    }
}

impl MockTwitterClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn with_tweet(self, tweet: Tweet) -> Self {
        self.tweets.lock().await.insert(tweet.id.clone(), tweet);
        self
    }

    pub async fn with_user(self, user: TwitterUser) -> Self {
        self.users
            .lock()
            .await
            .insert(user.username.clone(), user);
        self
    }

    pub async fn with_timeline(self, username: &str, tweets: Vec<Tweet>) -> Self {
        self.timelines
            .lock()
            .await
            .insert(username.to_string(), tweets);
        self
    }

    /// Configure an error to return on the next API call.
    /// The error is consumed after one use.
    pub async fn with_error(self, error: ApiError) -> Self {
        *self.error.lock().await = Some(error);
        self
    }

    /// Same as [`MockTwitterClient::with_error`] on a shared handle
    pub async fn fail_next(&self, error: ApiError) {
        *self.error.lock().await = Some(error);
    }

    /// Make every timeline lookup for `username` fail
    pub async fn with_failing_user(self, username: &str) -> Self {
        self.failing_users
            .lock()
            .await
            .insert(username.to_string());
        self
    }

    /// After the threshold is reached, all calls return RateLimited.
    pub async fn rate_limit_after(self, calls: usize) -> Self {
        *self.rate_limit_after.lock().await = Some(calls);
        self
    }

    pub async fn call_counts(&self) -> CallCounts {
        self.call_count.lock().await.clone()
    }

    /// Tweets posted so far as `(text, reply_to)`
    pub async fn posted(&self) -> Vec<(String, Option<String>)> {
        self.posted.lock().await.clone()
    }

    async fn check_error(&self) -> Result<()> {
        {
            let mut error = self.error.lock().await;
            if let Some(e) = error.take() {
                return Err(e.into());
            }
        }

        {
            let rate_limit = self.rate_limit_after.lock().await;
            if let Some(threshold) = *rate_limit {
                let counts = self.call_count.lock().await;
                if counts.total() >= threshold {
                    return Err(ApiError::RateLimited {
                        provider: Provider::Twitter,
                        reset_at: None,
                    }
                    .into());
                }
            }
        }

        Ok(())
    }
}

#[async_trait]
impl TwitterApi for MockTwitterClient {
    async fn get_tweet(&self, id: &str) -> Result<Tweet> {
        self.check_error().await?;
        self.call_count.lock().await.get_tweet += 1;

        self.tweets
            .lock()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(format!("Tweet {}", id)).into())
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<TwitterUser>> {
        self.check_error().await?;
        self.call_count.lock().await.get_user += 1;

        if let Some(user) = self.users.lock().await.get(username) {
            return Ok(Some(user.clone()));
        }

        // Handles with a configured timeline resolve without an explicit user
        let known = self.timelines.lock().await.contains_key(username)
            || self.failing_users.lock().await.contains(username);
        Ok(known.then(|| UserBuilder::new(username).build()))
    }

    async fn get_user_timeline(&self, username: &str, count: usize) -> Result<Vec<Tweet>> {
        self.check_error().await?;
        self.call_count.lock().await.get_timeline += 1;

        if self.failing_users.lock().await.contains(username) {
            return Err(ApiError::Network(format!("timeline for @{} unavailable", username)).into());
        }

        let timelines = self.timelines.lock().await;
        let tweets = timelines
            .get(username)
            .ok_or_else(|| ApiError::NotFound(format!("Twitter user @{}", username)))?;
        Ok(tweets.iter().take(count).cloned().collect())
    }

    async fn post_tweet(&self, text: &str, reply_to: Option<&str>) -> Result<PostedTweet> {
        self.check_error().await?;
        let mut counts = self.call_count.lock().await;
        counts.post_tweet += 1;

        self.posted
            .lock()
            .await
            .push((text.to_string(), reply_to.map(str::to_string)));

        Ok(PostedTweet {
            id: format!("posted-{}", counts.post_tweet),
            text: text.to_string(),
        })
    }

    async fn register_webhook(&self, url: &str) -> Result<WebhookRegistration> {
        self.check_error().await?;
        self.call_count.lock().await.register_webhook += 1;

        Ok(WebhookRegistration {
            id: "webhook-1".to_string(),
            url: url.to_string(),
            valid: true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::fixtures::{TweetBuilder, timeline};
    use crate::error::Error;

    #[tokio::test]
    async fn test_returns_configured_tweet() {
        let mock = MockTwitterClient::new()
            .with_tweet(TweetBuilder::new("7").text("seven").build())
            .await;

        let tweet = mock.get_tweet("7").await.unwrap();
        assert_eq!(tweet.text, "seven");
        assert_eq!(mock.call_counts().await.get_tweet, 1);
    }

    #[tokio::test]
    async fn test_one_shot_error_consumed() {
        let mock = MockTwitterClient::new()
            .with_timeline("jack", timeline("jack", 2))
            .await
            .with_error(ApiError::Unauthorized {
                provider: Provider::Twitter,
            })
            .await;

        let first = mock.get_user_timeline("jack", 2).await;
        assert!(matches!(first, Err(Error::Api(ApiError::Unauthorized { .. }))));
        assert_eq!(mock.get_user_timeline("jack", 2).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_rate_limit_after_threshold() {
        let mock = MockTwitterClient::new()
            .with_timeline("jack", timeline("jack", 2))
            .await
            .rate_limit_after(1)
            .await;

        assert!(mock.get_user_timeline("jack", 2).await.is_ok());
        let err = mock.get_user_timeline("jack", 2).await.unwrap_err();
        assert!(err.is_rate_limit());
    }

    #[tokio::test]
    async fn test_timeline_handles_resolve_to_users() {
        let mock = MockTwitterClient::new()
            .with_timeline("jack", timeline("jack", 2))
            .await;

        let user = mock.get_user_by_username("jack").await.unwrap().unwrap();
        assert_eq!(user.id, "id-jack");
        assert_eq!(mock.get_user_tweets(&user, 5).await.unwrap().len(), 2);
        assert!(mock.get_user_by_username("nobody").await.unwrap().is_none());
    }
}
