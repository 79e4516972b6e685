//! Fixed provider responses for mock mode
//!
//! Used when the process runs with `MOCK_TWITTER_API` unset (or anything but
//! `false`), or when a single request asks for mock data.

use async_trait::async_trait;
use chrono::Utc;

use super::{PostedTweet, PublicMetrics, Tweet, TwitterApi, TwitterUser, WebhookRegistration};
use crate::error::Result;

pub const MOCK_TWEET_ID: &str = "1234567890";
pub const MOCK_TWEET_TEXT: &str = "This is a mock tweet for testing purposes. The Twitter API has strict rate limits, so we use this for development.";
pub const MOCK_AUTHOR_ID: &str = "12345";

/// Offline stand-in for the Twitter API.
#[derive(Debug, Default, Clone, Copy)]
pub struct CannedTwitterClient;

impl CannedTwitterClient {
    pub fn new() -> Self {
        Self
    }

    pub fn mock_tweet() -> Tweet {
        Tweet {
            id: MOCK_TWEET_ID.to_string(),
            text: MOCK_TWEET_TEXT.to_string(),
            author_id: MOCK_AUTHOR_ID.to_string(),
            created_at: Utc::now(),
            public_metrics: Some(PublicMetrics::default()),
        }
    }
}

#[async_trait]
impl TwitterApi for CannedTwitterClient {
    async fn get_tweet(&self, id: &str) -> Result<Tweet> {
        Ok(Tweet {
            id: id.to_string(),
            ..Self::mock_tweet()
        })
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<TwitterUser>> {
        Ok(Some(TwitterUser {
            id: MOCK_AUTHOR_ID.to_string(),
            name: format!("Mock {}", username),
            username: username.to_string(),
            description: Some("Mock account".to_string()),
            profile_image_url: None,
        }))
    }

    async fn get_user_timeline(&self, username: &str, count: usize) -> Result<Vec<Tweet>> {
        let now = Utc::now();
        Ok((0..count.min(5))
            .map(|i| Tweet {
                id: format!("{}{}", MOCK_TWEET_ID, i),
                text: format!("Mock tweet #{} from @{}", i + 1, username),
                author_id: MOCK_AUTHOR_ID.to_string(),
                created_at: now - chrono::Duration::minutes(i as i64 * 30),
                public_metrics: Some(PublicMetrics {
                    like_count: (5 - i as u64) * 10,
                    retweet_count: 5 - i as u64,
                    ..Default::default()
                }),
            })
            .collect())
    }

    async fn post_tweet(&self, text: &str, _reply_to: Option<&str>) -> Result<PostedTweet> {
        Ok(PostedTweet {
            id: format!("mock-{}", uuid::Uuid::new_v4().simple()),
            text: text.to_string(),
        })
    }

    async fn register_webhook(&self, url: &str) -> Result<WebhookRegistration> {
        Ok(WebhookRegistration {
            id: "mock-webhook".to_string(),
            url: url.to_string(),
            valid: true,
        })
    }
}
