//! Test fixtures and builders for Twitter model types
//!
//! Import via `use crate::client::fixtures::*` in test modules.

#![allow(dead_code)]

use chrono::{DateTime, Duration, Utc};

use super::{PublicMetrics, Tweet, TwitterUser};

// ============================================================================
// TweetBuilder
// ============================================================================

/// Builder for creating test Tweet instances.
///
/// # Example
/// ```ignore
/// let tweet = TweetBuilder::new("42")
///     .text("gm")
///     .likes(10)
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct TweetBuilder {
    id: String,
    text: String,
    author_id: String,
    created_at: DateTime<Utc>,
    metrics: Option<PublicMetrics>,
}

impl TweetBuilder {
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            text: format!("Tweet {}", &id),
            id,
            author_id: "12345".to_string(),
            created_at: DateTime::from_timestamp(1_700_000_000, 0).unwrap_or_else(Utc::now),
            metrics: None,
        }
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn author(mut self, author_id: impl Into<String>) -> Self {
        self.author_id = author_id.into();
        self
    }

    pub fn created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    /// Sets like count, keeping other metrics.
    pub fn likes(mut self, count: u64) -> Self {
        self.metrics.get_or_insert_with(Default::default).like_count = count;
        self
    }

    /// Sets retweet count, keeping other metrics.
    pub fn retweets(mut self, count: u64) -> Self {
        self.metrics.get_or_insert_with(Default::default).retweet_count = count;
        self
    }

    pub fn build(self) -> Tweet {
        Tweet {
            id: self.id,
            text: self.text,
            author_id: self.author_id,
            created_at: self.created_at,
            public_metrics: self.metrics,
        }
    }
}

// ============================================================================
// UserBuilder
// ============================================================================

/// Builder for creating test TwitterUser instances.
#[derive(Debug, Clone)]
pub struct UserBuilder {
    id: String,
    username: String,
    name: String,
}

impl UserBuilder {
    pub fn new(username: impl Into<String>) -> Self {
        let username = username.into();
        Self {
            id: format!("id-{}", &username),
            name: username.clone(),
            username,
        }
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn build(self) -> TwitterUser {
        TwitterUser {
            id: self.id,
            name: self.name,
            username: self.username,
            description: None,
            profile_image_url: None,
        }
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// `count` tweets, newest first, one hour apart
pub fn timeline(prefix: &str, count: usize) -> Vec<Tweet> {
    let newest = DateTime::from_timestamp(1_700_000_000, 0).unwrap_or_else(Utc::now);
    (0..count)
        .map(|i| {
            TweetBuilder::new(format!("{}-{}", prefix, i))
                .created_at(newest - Duration::hours(i as i64))
                .build()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tweet_builder_defaults() {
        let tweet = TweetBuilder::new("1").build();
        assert_eq!(tweet.id, "1");
        assert_eq!(tweet.text, "Tweet 1");
        assert!(tweet.public_metrics.is_none());
    }

    #[test]
    fn test_tweet_builder_metrics() {
        let tweet = TweetBuilder::new("1").likes(3).retweets(2).build();
        assert_eq!(tweet.engagement(), 5);
    }

    #[test]
    fn test_timeline_newest_first() {
        let tweets = timeline("t", 3);
        assert_eq!(tweets.len(), 3);
        assert!(tweets[0].created_at > tweets[2].created_at);
    }
}
