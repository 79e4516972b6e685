//! Cached timeline entries and the durable-tier interface

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::client::Tweet;
use crate::error::Result;

/// A user's timeline as last fetched from the provider.
///
/// Refreshed by full replacement, never partially updated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedUserTimeline {
    pub username: String,

    /// In provider response order (newest first)
    pub tweets: Vec<Tweet>,

    /// How many tweets were asked of the provider for this fetch
    #[serde(default)]
    pub fetched_count: usize,

    pub updated_at: DateTime<Utc>,
}

impl CachedUserTimeline {
    pub fn new(username: &str, tweets: Vec<Tweet>, updated_at: DateTime<Utc>) -> Self {
        Self {
            username: timeline_key(username),
            fetched_count: tweets.len(),
            tweets,
            updated_at,
        }
    }

    /// Record the count the provider was asked for, which may exceed
    /// what it returned.
    pub fn with_fetched_count(mut self, count: usize) -> Self {
        self.fetched_count = count;
        self
    }

    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        now - self.updated_at
    }

    /// Younger than `ttl` at `now`
    pub fn is_fresh(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        self.age(now) < ttl
    }

    /// Whether this entry can answer a request for `count` tweets.
    ///
    /// A short answer from the provider means the account has no more, so
    /// any larger count is covered too.
    pub fn covers(&self, count: usize) -> bool {
        count <= self.fetched_count || self.tweets.len() < self.fetched_count
    }

    /// At most `count` tweets, newest first
    pub fn take(&self, count: usize) -> Vec<Tweet> {
        self.tweets.iter().take(count).cloned().collect()
    }
}

/// Durable timeline tier, injected by the host application.
#[async_trait]
pub trait TimelineStore: Send + Sync {
    async fn load_timeline(&self, username: &str) -> Result<Option<CachedUserTimeline>>;

    async fn save_timeline(&self, timeline: &CachedUserTimeline) -> Result<()>;
}

/// Cache key for a handle: `@Jack` and `jack` share an entry.
pub fn timeline_key(username: &str) -> String {
    username.trim().trim_start_matches('@').to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::fixtures::timeline;

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(secs, 0).unwrap()
    }

    #[test]
    fn test_timeline_key_normalizes_handle() {
        assert_eq!(timeline_key("@Jack"), "jack");
        assert_eq!(timeline_key(" jack "), "jack");
    }

    #[test]
    fn test_freshness_window() {
        let entry = CachedUserTimeline::new("jack", vec![], at(0));
        let ttl = Duration::hours(24);

        assert!(entry.is_fresh(at(0) + Duration::hours(23) + Duration::minutes(59), ttl));
        assert!(!entry.is_fresh(at(0) + Duration::hours(24), ttl));
        assert!(!entry.is_fresh(at(0) + Duration::hours(24) + Duration::minutes(1), ttl));
    }

    #[test]
    fn test_take_truncates_in_order() {
        let entry = CachedUserTimeline::new("jack", timeline("jack", 4), at(0));
        let ids: Vec<_> = entry.take(2).into_iter().map(|t| t.id).collect();
        assert_eq!(ids, vec!["jack-0", "jack-1"]);
        assert_eq!(entry.take(10).len(), 4);
    }

    #[test]
    fn test_covers_smaller_counts_only_when_full() {
        let full = CachedUserTimeline::new("jack", timeline("jack", 5), at(0))
            .with_fetched_count(5);
        assert!(full.covers(3));
        assert!(full.covers(5));
        assert!(!full.covers(20));

        // asked for 20, got 2: nothing more to fetch
        let short = CachedUserTimeline::new("jack", timeline("jack", 2), at(0))
            .with_fetched_count(20);
        assert!(short.covers(20));
        assert!(short.covers(100));
    }
}
