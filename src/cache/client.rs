//! Cached, rate-aware wrapper for any Twitter API implementation
//!
//! Timeline reads go memory, then the durable store, then the provider.
//! Every provider call is serialized through the [`RequestQueue`].

use async_trait::async_trait;
use chrono::Duration;
use log::{debug, warn};
use std::fmt;
use std::sync::Arc;

use super::memory::MemoryCache;
use super::store::{CachedUserTimeline, TimelineStore, timeline_key};
use crate::client::{
    Endpoint, PostedTweet, RateLimitTracker, RequestQueue, Tweet, TwitterApi, TwitterUser,
    WebhookRegistration,
};
use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::error::{ApiError, Result};

/// Shared state of the access layer.
///
/// Built once (per process, or per test) and handed to
/// [`CachedTwitterClient::new`]; nothing in the access layer is global.
#[derive(Clone)]
pub struct AccessContext {
    pub memory: Arc<MemoryCache>,
    pub tracker: Arc<RateLimitTracker>,
    pub queue: Arc<RequestQueue>,
    pub clock: Arc<dyn Clock>,
    pub timeline_ttl: Duration,
}

impl AccessContext {
    pub fn new(clock: Arc<dyn Clock>, interval: std::time::Duration, timeline_ttl: Duration) -> Self {
        let tracker = Arc::new(RateLimitTracker::new(clock.clone()));
        let queue = Arc::new(RequestQueue::new(tracker.clone(), interval));
        Self {
            memory: Arc::new(MemoryCache::new()),
            tracker,
            queue,
            clock,
            timeline_ttl,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            Arc::new(SystemClock),
            config.request_interval(),
            config.timeline_ttl(),
        )
    }
}

/// Where a cached read was answered from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheSource {
    Memory,
    Durable,
    Live,
    /// Past the freshness window, served because the provider is rate limited
    Stale,
}

impl CacheSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheSource::Memory => "memory",
            CacheSource::Durable => "durable",
            CacheSource::Live => "live",
            CacheSource::Stale => "stale",
        }
    }

    pub fn is_stale(&self) -> bool {
        matches!(self, CacheSource::Stale)
    }
}

impl fmt::Display for CacheSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A value together with where it came from
#[derive(Debug, Clone)]
pub struct Cached<T> {
    pub value: T,
    pub source: CacheSource,
}

/// Cached wrapper for any TwitterApi implementation.
///
/// The durable tier is optional (absent for `--no-cache` and canned runs).
/// Single tweets and resolved users are only cached in memory.
pub struct CachedTwitterClient<C: TwitterApi> {
    inner: Arc<C>,
    store: Option<Arc<dyn TimelineStore>>,
    context: AccessContext,
}

impl<C: TwitterApi + 'static> CachedTwitterClient<C> {
    pub fn new(inner: C, store: Option<Arc<dyn TimelineStore>>, context: AccessContext) -> Self {
        Self {
            inner: Arc::new(inner),
            store,
            context,
        }
    }

    pub fn context(&self) -> &AccessContext {
        &self.context
    }

    /// Timeline lookup reporting which tier answered.
    ///
    /// Cached entries only answer counts they cover. A stale (or short)
    /// entry is only returned when the provider is rate limited, either
    /// already known to the tracker or reported by the live fetch.
    pub async fn lookup_user_timeline(
        &self,
        username: &str,
        count: usize,
    ) -> Result<Cached<Vec<Tweet>>> {
        let key = timeline_key(username);
        let now = self.context.clock.now();
        let ttl = self.context.timeline_ttl;
        let mut stale: Option<CachedUserTimeline> = None;

        if let Some(entry) = self.context.memory.get_timeline(&key) {
            if entry.is_fresh(now, ttl) && entry.covers(count) {
                debug!("Cache hit (fresh, memory): timeline @{}", key);
                return Ok(Cached {
                    value: entry.take(count),
                    source: CacheSource::Memory,
                });
            }
            stale = Some(entry);
        }

        if let Some(store) = &self.store {
            match store.load_timeline(&key).await {
                Ok(Some(entry)) if entry.is_fresh(now, ttl) && entry.covers(count) => {
                    debug!("Cache hit (fresh, durable): timeline @{}", key);
                    let value = entry.take(count);
                    self.context.memory.put_timeline(entry);
                    return Ok(Cached {
                        value,
                        source: CacheSource::Durable,
                    });
                }
                Ok(Some(entry)) => {
                    if stale.as_ref().is_none_or(|s| s.updated_at < entry.updated_at) {
                        stale = Some(entry);
                    }
                }
                Ok(None) => {}
                Err(e) => warn!("Durable cache read failed for @{}: {}", key, e),
            }
        }

        if let Some(entry) = &stale
            && self.context.tracker.is_limited(Endpoint::UserTimeline)
        {
            return Ok(self.serve_stale(entry, count));
        }

        match self.fetch_timeline(&key, count).await {
            Ok(tweets) => {
                let entry = CachedUserTimeline::new(&key, tweets, self.context.clock.now())
                    .with_fetched_count(count);
                let value = entry.tweets.clone();
                self.write_through(entry).await;
                Ok(Cached {
                    value,
                    source: CacheSource::Live,
                })
            }
            Err(e) if e.is_rate_limit() => match &stale {
                Some(entry) => Ok(self.serve_stale(entry, count)),
                None => Err(e),
            },
            Err(e) => Err(e),
        }
    }

    /// Resolve the handle in its own `UserLookup` slot, then read tweets in
    /// a `UserTimeline` slot.
    async fn fetch_timeline(&self, handle: &str, count: usize) -> Result<Vec<Tweet>> {
        let user = self
            .get_user_by_username(handle)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("Twitter user @{}", handle)))?;

        let inner = self.inner.clone();
        self.context
            .queue
            .enqueue(Endpoint::UserTimeline, move || async move {
                inner.get_user_tweets(&user, count).await
            })
            .await
    }

    fn serve_stale(&self, entry: &CachedUserTimeline, count: usize) -> Cached<Vec<Tweet>> {
        let age = entry.age(self.context.clock.now());
        warn!(
            "Cache hit (stale, {}h old): timeline @{} served while rate limited",
            age.num_hours(),
            entry.username
        );
        Cached {
            value: entry.take(count),
            source: CacheSource::Stale,
        }
    }

    /// Memory always; durable best effort.
    async fn write_through(&self, entry: CachedUserTimeline) {
        if let Some(store) = &self.store
            && let Err(e) = store.save_timeline(&entry).await
        {
            warn!(
                "Failed to persist timeline @{} to durable cache: {}",
                entry.username, e
            );
        }
        self.context.memory.put_timeline(entry);
    }
}

#[async_trait]
impl<C: TwitterApi + 'static> TwitterApi for CachedTwitterClient<C> {
    async fn get_tweet(&self, id: &str) -> Result<Tweet> {
        if let Some(tweet) = self.context.memory.get_tweet(id) {
            debug!("Cache hit (fresh, memory): tweet {}", id);
            return Ok(tweet);
        }

        let inner = self.inner.clone();
        let tweet_id = id.to_string();
        let tweet = self
            .context
            .queue
            .enqueue(Endpoint::TweetLookup, move || async move {
                inner.get_tweet(&tweet_id).await
            })
            .await?;

        self.context.memory.put_tweet(tweet.clone());
        Ok(tweet)
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<TwitterUser>> {
        let key = timeline_key(username);
        if let Some(user) = self.context.memory.get_user(&key) {
            debug!("Cache hit (fresh, memory): user @{}", key);
            return Ok(Some(user));
        }

        let inner = self.inner.clone();
        let handle = key.clone();
        let user = self
            .context
            .queue
            .enqueue(Endpoint::UserLookup, move || async move {
                inner.get_user_by_username(&handle).await
            })
            .await?;

        if let Some(user) = &user {
            self.context.memory.put_user(user.clone());
        }
        Ok(user)
    }

    async fn get_user_timeline(&self, username: &str, count: usize) -> Result<Vec<Tweet>> {
        Ok(self.lookup_user_timeline(username, count).await?.value)
    }

    async fn post_tweet(&self, text: &str, reply_to: Option<&str>) -> Result<PostedTweet> {
        let inner = self.inner.clone();
        let text = text.to_string();
        let reply_to = reply_to.map(str::to_string);
        self.context
            .queue
            .enqueue(Endpoint::TweetCreate, move || async move {
                inner.post_tweet(&text, reply_to.as_deref()).await
            })
            .await
    }

    async fn register_webhook(&self, url: &str) -> Result<WebhookRegistration> {
        let inner = self.inner.clone();
        let url = url.to_string();
        self.context
            .queue
            .enqueue(Endpoint::WebhookRegister, move || async move {
                inner.register_webhook(&url).await
            })
            .await
    }
}
