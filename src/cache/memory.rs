//! In-process cache tier
//!
//! Lives as long as the [`AccessContext`](super::AccessContext) that owns it.
//! Nothing is evicted; entries go away with the process.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use super::store::{CachedUserTimeline, timeline_key};
use crate::client::{Tweet, TwitterUser};

#[derive(Debug, Default)]
pub struct MemoryCache {
    tweets: Mutex<HashMap<String, Tweet>>,
    timelines: Mutex<HashMap<String, CachedUserTimeline>>,
    /// Resolved accounts by lower-cased handle
    users: Mutex<HashMap<String, TwitterUser>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_tweet(&self, id: &str) -> Option<Tweet> {
        lock(&self.tweets).get(id).cloned()
    }

    pub fn put_tweet(&self, tweet: Tweet) {
        lock(&self.tweets).insert(tweet.id.clone(), tweet);
    }

    pub fn get_timeline(&self, username: &str) -> Option<CachedUserTimeline> {
        lock(&self.timelines).get(&timeline_key(username)).cloned()
    }

    /// Replaces any previous entry for the same handle.
    pub fn put_timeline(&self, timeline: CachedUserTimeline) {
        lock(&self.timelines).insert(timeline_key(&timeline.username), timeline);
    }

    pub fn get_user(&self, username: &str) -> Option<TwitterUser> {
        lock(&self.users).get(&timeline_key(username)).cloned()
    }

    pub fn put_user(&self, user: TwitterUser) {
        lock(&self.users).insert(timeline_key(&user.username), user);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
