//! Per-endpoint rate-limit tracking for the Twitter API
//!
//! Reactive: an endpoint is only considered limited after the provider has
//! answered 429. The flag clears lazily the first time it is consulted after
//! the reset time; there is no background sweep.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use log::{debug, warn};

use crate::clock::Clock;

/// Default lockout when the provider does not say when the window resets.
pub const DEFAULT_LOCKOUT_SECS: i64 = 15 * 60;

/// Categories of provider operations, used as rate-limit and queue keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// GET /2/tweets/:id
    TweetLookup,
    /// GET /2/users/by/username/:username
    UserLookup,
    /// GET /2/users/:id/tweets
    UserTimeline,
    /// POST /2/tweets
    TweetCreate,
    /// POST /2/webhooks
    WebhookRegister,
}

impl Endpoint {
    pub const ALL: [Endpoint; 5] = [
        Endpoint::TweetLookup,
        Endpoint::UserLookup,
        Endpoint::UserTimeline,
        Endpoint::TweetCreate,
        Endpoint::WebhookRegister,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Endpoint::TweetLookup => "tweet_lookup",
            Endpoint::UserLookup => "user_lookup",
            Endpoint::UserTimeline => "user_timeline",
            Endpoint::TweetCreate => "tweet_create",
            Endpoint::WebhookRegister => "webhook_register",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Limit state for one endpoint.
#[derive(Debug, Clone, Copy, Default)]
struct EndpointState {
    limited: bool,
    /// Epoch seconds
    reset_time: i64,
}

/// Rate-limit state for all endpoints.
///
/// Advisory and process-local: it lets callers short-circuit before the
/// provider has to answer 429, it does not itself block anything.
pub struct RateLimitTracker {
    clock: Arc<dyn Clock>,
    states: Mutex<HashMap<Endpoint, EndpointState>>,
}

impl RateLimitTracker {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        let states = Endpoint::ALL
            .into_iter()
            .map(|e| (e, EndpointState::default()))
            .collect();

        Self {
            clock,
            states: Mutex::new(states),
        }
    }

    /// Whether `endpoint` is currently limited. Clears an expired flag.
    pub fn is_limited(&self, endpoint: Endpoint) -> bool {
        let now = self.clock.epoch_seconds();
        let mut states = match self.states.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let state = states.entry(endpoint).or_default();

        if state.limited && now >= state.reset_time {
            debug!("Rate limit for {} expired", endpoint);
            state.limited = false;
        }
        state.limited
    }

    /// Mark `endpoint` limited until `reset_at` (epoch seconds), or for
    /// fifteen minutes when the provider gave no reset time.
    pub fn mark_limited(&self, endpoint: Endpoint, reset_at: Option<i64>) {
        let now = self.clock.epoch_seconds();
        let reset_time = match reset_at {
            Some(ts) if ts > now => ts,
            _ => now + DEFAULT_LOCKOUT_SECS,
        };

        warn!(
            "Rate limit hit for {}, blocking until epoch {}",
            endpoint, reset_time
        );

        let mut states = match self.states.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        states.insert(
            endpoint,
            EndpointState {
                limited: true,
                reset_time,
            },
        );
    }

    /// Reset time of a limited endpoint, `None` when not limited.
    pub fn reset_time(&self, endpoint: Endpoint) -> Option<DateTime<Utc>> {
        if !self.is_limited(endpoint) {
            return None;
        }
        let states = match self.states.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        states
            .get(&endpoint)
            .and_then(|s| DateTime::from_timestamp(s.reset_time, 0))
    }

    /// Reset time as epoch seconds, `None` when not limited.
    pub fn reset_epoch(&self, endpoint: Endpoint) -> Option<i64> {
        self.reset_time(endpoint).map(|t| t.timestamp())
    }
}
