//! Single-lane request queue for Twitter API calls
//!
//! Requests run one at a time in submission order, whatever endpoint they
//! target, with a fixed pause after each one before the next is dequeued.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use log::debug;
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::rate_limit::{Endpoint, RateLimitTracker};
use crate::error::{ApiError, Provider, Result};

/// Default pause between dispatched requests
pub const DEFAULT_REQUEST_INTERVAL: Duration = Duration::from_millis(1000);

/// FIFO serializer in front of the provider.
///
/// The lane is a fair async mutex, so waiters are serviced in the order they
/// called [`RequestQueue::enqueue`]. After an item is dequeued the lane stays
/// held for `interval` by a detached task, which paces the next item without
/// making the current caller wait for the pause.
pub struct RequestQueue {
    tracker: Arc<RateLimitTracker>,
    lane: Arc<Mutex<()>>,
    interval: Duration,
}

impl RequestQueue {
    pub fn new(tracker: Arc<RateLimitTracker>, interval: Duration) -> Self {
        Self {
            tracker,
            lane: Arc::new(Mutex::new(())),
            interval,
        }
    }

    pub fn tracker(&self) -> &Arc<RateLimitTracker> {
        &self.tracker
    }

    /// Run `work` when its turn comes and return its result.
    ///
    /// Rejects with [`ApiError::RateLimited`] without running `work` when
    /// `endpoint` is limited at dequeue time. A rate-limit failure from `work`
    /// marks the endpoint before the error is returned.
    pub async fn enqueue<T, F, Fut>(&self, endpoint: Endpoint, work: F) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let turn = self.lane.clone().lock_owned().await;

        let outcome = if self.tracker.is_limited(endpoint) {
            let reset_at = self.tracker.reset_epoch(endpoint);
            debug!("Rejecting queued {} request: endpoint is rate limited", endpoint);
            Err(ApiError::RateLimited {
                provider: Provider::Twitter,
                reset_at,
            }
            .into())
        } else {
            debug!("Dispatching queued {} request", endpoint);
            let result = work().await;
            if let Err(err) = &result
                && let Some(ApiError::RateLimited { reset_at, .. }) = err.as_api()
            {
                self.tracker.mark_limited(endpoint, *reset_at);
            }
            result
        };

        self.release_after_interval(turn);
        outcome
    }

    fn release_after_interval(&self, turn: OwnedMutexGuard<()>) {
        let interval = self.interval;
        tokio::spawn(async move {
            tokio::time::sleep(interval).await;
            drop(turn);
        });
    }
}
