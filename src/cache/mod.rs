//! Two-tier cache in front of the Twitter API
//!
//! An in-process tier lives for the lifetime of the [`AccessContext`]; an
//! optional durable tier (SQLite by default) keeps user timelines across
//! runs. Timelines older than the freshness window are stale: they are only
//! served when the provider is rate limited.

pub mod client;
pub mod memory;
pub mod storage;
pub mod store;

/// Default freshness window for user timelines
pub const DEFAULT_TIMELINE_TTL_HOURS: u64 = 24;

// Re-export main types
pub use client::{AccessContext, Cached, CacheSource, CachedTwitterClient};
pub use memory::MemoryCache;
pub use storage::SqliteTimelineStore;
pub use store::{CachedUserTimeline, TimelineStore};
