//! Command execution context
//!
//! Loads configuration once and wires the access layer for a command:
//! shared [`AccessContext`], durable store, provider client and
//! [`DraftService`].

use std::sync::Arc;

use log::{debug, warn};

use crate::cache::{AccessContext, CachedTwitterClient, SqliteTimelineStore, TimelineStore};
use crate::cli::OutputFormat;
use crate::cli::args::GlobalOptions;
use crate::client::{CannedTwitterClient, TwitterApi, TwitterClient};
use crate::config::{Config, ProviderMode};
use crate::drafts::MemoryDraftStore;
use crate::error::Result;
use crate::generation::{AnthropicClient, DraftGenerator, MockGenerator};
use crate::service::DraftService;

/// Provider client as seen by commands: live or canned, behind the cache
pub type SharedTwitter = CachedTwitterClient<Arc<dyn TwitterApi>>;

/// Everything a command needs, built once per invocation.
pub struct CommandContext {
    /// Loaded configuration with CLI overrides applied
    pub config: Config,
    /// Cached, queued provider client
    pub twitter: Arc<SharedTwitter>,
    /// Output format preference
    pub format: OutputFormat,
}

impl CommandContext {
    /// Load config and build the client stack.
    ///
    /// `--mock` forces [`ProviderMode::Mock`]. Canned runs and `--no-cache`
    /// leave out the durable tier; the in-memory tier always exists. A
    /// durable store that cannot be opened is logged and skipped.
    pub fn new(opts: &GlobalOptions) -> Result<Self> {
        let mut config = Config::load_at(opts.config_ref())?;
        if opts.mock {
            config.mode = ProviderMode::Mock;
        }

        let provider: Arc<dyn TwitterApi> = if config.mode.is_mock() {
            debug!("Using canned Twitter responses");
            Arc::new(CannedTwitterClient::new())
        } else {
            Arc::new(TwitterClient::new(&config)?)
        };

        let durable = uses_durable_store(config.mode, opts.no_cache);
        let store: Option<Arc<dyn TimelineStore>> = if !durable {
            debug!("Durable timeline cache disabled for this run");
            None
        } else {
            match SqliteTimelineStore::open() {
                Ok(store) => Some(Arc::new(store)),
                Err(e) => {
                    warn!("Timeline cache unavailable: {}", e);
                    None
                }
            }
        };

        let access = AccessContext::from_config(&config);
        let twitter = Arc::new(CachedTwitterClient::new(provider, store, access));

        Ok(Self {
            config,
            twitter,
            format: opts.format,
        })
    }

    /// Draft service over this context's client, with an in-process draft
    /// store seeded from the configured users.
    pub fn draft_service(&self) -> Result<DraftService> {
        let generator: Arc<dyn DraftGenerator> = if self.config.mode.is_mock() {
            Arc::new(MockGenerator::new())
        } else {
            Arc::new(AnthropicClient::new(&self.config)?)
        };

        let store = Arc::new(MemoryDraftStore::new());
        for user in &self.config.users {
            store.set_preferences(user.clone());
        }

        let twitter: Arc<dyn TwitterApi> = self.twitter.clone();
        Ok(DraftService::new(twitter, generator, store.clone(), store).configured(&self.config))
    }
}

/// Canned timelines never reach the on-disk cache, so a later live run
/// cannot mistake them for provider data.
fn uses_durable_store(mode: ProviderMode, no_cache: bool) -> bool {
    !no_cache && !mode.is_mock()
}
