//! Route-handler operations
//!
//! Plain async functions over the access layer. Each `*_response` method
//! returns a [`HandlerResponse`] (status plus JSON body) that an HTTP layer
//! can write out as is; the typed methods behind them are shared with the CLI.

use std::sync::Arc;

use futures::future::{join_all, try_join_all};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use uuid::Uuid;

use crate::client::{CannedTwitterClient, PostedTweet, Tweet, TwitterApi, TwitterUser};
use crate::config::{Config, ProviderMode};
use crate::drafts::{DraftStatus, DraftStore, DraftTweet, NewDraft, PreferencesStore, UserPreferences};
use crate::error::{ApiError, Error, Result};
use crate::generation::{DraftGenerator, DraftPrompt, MockGenerator};
use crate::webhook::WebhookVerifier;

/// Tweets fetched from a style account when looking for examples
const STYLE_SAMPLE_SIZE: usize = 20;

/// Examples kept after ranking by engagement
const STYLE_EXAMPLE_COUNT: usize = 5;

/// Status and JSON body for an HTTP layer to send
#[derive(Debug, Clone, PartialEq)]
pub struct HandlerResponse {
    pub status: u16,
    pub body: Value,
}

impl HandlerResponse {
    pub fn ok(body: Value) -> Self {
        Self { status: 200, body }
    }

    pub fn error(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            body: json!({ "error": message.into() }),
        }
    }

    pub fn from_error(err: &Error) -> Self {
        Self::error(err.status_code(), err.to_string())
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Body of the draft generation endpoint
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateDraftsRequest {
    #[serde(default)]
    pub tweet_id: String,

    #[serde(default)]
    pub style_account: Option<String>,

    /// Use canned providers for this request only
    #[serde(default)]
    pub use_mock: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneratedDraft {
    pub id: String,
    pub text: String,
}

/// Body of the draft approval endpoint
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApproveDraftRequest {
    #[serde(default)]
    pub draft_text: String,

    #[serde(default)]
    pub original_tweet_id: String,

    /// Stored draft to mark approved once posted
    #[serde(default)]
    pub draft_id: Option<String>,
}

/// A user's settings and the drafts waiting for them to review
#[derive(Debug, Clone, Serialize)]
pub struct ReviewQueue {
    pub preferences: UserPreferences,
    pub pending: Vec<DraftTweet>,
}

/// Webhook delivery body (account activity)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebhookPayload {
    #[serde(default)]
    pub for_user_id: Option<String>,

    #[serde(default)]
    pub tweet_create_events: Vec<TweetCreateEvent>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TweetCreateEvent {
    pub id_str: String,
    pub text: String,
    pub user: EventUser,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventUser {
    pub screen_name: String,
}

/// Draft workflows on top of the Twitter access layer and a generator.
///
/// Provider mode is fixed at construction. A request may still ask for the
/// canned providers for itself via `use_mock`.
pub struct DraftService {
    twitter: Arc<dyn TwitterApi>,
    mock_twitter: Arc<dyn TwitterApi>,
    generator: Arc<dyn DraftGenerator>,
    mock_generator: Arc<dyn DraftGenerator>,
    drafts: Arc<dyn DraftStore>,
    preferences: Arc<dyn PreferencesStore>,
    verifier: Option<WebhookVerifier>,
    mode: ProviderMode,
    drafts_per_tweet: usize,
}

impl DraftService {
    pub fn new(
        twitter: Arc<dyn TwitterApi>,
        generator: Arc<dyn DraftGenerator>,
        drafts: Arc<dyn DraftStore>,
        preferences: Arc<dyn PreferencesStore>,
    ) -> Self {
        Self {
            twitter,
            mock_twitter: Arc::new(CannedTwitterClient::new()),
            generator,
            mock_generator: Arc::new(MockGenerator::new()),
            drafts,
            preferences,
            verifier: None,
            mode: ProviderMode::Live,
            drafts_per_tweet: 3,
        }
    }

    /// Mode, webhook secret and batch size from configuration
    pub fn configured(self, config: &Config) -> Self {
        let verifier = config
            .twitter
            .webhook_secret
            .as_deref()
            .map(WebhookVerifier::new);
        Self {
            verifier,
            mode: config.mode,
            drafts_per_tweet: config.preferences.drafts_per_tweet.max(1),
            ..self
        }
    }

    pub fn with_mode(mut self, mode: ProviderMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_verifier(mut self, verifier: WebhookVerifier) -> Self {
        self.verifier = Some(verifier);
        self
    }

    pub fn with_drafts_per_tweet(mut self, count: usize) -> Self {
        self.drafts_per_tweet = count.max(1);
        self
    }

    pub fn with_mock_providers(
        mut self,
        twitter: Arc<dyn TwitterApi>,
        generator: Arc<dyn DraftGenerator>,
    ) -> Self {
        self.mock_twitter = twitter;
        self.mock_generator = generator;
        self
    }

    fn twitter_for(&self, use_mock: bool) -> &dyn TwitterApi {
        if use_mock || self.mode.is_mock() {
            self.mock_twitter.as_ref()
        } else {
            self.twitter.as_ref()
        }
    }

    fn generator_for(&self, use_mock: bool) -> &dyn DraftGenerator {
        if use_mock || self.mode.is_mock() {
            self.mock_generator.as_ref()
        } else {
            self.generator.as_ref()
        }
    }

    // ------------------------------------------------------------------
    // Webhook
    // ------------------------------------------------------------------

    /// GET handler: answer a CRC challenge
    pub fn crc_response(&self, crc_token: Option<&str>) -> HandlerResponse {
        let Some(token) = crc_token.filter(|t| !t.is_empty()) else {
            return HandlerResponse::error(400, "No CRC token provided");
        };
        let Some(verifier) = &self.verifier else {
            return HandlerResponse::error(500, "Webhook secret is not configured");
        };

        match verifier.handle_challenge(token) {
            Ok(response_token) => HandlerResponse::ok(json!({ "response_token": response_token })),
            Err(e) => HandlerResponse::from_error(&e),
        }
    }

    /// POST handler: verify, then draft replies for every monitoring user
    pub async fn handle_webhook(&self, signature: Option<&str>, raw_body: &[u8]) -> HandlerResponse {
        let verified = self
            .verifier
            .as_ref()
            .is_some_and(|v| v.verify_signature(signature, raw_body));
        if !verified {
            warn!("Rejected webhook delivery with invalid signature");
            return HandlerResponse::error(401, "Invalid signature");
        }

        let payload: WebhookPayload = match serde_json::from_slice(raw_body) {
            Ok(payload) => payload,
            Err(e) => {
                warn!("Malformed webhook body: {}", e);
                return HandlerResponse::error(500, "Internal Server Error");
            }
        };

        for event in &payload.tweet_create_events {
            if let Err(e) = self.handle_tweet_event(event).await {
                warn!("Error processing webhook event {}: {}", event.id_str, e);
                return HandlerResponse::error(500, "Internal Server Error");
            }
        }

        HandlerResponse::ok(Value::String("OK".to_string()))
    }

    /// Draft a reply for each user monitoring the author.
    ///
    /// Returns the drafts saved. One user's failure is logged and does not
    /// stop the others.
    pub async fn handle_tweet_event(&self, event: &TweetCreateEvent) -> Result<Vec<DraftTweet>> {
        let watchers = self.preferences.monitoring(&event.user.screen_name).await?;
        if watchers.is_empty() {
            debug!("No users monitor @{}", event.user.screen_name);
            return Ok(Vec::new());
        }

        info!(
            "Tweet {} from @{} matched {} monitoring user(s)",
            event.id_str,
            event.user.screen_name,
            watchers.len()
        );

        let results = join_all(watchers.iter().map(|prefs| self.draft_for_user(prefs, event))).await;

        let mut saved = Vec::new();
        for (prefs, result) in watchers.iter().zip(results) {
            match result {
                Ok(draft) => {
                    info!("New draft {} for user {}", draft.id, draft.user_id);
                    saved.push(draft);
                }
                Err(e) => warn!("Failed to generate draft for user {}: {}", prefs.user_id, e),
            }
        }
        Ok(saved)
    }

    async fn draft_for_user(
        &self,
        prefs: &UserPreferences,
        event: &TweetCreateEvent,
    ) -> Result<DraftTweet> {
        let prompt = DraftPrompt {
            style_accounts: prefs.style_accounts.clone(),
            custom_instructions: prefs.custom_instructions.clone(),
            ..DraftPrompt::new(event.text.clone())
        };
        let text = self.generator_for(false).generate_reply(&prompt).await?;

        self.drafts
            .save_draft(NewDraft {
                user_id: prefs.user_id.clone(),
                original_tweet_id: event.id_str.clone(),
                original_tweet_text: event.text.clone(),
                draft_text: text,
                status: DraftStatus::Pending,
            })
            .await
    }

    // ------------------------------------------------------------------
    // Draft generation
    // ------------------------------------------------------------------

    /// Generate `drafts_per_tweet` replies to a tweet.
    ///
    /// All drafts are requested concurrently; any failure fails the batch.
    pub async fn generate_drafts(&self, request: &GenerateDraftsRequest) -> Result<Vec<GeneratedDraft>> {
        let tweet_id = request.tweet_id.trim();
        if tweet_id.is_empty() {
            return Err(ApiError::BadRequest("Missing required fields".to_string()).into());
        }

        let use_mock = request.use_mock || self.mode.is_mock();
        if use_mock {
            debug!("Using mock providers for tweet {}", tweet_id);
        }
        let tweet = self.twitter_for(use_mock).get_tweet(tweet_id).await?;

        let style_account = request
            .style_account
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty());

        let mut prompt = DraftPrompt::new(tweet.text.clone());
        if let Some(account) = style_account {
            prompt.style_accounts = vec![account.to_string()];
            if !use_mock {
                prompt.style_examples = self.style_examples(account).await;
            }
        }

        let generator = self.generator_for(use_mock);
        let texts = try_join_all(
            (0..self.drafts_per_tweet).map(|_| generator.generate_reply(&prompt)),
        )
        .await?;

        Ok(texts
            .into_iter()
            .map(|text| GeneratedDraft {
                id: Uuid::new_v4().to_string(),
                text,
            })
            .collect())
    }

    /// Top tweets of `account` by likes plus retweets, blank-line separated.
    /// Empty when the timeline cannot be read.
    async fn style_examples(&self, account: &str) -> String {
        match self.twitter.get_user_timeline(account, STYLE_SAMPLE_SIZE).await {
            Ok(tweets) => {
                let examples = top_by_engagement(tweets, STYLE_EXAMPLE_COUNT);
                debug!("Using {} tweets from @{} as style examples", examples.len(), account);
                examples
                    .iter()
                    .map(|t| t.text.as_str())
                    .collect::<Vec<_>>()
                    .join("\n\n")
            }
            Err(e) => {
                warn!("Error getting style examples for @{}: {}", account, e);
                String::new()
            }
        }
    }

    pub async fn generate_drafts_response(&self, raw_body: &[u8]) -> HandlerResponse {
        let request: GenerateDraftsRequest = match serde_json::from_slice(raw_body) {
            Ok(request) => request,
            Err(e) => return HandlerResponse::error(400, format!("Invalid request body: {}", e)),
        };

        match self.generate_drafts(&request).await {
            Ok(drafts) => HandlerResponse::ok(json!({ "drafts": drafts })),
            Err(e) => {
                warn!("Error generating drafts: {}", e);
                HandlerResponse::from_error(&e)
            }
        }
    }

    // ------------------------------------------------------------------
    // Review
    // ------------------------------------------------------------------

    /// Preferences (defaults when none are saved) and pending drafts, newest
    /// first
    pub async fn review_queue(&self, user_id: &str) -> Result<ReviewQueue> {
        let preferences = self.preferences.preferences(user_id).await?;
        let pending = self.drafts.pending_drafts(user_id).await?;
        Ok(ReviewQueue {
            preferences,
            pending,
        })
    }

    // ------------------------------------------------------------------
    // Approval
    // ------------------------------------------------------------------

    /// Post an approved draft as a reply to the original tweet.
    pub async fn approve_draft(&self, request: &ApproveDraftRequest) -> Result<PostedTweet> {
        let text = request.draft_text.trim();
        let reply_to = request.original_tweet_id.trim();
        if text.is_empty() || reply_to.is_empty() {
            return Err(ApiError::BadRequest("Missing required fields".to_string()).into());
        }

        let posted = self.twitter_for(false).post_tweet(text, Some(reply_to)).await?;
        info!("Posted reply {} to tweet {}", posted.id, reply_to);

        if let Some(draft_id) = &request.draft_id
            && let Err(e) = self.drafts.set_status(draft_id, DraftStatus::Approved).await
        {
            warn!("Posted draft {} but could not mark it approved: {}", draft_id, e);
        }

        Ok(posted)
    }

    pub async fn approve_draft_response(&self, raw_body: &[u8]) -> HandlerResponse {
        let request: ApproveDraftRequest = match serde_json::from_slice(raw_body) {
            Ok(request) => request,
            Err(e) => return HandlerResponse::error(400, format!("Invalid request body: {}", e)),
        };

        match self.approve_draft(&request).await {
            Ok(tweet) => HandlerResponse::ok(json!({ "success": true, "tweet": tweet })),
            Err(e) => {
                warn!("Error approving draft: {}", e);
                HandlerResponse::from_error(&e)
            }
        }
    }

    // ------------------------------------------------------------------
    // User lookup
    // ------------------------------------------------------------------

    pub async fn lookup_user(&self, username: &str) -> Result<TwitterUser> {
        let username = username.trim().trim_start_matches('@');
        if username.is_empty() {
            return Err(ApiError::BadRequest("Username is required".to_string()).into());
        }

        self.twitter_for(false)
            .get_user_by_username(username)
            .await?
            .ok_or_else(|| ApiError::NotFound("Twitter user not found".to_string()).into())
    }

    pub async fn lookup_user_response(&self, username: Option<&str>) -> HandlerResponse {
        match self.lookup_user(username.unwrap_or_default()).await {
            Ok(user) => match serde_json::to_value(&user) {
                Ok(body) => HandlerResponse::ok(body),
                Err(e) => HandlerResponse::from_error(&e.into()),
            },
            Err(e) => HandlerResponse::from_error(&e),
        }
    }
}

/// The `n` tweets with the most likes plus retweets, highest first
pub fn top_by_engagement(mut tweets: Vec<Tweet>, n: usize) -> Vec<Tweet> {
    tweets.sort_by_key(|t| std::cmp::Reverse(t.engagement()));
    tweets.truncate(n);
    tweets
}
