//! Twitter API v2 client implementation

use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use reqwest::{Client as HttpClient, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use super::oauth::OAuthSigner;
use super::{PostedTweet, Tweet, TwitterApi, TwitterUser, WebhookRegistration};
use crate::config::{Config, OAuthCredentials};
use crate::error::{ApiError, ConfigError, Provider, Result};

/// Fields requested on every tweet lookup
const TWEET_FIELDS: &str = "author_id,created_at,public_metrics";

/// Fields requested on every user lookup
const USER_FIELDS: &str = "description,profile_image_url";

/// Bounds the timeline endpoint accepts for `max_results`
const TIMELINE_MIN_RESULTS: usize = 5;
const TIMELINE_MAX_RESULTS: usize = 100;

/// Twitter API client.
///
/// Read calls authenticate with the app-only bearer token, write calls with
/// OAuth 1.0a user credentials. Either may be absent; the call that needs it
/// fails with [`ConfigError::Missing`].
pub struct TwitterClient {
    http: HttpClient,
    base_url: String,
    bearer_token: Option<String>,
    signer: Option<OAuthSigner>,
}

/// v2 response envelope
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<Problem>,
}

/// Partial-error entry inside a 200 response
#[derive(Debug, Deserialize)]
struct Problem {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    detail: Option<String>,
}

impl Problem {
    fn is_not_found(&self) -> bool {
        self.title.as_deref() == Some("Not Found Error")
    }

    fn message(&self) -> String {
        self.detail
            .clone()
            .or_else(|| self.title.clone())
            .unwrap_or_else(|| "Unknown error".to_string())
    }
}

impl TwitterClient {
    /// Create a client from configuration
    pub fn new(config: &Config) -> Result<Self> {
        Self::with_host(
            config.twitter.bearer_token.clone(),
            config.require_oauth_credentials().ok(),
            &config.preferences.api_host,
        )
    }

    /// Create a client against a specific API host (tests, proxies)
    pub fn with_host(
        bearer_token: Option<String>,
        oauth: Option<OAuthCredentials>,
        api_host: &str,
    ) -> Result<Self> {
        let http = HttpClient::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(format!("draftgod/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ApiError::Network(e.to_string()))?;

        Ok(Self {
            http,
            base_url: api_host.trim_end_matches('/').to_string(),
            bearer_token,
            signer: oauth.map(OAuthSigner::new),
        })
    }

    fn bearer(&self) -> Result<&str> {
        self.bearer_token
            .as_deref()
            .ok_or_else(|| ConfigError::Missing("TWITTER_BEARER_TOKEN").into())
    }

    fn signer(&self) -> Result<&OAuthSigner> {
        self.signer
            .as_ref()
            .ok_or_else(|| ConfigError::Missing("TWITTER_API_KEY").into())
    }

    /// App-only GET
    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<Envelope<T>> {
        let url = format!("{}{}", self.base_url, path);
        debug!("GET {}", path);

        let response = self
            .http
            .get(&url)
            .bearer_auth(self.bearer()?)
            .query(params)
            .send()
            .await
            .map_err(ApiError::from)?;

        Self::handle_response(response).await
    }

    /// User-context POST with a JSON body
    async fn post<T: DeserializeOwned, B: serde::Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<Envelope<T>> {
        let url = format!("{}{}", self.base_url, path);
        let authorization = self.signer()?.authorization("POST", &url, &[])?;
        debug!("POST {}", path);

        let response = self
            .http
            .post(&url)
            .header("Authorization", authorization)
            .json(body)
            .send()
            .await
            .map_err(ApiError::from)?;

        Self::handle_response(response).await
    }

    async fn handle_response<T: DeserializeOwned>(response: Response) -> Result<T> {
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response.bytes().await.map_err(ApiError::from)?;

        if status.is_success() {
            serde_json::from_slice(&bytes).map_err(|e| {
                ApiError::InvalidResponse(format!("Failed to parse response: {}", e)).into()
            })
        } else {
            Err(ApiError::from_response(Provider::Twitter, status, &headers, &bytes).into())
        }
    }

    /// Unwrap `data`, turning a not-found problem into [`ApiError::NotFound`]
    fn require_data<T>(envelope: Envelope<T>, what: &str) -> Result<T> {
        match envelope.data {
            Some(data) => Ok(data),
            None => {
                let message = envelope
                    .errors
                    .first()
                    .map(Problem::message)
                    .unwrap_or_else(|| format!("{} not found", what));
                Err(ApiError::NotFound(message).into())
            }
        }
    }
}

#[async_trait]
impl TwitterApi for TwitterClient {
    async fn get_tweet(&self, id: &str) -> Result<Tweet> {
        let envelope: Envelope<Tweet> = self
            .get(
                &format!("/2/tweets/{}", id),
                &[("tweet.fields", TWEET_FIELDS.to_string())],
            )
            .await?;
        Self::require_data(envelope, &format!("Tweet {}", id))
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<TwitterUser>> {
        let envelope: Envelope<TwitterUser> = self
            .get(
                &format!("/2/users/by/username/{}", username),
                &[("user.fields", USER_FIELDS.to_string())],
            )
            .await?;

        match envelope.data {
            Some(user) => Ok(Some(user)),
            None if envelope.errors.iter().all(Problem::is_not_found) => Ok(None),
            None => Err(ApiError::BadRequest(
                envelope
                    .errors
                    .first()
                    .map(Problem::message)
                    .unwrap_or_default(),
            )
            .into()),
        }
    }

    async fn get_user_timeline(&self, username: &str, count: usize) -> Result<Vec<Tweet>> {
        let user = self
            .get_user_by_username(username)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("Twitter user @{}", username)))?;
        self.get_user_tweets(&user, count).await
    }

    async fn get_user_tweets(&self, user: &TwitterUser, count: usize) -> Result<Vec<Tweet>> {
        let max_results = count.clamp(TIMELINE_MIN_RESULTS, TIMELINE_MAX_RESULTS);
        let envelope: Envelope<Vec<Tweet>> = self
            .get(
                &format!("/2/users/{}/tweets", user.id),
                &[
                    ("max_results", max_results.to_string()),
                    ("tweet.fields", TWEET_FIELDS.to_string()),
                ],
            )
            .await?;

        // No `data` just means no tweets
        let mut tweets = envelope.data.unwrap_or_default();
        tweets.truncate(count);
        Ok(tweets)
    }

    async fn post_tweet(&self, text: &str, reply_to: Option<&str>) -> Result<PostedTweet> {
        let mut body = serde_json::json!({ "text": text });
        if let Some(id) = reply_to {
            body["reply"] = serde_json::json!({ "in_reply_to_tweet_id": id });
        }

        let envelope: Envelope<PostedTweet> = self.post("/2/tweets", &body).await?;
        Self::require_data(envelope, "Posted tweet")
    }

    async fn register_webhook(&self, url: &str) -> Result<WebhookRegistration> {
        let envelope: Envelope<WebhookRegistration> = self
            .post("/2/webhooks", &serde_json::json!({ "url": url }))
            .await?;
        let webhook = Self::require_data(envelope, "Webhook")?;

        // Subscribe the authenticating account's activity (tweet_create events)
        let _: Envelope<serde_json::Value> = self
            .post(
                &format!(
                    "/2/account_activity/webhooks/{}/subscriptions/all",
                    webhook.id
                ),
                &serde_json::json!({}),
            )
            .await?;

        Ok(webhook)
    }
}
