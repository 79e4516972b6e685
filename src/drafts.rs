//! Draft replies and per-user preferences
//!
//! Persistence belongs to the host application; the access layer only talks
//! to it through [`DraftStore`] and [`PreferencesStore`].
//! [`MemoryDraftStore`] implements both in process.

use std::collections::HashMap;
use std::fmt;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};

/// Review state of a draft
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DraftStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl fmt::Display for DraftStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DraftStatus::Pending => "pending",
            DraftStatus::Approved => "approved",
            DraftStatus::Rejected => "rejected",
        };
        f.write_str(s)
    }
}

/// A generated reply awaiting review
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftTweet {
    pub id: String,
    pub user_id: String,
    pub original_tweet_id: String,
    pub original_tweet_text: String,
    pub draft_text: String,
    pub status: DraftStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields supplied when saving a draft; the store assigns id and timestamps
#[derive(Debug, Clone, PartialEq)]
pub struct NewDraft {
    pub user_id: String,
    pub original_tweet_id: String,
    pub original_tweet_text: String,
    pub draft_text: String,
    pub status: DraftStatus,
}

/// What a user monitors and how their replies should sound
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserPreferences {
    pub user_id: String,

    /// Handles whose new tweets trigger draft generation
    #[serde(default)]
    pub monitored_accounts: Vec<String>,

    /// Handles whose voice drafts should imitate
    #[serde(default)]
    pub style_accounts: Vec<String>,

    #[serde(default)]
    pub custom_instructions: String,
}

impl UserPreferences {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            ..Default::default()
        }
    }

    /// Case-insensitive, ignores a leading `@`
    pub fn monitors(&self, screen_name: &str) -> bool {
        let wanted = normalize_handle(screen_name);
        self.monitored_accounts
            .iter()
            .any(|a| normalize_handle(a) == wanted)
    }
}

fn normalize_handle(handle: &str) -> String {
    handle.trim().trim_start_matches('@').to_lowercase()
}

#[async_trait]
pub trait DraftStore: Send + Sync {
    /// Persist a new draft and return it as stored
    async fn save_draft(&self, draft: NewDraft) -> Result<DraftTweet>;

    /// A user's pending drafts, newest first
    async fn pending_drafts(&self, user_id: &str) -> Result<Vec<DraftTweet>>;

    async fn set_status(&self, draft_id: &str, status: DraftStatus) -> Result<DraftTweet>;
}

#[async_trait]
pub trait PreferencesStore: Send + Sync {
    /// A user's preferences, empty defaults when none were saved
    async fn preferences(&self, user_id: &str) -> Result<UserPreferences>;

    /// Every user monitoring `screen_name`
    async fn monitoring(&self, screen_name: &str) -> Result<Vec<UserPreferences>>;
}

/// In-process draft and preference store
#[derive(Debug, Default)]
pub struct MemoryDraftStore {
    drafts: Mutex<Vec<DraftTweet>>,
    preferences: Mutex<HashMap<String, UserPreferences>>,
}

impl MemoryDraftStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_preferences(self, prefs: UserPreferences) -> Self {
        self.set_preferences(prefs);
        self
    }

    pub fn set_preferences(&self, prefs: UserPreferences) {
        if let Ok(mut map) = self.preferences.lock() {
            map.insert(prefs.user_id.clone(), prefs);
        }
    }

    /// Every stored draft, in insertion order
    pub fn all_drafts(&self) -> Vec<DraftTweet> {
        self.drafts
            .lock()
            .map(|d| d.clone())
            .unwrap_or_default()
    }
}

fn poisoned<T>(_: T) -> Error {
    Error::Other("Draft store lock poisoned".to_string())
}

#[async_trait]
impl DraftStore for MemoryDraftStore {
    async fn save_draft(&self, draft: NewDraft) -> Result<DraftTweet> {
        let now = Utc::now();
        let stored = DraftTweet {
            id: Uuid::new_v4().to_string(),
            user_id: draft.user_id,
            original_tweet_id: draft.original_tweet_id,
            original_tweet_text: draft.original_tweet_text,
            draft_text: draft.draft_text,
            status: draft.status,
            created_at: now,
            updated_at: now,
        };
        self.drafts.lock().map_err(poisoned)?.push(stored.clone());
        Ok(stored)
    }

    async fn pending_drafts(&self, user_id: &str) -> Result<Vec<DraftTweet>> {
        let drafts = self.drafts.lock().map_err(poisoned)?;
        let mut pending: Vec<_> = drafts
            .iter()
            .filter(|d| d.user_id == user_id && d.status == DraftStatus::Pending)
            .cloned()
            .collect();
        pending.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(pending)
    }

    async fn set_status(&self, draft_id: &str, status: DraftStatus) -> Result<DraftTweet> {
        let mut drafts = self.drafts.lock().map_err(poisoned)?;
        let draft = drafts
            .iter_mut()
            .find(|d| d.id == draft_id)
            .ok_or_else(|| Error::Other(format!("Draft {} not found", draft_id)))?;
        draft.status = status;
        draft.updated_at = Utc::now();
        Ok(draft.clone())
    }
}

#[async_trait]
impl PreferencesStore for MemoryDraftStore {
    async fn preferences(&self, user_id: &str) -> Result<UserPreferences> {
        let map = self.preferences.lock().map_err(poisoned)?;
        Ok(map
            .get(user_id)
            .cloned()
            .unwrap_or_else(|| UserPreferences::new(user_id)))
    }

    async fn monitoring(&self, screen_name: &str) -> Result<Vec<UserPreferences>> {
        let map = self.preferences.lock().map_err(poisoned)?;
        let mut users: Vec<_> = map
            .values()
            .filter(|p| p.monitors(screen_name))
            .cloned()
            .collect();
        users.sort_by(|a, b| a.user_id.cmp(&b.user_id));
        Ok(users)
    }
}
