//! Tweet, user, timeline and post commands

use crate::cli::CommandContext;
use crate::cli::args::GlobalOptions;
use crate::client::TwitterApi;
use crate::error::{ApiError, Result};
use crate::output::{self, twitter::TimelineView};

/// Look up a user by handle
pub async fn user(opts: &GlobalOptions, username: &str) -> Result<()> {
    let ctx = CommandContext::new(opts)?;
    let user = ctx.draft_service()?.lookup_user(username).await?;
    output::print(&user, ctx.format)
}

/// Look up a tweet by id
pub async fn tweet(opts: &GlobalOptions, id: &str) -> Result<()> {
    let ctx = CommandContext::new(opts)?;
    let tweet = ctx.twitter.get_tweet(id).await?;
    output::print(&tweet, ctx.format)
}

/// Show a user's timeline through the cache tiers
pub async fn timeline(opts: &GlobalOptions, username: &str, count: usize) -> Result<()> {
    if count == 0 {
        return Err(ApiError::BadRequest("--count must be at least 1".to_string()).into());
    }
    let ctx = CommandContext::new(opts)?;
    let timeline = ctx.twitter.lookup_user_timeline(username, count).await?;
    let view = TimelineView {
        username: username.trim_start_matches('@').to_string(),
        timeline,
    };
    output::print(&view, ctx.format)
}

/// Post a tweet, optionally as a reply
pub async fn post(opts: &GlobalOptions, text: &str, reply_to: Option<&str>) -> Result<()> {
    if text.trim().is_empty() {
        return Err(ApiError::BadRequest("Tweet text is empty".to_string()).into());
    }
    let ctx = CommandContext::new(opts)?;
    let posted = ctx.twitter.post_tweet(text, reply_to).await?;
    output::print(&posted, ctx.format)
}
