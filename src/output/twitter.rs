//! Formatting for tweets, users and drafts

use colored::Colorize;
use tabled::Tabled;

use super::Formattable;
use super::formatters::{format_local, truncate_text};
use super::json::{format_json, format_json_with_source};
use super::table::format_table;
use crate::cache::{CacheSource, Cached};
use crate::cli::OutputFormat;
use crate::client::{PostedTweet, Tweet, TwitterUser, WebhookRegistration};
use crate::error::Result;
use crate::service::GeneratedDraft;

const TEXT_WIDTH: usize = 60;

#[derive(Tabled)]
struct TweetRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "CREATED")]
    created: String,
    #[tabled(rename = "LIKES")]
    likes: u64,
    #[tabled(rename = "RTS")]
    retweets: u64,
    #[tabled(rename = "TEXT")]
    text: String,
}

impl From<&Tweet> for TweetRow {
    fn from(tweet: &Tweet) -> Self {
        let metrics = tweet.public_metrics.clone().unwrap_or_default();
        Self {
            id: tweet.id.clone(),
            created: format_local(tweet.created_at),
            likes: metrics.like_count,
            retweets: metrics.retweet_count,
            text: truncate_text(&tweet.text, TEXT_WIDTH),
        }
    }
}

fn pretty_tweet(tweet: &Tweet) -> String {
    let metrics = tweet.public_metrics.clone().unwrap_or_default();
    format!(
        "{} {}\n{}\n{} likes · {} retweets · {} replies",
        tweet.id.bold(),
        format_local(tweet.created_at).dimmed(),
        tweet.text,
        metrics.like_count,
        metrics.retweet_count,
        metrics.reply_count,
    )
}

impl Formattable for Tweet {
    fn format(&self, format: OutputFormat) -> Result<String> {
        Ok(match format {
            OutputFormat::Json => format_json(self)?,
            OutputFormat::Table => format_table(&[TweetRow::from(self)]),
            OutputFormat::Pretty => pretty_tweet(self),
        })
    }
}

/// A user's timeline and the tier that served it
pub struct TimelineView {
    pub username: String,
    pub timeline: Cached<Vec<Tweet>>,
}

impl Formattable for TimelineView {
    fn format(&self, format: OutputFormat) -> Result<String> {
        let tweets = &self.timeline.value;
        let source = self.timeline.source;
        Ok(match format {
            OutputFormat::Json => format_json_with_source(tweets, source.as_str())?,
            OutputFormat::Table => {
                let rows: Vec<TweetRow> = tweets.iter().map(TweetRow::from).collect();
                format_table(&rows)
            }
            OutputFormat::Pretty => {
                let mut out = format!(
                    "{} {}\n",
                    format!("@{}", self.username).bold(),
                    source_label(source)
                );
                if tweets.is_empty() {
                    out.push_str("\nNo tweets found.");
                }
                for tweet in tweets {
                    out.push('\n');
                    out.push_str(&pretty_tweet(tweet));
                    out.push('\n');
                }
                out.trim_end().to_string()
            }
        })
    }
}

fn source_label(source: CacheSource) -> String {
    let label = format!("({})", source);
    match source {
        CacheSource::Live => label.green().to_string(),
        CacheSource::Stale => format!("{} rate limited, showing cached data", label)
            .yellow()
            .to_string(),
        CacheSource::Memory | CacheSource::Durable => label.dimmed().to_string(),
    }
}

#[derive(Tabled)]
struct UserRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "HANDLE")]
    username: String,
    #[tabled(rename = "NAME")]
    name: String,
}

impl Formattable for TwitterUser {
    fn format(&self, format: OutputFormat) -> Result<String> {
        Ok(match format {
            OutputFormat::Json => format_json(self)?,
            OutputFormat::Table => format_table(&[UserRow {
                id: self.id.clone(),
                username: self.username.clone(),
                name: self.name.clone(),
            }]),
            OutputFormat::Pretty => {
                let mut out = format!(
                    "{} {}\nID: {}",
                    self.name.bold(),
                    format!("@{}", self.username).cyan(),
                    self.id
                );
                if let Some(description) = self.description.as_deref().filter(|d| !d.is_empty()) {
                    out.push('\n');
                    out.push_str(description);
                }
                out
            }
        })
    }
}

#[derive(Tabled)]
struct DraftRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "DRAFT")]
    text: String,
}

impl Formattable for Vec<GeneratedDraft> {
    fn format(&self, format: OutputFormat) -> Result<String> {
        Ok(match format {
            OutputFormat::Json => format_json(self)?,
            OutputFormat::Table => {
                let rows: Vec<DraftRow> = self
                    .iter()
                    .enumerate()
                    .map(|(i, d)| DraftRow {
                        index: i + 1,
                        id: d.id.clone(),
                        text: truncate_text(&d.text, TEXT_WIDTH),
                    })
                    .collect();
                format_table(&rows)
            }
            OutputFormat::Pretty => self
                .iter()
                .enumerate()
                .map(|(i, d)| format!("{} {}", format!("{}.", i + 1).bold(), d.text))
                .collect::<Vec<_>>()
                .join("\n\n"),
        })
    }
}

impl Formattable for PostedTweet {
    fn format(&self, format: OutputFormat) -> Result<String> {
        Ok(match format {
            OutputFormat::Json => format_json(self)?,
            _ => format!("{} Posted tweet {}", "✓".green(), self.id.bold()),
        })
    }
}

impl Formattable for WebhookRegistration {
    fn format(&self, format: OutputFormat) -> Result<String> {
        Ok(match format {
            OutputFormat::Json => format_json(self)?,
            _ => format!(
                "{} Registered webhook {} for {}",
                "✓".green(),
                self.id.bold(),
                self.url
            ),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::PublicMetrics;
    use chrono::DateTime;

    fn tweet(id: &str, text: &str) -> Tweet {
        Tweet {
            id: id.to_string(),
            text: text.to_string(),
            author_id: "12345".to_string(),
            created_at: DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
            public_metrics: Some(PublicMetrics {
                like_count: 7,
                retweet_count: 2,
                ..Default::default()
            }),
        }
    }

    #[test]
    fn test_timeline_json_carries_source() {
        let view = TimelineView {
            username: "jack".to_string(),
            timeline: Cached {
                value: vec![tweet("1", "gm")],
                source: CacheSource::Stale,
            },
        };
        let out = view.format(OutputFormat::Json).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed["meta"]["source"], "stale");
        assert_eq!(parsed["data"][0]["id"], "1");
    }

    #[test]
    fn test_timeline_table() {
        let view = TimelineView {
            username: "jack".to_string(),
            timeline: Cached {
                value: vec![tweet("1", "gm"), tweet("2", "gn")],
                source: CacheSource::Live,
            },
        };
        let out = view.format(OutputFormat::Table).unwrap();
        assert!(out.contains("LIKES"));
        assert!(out.contains("gn"));
    }

    #[test]
    fn test_empty_timeline_pretty() {
        let view = TimelineView {
            username: "jack".to_string(),
            timeline: Cached {
                value: vec![],
                source: CacheSource::Live,
            },
        };
        assert!(view.format(OutputFormat::Pretty).unwrap().contains("No tweets found."));
    }

    #[test]
    fn test_drafts_pretty_numbered() {
        let drafts = vec![
            GeneratedDraft {
                id: "a".to_string(),
                text: "first".to_string(),
            },
            GeneratedDraft {
                id: "b".to_string(),
                text: "second".to_string(),
            },
        ];
        colored::control::set_override(false);
        let out = drafts.format(OutputFormat::Pretty).unwrap();
        assert_eq!(out, "1. first\n\n2. second");
    }

    #[test]
    fn test_user_table() {
        let user = TwitterUser {
            id: "42".to_string(),
            name: "Jack".to_string(),
            username: "jack".to_string(),
            description: None,
            profile_image_url: None,
        };
        let out = user.format(OutputFormat::Table).unwrap();
        assert!(out.contains("HANDLE"));
        assert!(out.contains("42"));
    }
}
