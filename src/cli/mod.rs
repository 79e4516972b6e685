//! CLI command definitions and handlers

use clap::{Parser, Subcommand};
pub use clap_complete::Shell;

pub mod args;
pub mod cache;
pub mod context;
pub mod draft;
pub mod init;
pub mod status;
pub mod twitter;
pub mod webhook;

pub use args::OutputFormat;
pub use context::CommandContext;

/// DraftGod CLI - rate-aware Twitter access and AI reply drafts
#[derive(Parser, Debug)]
#[command(name = "draftgod")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Output format (pretty, table, json)
    #[arg(
        long,
        global = true,
        env = "DRAFTGOD_FORMAT",
        default_value = "pretty",
        hide_env = true,
        hide_possible_values = true
    )]
    pub format: OutputFormat,

    /// Override config file location
    #[arg(long, global = true, env = "DRAFTGOD_CONFIG", hide_env = true)]
    pub config: Option<String>,

    /// Enable debug logging
    #[arg(long, global = true, env = "DRAFTGOD_DEBUG", hide_env = true)]
    pub debug: bool,

    /// Skip the durable timeline cache
    #[arg(long, global = true, env = "DRAFTGOD_NO_CACHE", hide_env = true)]
    pub no_cache: bool,

    /// Use canned Twitter and generator responses
    #[arg(long, global = true)]
    pub mock: bool,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize DraftGod configuration
    Init,

    /// Show credential and configuration status
    Status,

    /// Display version information
    Version,

    /// Look up a user by handle
    User {
        /// Handle, with or without a leading @
        username: String,
    },

    /// Look up a tweet by id
    Tweet {
        /// Tweet id
        id: String,
    },

    /// Show a user's recent tweets (cached)
    Timeline {
        /// Handle, with or without a leading @
        username: String,

        /// Number of tweets to show
        #[arg(long, short = 'n', default_value_t = 10)]
        count: usize,
    },

    /// Generate reply drafts for a tweet
    Draft {
        /// Tweet to reply to
        tweet_id: String,

        /// Account whose voice the drafts should imitate
        #[arg(long)]
        style: Option<String>,
    },

    /// Post a tweet
    Post {
        /// Tweet text
        text: String,

        /// Post as a reply to this tweet id
        #[arg(long)]
        reply_to: Option<String>,
    },

    /// Webhook CRC, signature and registration tools
    #[command(subcommand)]
    Webhook(WebhookCommands),

    /// Manage the local timeline cache
    #[command(subcommand)]
    Cache(CacheCommands),

    /// Generate shell completions
    #[command(after_help = "\
Static completions (subcommands/flags only):
  bash:   draftgod completion bash > /etc/bash_completion.d/draftgod
  zsh:    draftgod completion zsh > \"${fpath[1]}/_draftgod\"
  fish:   draftgod completion fish > ~/.config/fish/completions/draftgod.fish")]
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Webhook subcommands
#[derive(Subcommand, Debug)]
pub enum WebhookCommands {
    /// Compute the response token for a CRC challenge
    Crc {
        /// The crc_token Twitter sent
        token: String,
    },

    /// Check a delivery signature against a body (file or stdin)
    Verify {
        /// Value of the x-twitter-webhooks-signature header
        #[arg(long)]
        signature: String,

        /// Body file; reads stdin when omitted
        #[arg(long)]
        file: Option<String>,
    },

    /// Process a delivery as the webhook endpoint would
    Handle {
        /// Value of the x-twitter-webhooks-signature header
        #[arg(long)]
        signature: Option<String>,

        /// Body file; reads stdin when omitted
        #[arg(long)]
        file: Option<String>,
    },

    /// Register an https callback URL and subscribe it to events
    Register {
        /// Public https URL of the webhook endpoint
        url: String,
    },
}

/// Cache management subcommands
#[derive(Subcommand, Debug)]
pub enum CacheCommands {
    /// Show cache statistics
    Status,

    /// Clear all cached timelines
    Clear,

    /// Show cache directory path
    Path,
}
