//! Global CLI options shared across all commands

use crate::cli::{Cli, OutputFormat};

/// Global flags, captured once after parsing and passed to every handler.
///
/// Precedence is CLI flag > environment variable > config file > default.
/// Config file values are resolved later in `CommandContext`.
#[derive(Debug, Clone, Default)]
pub struct GlobalOptions {
    /// Output format (pretty, table, json)
    pub format: OutputFormat,

    /// Custom config file path (defaults to ~/.draftgod/config.yaml)
    pub config: Option<String>,

    /// Skip the durable timeline cache
    pub no_cache: bool,

    /// Force canned providers regardless of configuration
    pub mock: bool,
}

impl GlobalOptions {
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            format: cli.format,
            config: cli.config.clone(),
            no_cache: cli.no_cache,
            mock: cli.mock,
        }
    }

    /// Get config path as `Option<&str>`.
    pub fn config_ref(&self) -> Option<&str> {
        self.config.as_deref()
    }
}
