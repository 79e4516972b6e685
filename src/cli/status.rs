//! Status command implementation

use colored::Colorize;

use crate::cache::SqliteTimelineStore;
use crate::cli::OutputFormat;
use crate::cli::args::GlobalOptions;
use crate::config::Config;
use crate::error::Result;
use crate::output;

fn check(label: &str, present: bool, hint: &str) {
    if present {
        println!("{} {} configured", "✓".green(), label);
    } else {
        println!("{} {} not configured", "✗".red(), label);
        println!("  → {}", hint);
    }
}

/// Run the status command to display configuration status
pub fn run(opts: &GlobalOptions) -> Result<()> {
    let config_path = Config::resolve_path(opts.config_ref())?;
    let mut config = Config::load_at(opts.config_ref())?;
    if opts.mock {
        config.mode = crate::config::ProviderMode::Mock;
    }
    let t = &config.twitter;
    let oauth_ready = config.require_oauth_credentials().is_ok();

    if opts.format == OutputFormat::Json {
        let json = serde_json::json!({
            "config_path": config_path.display().to_string(),
            "config_exists": config_path.exists(),
            "mode": config.mode,
            "bearer_token": t.bearer_token.is_some(),
            "oauth": oauth_ready,
            "webhook_secret": t.webhook_secret.is_some(),
            "anthropic_api_key": config.anthropic_api_key.is_some(),
            "monitoring_users": config.users.len(),
        });
        output::print_object(&json)?;
        return Ok(());
    }

    println!("{}\n", "DraftGod Configuration Status".bold());

    let location = config_path.display().to_string();
    if config_path.exists() {
        println!("Config file: {}", location.cyan());
    } else {
        println!("Config file: {} {}", location.cyan(), "(not found, using environment)".dimmed());
    }

    if config.mode.is_mock() {
        println!("Mode: {}", "mock".yellow());
        println!("  → Set MOCK_TWITTER_API=false to call the real APIs");
    } else {
        println!("Mode: {}", "live".green());
    }
    println!();

    check(
        "Bearer token",
        t.bearer_token.is_some(),
        "Set TWITTER_BEARER_TOKEN or run 'draftgod init'",
    );
    check(
        "OAuth user credentials",
        oauth_ready,
        "Needed to post; set TWITTER_API_KEY, TWITTER_API_SECRET, TWITTER_ACCESS_TOKEN, TWITTER_ACCESS_SECRET",
    );
    check(
        "Webhook secret",
        t.webhook_secret.is_some(),
        "Set TWITTER_CONSUMER_SECRET",
    );
    check(
        "Anthropic API key",
        config.anthropic_api_key.is_some(),
        "Set ANTHROPIC_API_KEY",
    );

    if !config.users.is_empty() {
        println!(
            "{} {} user(s) with monitored accounts",
            "○".dimmed(),
            config.users.len()
        );
    }

    match SqliteTimelineStore::cache_dir() {
        Ok(dir) => println!("\nCache: {}", dir.display().to_string().dimmed()),
        Err(_) => println!("\nCache: {}", "unavailable".dimmed()),
    }

    println!();
    Ok(())
}
