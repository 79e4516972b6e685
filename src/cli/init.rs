//! Init command implementation

use colored::Colorize;
use dialoguer::{Confirm, Password, theme::ColorfulTheme};

use crate::cli::args::GlobalOptions;
use crate::config::{Config, ProviderMode};
use crate::error::Result;

/// Prompt for a secret, keeping `current` when the answer is blank
fn secret(theme: &ColorfulTheme, prompt: &str, current: Option<String>) -> Result<Option<String>> {
    let hint = if current.is_some() {
        format!("{} (leave blank to keep)", prompt)
    } else {
        prompt.to_string()
    };
    let value: String = Password::with_theme(theme)
        .with_prompt(hint)
        .allow_empty_password(true)
        .interact()?;
    let value = value.trim();
    Ok(if value.is_empty() {
        current
    } else {
        Some(value.to_string())
    })
}

/// Run the init command.
///
/// Existing values are kept for every blank answer, so re-running init only
/// changes what the user types.
pub fn run(opts: &GlobalOptions) -> Result<()> {
    let path = Config::resolve_path(opts.config_ref())?;
    let mut config = if path.exists() {
        Config::load_from(path.clone())?
    } else {
        Config::default()
    };
    let theme = ColorfulTheme::default();

    println!("{}", "Welcome to DraftGod!".bold().green());
    println!("Let's set up your Twitter and Anthropic credentials.\n");

    let t = &mut config.twitter;
    t.bearer_token = secret(&theme, "Twitter bearer token", t.bearer_token.take())?;
    t.api_key = secret(&theme, "Twitter API key", t.api_key.take())?;
    t.api_secret = secret(&theme, "Twitter API secret", t.api_secret.take())?;
    t.access_token = secret(&theme, "Twitter access token", t.access_token.take())?;
    t.access_secret = secret(&theme, "Twitter access secret", t.access_secret.take())?;
    t.webhook_secret = secret(
        &theme,
        "Twitter consumer secret (webhook signing)",
        t.webhook_secret.take(),
    )?;
    config.anthropic_api_key = secret(
        &theme,
        "Anthropic API key",
        config.anthropic_api_key.take(),
    )?;

    let live = Confirm::with_theme(&theme)
        .with_prompt("Call the real APIs? (no = canned mock responses)")
        .default(!config.mode.is_mock())
        .interact()?;
    config.mode = if live {
        ProviderMode::Live
    } else {
        ProviderMode::Mock
    };

    config.save_to(path.clone())?;

    println!("\n{} Configuration saved to: {}", "✓".green(), path.display());
    println!("\n{}", "You're all set! Try running:".bold());
    println!("  {} - Show configuration status", "draftgod status".cyan());
    println!("  {} - Show recent tweets", "draftgod timeline <handle>".cyan());
    println!("  {} - Draft replies", "draftgod draft <tweet-id>".cyan());

    Ok(())
}
