//! Webhook commands: CRC answers, signature checks, local delivery and
//! registration

use std::io::Read;

use colored::Colorize;

use crate::cli::args::GlobalOptions;
use crate::cli::{CommandContext, OutputFormat};
use crate::client::TwitterApi;
use crate::config::Config;
use crate::error::{ConfigError, Error, Result};
use crate::output;
use crate::webhook::WebhookVerifier;

fn read_body(file: Option<&str>) -> Result<Vec<u8>> {
    match file {
        Some(path) => Ok(std::fs::read(path)?),
        None => {
            let mut body = Vec::new();
            std::io::stdin().read_to_end(&mut body)?;
            Ok(body)
        }
    }
}

fn verifier(opts: &GlobalOptions) -> Result<WebhookVerifier> {
    let config = Config::load_at(opts.config_ref())?;
    Ok(WebhookVerifier::new(config.require_webhook_secret()?))
}

/// Compute the CRC response token
pub fn crc(opts: &GlobalOptions, token: &str) -> Result<()> {
    let response_token = verifier(opts)?.handle_challenge(token)?;
    match opts.format {
        OutputFormat::Json => {
            let json = serde_json::json!({ "response_token": response_token });
            output::print_object(&json)?;
        }
        _ => println!("{}", response_token),
    }
    Ok(())
}

/// Check a signature. An invalid signature is an error exit.
pub fn verify(opts: &GlobalOptions, signature: &str, file: Option<&str>) -> Result<()> {
    let body = read_body(file)?;
    let valid = verifier(opts)?.verify_signature(Some(signature), &body);

    match opts.format {
        OutputFormat::Json => {
            let json = serde_json::json!({ "valid": valid });
            output::print_object(&json)?;
        }
        _ if valid => println!("{} Signature valid", "✓".green()),
        _ => {}
    }

    if valid {
        Ok(())
    } else {
        Err(Error::Other("Signature does not match body".to_string()))
    }
}

/// Run a delivery through the webhook handler and print its response,
/// followed by each configured user's review queue
pub async fn handle(opts: &GlobalOptions, signature: Option<&str>, file: Option<&str>) -> Result<()> {
    let body = read_body(file)?;
    let ctx = CommandContext::new(opts)?;
    let service = ctx.draft_service()?;
    let response = service.handle_webhook(signature, &body).await;

    let mut review = Vec::with_capacity(ctx.config.users.len());
    for user in &ctx.config.users {
        review.push(service.review_queue(&user.user_id).await?);
    }

    output::print_object(&serde_json::json!({
        "status": response.status,
        "body": response.body,
        "review": review,
    }))?;

    if response.is_success() {
        Ok(())
    } else {
        Err(Error::Other(format!("Webhook handler returned {}", response.status)))
    }
}

/// Callback URLs must be absolute https URLs
fn validate_callback_url(url: &str) -> Result<()> {
    let host = url
        .strip_prefix("https://")
        .map(|rest| rest.split(['/', '?', '#']).next().unwrap_or_default())
        .unwrap_or_default();
    if host.is_empty() {
        return Err(ConfigError::Invalid(format!(
            "Webhook URL must be an absolute https URL, got '{}'",
            url
        ))
        .into());
    }
    Ok(())
}

/// Register a webhook URL and subscribe it
pub async fn register(opts: &GlobalOptions, url: &str) -> Result<()> {
    validate_callback_url(url)?;
    let ctx = CommandContext::new(opts)?;
    let registration = ctx.twitter.register_webhook(url).await?;
    output::print(&registration, ctx.format)
}
