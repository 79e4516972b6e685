//! Draft generation command

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

use crate::cli::args::GlobalOptions;
use crate::cli::{CommandContext, OutputFormat};
use crate::error::Result;
use crate::output;
use crate::service::GenerateDraftsRequest;

fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Generate reply drafts for a tweet
pub async fn generate(opts: &GlobalOptions, tweet_id: &str, style: Option<&str>) -> Result<()> {
    let ctx = CommandContext::new(opts)?;
    let service = ctx.draft_service()?;
    let request = GenerateDraftsRequest {
        tweet_id: tweet_id.to_string(),
        style_account: style.map(str::to_string),
        use_mock: false,
    };

    let pb = (ctx.format == OutputFormat::Pretty).then(|| spinner("Generating drafts..."));
    let result = service.generate_drafts(&request).await;
    if let Some(pb) = pb {
        pb.finish_and_clear();
    }

    output::print(&result?, ctx.format)
}
