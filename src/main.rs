//! DraftGod CLI - drive the Twitter access layer from a terminal

use std::io;

use clap::{CommandFactory, Parser};
use log::LevelFilter;

use draftgod::cli::args::GlobalOptions;
use draftgod::cli::{self, CacheCommands, Cli, Commands, WebhookCommands};
use draftgod::error::Result;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.debug);

    if let Err(err) = run(cli).await {
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }
}

/// `--debug` forces debug level; otherwise `RUST_LOG` applies, default warn.
fn init_logging(debug: bool) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if debug {
        builder.filter_level(LevelFilter::Debug);
    }
    builder.format_timestamp(None).init();
}

async fn run(cli: Cli) -> Result<()> {
    let opts = GlobalOptions::from_cli(&cli);

    match cli.command {
        Commands::Init => cli::init::run(&opts),
        Commands::Status => cli::status::run(&opts),
        Commands::Version => {
            println!("draftgod version {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Commands::User { username } => cli::twitter::user(&opts, &username).await,
        Commands::Tweet { id } => cli::twitter::tweet(&opts, &id).await,
        Commands::Timeline { username, count } => {
            cli::twitter::timeline(&opts, &username, count).await
        }
        Commands::Draft { tweet_id, style } => {
            cli::draft::generate(&opts, &tweet_id, style.as_deref()).await
        }
        Commands::Post { text, reply_to } => {
            cli::twitter::post(&opts, &text, reply_to.as_deref()).await
        }
        Commands::Webhook(webhook_cmd) => match webhook_cmd {
            WebhookCommands::Crc { token } => cli::webhook::crc(&opts, &token),
            WebhookCommands::Verify { signature, file } => {
                cli::webhook::verify(&opts, &signature, file.as_deref())
            }
            WebhookCommands::Handle { signature, file } => {
                cli::webhook::handle(&opts, signature.as_deref(), file.as_deref()).await
            }
            WebhookCommands::Register { url } => cli::webhook::register(&opts, &url).await,
        },
        Commands::Cache(cache_cmd) => match cache_cmd {
            CacheCommands::Status => cli::cache::status(&opts),
            CacheCommands::Clear => cli::cache::clear(opts.format),
            CacheCommands::Path => cli::cache::path(),
        },
        Commands::Completion { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "draftgod", &mut io::stdout());
            Ok(())
        }
    }
}
