//! Cache management commands

use chrono::Utc;

use crate::cache::SqliteTimelineStore;
use crate::cli::OutputFormat;
use crate::cli::args::GlobalOptions;
use crate::config::Config;
use crate::error::Result;
use crate::output;
use crate::output::formatters::{format_local, format_size};

fn cache_path_display() -> String {
    SqliteTimelineStore::cache_dir()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|_| "unknown".to_string())
}

/// Show cache status/statistics. Freshness uses the configured TTL.
pub fn status(opts: &GlobalOptions) -> Result<()> {
    let config = Config::load_at(opts.config_ref())?;
    let store = SqliteTimelineStore::open()?;
    let stats = store.stats(Utc::now(), config.timeline_ttl())?;

    match opts.format {
        OutputFormat::Json => {
            let json = serde_json::json!({
                "total_entries": stats.total_entries,
                "fresh_entries": stats.fresh_entries,
                "stale_entries": stats.stale_entries,
                "total_size_bytes": stats.total_size_bytes,
                "total_size_human": format_size(stats.total_size_bytes),
                "oldest_entry": stats.oldest_entry.map(|t| t.to_rfc3339()),
                "newest_entry": stats.newest_entry.map(|t| t.to_rfc3339()),
                "ttl_hours": config.preferences.timeline_ttl_hours,
                "path": cache_path_display(),
            });
            output::print_object(&json)?;
        }
        _ => {
            println!("Cache Status");
            println!("────────────────────────────────────────");
            println!("Location:       {}", cache_path_display());
            println!("Timelines:      {}", stats.total_entries);
            println!(
                "Fresh:          {} (within {}h)",
                stats.fresh_entries, config.preferences.timeline_ttl_hours
            );
            println!("Stale:          {}", stats.stale_entries);
            println!("Total size:     {}", format_size(stats.total_size_bytes));

            if let Some(oldest) = stats.oldest_entry {
                println!("Oldest entry:   {}", format_local(oldest));
            }
            if let Some(newest) = stats.newest_entry {
                println!("Newest entry:   {}", format_local(newest));
            }
        }
    }

    Ok(())
}

/// Clear all cached timelines
pub fn clear(format: OutputFormat) -> Result<()> {
    let store = SqliteTimelineStore::open()?;
    let stats = store.clear_all()?;

    match format {
        OutputFormat::Json => {
            let json = serde_json::json!({
                "entries_removed": stats.entries_removed,
                "success": true,
            });
            output::print_object(&json)?;
        }
        _ => {
            if stats.entries_removed > 0 {
                println!("Cleared {} cached timelines", stats.entries_removed);
            } else {
                println!("Cache was already empty");
            }
        }
    }

    Ok(())
}

/// Show cache path
pub fn path() -> Result<()> {
    println!("{}", SqliteTimelineStore::cache_dir()?.display());
    Ok(())
}
