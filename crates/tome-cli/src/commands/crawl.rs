//! Crawl command implementation

use anyhow::{Result, bail};
use colored::Colorize;
use serde_json::json;
use tome_core::{Crawler, StopReason};

use crate::output::{print_json, strip_line};
use crate::utils::Context;

/// Execute the crawl command
pub async fn execute(ctx: &Context, limit: Option<usize>, dry_run: bool) -> Result<()> {
    let index = ctx.load_index_or_empty()?.into_shared();
    let crawler = Crawler::from_config(ctx.fetcher()?, &ctx.config);

    let spinner = ctx.spinner(&format!("Crawling {}...", ctx.config.site.archive_url()));
    let report = crawler.discover(&index, limit).await;
    spinner.finish_and_clear();
    let report = report?;

    if !dry_run && !report.added.is_empty() {
        ctx.save_index(&*index.read().await)?;
    }

    if ctx.format.is_machine() {
        print_json(&json!({
            "added": report.added,
            "rejected": report.rejected.iter().map(|r| json!({
                "title": r.title,
                "url": r.url,
                "error": r.error.to_string(),
            })).collect::<Vec<_>>(),
            "failure": report.failure.as_ref().map(ToString::to_string),
            "stop": report.stop,
            "dryRun": dry_run,
        }))?;
    } else {
        for strip in &report.added {
            println!("{} {}", "+".green(), strip_line(strip));
        }
        for rejection in &report.rejected {
            println!(
                "{} {} ({}): {}",
                "!".yellow(),
                rejection.title,
                rejection.url.bright_black(),
                rejection.error
            );
        }
        if !ctx.quiet {
            let reason = match report.stop {
                StopReason::KnownStrip => "caught up with the index",
                StopReason::ArchiveStart => "reached the start of the archive",
                StopReason::Limit => "limit reached",
                StopReason::Failed => "stopped on an error",
            };
            let verb = if dry_run { "Would add" } else { "Added" };
            eprintln!("{verb} {} new strip(s); {reason}", report.added.len());
        }
    }

    if let Some(failure) = report.failure {
        bail!("Crawl incomplete: {failure}");
    }
    Ok(())
}
