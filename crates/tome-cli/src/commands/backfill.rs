//! Backfill command implementation

use anyhow::{Result, bail};
use colored::Colorize;
use serde_json::json;
use tome_core::{BacklogEntry, Crawler};

use crate::output::{print_json, strip_line};
use crate::utils::Context;

/// Execute the backfill command
pub async fn execute(
    ctx: &Context,
    entries: Vec<BacklogEntry>,
    concurrency: Option<usize>,
) -> Result<()> {
    let index = ctx.load_index_or_empty()?.into_shared();
    let concurrency = concurrency.unwrap_or(ctx.config.fetch.concurrency);
    let total = entries.len();

    let pb = ctx.progress_bar(total);
    let progress = pb.clone();
    let crawler = Crawler::from_config(ctx.fetcher()?, &ctx.config)
        .with_progress(move |done, _| progress.set_position(done as u64));
    let outcomes = crawler.backfill(&index, entries, concurrency).await;
    pb.finish_and_clear();

    let failed = outcomes.iter().filter(|o| o.result.is_err()).count();
    if failed < total {
        ctx.save_index(&*index.read().await)?;
    }

    if ctx.format.is_machine() {
        let rows: Vec<_> = outcomes
            .iter()
            .map(|o| match &o.result {
                Ok(strip) => json!({ "url": o.url, "order": o.order, "strip": strip }),
                Err(e) => json!({ "url": o.url, "order": o.order, "error": e.to_string() }),
            })
            .collect();
        print_json(&rows)?;
    } else {
        for outcome in &outcomes {
            match &outcome.result {
                Ok(strip) => println!("{} {}", "+".green(), strip_line(strip)),
                Err(e) => println!(
                    "{} {:>5}  {}: {e}",
                    "x".red(),
                    outcome.order,
                    outcome.url.bright_black()
                ),
            }
        }
    }

    if failed > 0 {
        bail!("{failed} of {total} backfill entries failed");
    }
    Ok(())
}
