//! Add command implementation

use anyhow::{Context as _, Result};
use colored::Colorize;
use tome_core::{Crawler, PublishOrder};

use crate::output::{print_json, print_strip_details};
use crate::utils::Context;

/// Execute the add command
pub async fn execute(
    ctx: &Context,
    url: &str,
    order: Option<PublishOrder>,
    tags: Vec<String>,
    arcs: Vec<String>,
) -> Result<()> {
    let index = ctx.load_index_or_empty()?.into_shared();
    let order = match order {
        Some(order) => order,
        None => index.read().await.next_publish_order(),
    };
    let crawler = Crawler::from_config(ctx.fetcher()?, &ctx.config);

    let spinner = ctx.spinner(&format!("Resolving {url}..."));
    let added = crawler.resolve_and_add(&index, url, order, tags, arcs).await;
    spinner.finish_and_clear();
    let strip = added.with_context(|| format!("Failed to add strip from {url}"))?;

    ctx.save_index(&*index.read().await)?;

    if ctx.format.is_machine() {
        print_json(&strip)?;
    } else {
        print!("{} ", "Added".green());
        print_strip_details(&strip);
    }
    Ok(())
}
