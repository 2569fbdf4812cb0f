//! tome CLI - index and crawl a serialized comic archive
//!
//! This is the main entry point for the `tome` command-line interface.
//! Each subcommand lives in its own module under `commands`.

use anyhow::Result;
use clap::Parser;

mod cli;
mod commands;
mod output;
mod utils;

use cli::{Cli, Commands};
use utils::{Context, initialize_logging};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    initialize_logging(&cli)?;

    let ctx = Context::from_cli(&cli)?;
    execute_command(cli.command, &ctx).await
}

async fn execute_command(command: Commands, ctx: &Context) -> Result<()> {
    match command {
        Commands::Crawl { limit, dry_run } => commands::crawl(ctx, limit, dry_run).await,
        Commands::Add {
            url,
            order,
            tags,
            arcs,
        } => commands::add(ctx, &url, order, tags, arcs).await,
        Commands::Backfill {
            entries,
            concurrency,
        } => commands::backfill(ctx, entries, concurrency).await,
        Commands::Find(args) => commands::find(ctx, &args),
        Commands::Show { title } => commands::show(ctx, &title),
        Commands::Tag { title, tags } => {
            commands::label(ctx, commands::LabelKind::Tag, &title, &tags)
        },
        Commands::Arc { title, arcs } => {
            commands::label(ctx, commands::LabelKind::Arc, &title, &arcs)
        },
        Commands::List => commands::list(ctx),
    }
}
