//! # CLI Structure and Argument Parsing
//!
//! ```bash
//! # Pull new strips from the live archive
//! tome crawl
//! tome crawl --limit 5 --dry-run
//!
//! # Add known strips
//! tome add https://www.oglaf.com/glove/ --order 12 --tag Ivan
//! tome backfill 0=https://www.oglaf.com/cumsprite/ 1=https://www.oglaf.com/glove/
//!
//! # Lookups
//! tome find --tag ivan
//! tome show "rough trade"
//! tome list --format json
//! ```

use std::path::PathBuf;

use clap::{ArgGroup, Args, Parser, Subcommand};
use tome_core::{BacklogEntry, PublishOrder};

use crate::output::OutputFormat;

/// Main CLI structure for the `tome` command
#[derive(Parser, Clone, Debug)]
#[command(name = "tome")]
#[command(version)]
#[command(about = "tome - index and crawl a serialized comic archive", long_about = None)]
#[allow(clippy::struct_excessive_bools)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Show debug logging
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    /// Suppress informational messages (only show errors)
    #[arg(short = 'q', long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable all ANSI colors in output (also respects `NO_COLOR` env)
    #[arg(long = "no-color", global = true)]
    pub no_color: bool,

    /// Configuration file to use instead of the platform default
    #[arg(long, global = true, env = "TOME_CONFIG", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Snapshot file to read and write instead of the configured one
    #[arg(long, global = true, env = "TOME_SNAPSHOT", value_name = "FILE")]
    pub snapshot: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

/// Available subcommands
#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// Discover strips published since the last crawl
    Crawl {
        /// Stop after resolving this many strips
        #[arg(long)]
        limit: Option<usize>,

        /// Resolve and report without saving the snapshot
        #[arg(long)]
        dry_run: bool,
    },

    /// Resolve one strip from any of its pages and add it
    Add {
        /// URL of any page of the strip
        url: String,

        /// Publish order to file the strip under (default: after the newest)
        #[arg(long, value_parser = parse_publish_order)]
        order: Option<PublishOrder>,

        /// Tag to attach (repeatable)
        #[arg(long = "tag", value_name = "TAG")]
        tags: Vec<String>,

        /// Story arc to attach (repeatable)
        #[arg(long = "arc", value_name = "ARC")]
        arcs: Vec<String>,
    },

    /// Resolve and add many known strips concurrently
    Backfill {
        /// Entries as ORDER=URL
        #[arg(required = true, value_name = "ORDER=URL", value_parser = parse_backlog_entry)]
        entries: Vec<BacklogEntry>,

        /// Strips resolved in parallel (default from config)
        #[arg(long)]
        concurrency: Option<usize>,
    },

    /// Look strips up by URL, tag, story arc or publish order
    Find(FindArgs),

    /// Show one strip by title (case-insensitive)
    Show {
        /// Strip title
        title: String,
    },

    /// Attach tags to a strip
    Tag {
        /// Strip title (case-insensitive)
        title: String,

        /// Tags to attach
        #[arg(required = true)]
        tags: Vec<String>,
    },

    /// Attach story arcs to a strip
    Arc {
        /// Strip title (case-insensitive)
        title: String,

        /// Story arcs to attach
        #[arg(required = true)]
        arcs: Vec<String>,
    },

    /// List every strip in publish order
    List,
}

/// Arguments for `tome find`
#[derive(Args, Clone, Debug)]
#[command(group(ArgGroup::new("key").required(true).args(["url", "tag", "arc", "order"])))]
pub struct FindArgs {
    /// Strip owning this page URL
    #[arg(long)]
    pub url: Option<String>,

    /// Strips carrying this tag
    #[arg(long)]
    pub tag: Option<String>,

    /// Strips in this story arc
    #[arg(long)]
    pub arc: Option<String>,

    /// Strip at this publish order
    #[arg(long, value_parser = parse_publish_order)]
    pub order: Option<PublishOrder>,

    /// Match tags and arcs case-sensitively
    #[arg(long)]
    pub exact: bool,
}

fn parse_backlog_entry(raw: &str) -> Result<BacklogEntry, String> {
    raw.parse().map_err(|e: tome_core::Error| e.to_string())
}

fn parse_publish_order(raw: &str) -> Result<PublishOrder, String> {
    raw.parse().map_err(|e: tome_core::Error| e.to_string())
}
