//! Configuration and snapshot location for one invocation.

use std::sync::Arc;

use anyhow::{Context as _, Result};
use indicatif::{ProgressBar, ProgressStyle};
use tome_core::{ArchiveIndex, Config, HttpFetcher, PageFetcher, SnapshotStore};
use tracing::debug;

use crate::cli::Cli;
use crate::output::OutputFormat;

/// Everything a command needs besides its own arguments.
pub struct Context {
    pub config: Config,
    pub store: SnapshotStore,
    pub format: OutputFormat,
    pub quiet: bool,
}

impl Context {
    /// Resolve configuration (`--config`, then the platform file, then
    /// defaults) and the snapshot path (`--snapshot`, then the config).
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let config = match &cli.config {
            Some(path) => Config::load_from(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => Config::load().context("Failed to load config")?,
        };
        let snapshot = cli
            .snapshot
            .clone()
            .unwrap_or_else(|| config.paths.snapshot.clone());
        debug!(snapshot = %snapshot.display(), "Using snapshot");

        Ok(Self {
            config,
            store: SnapshotStore::new(snapshot),
            format: cli.format,
            quiet: cli.quiet,
        })
    }

    /// Index from an existing snapshot; a missing file is an error.
    pub fn load_index(&self) -> Result<ArchiveIndex> {
        self.store.load_index().with_context(|| {
            format!(
                "Could not load snapshot {} (run 'tome crawl' first?)",
                self.store.path().display()
            )
        })
    }

    /// Index from the snapshot, or empty if there is none yet.
    pub fn load_index_or_empty(&self) -> Result<ArchiveIndex> {
        Ok(self.store.load_index_or_empty()?)
    }

    pub fn save_index(&self, index: &ArchiveIndex) -> Result<()> {
        self.store
            .save_index(index)
            .with_context(|| format!("Failed to save snapshot {}", self.store.path().display()))
    }

    /// HTTP fetcher configured from `[fetch]` and `[site]`.
    pub fn fetcher(&self) -> Result<Arc<dyn PageFetcher>> {
        Ok(Arc::new(HttpFetcher::from_config(
            &self.config.fetch,
            &self.config.site,
        )?))
    }

    /// Whether progress indicators should be drawn.
    pub const fn interactive(&self) -> bool {
        !self.quiet && !self.format.is_machine()
    }

    /// Spinner on stderr, hidden for quiet or machine output.
    pub fn spinner(&self, message: &str) -> ProgressBar {
        if !self.interactive() {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message(message.to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        pb
    }

    /// Progress bar over `len` items, hidden for quiet or machine output.
    pub fn progress_bar(&self, len: usize) -> ProgressBar {
        if !self.interactive() {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new(len as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{bar:30.green/bright_black} {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        pb
    }
}
