//! Configuration for the archive crawler.
//!
//! Configuration is stored as TOML. Every table and field has a default, so
//! an empty (or missing) file is a valid configuration.
//!
//! ## Resolution order
//!
//! 1. An explicit path (`--config` / `TOME_CONFIG`)
//! 2. `config.toml` in the platform config directory
//! 3. Built-in defaults
//!
//! `TOME_DATA_DIR` overrides the directory holding the snapshot.
//!
//! ## Example
//!
//! ```toml
//! [site]
//! protohost = "https://www.oglaf.com"
//! archive_path = "/archive/"
//! age_cookie = true
//!
//! [fetch]
//! retry_delay_ms = 5000
//! max_retries = 12
//! concurrency = 4
//!
//! [paths]
//! snapshot = "/home/user/.local/share/tome/meta.json"
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::fetcher::RetryPolicy;
use crate::{Error, Result};

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where the archive lives and how to recognise its pages.
    pub site: SiteConfig,
    /// HTTP behaviour.
    pub fetch: FetchConfig,
    /// Local file locations.
    pub paths: PathsConfig,
}

/// The comic site being crawled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Scheme and host, without a trailing slash.
    pub protohost: String,
    /// Path of the archive listing page.
    pub archive_path: String,
    /// Send the age-confirmation cookie with every request.
    pub age_cookie: bool,
    /// `width` attribute of the newest-strip thumbnail on the listing page.
    pub thumbnail_width: u32,
    /// `height` attribute of the newest-strip thumbnail on the listing page.
    pub thumbnail_height: u32,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            protohost: "https://www.oglaf.com".to_string(),
            archive_path: "/archive/".to_string(),
            age_cookie: true,
            thumbnail_width: 400,
            thumbnail_height: 100,
        }
    }
}

impl SiteConfig {
    /// Absolute URL of the archive listing page.
    #[must_use]
    pub fn archive_url(&self) -> String {
        format!("{}{}", self.protohost.trim_end_matches('/'), self.archive_path)
    }
}

/// Fetching and traversal limits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Wait before retrying a "come back later" response.
    pub retry_delay_ms: u64,
    /// Retries per URL before giving up.
    pub max_retries: u32,
    /// Ignore `max_retries` and keep retrying until the server answers.
    pub retry_forever: bool,
    /// Per-request timeout.
    pub timeout_secs: u64,
    /// Strips resolved in parallel during a backfill.
    pub concurrency: usize,
    /// Physical pages one strip may span before resolution is abandoned.
    pub max_pages_per_strip: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            retry_delay_ms: 5_000,
            max_retries: 12,
            retry_forever: false,
            timeout_secs: 30,
            concurrency: 4,
            max_pages_per_strip: 64,
        }
    }
}

impl FetchConfig {
    /// Retry policy described by this table.
    #[must_use]
    pub const fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            delay: Duration::from_millis(self.retry_delay_ms),
            max_retries: if self.retry_forever {
                None
            } else {
                Some(self.max_retries)
            },
        }
    }
}

/// Local paths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Snapshot file holding the whole index.
    pub snapshot: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            snapshot: default_data_dir().join("meta.json"),
        }
    }
}

impl Config {
    /// Load from the platform config directory, or defaults if no file exists.
    pub fn load() -> Result<Self> {
        match Self::config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Load from an explicit file, which must exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read config {}: {e}", path.display()))
        })?;
        toml::from_str(&content).map_err(|e| {
            Error::Config(format!("Failed to parse config {}: {e}", path.display()))
        })
    }

    /// Write this configuration as TOML, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| Error::Config(format!("Failed to create config directory: {e}")))?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {e}")))?;
        fs::write(path, content)
            .map_err(|e| Error::Config(format!("Failed to write config: {e}")))?;
        Ok(())
    }

    /// Default config file location for this platform.
    #[must_use]
    pub fn config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "tome")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }
}

fn default_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("TOME_DATA_DIR") {
        let trimmed = dir.trim();
        if !trimmed.is_empty() {
            return PathBuf::from(trimmed);
        }
    }

    directories::ProjectDirs::from("", "", "tome").map_or_else(
        || {
            directories::BaseDirs::new().map_or_else(
                || PathBuf::from(".tome"),
                |base| base.home_dir().join(".tome"),
            )
        },
        |dirs| dirs.data_dir().to_path_buf(),
    )
}
