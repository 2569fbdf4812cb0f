//! Error types and handling for tome-core operations.
//!
//! Errors fall into a few families:
//!
//! - **Resource errors**: the snapshot file is missing or unreadable
//! - **Snapshot errors**: persisted data that cannot be turned into an index
//! - **Fetch errors**: non-success HTTP responses and transport failures
//! - **Markup errors**: pages missing the elements strip resolution depends on
//! - **Index errors**: `add_strip` calls that would break an index invariant
//!
//! Transient "come back later" responses are absorbed by the fetcher's retry
//! loop and never show up here unless the retry budget is exhausted.
//!
//! ```rust
//! use tome_core::Error;
//!
//! let err = Error::DuplicateTitle("Cumsprite".to_string());
//! assert_eq!(err.category(), "index");
//! assert!(!err.is_recoverable());
//! ```

use std::path::PathBuf;

use thiserror::Error;

use crate::types::PublishOrder;

/// The main error type for tome-core operations.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation failed outside of snapshot loading.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Transport-level network failure (connection refused, timeout, TLS).
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The snapshot file is absent or cannot be read.
    #[error("Snapshot not found or unreadable: {}: {source}", path.display())]
    ResourceUnavailable {
        /// Path that was requested.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The snapshot exists but its contents cannot form a valid index.
    #[error("Malformed snapshot {}: {reason}", path.display())]
    MalformedSnapshot {
        /// Snapshot location, or `<memory>` for in-memory data.
        path: PathBuf,
        /// What was wrong with it.
        reason: String,
    },

    /// The server answered with a non-success status that is not retried.
    #[error("Failed to fetch {url} (HTTP {status})")]
    FetchFailed {
        /// URL that was requested.
        url: String,
        /// HTTP status code returned.
        status: u16,
    },

    /// A strip page carried no canonical link, so its identity is unknown.
    #[error("Page {url} has no canonical link")]
    MissingCanonical {
        /// URL the page was fetched from.
        url: String,
    },

    /// Page markup did not have the shape strip resolution expects.
    #[error("Markup error: {0}")]
    Markup(String),

    /// A strip with this title is already indexed.
    #[error("Title '{0}' already exists")]
    DuplicateTitle(String),

    /// Another strip already holds this publish order.
    #[error("Publish order {0} is already taken")]
    DuplicatePublishOrder(PublishOrder),

    /// A URL is already owned by a strip (possibly the one being added).
    #[error("URL {url} already belongs to '{owner}'")]
    DuplicateUrl {
        /// The conflicting URL.
        url: String,
        /// Title that already owns it.
        owner: String,
    },

    /// A strip was submitted without any page URLs.
    #[error("Strip '{0}' has no URLs")]
    EmptyUrlList(String),

    /// A strip was submitted with a blank title.
    #[error("Strip title must not be empty")]
    EmptyTitle,

    /// A blank tag or story arc was submitted.
    #[error("Label must not be empty")]
    EmptyLabel,

    /// Requested title, tag, arc or order does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Configuration is invalid or inaccessible.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization or deserialization failed.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<toml::ser::Error> for Error {
    fn from(err: toml::ser::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl Error {
    /// Check if the error might go away if the operation is retried later.
    ///
    /// Connection failures, timeouts and server-side 5xx/421/429 responses are
    /// recoverable; invariant violations and malformed data are not.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Network(e) => e.is_timeout() || e.is_connect(),
            Self::FetchFailed { status, .. } => {
                matches!(status, 421 | 429) || (500..=599).contains(status)
            },
            Self::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::TimedOut | std::io::ErrorKind::Interrupted
            ),
            _ => false,
        }
    }

    /// Get the error category as a string identifier for logs and reports.
    #[must_use]
    pub const fn category(&self) -> &'static str {
        match self {
            Self::Io(_) => "io",
            Self::Network(_) | Self::FetchFailed { .. } => "network",
            Self::ResourceUnavailable { .. } | Self::MalformedSnapshot { .. } => "snapshot",
            Self::MissingCanonical { .. } | Self::Markup(_) => "markup",
            Self::DuplicateTitle(_)
            | Self::DuplicatePublishOrder(_)
            | Self::DuplicateUrl { .. }
            | Self::EmptyUrlList(_)
            | Self::EmptyTitle
            | Self::EmptyLabel => "index",
            Self::NotFound(_) => "not_found",
            Self::Config(_) => "config",
            Self::Serialization(_) => "serialization",
        }
    }

    /// True for the rejections index mutations return when an invariant would break.
    #[must_use]
    pub const fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::DuplicateTitle(_)
                | Self::DuplicatePublishOrder(_)
                | Self::DuplicateUrl { .. }
                | Self::EmptyUrlList(_)
                | Self::EmptyTitle
                | Self::EmptyLabel
        )
    }
}

/// Convenience type alias for Results with our Error type.
pub type Result<T> = std::result::Result<T, Error>;
