//! # tome-core
//!
//! Core functionality for tome - an index of a serialized comic archive that
//! grows by crawling the live site page by page.
//!
//! ## Architecture
//!
//! - **Index**: one record per strip plus secondary lookups by URL, tag,
//!   story arc and publish order, kept consistent on every mutation
//! - **Resolver**: works out which physical pages make up one strip
//! - **Fetcher**: HTTP access with the site's age cookie and "come back later" retries
//! - **Snapshot**: the JSON file the whole index is persisted to
//! - **Crawl**: discovery of new strips and concurrent backfills
//!
//! ## Quick Start
//!
//! ```rust
//! use tome_core::{ArchiveIndex, NewStrip, PublishOrder};
//!
//! let mut index = ArchiveIndex::new();
//! index.add_strip(
//!     NewStrip::new("Glove", vec!["https://www.oglaf.com/glove/".into()], PublishOrder::from(0))
//!         .with_tags(vec!["Ivan".into()]),
//! )?;
//!
//! assert_eq!(index.title_for_url("https://www.oglaf.com/glove/"), Some("Glove"));
//! assert_eq!(index.resolve_tag("ivan"), Some("Ivan"));
//! # Ok::<(), tome_core::Error>(())
//! ```
//!
//! ## Error Handling
//!
//! All operations return [`Result<T, Error>`]. Index rejections are ordinary
//! values the caller may skip past:
//!
//! ```rust
//! use tome_core::{ArchiveIndex, Error, NewStrip, PublishOrder};
//!
//! let mut index = ArchiveIndex::new();
//! index.add_strip(NewStrip::new("A", vec!["https://x/a/".into()], PublishOrder::from(0)))?;
//! match index.add_strip(NewStrip::new("B", vec!["https://x/a/".into()], PublishOrder::from(1))) {
//!     Err(Error::DuplicateUrl { owner, .. }) => assert_eq!(owner, "A"),
//!     other => panic!("unexpected: {other:?}"),
//! }
//! # Ok::<(), tome_core::Error>(())
//! ```

/// Configuration for the site, fetching and local paths
pub mod config;
/// Discovery and backfill against the live archive
pub mod crawl;
/// Error types and result aliases
pub mod error;
/// HTTP page fetching with retry on "come back later"
pub mod fetcher;
/// Multi-relation archive index
pub mod index;
/// HTML queries over fetched pages
pub mod markup;
/// Strip boundary resolution
pub mod resolver;
/// JSON snapshot persistence
pub mod snapshot;
/// Core data types
pub mod types;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod test_support;

// Re-export commonly used types
pub use config::{Config, FetchConfig, PathsConfig, SiteConfig};
pub use crawl::{
    BackfillOutcome, BacklogEntry, Crawler, DiscoveryReport, Rejection, StopReason,
    newest_strip_url,
};
pub use error::{Error, Result};
pub use fetcher::{HttpFetcher, PageFetcher, RetryPolicy};
pub use index::{ArchiveIndex, SharedIndex};
pub use markup::StripPage;
pub use resolver::StripResolver;
pub use snapshot::SnapshotStore;
pub use types::*;
