use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Unique ordering key that places every strip in a total publish order.
///
/// Older snapshots spell the key as a string (`"12"`), newer ones as a number,
/// and the spelling survives a load and save. Keys that read as the same number
/// are the same key. Keys that are not numbers at all sort after every numeric
/// one, by spelling.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PublishOrder {
    /// Spelled as a JSON number.
    Number(u64),
    /// Spelled as a JSON string, numeric or not.
    Text(String),
}

impl PublishOrder {
    /// Numeric value of the key, if it has one.
    #[must_use]
    pub fn value(&self) -> Option<u64> {
        self.sort_key().ok()
    }

    /// The order directly after this one, spelled the same way.
    ///
    /// Non-numeric keys have no successor.
    #[must_use]
    pub fn next(&self) -> Option<Self> {
        match self {
            Self::Number(n) => Some(Self::Number(n.saturating_add(1))),
            Self::Text(_) => self
                .value()
                .map(|n| Self::Text(n.saturating_add(1).to_string())),
        }
    }

    fn sort_key(&self) -> std::result::Result<u64, &str> {
        match self {
            Self::Number(n) => Ok(*n),
            Self::Text(text) => text.parse().map_err(|_| text.as_str()),
        }
    }
}

impl Default for PublishOrder {
    fn default() -> Self {
        Self::Number(0)
    }
}

impl PartialEq for PublishOrder {
    fn eq(&self, other: &Self) -> bool {
        self.sort_key() == other.sort_key()
    }
}

impl Eq for PublishOrder {}

impl PartialOrd for PublishOrder {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

// `Ok` sorts before `Err`, which puts numeric keys first.
impl Ord for PublishOrder {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sort_key().cmp(&other.sort_key())
    }
}

impl Hash for PublishOrder {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.sort_key().hash(state);
    }
}

impl fmt::Display for PublishOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => fmt::Display::fmt(n, f),
            Self::Text(text) => f.pad(text),
        }
    }
}

impl From<u64> for PublishOrder {
    fn from(value: u64) -> Self {
        Self::Number(value)
    }
}

/// Parses user input: digits become a number, anything else an opaque key.
impl FromStr for PublishOrder {
    type Err = Error;

    fn from_str(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(Error::Config("publish order must not be empty".to_string()));
        }
        Ok(raw
            .parse()
            .map_or_else(|_| Self::Text(raw.to_string()), Self::Number))
    }
}

/// One logical comic entry as held by the index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Strip {
    /// Unique, case-sensitive title.
    pub title: String,
    /// Physical page URLs in discovery order; never empty.
    pub urls: Vec<String>,
    /// Position in the publish order.
    pub publish_order: PublishOrder,
    /// Tag labels in insertion order, without duplicates.
    pub tags: Vec<String>,
    /// Story arc labels in insertion order, without duplicates.
    pub arcs: Vec<String>,
}

/// Input to [`ArchiveIndex::add_strip`](crate::ArchiveIndex::add_strip).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewStrip {
    /// Title of the strip.
    pub title: String,
    /// Physical page URLs.
    pub urls: Vec<String>,
    /// Requested publish order.
    pub publish_order: PublishOrder,
    /// Initial tags.
    pub tags: Vec<String>,
    /// Initial story arcs.
    pub arcs: Vec<String>,
}

impl NewStrip {
    /// Start a strip with no tags or arcs.
    #[must_use]
    pub fn new(title: impl Into<String>, urls: Vec<String>, publish_order: PublishOrder) -> Self {
        Self {
            title: title.into(),
            urls,
            publish_order,
            tags: Vec::new(),
            arcs: Vec::new(),
        }
    }

    /// Attach tags using builder pattern.
    #[must_use]
    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    /// Attach story arcs using builder pattern.
    #[must_use]
    pub fn with_arcs(mut self, arcs: Vec<String>) -> Self {
        self.arcs = arcs;
        self
    }
}

/// Everything the resolver learned about one strip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedStrip {
    /// Document title of the first physical page, minus any " page 1" suffix.
    pub title: String,
    /// Physical pages in visit order; the first page is index 0.
    pub urls: Vec<String>,
    /// Link to the preceding strip, absent for the first strip of the archive.
    pub prev: Option<String>,
    /// Link to the following strip, absent for the newest strip.
    pub next: Option<String>,
}

impl ResolvedStrip {
    /// Turn the resolution into an index insertion at `publish_order`.
    #[must_use]
    pub fn into_new_strip(self, publish_order: PublishOrder) -> NewStrip {
        NewStrip::new(self.title, self.urls, publish_order)
    }
}

/// Persisted record for one strip, keyed by title in a [`Snapshot`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotRecord {
    /// Physical page URLs.
    pub urls: Vec<String>,
    /// Publish order key.
    pub publish_order: PublishOrder,
    /// Tags.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Story arcs.
    #[serde(default)]
    pub arcs: Vec<String>,
}

/// The persisted form of the whole index: title to record.
pub type Snapshot = BTreeMap<String, SnapshotRecord>;
