//! In-memory multi-relation index over every known strip.
//!
//! The index keeps one primary record per title and derives every other
//! relation from it:
//!
//! - `url -> title` (each URL owned by exactly one strip)
//! - `tag -> [title]` and `arc -> [title]` in insertion order
//! - `publish order -> title` (bijective)
//! - case-fold tables for titles, tags and arcs
//!
//! All mutations validate first and commit second, so a rejected call leaves
//! every relation exactly as it was.
//!
//! ```rust
//! use tome_core::{ArchiveIndex, NewStrip, PublishOrder};
//!
//! let mut index = ArchiveIndex::new();
//! index.add_strip(
//!     NewStrip::new("Glove", vec!["https://example.com/glove/".into()], PublishOrder::from(1))
//!         .with_tags(vec!["Ivan".into()]),
//! )?;
//!
//! assert_eq!(index.title_for_url("https://example.com/glove/"), Some("Glove"));
//! assert_eq!(index.titles_for_tag("Ivan"), ["Glove".to_string()]);
//! assert_eq!(index.resolve_title("GLOVE"), Some("Glove"));
//! # Ok::<(), tome_core::Error>(())
//! ```

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;

use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;
use tokio::sync::RwLock;
use tracing::debug;

use crate::{Error, NewStrip, PublishOrder, Result, Snapshot, SnapshotRecord, Strip};

/// Index shared between concurrent resolutions; `add_strip` runs under the write lock.
pub type SharedIndex = Arc<RwLock<ArchiveIndex>>;

/// Lowercase to canonical-casing lookup table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct CaseFold(HashMap<String, String>);

impl CaseFold {
    // First spelling wins so canonical casing never flips on later inserts.
    fn insert(&mut self, original: &str) {
        self.0
            .entry(original.to_lowercase())
            .or_insert_with(|| original.to_string());
    }

    fn resolve(&self, text: &str) -> Option<&str> {
        self.0.get(&text.to_lowercase()).map(String::as_str)
    }
}

#[derive(Debug, Clone, Copy)]
enum LabelKind {
    Tag,
    Arc,
}

/// Queryable store of every strip and the relations derived from it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArchiveIndex {
    strips: HashMap<String, Strip>,
    by_url: HashMap<String, String>,
    by_tag: HashMap<String, Vec<String>>,
    by_arc: HashMap<String, Vec<String>>,
    by_order: BTreeMap<PublishOrder, String>,
    titles_ci: CaseFold,
    tags_ci: CaseFold,
    arcs_ci: CaseFold,
}

impl ArchiveIndex {
    /// Create an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap this index for use across tasks.
    #[must_use]
    pub fn into_shared(self) -> SharedIndex {
        Arc::new(RwLock::new(self))
    }

    /// Build an index by replaying every record of `snapshot`.
    ///
    /// Records are inserted in publish order, so tag and arc listings come out
    /// in publish order as well. A record that lists the same tag or arc twice
    /// is malformed.
    pub fn from_snapshot(snapshot: &Snapshot) -> Result<Self> {
        let mut records: Vec<(&String, &SnapshotRecord)> = snapshot.iter().collect();
        records.sort_by(|(_, a), (_, b)| a.publish_order.cmp(&b.publish_order));

        let mut index = Self::new();
        for (title, record) in records {
            let malformed = |reason: String| Error::MalformedSnapshot {
                path: PathBuf::from("<memory>"),
                reason: format!("record '{title}': {reason}"),
            };
            if let Some(label) =
                repeated_label(&record.tags).or_else(|| repeated_label(&record.arcs))
            {
                return Err(malformed(format!("label '{label}' is listed twice")));
            }

            let strip = NewStrip {
                title: title.clone(),
                urls: record.urls.clone(),
                publish_order: record.publish_order.clone(),
                tags: record.tags.clone(),
                arcs: record.arcs.clone(),
            };
            index
                .add_strip(strip)
                .map_err(|err| malformed(err.to_string()))?;
        }

        debug!("Loaded {} strips from snapshot", index.len());
        Ok(index)
    }

    /// Replace every relation with the contents of `snapshot`.
    ///
    /// On failure the index keeps its previous contents.
    pub fn load_snapshot(&mut self, snapshot: &Snapshot) -> Result<()> {
        *self = Self::from_snapshot(snapshot)?;
        Ok(())
    }

    /// Project every strip back to its persisted record shape.
    #[must_use]
    pub fn serialize_snapshot(&self) -> Snapshot {
        self.strips
            .values()
            .map(|strip| {
                (
                    strip.title.clone(),
                    SnapshotRecord {
                        urls: strip.urls.clone(),
                        publish_order: strip.publish_order.clone(),
                        tags: strip.tags.clone(),
                        arcs: strip.arcs.clone(),
                    },
                )
            })
            .collect()
    }

    /// Validate and insert a new strip, updating every relation or none.
    pub fn add_strip(&mut self, strip: NewStrip) -> Result<()> {
        self.validate(&strip)?;

        let NewStrip {
            title,
            urls,
            publish_order,
            tags,
            arcs,
        } = strip;
        let tags = dedup_labels(tags);
        let arcs = dedup_labels(arcs);

        for url in &urls {
            self.by_url.insert(url.clone(), title.clone());
        }
        for tag in &tags {
            self.tags_ci.insert(tag);
            self.by_tag
                .entry(tag.clone())
                .or_default()
                .push(title.clone());
        }
        for arc in &arcs {
            self.arcs_ci.insert(arc);
            self.by_arc
                .entry(arc.clone())
                .or_default()
                .push(title.clone());
        }
        self.by_order.insert(publish_order.clone(), title.clone());
        self.titles_ci.insert(&title);

        debug!(%title, %publish_order, pages = urls.len(), "Indexed strip");
        self.strips.insert(
            title.clone(),
            Strip {
                title,
                urls,
                publish_order,
                tags,
                arcs,
            },
        );
        Ok(())
    }

    fn validate(&self, strip: &NewStrip) -> Result<()> {
        if strip.title.trim().is_empty() {
            return Err(Error::EmptyTitle);
        }
        if self.strips.contains_key(&strip.title) {
            return Err(Error::DuplicateTitle(strip.title.clone()));
        }
        if self.by_order.contains_key(&strip.publish_order) {
            return Err(Error::DuplicatePublishOrder(strip.publish_order.clone()));
        }
        if strip.urls.is_empty() {
            return Err(Error::EmptyUrlList(strip.title.clone()));
        }

        let mut seen = HashSet::with_capacity(strip.urls.len());
        for url in &strip.urls {
            if let Some(owner) = self.by_url.get(url) {
                return Err(Error::DuplicateUrl {
                    url: url.clone(),
                    owner: owner.clone(),
                });
            }
            if !seen.insert(url.as_str()) {
                return Err(Error::DuplicateUrl {
                    url: url.clone(),
                    owner: strip.title.clone(),
                });
            }
        }
        Ok(())
    }

    /// Attach `tag` to an existing strip. Returns `false` if it was already there.
    pub fn tag_strip(&mut self, title: &str, tag: &str) -> Result<bool> {
        self.attach_label(LabelKind::Tag, title, tag)
    }

    /// Attach story arc `arc` to an existing strip. Returns `false` if it was already there.
    pub fn add_arc(&mut self, title: &str, arc: &str) -> Result<bool> {
        self.attach_label(LabelKind::Arc, title, arc)
    }

    fn attach_label(&mut self, kind: LabelKind, title: &str, label: &str) -> Result<bool> {
        if label.trim().is_empty() {
            return Err(Error::EmptyLabel);
        }
        let strip = self
            .strips
            .get_mut(title)
            .ok_or_else(|| Error::NotFound(format!("strip '{title}'")))?;

        let (labels, relation, fold) = match kind {
            LabelKind::Tag => (&mut strip.tags, &mut self.by_tag, &mut self.tags_ci),
            LabelKind::Arc => (&mut strip.arcs, &mut self.by_arc, &mut self.arcs_ci),
        };
        if labels.iter().any(|existing| existing == label) {
            return Ok(false);
        }

        labels.push(label.to_string());
        relation
            .entry(label.to_string())
            .or_default()
            .push(title.to_string());
        fold.insert(label);
        Ok(true)
    }

    /// Title owning `url`, if any.
    #[must_use]
    pub fn title_for_url(&self, url: &str) -> Option<&str> {
        self.by_url.get(url).map(String::as_str)
    }

    /// Whether any strip owns `url`.
    #[must_use]
    pub fn contains_url(&self, url: &str) -> bool {
        self.by_url.contains_key(url)
    }

    /// Titles carrying exactly `tag`, in the order they were tagged.
    #[must_use]
    pub fn titles_for_tag(&self, tag: &str) -> &[String] {
        self.by_tag.get(tag).map_or(&[], Vec::as_slice)
    }

    /// Titles in story arc exactly `arc`, in the order they were added.
    #[must_use]
    pub fn titles_for_arc(&self, arc: &str) -> &[String] {
        self.by_arc.get(arc).map_or(&[], Vec::as_slice)
    }

    /// Title published at `order`, if any.
    #[must_use]
    pub fn title_at_publish_order(&self, order: &PublishOrder) -> Option<&str> {
        self.by_order.get(order).map(String::as_str)
    }

    /// Canonical casing of a title, matched case-insensitively.
    #[must_use]
    pub fn resolve_title(&self, text: &str) -> Option<&str> {
        self.titles_ci.resolve(text)
    }

    /// Canonical casing of a tag, matched case-insensitively.
    #[must_use]
    pub fn resolve_tag(&self, text: &str) -> Option<&str> {
        self.tags_ci.resolve(text)
    }

    /// Canonical casing of a story arc, matched case-insensitively.
    #[must_use]
    pub fn resolve_arc(&self, text: &str) -> Option<&str> {
        self.arcs_ci.resolve(text)
    }

    /// Full record for `title`.
    #[must_use]
    pub fn strip(&self, title: &str) -> Option<&Strip> {
        self.strips.get(title)
    }

    /// Every strip, oldest publish order first.
    pub fn strips_by_publish_order(&self) -> impl Iterator<Item = &Strip> {
        self.by_order
            .values()
            .filter_map(|title| self.strips.get(title))
    }

    /// All known tags, sorted.
    #[must_use]
    pub fn tags(&self) -> Vec<&str> {
        sorted_keys(&self.by_tag)
    }

    /// All known story arcs, sorted.
    #[must_use]
    pub fn arcs(&self) -> Vec<&str> {
        sorted_keys(&self.by_arc)
    }

    /// Highest publish order in use.
    #[must_use]
    pub fn latest_publish_order(&self) -> Option<&PublishOrder> {
        self.by_order.last_key_value().map(|(order, _)| order)
    }

    /// First publish order after every numeric one; zero for an empty index.
    ///
    /// Follows the spelling of the highest numeric key, so an index loaded from
    /// string keys keeps handing out string keys.
    #[must_use]
    pub fn next_publish_order(&self) -> PublishOrder {
        self.by_order
            .keys()
            .rev()
            .find_map(PublishOrder::next)
            .unwrap_or_default()
    }

    /// Number of strips.
    #[must_use]
    pub fn len(&self) -> usize {
        self.strips.len()
    }

    /// True when no strip is indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.strips.is_empty()
    }

    /// Titles that fuzzily match `query`, best first.
    #[must_use]
    pub fn suggest_titles(&self, query: &str, limit: usize) -> Vec<&str> {
        let matcher = SkimMatcherV2::default();
        let query = query.trim().to_lowercase();

        let mut scored: Vec<(i64, &str)> = self
            .strips
            .keys()
            .filter_map(|title| {
                matcher
                    .fuzzy_match(&title.to_lowercase(), &query)
                    .map(|score| (score, title.as_str()))
            })
            .collect();
        scored.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(b.1)));
        scored.into_iter().take(limit).map(|(_, t)| t).collect()
    }
}

fn dedup_labels(labels: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    labels
        .into_iter()
        .filter(|label| seen.insert(label.clone()))
        .collect()
}

fn repeated_label(labels: &[String]) -> Option<&str> {
    let mut seen = HashSet::with_capacity(labels.len());
    for label in labels {
        if !seen.insert(label.as_str()) {
            return Some(label);
        }
    }
    None
}

fn sorted_keys(map: &HashMap<String, Vec<String>>) -> Vec<&str> {
    let mut keys: Vec<&str> = map.keys().map(String::as_str).collect();
    keys.sort_unstable();
    keys
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn strip(title: &str, urls: &[&str], order: u64) -> NewStrip {
        NewStrip::new(
            title,
            urls.iter().map(|u| (*u).to_string()).collect(),
            PublishOrder::Number(order),
        )
    }

    fn labels(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_string()).collect()
    }

    /// Every secondary relation must be derivable from the primary records.
    fn assert_consistent(index: &ArchiveIndex) {
        let mut url_count = 0;
        for (title, record) in &index.strips {
            assert_eq!(&record.title, title);
            assert_eq!(index.by_order.get(&record.publish_order), Some(title));
            for url in &record.urls {
                assert_eq!(index.by_url.get(url), Some(title));
                url_count += 1;
            }
            for tag in &record.tags {
                assert_eq!(
                    index.by_tag[tag].iter().filter(|t| *t == title).count(),
                    1
                );
            }
            for arc in &record.arcs {
                assert_eq!(
                    index.by_arc[arc].iter().filter(|t| *t == title).count(),
                    1
                );
            }
        }
        assert_eq!(index.by_url.len(), url_count);
        assert_eq!(index.by_order.len(), index.strips.len());
        for (tag, titles) in &index.by_tag {
            for title in titles {
                assert!(index.strips[title].tags.contains(tag));
            }
        }
        for (arc, titles) in &index.by_arc {
            for title in titles {
                assert!(index.strips[title].arcs.contains(arc));
            }
        }
    }

    #[test]
    fn test_add_and_lookup_every_direction() {
        let mut index = ArchiveIndex::new();
        index
            .add_strip(
                strip("Glove", &["https://x/glove/", "https://x/glove/2/"], 1)
                    .with_tags(labels(&["Ivan", "Mistress"]))
                    .with_arcs(labels(&["Glove"])),
            )
            .unwrap();

        assert_eq!(index.title_for_url("https://x/glove/2/"), Some("Glove"));
        assert_eq!(index.titles_for_tag("Mistress"), ["Glove".to_string()]);
        assert_eq!(index.titles_for_arc("Glove"), ["Glove".to_string()]);
        assert_eq!(index.title_at_publish_order(&PublishOrder::Number(1)), Some("Glove"));
        assert_eq!(index.title_for_url("https://x/other/"), None);
        assert!(index.titles_for_tag("ivan").is_empty());
        assert_consistent(&index);
    }

    #[test]
    fn test_tag_listing_follows_insertion_order() {
        let mut index = ArchiveIndex::new();
        index
            .add_strip(strip("B", &["https://x/b/"], 2).with_tags(labels(&["Ivan"])))
            .unwrap();
        index
            .add_strip(strip("A", &["https://x/a/"], 1).with_tags(labels(&["Ivan"])))
            .unwrap();
        assert_eq!(index.titles_for_tag("Ivan"), labels(&["B", "A"]));
    }

    #[test]
    fn test_rejections_leave_index_untouched() {
        let mut index = ArchiveIndex::new();
        index.add_strip(strip("A", &["https://x/a/"], 1)).unwrap();
        let before = index.clone();

        let cases = [
            (strip("A", &["https://x/z/"], 9), "title"),
            (strip("B", &["https://x/b/"], 1), "order"),
            (strip("B", &[], 2), "empty"),
            (strip("B", &["https://x/b/", "https://x/a/"], 2), "url"),
            (strip("B", &["https://x/b/", "https://x/b/"], 2), "repeat"),
            (strip("  ", &["https://x/b/"], 2), "blank"),
        ];
        for (candidate, label) in cases {
            let err = index.add_strip(candidate).unwrap_err();
            assert!(err.is_rejection(), "{label}: {err}");
            assert_eq!(index, before, "{label} mutated the index");
        }
    }

    #[test]
    fn test_rejection_variants() {
        let mut index = ArchiveIndex::new();
        index.add_strip(strip("A", &["https://x/a/"], 1)).unwrap();

        assert!(matches!(
            index.add_strip(strip("A", &["https://x/q/"], 5)),
            Err(Error::DuplicateTitle(t)) if t == "A"
        ));
        assert!(matches!(
            index.add_strip(strip("B", &["https://x/q/"], 1)),
            Err(Error::DuplicatePublishOrder(order)) if order == PublishOrder::Number(1)
        ));
        assert!(matches!(
            index.add_strip(strip("B", &[], 2)),
            Err(Error::EmptyUrlList(_))
        ));
        assert!(matches!(
            index.add_strip(strip("B", &["https://x/a/"], 2)),
            Err(Error::DuplicateUrl { owner, .. }) if owner == "A"
        ));
    }

    #[test]
    fn test_case_fold_keeps_first_spelling() {
        let mut index = ArchiveIndex::new();
        index
            .add_strip(strip("Hot Tub", &["https://x/a/"], 1).with_tags(labels(&["Ivan"])))
            .unwrap();
        index
            .add_strip(strip("HOT TUB", &["https://x/b/"], 2).with_tags(labels(&["IVAN"])))
            .unwrap();

        assert_eq!(index.resolve_title("hot tub"), Some("Hot Tub"));
        assert_eq!(index.resolve_tag("iVaN"), Some("Ivan"));
        assert_eq!(index.resolve_arc("anything"), None);
        // Exact lookups stay case-sensitive.
        assert_eq!(index.titles_for_tag("IVAN"), labels(&["HOT TUB"]));
    }

    #[test]
    fn test_duplicate_labels_collapse() {
        let mut index = ArchiveIndex::new();
        index
            .add_strip(strip("A", &["https://x/a/"], 1).with_tags(labels(&["t", "t"])))
            .unwrap();
        assert_eq!(index.strip("A").unwrap().tags, labels(&["t"]));
        assert_eq!(index.titles_for_tag("t").len(), 1);
    }

    #[test]
    fn test_tag_and_arc_existing_strip() {
        let mut index = ArchiveIndex::new();
        index.add_strip(strip("A", &["https://x/a/"], 1)).unwrap();

        assert!(index.tag_strip("A", "Sorceress").unwrap());
        assert!(!index.tag_strip("A", "Sorceress").unwrap());
        assert!(index.add_arc("A", "Rough Trade").unwrap());
        assert!(matches!(
            index.tag_strip("Missing", "x"),
            Err(Error::NotFound(_))
        ));
        assert!(matches!(index.tag_strip("A", " "), Err(Error::EmptyLabel)));
        assert!(matches!(index.add_arc("A", ""), Err(Error::EmptyLabel)));

        assert_eq!(index.titles_for_tag("Sorceress"), labels(&["A"]));
        assert_eq!(index.resolve_arc("rough trade"), Some("Rough Trade"));
        assert_consistent(&index);
    }

    #[test]
    fn test_snapshot_round_trip() {
        let json = r#"{
            "Cumsprite": {"urls": ["https://x/cumsprite/", "https://x/cumsprite/2/"],
                          "publishOrder": 0, "tags": ["Ivan", "Mistress"], "arcs": ["Cumsprite"]},
            "Glove": {"urls": ["https://x/glove/"], "publishOrder": 1, "tags": ["Ivan"], "arcs": []}
        }"#;
        let snapshot: Snapshot = serde_json::from_str(json).unwrap();

        let index = ArchiveIndex::from_snapshot(&snapshot).unwrap();
        assert_eq!(index.serialize_snapshot(), snapshot);
        assert_eq!(index.titles_for_tag("Ivan"), labels(&["Cumsprite", "Glove"]));
        assert_consistent(&index);
    }

    #[test]
    fn test_snapshot_json_survives_load_and_save_unchanged() {
        let data = serde_json::json!({
            "Cumsprite": {"urls": ["https://x/cumsprite/"], "publishOrder": "0",
                          "tags": ["Ivan"], "arcs": ["Cumsprite"]},
            "Glove": {"urls": ["https://x/glove/"], "publishOrder": 1, "tags": [], "arcs": []},
            "Bonus": {"urls": ["https://x/bonus/"], "publishOrder": "extra", "tags": [], "arcs": []}
        });
        let snapshot: Snapshot = serde_json::from_value(data.clone()).unwrap();

        let index = ArchiveIndex::from_snapshot(&snapshot).unwrap();
        let saved = serde_json::to_value(index.serialize_snapshot()).unwrap();
        assert_eq!(saved, data);

        let titles: Vec<&str> = index
            .strips_by_publish_order()
            .map(|s| s.title.as_str())
            .collect();
        assert_eq!(titles, ["Cumsprite", "Glove", "Bonus"]);
        assert_eq!(
            index.title_at_publish_order(&PublishOrder::Number(0)),
            Some("Cumsprite")
        );
        assert_eq!(index.next_publish_order(), PublishOrder::Number(2));
    }

    #[test]
    fn test_string_and_number_spellings_collide() {
        let snapshot: Snapshot = serde_json::from_str(
            r#"{
                "A": {"urls": ["https://x/a/"], "publishOrder": "3"},
                "B": {"urls": ["https://x/b/"], "publishOrder": 3}
            }"#,
        )
        .unwrap();
        assert!(matches!(
            ArchiveIndex::from_snapshot(&snapshot),
            Err(Error::MalformedSnapshot { .. })
        ));
    }

    #[test]
    fn test_snapshot_with_repeated_label_is_malformed() {
        for record in [
            r#"{"urls": ["https://x/a/"], "publishOrder": 1, "tags": ["Ivan", "Ivan"]}"#,
            r#"{"urls": ["https://x/a/"], "publishOrder": 1, "arcs": ["Glove", "Glove"]}"#,
        ] {
            let snapshot: Snapshot =
                serde_json::from_str(&format!(r#"{{"A": {record}}}"#)).unwrap();
            match ArchiveIndex::from_snapshot(&snapshot) {
                Err(Error::MalformedSnapshot { reason, .. }) => {
                    assert!(reason.contains("listed twice"), "{reason}");
                },
                other => panic!("expected a malformed snapshot, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_malformed_snapshot_keeps_previous_state() {
        let mut index = ArchiveIndex::new();
        index.add_strip(strip("Keep", &["https://x/keep/"], 1)).unwrap();
        let before = index.clone();

        let bad: Snapshot = serde_json::from_str(
            r#"{
                "A": {"urls": ["https://x/a/"], "publishOrder": 3},
                "B": {"urls": ["https://x/b/"], "publishOrder": 3}
            }"#,
        )
        .unwrap();

        let err = index.load_snapshot(&bad).unwrap_err();
        assert!(matches!(err, Error::MalformedSnapshot { .. }));
        assert_eq!(index, before);
    }

    #[test]
    fn test_publish_order_helpers() {
        let mut index = ArchiveIndex::new();
        assert_eq!(index.next_publish_order(), PublishOrder::Number(0));
        index.add_strip(strip("A", &["https://x/a/"], 4)).unwrap();
        index.add_strip(strip("B", &["https://x/b/"], 2)).unwrap();
        assert_eq!(index.latest_publish_order(), Some(&PublishOrder::Number(4)));
        assert_eq!(index.next_publish_order(), PublishOrder::Number(5));

        let titles: Vec<&str> = index
            .strips_by_publish_order()
            .map(|s| s.title.as_str())
            .collect();
        assert_eq!(titles, ["B", "A"]);
    }

    #[test]
    fn test_suggest_titles() {
        let mut index = ArchiveIndex::new();
        index.add_strip(strip("Cumsprite", &["https://x/a/"], 1)).unwrap();
        index.add_strip(strip("Glove", &["https://x/b/"], 2)).unwrap();
        let suggestions = index.suggest_titles("cumsprit", 3);
        assert_eq!(suggestions.first(), Some(&"Cumsprite"));
    }

    proptest! {
        #[test]
        fn prop_accepted_strips_never_collide(
            ops in proptest::collection::vec(
                (0u8..6, proptest::collection::vec(0u8..10, 0..4), 0u64..6, proptest::collection::vec(0u8..3, 0..3)),
                1..40,
            )
        ) {
            let mut index = ArchiveIndex::new();
            for (title, urls, order, tags) in ops {
                let candidate = NewStrip {
                    title: format!("strip-{title}"),
                    urls: urls.iter().map(|u| format!("https://x/{u}/")).collect(),
                    publish_order: PublishOrder::Number(order),
                    tags: tags.iter().map(|t| format!("tag-{t}")).collect(),
                    arcs: Vec::new(),
                };
                let before = index.clone();
                match index.add_strip(candidate.clone()) {
                    Ok(()) => {
                        for url in &candidate.urls {
                            prop_assert_eq!(index.title_for_url(url), Some(candidate.title.as_str()));
                        }
                    },
                    Err(err) => {
                        prop_assert!(err.is_rejection());
                        prop_assert_eq!(&index, &before);
                    },
                }
                assert_consistent(&index);
            }
        }
    }
}
