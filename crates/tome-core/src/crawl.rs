//! Crawl driver: finds the newest strip and grows the index from the live archive.

use std::collections::HashSet;
use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use futures::stream::{self, StreamExt};
use serde::Serialize;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::{Config, SiteConfig};
use crate::markup::thumbnail_anchor_href;
use crate::resolver::{DEFAULT_MAX_PAGES, StripResolver};
use crate::{
    Error, NewStrip, PageFetcher, PublishOrder, ResolvedStrip, Result, SharedIndex, Strip,
};

/// Progress callback receiving `(completed, total)`.
pub type ProgressCallback = Arc<dyn Fn(usize, usize) + Send + Sync>;

/// Fetch the archive listing and return the absolute URL of the newest strip.
pub async fn newest_strip_url(fetcher: &dyn PageFetcher, site: &SiteConfig) -> Result<String> {
    let listing_url = site.archive_url();
    let html = fetcher.fetch(&listing_url).await?;
    let href = thumbnail_anchor_href(&html, site.thumbnail_width, site.thumbnail_height)?
        .ok_or_else(|| {
            Error::Markup(format!(
                "no {}x{} thumbnail link on {listing_url}",
                site.thumbnail_width, site.thumbnail_height
            ))
        })?;

    let base = Url::parse(&site.protohost)
        .map_err(|e| Error::Config(format!("invalid protohost '{}': {e}", site.protohost)))?;
    let url = base
        .join(href.trim())
        .map_err(|e| Error::Markup(format!("invalid newest strip link '{href}': {e}")))?;
    debug!(%url, "Newest strip");
    Ok(url.into())
}

/// Why a discovery walk stopped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Reached a strip the index already holds.
    KnownStrip,
    /// Reached the first strip of the archive.
    #[default]
    ArchiveStart,
    /// Resolved the requested number of strips.
    Limit,
    /// A strip could not be resolved, so its predecessor is unknown.
    Failed,
}

/// A resolved strip the index refused.
#[derive(Debug)]
pub struct Rejection {
    /// Resolved title.
    pub title: String,
    /// First page of the strip.
    pub url: String,
    /// Why the index refused it.
    pub error: Error,
}

/// Result of [`Crawler::discover`].
#[derive(Debug, Default)]
pub struct DiscoveryReport {
    /// Strips committed, oldest first.
    pub added: Vec<Strip>,
    /// Strips resolved but rejected by the index.
    pub rejected: Vec<Rejection>,
    /// The error that ended the walk early, if any.
    pub failure: Option<Error>,
    /// Why the walk ended.
    pub stop: StopReason,
}

/// One known strip URL to resolve during a backfill.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BacklogEntry {
    /// Any page of the strip.
    pub url: String,
    /// Publish order to commit at.
    pub order: PublishOrder,
    /// Tags to attach.
    pub tags: Vec<String>,
    /// Story arcs to attach.
    pub arcs: Vec<String>,
}

impl BacklogEntry {
    /// Entry with no labels.
    #[must_use]
    pub fn new(order: PublishOrder, url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            order,
            tags: Vec::new(),
            arcs: Vec::new(),
        }
    }
}

/// Parses `ORDER=URL`, e.g. `12=https://www.oglaf.com/glove/`.
impl FromStr for BacklogEntry {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (order, url) = s
            .split_once('=')
            .ok_or_else(|| Error::Config(format!("expected ORDER=URL, got '{s}'")))?;
        let order: PublishOrder = order.parse()?;
        let url = url.trim();
        Url::parse(url).map_err(|e| Error::Config(format!("invalid URL '{url}': {e}")))?;
        Ok(Self::new(order, url))
    }
}

/// Outcome for one backlog entry.
#[derive(Debug)]
pub struct BackfillOutcome {
    /// URL from the backlog entry.
    pub url: String,
    /// Requested publish order.
    pub order: PublishOrder,
    /// The committed strip, or why it was not committed.
    pub result: Result<Strip>,
}

/// Drives strip resolution against the live archive and commits into a shared index.
pub struct Crawler {
    fetcher: Arc<dyn PageFetcher>,
    site: SiteConfig,
    max_pages: usize,
    progress_callback: Option<ProgressCallback>,
}

impl Crawler {
    /// Crawler for `site` with the default page limit.
    #[must_use]
    pub fn new(fetcher: Arc<dyn PageFetcher>, site: SiteConfig) -> Self {
        Self {
            fetcher,
            site,
            max_pages: DEFAULT_MAX_PAGES,
            progress_callback: None,
        }
    }

    /// Crawler using the site and page limit from `config`.
    #[must_use]
    pub fn from_config(fetcher: Arc<dyn PageFetcher>, config: &Config) -> Self {
        Self::new(fetcher, config.site.clone()).with_max_pages(config.fetch.max_pages_per_strip)
    }

    /// Limit the number of physical pages fetched for one strip.
    #[must_use]
    pub const fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = max_pages;
        self
    }

    /// Set progress callback.
    ///
    /// The callback receives `(completed, total)` after each backlog entry.
    #[must_use]
    pub fn with_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(usize, usize) + Send + Sync + 'static,
    {
        self.progress_callback = Some(Arc::new(callback));
        self
    }

    fn resolver(&self) -> StripResolver<'_> {
        StripResolver::new(self.fetcher.as_ref()).with_max_pages(self.max_pages)
    }

    /// Resolve a single strip without touching the index.
    pub async fn resolve(&self, url: &str) -> Result<ResolvedStrip> {
        self.resolver().resolve(url).await
    }

    /// Walk backwards from the newest strip until the index already knows a
    /// strip, the archive starts, or `limit` strips have been resolved.
    ///
    /// New strips are committed oldest first, each at the index's next free
    /// publish order. Only a failure to read the archive listing is returned
    /// as `Err`; everything after that is reported.
    pub async fn discover(&self, index: &SharedIndex, limit: Option<usize>) -> Result<DiscoveryReport> {
        let start = newest_strip_url(self.fetcher.as_ref(), &self.site).await?;
        let mut report = DiscoveryReport::default();
        let mut found: Vec<ResolvedStrip> = Vec::new();
        let mut walked: HashSet<String> = HashSet::new();
        let mut cursor = Some(start);

        while let Some(url) = cursor.take() {
            if limit.is_some_and(|limit| found.len() >= limit) {
                report.stop = StopReason::Limit;
                break;
            }
            if index.read().await.contains_url(&url) || !walked.insert(url.clone()) {
                report.stop = StopReason::KnownStrip;
                break;
            }

            match self.resolve(&url).await {
                Ok(strip) => {
                    let known = {
                        let index = index.read().await;
                        strip.urls.iter().any(|u| index.contains_url(u))
                    };
                    if known {
                        report.stop = StopReason::KnownStrip;
                        break;
                    }
                    info!(title = %strip.title, pages = strip.urls.len(), "Discovered strip");
                    walked.extend(strip.urls.iter().cloned());
                    cursor.clone_from(&strip.prev);
                    found.push(strip);
                },
                Err(err) => {
                    warn!(%url, error = %err, "Discovery stopped");
                    report.stop = StopReason::Failed;
                    report.failure = Some(err);
                    break;
                },
            }
        }

        for strip in found.into_iter().rev() {
            let title = strip.title.clone();
            let url = strip.urls.first().cloned().unwrap_or_default();

            let mut index = index.write().await;
            let order = index.next_publish_order();
            match index.add_strip(strip.into_new_strip(order.clone())) {
                Ok(()) => {
                    info!(%title, %order, "Added strip");
                    if let Some(added) = index.strip(&title) {
                        report.added.push(added.clone());
                    }
                },
                Err(error) => {
                    warn!(%title, %url, %error, "Index rejected strip");
                    report.rejected.push(Rejection { title, url, error });
                },
            }
        }

        Ok(report)
    }

    /// Resolve the strip at `url` and commit it at `order` with the given labels.
    pub async fn resolve_and_add(
        &self,
        index: &SharedIndex,
        url: &str,
        order: PublishOrder,
        tags: Vec<String>,
        arcs: Vec<String>,
    ) -> Result<Strip> {
        let resolved = self.resolve(url).await?;
        let title = resolved.title.clone();
        let new_strip: NewStrip = resolved
            .into_new_strip(order.clone())
            .with_tags(tags)
            .with_arcs(arcs);

        let mut index = index.write().await;
        index.add_strip(new_strip)?;
        info!(%title, %order, "Added strip");
        index
            .strip(&title)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("strip '{title}'")))
    }

    /// Resolve and commit many known strip URLs concurrently.
    ///
    /// At most `concurrency` resolutions run at once. Each commit holds the
    /// index write lock, so uniqueness checks never interleave. Outcomes are
    /// returned in publish order.
    pub async fn backfill(
        &self,
        index: &SharedIndex,
        entries: Vec<BacklogEntry>,
        concurrency: usize,
    ) -> Vec<BackfillOutcome> {
        if entries.is_empty() {
            return Vec::new();
        }

        let concurrency = concurrency.max(1);
        let total = entries.len();
        let completed = Arc::new(AtomicUsize::new(0));

        let mut outcomes: Vec<BackfillOutcome> = stream::iter(entries)
            .map(|entry| {
                let completed = Arc::clone(&completed);
                let progress = self.progress_callback.clone();

                async move {
                    let BacklogEntry {
                        url,
                        order,
                        tags,
                        arcs,
                    } = entry;
                    let result = self
                        .resolve_and_add(index, &url, order.clone(), tags, arcs)
                        .await;
                    if let Err(error) = &result {
                        warn!(%url, %order, %error, "Backfill entry failed");
                    }

                    let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
                    if let Some(cb) = progress {
                        cb(done, total);
                    }

                    BackfillOutcome { url, order, result }
                }
            })
            .buffer_unordered(concurrency)
            .collect()
            .await;

        outcomes.sort_by(|a, b| a.order.cmp(&b.order));
        outcomes
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::ArchiveIndex;
    use crate::test_support::{MapFetcher, at};
    use async_trait::async_trait;
    use std::time::Duration;

    /// Delays every fetch and records the most requests ever in flight at once.
    struct GaugedFetcher {
        inner: MapFetcher,
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    #[async_trait]
    impl PageFetcher for GaugedFetcher {
        async fn fetch(&self, url: &str) -> Result<String> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            let page = self.inner.fetch(url).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            page
        }
    }

    const LISTING: &str = "/archive/";

    fn site() -> SiteConfig {
        SiteConfig {
            protohost: crate::test_support::HOST.to_string(),
            ..SiteConfig::default()
        }
    }

    fn listing(newest: &str) -> String {
        format!(
            r#"<html><body>
            <a href="/old/"><img src="o.jpg" width="200" height="100"></a>
            <a href="{newest}"><img src="n.jpg" width="400" height="100"></a>
            </body></html>"#
        )
    }

    /// Four strips: /one/ (two pages), /two/, /three/ (with epilogue), /four/.
    fn archive() -> MapFetcher {
        MapFetcher::new()
            .with_raw(LISTING, &listing("/four/"))
            .with_page("/one/", "One page 1", None, Some("/one/2/"), &[])
            .with_page("/one/2/", "One page 2", Some("/one/"), Some("/two/"), &[])
            .with_page("/two/", "Two", Some("/one/2/"), Some("/three/"), &[])
            .with_page("/three/", "Three", Some("/two/"), Some("/four/"), &["/three/epilogue/"])
            .with_page("/three/epilogue/", "Epilogue", None, None, &[])
            .with_page("/four/", "Four", Some("/three/"), None, &[])
    }

    fn crawler(fetcher: MapFetcher) -> Crawler {
        Crawler::new(Arc::new(fetcher), site())
    }

    #[tokio::test]
    async fn test_newest_strip_url_joins_host() {
        let fetcher = archive();
        let url = newest_strip_url(&fetcher, &site()).await.unwrap();
        assert_eq!(url, at("/four/"));
    }

    #[tokio::test]
    async fn test_newest_strip_url_without_thumbnail_fails() {
        let fetcher = MapFetcher::new().with_raw(LISTING, "<html><body></body></html>");
        let err = newest_strip_url(&fetcher, &site()).await.unwrap_err();
        assert!(matches!(err, Error::Markup(_)));
    }

    #[tokio::test]
    async fn test_discover_from_empty_index_walks_to_archive_start() {
        let index = ArchiveIndex::new().into_shared();
        let report = crawler(archive()).discover(&index, None).await.unwrap();

        assert_eq!(report.stop, StopReason::ArchiveStart);
        assert!(report.failure.is_none());
        let titles: Vec<_> = report.added.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, ["One", "Two", "Three", "Four"]);

        let index = index.read().await;
        assert_eq!(index.title_at_publish_order(&PublishOrder::Number(0)), Some("One"));
        assert_eq!(index.title_at_publish_order(&PublishOrder::Number(3)), Some("Four"));
        assert_eq!(index.title_for_url(&at("/one/2/")), Some("One"));
        assert_eq!(index.title_for_url(&at("/three/epilogue/")), Some("Three"));
    }

    #[tokio::test]
    async fn test_discover_stops_at_known_strip() {
        let mut seeded = ArchiveIndex::new();
        seeded
            .add_strip(NewStrip::new(
                "One",
                vec![at("/one/"), at("/one/2/")],
                PublishOrder::Number(0),
            ))
            .unwrap();
        seeded
            .add_strip(NewStrip::new("Two", vec![at("/two/")], PublishOrder::Number(1)))
            .unwrap();
        let index = seeded.into_shared();

        let fetcher = Arc::new(archive());
        let crawler = Crawler::new(fetcher.clone(), site());
        let report = crawler.discover(&index, None).await.unwrap();

        assert_eq!(report.stop, StopReason::KnownStrip);
        let titles: Vec<_> = report.added.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, ["Three", "Four"]);
        assert_eq!(report.added[0].publish_order, PublishOrder::Number(2));
        assert_eq!(fetcher.hits("/two/"), 0);
    }

    #[tokio::test]
    async fn test_discover_respects_limit() {
        let index = ArchiveIndex::new().into_shared();
        let report = crawler(archive()).discover(&index, Some(1)).await.unwrap();

        assert_eq!(report.stop, StopReason::Limit);
        assert_eq!(report.added.len(), 1);
        assert_eq!(report.added[0].title, "Four");
    }

    #[tokio::test]
    async fn test_discover_reports_failure_and_keeps_progress() {
        let fetcher = archive().with_failure("/two/", 503);
        let index = ArchiveIndex::new().into_shared();
        let report = crawler(fetcher).discover(&index, None).await.unwrap();

        assert_eq!(report.stop, StopReason::Failed);
        assert!(matches!(
            report.failure,
            Some(Error::FetchFailed { status: 503, .. })
        ));
        assert_eq!(report.added.len(), 2);
        assert_eq!(index.read().await.len(), 2);
    }

    #[tokio::test]
    async fn test_discover_reports_rejections() {
        let mut seeded = ArchiveIndex::new();
        seeded
            .add_strip(NewStrip::new("Four", vec![at("/elsewhere/")], PublishOrder::Number(0)))
            .unwrap();
        let index = seeded.into_shared();

        let report = crawler(archive()).discover(&index, Some(1)).await.unwrap();
        assert!(report.added.is_empty());
        assert_eq!(report.rejected.len(), 1);
        assert!(matches!(report.rejected[0].error, Error::DuplicateTitle(_)));
    }

    #[tokio::test]
    async fn test_resolve_and_add_attaches_labels() {
        let index = ArchiveIndex::new().into_shared();
        let strip = crawler(archive())
            .resolve_and_add(
                &index,
                &at("/three/"),
                PublishOrder::Number(7),
                vec!["Ivan".into()],
                vec!["Epilogues".into()],
            )
            .await
            .unwrap();

        assert_eq!(strip.urls, vec![at("/three/"), at("/three/epilogue/")]);
        let index = index.read().await;
        assert_eq!(index.titles_for_tag("Ivan"), ["Three".to_string()]);
        assert_eq!(index.titles_for_arc("Epilogues"), ["Three".to_string()]);
    }

    #[tokio::test]
    async fn test_backfill_commits_each_entry_once() {
        let index = ArchiveIndex::new().into_shared();
        let entries = vec![
            BacklogEntry::new(PublishOrder::Number(3), at("/four/")),
            BacklogEntry::new(PublishOrder::Number(0), at("/one/")),
            BacklogEntry::new(PublishOrder::Number(2), at("/three/")),
            BacklogEntry::new(PublishOrder::Number(1), at("/two/")),
            // Same strip again through its second page: one of the pair is rejected.
            BacklogEntry::new(PublishOrder::Number(9), at("/one/2/")),
        ];

        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let outcomes = crawler(archive())
            .with_progress(move |_, total| {
                assert_eq!(total, 5);
                seen.fetch_add(1, Ordering::SeqCst);
            })
            .backfill(&index, entries, 3)
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 5);
        let orders: Vec<u64> = outcomes.iter().filter_map(|o| o.order.value()).collect();
        assert_eq!(orders, [0, 1, 2, 3, 9]);
        let failures: Vec<&Error> = outcomes.iter().filter_map(|o| o.result.as_ref().err()).collect();
        assert_eq!(failures.len(), 1);
        assert!(matches!(failures[0], Error::DuplicateTitle(title) if title == "One"));

        let index = index.read().await;
        assert_eq!(index.len(), 4);
        assert_eq!(index.title_at_publish_order(&PublishOrder::Number(2)), Some("Three"));
    }

    #[tokio::test]
    async fn test_backfill_never_exceeds_concurrency() {
        let fetcher = Arc::new(GaugedFetcher {
            inner: archive(),
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        });
        let index = ArchiveIndex::new().into_shared();
        let entries = vec![
            BacklogEntry::new(PublishOrder::Number(0), at("/one/")),
            BacklogEntry::new(PublishOrder::Number(1), at("/two/")),
            BacklogEntry::new(PublishOrder::Number(2), at("/three/")),
            BacklogEntry::new(PublishOrder::Number(3), at("/four/")),
        ];

        let outcomes = Crawler::new(fetcher.clone(), site())
            .backfill(&index, entries, 2)
            .await;

        assert!(outcomes.iter().all(|o| o.result.is_ok()));
        assert_eq!(fetcher.peak.load(Ordering::SeqCst), 2);
        assert_eq!(index.read().await.len(), 4);
    }

    #[tokio::test]
    async fn test_backfill_failures_do_not_abort_siblings() {
        let fetcher = archive().with_failure("/two/", 404);
        let index = ArchiveIndex::new().into_shared();
        let outcomes = crawler(fetcher)
            .backfill(
                &index,
                vec![
                    BacklogEntry::new(PublishOrder::Number(1), at("/two/")),
                    BacklogEntry::new(PublishOrder::Number(3), at("/four/")),
                ],
                2,
            )
            .await;

        assert!(matches!(
            outcomes[0].result,
            Err(Error::FetchFailed { status: 404, .. })
        ));
        assert!(outcomes[1].result.is_ok());
        assert_eq!(index.read().await.len(), 1);
    }

    #[test]
    fn test_backlog_entry_parsing() {
        let entry: BacklogEntry = "12=https://www.oglaf.com/glove/".parse().unwrap();
        assert!(matches!(entry.order, PublishOrder::Number(12)));
        assert_eq!(entry.url, "https://www.oglaf.com/glove/");

        assert!("https://www.oglaf.com/glove/".parse::<BacklogEntry>().is_err());
        assert!(" =https://www.oglaf.com/glove/".parse::<BacklogEntry>().is_err());
        assert!("3=not a url".parse::<BacklogEntry>().is_err());

        let bonus: BacklogEntry = "extra=https://www.oglaf.com/bonus/".parse().unwrap();
        assert_eq!(bonus.order, PublishOrder::Text("extra".into()));
    }
}
