//! Strip boundary resolution.
//!
//! One logical strip may span several physical pages: numbered continuation
//! pages chained by `rel=next`, plus auxiliary pages (epilogues, vocabulary
//! notes) that are only linked from inside the strip. [`StripResolver`] walks
//! those pages from any page of the strip and reports the whole strip.
//!
//! Pages belong together when their paths share a *path root*: the canonical
//! path with a trailing numeric page segment collapsed, so `/bar/` and
//! `/bar/2/` both have the root `/bar`.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;
use url::Url;

use crate::markup::StripPage;
use crate::{Error, PageFetcher, ResolvedStrip, Result};

/// Default limit on physical pages visited for one strip.
pub const DEFAULT_MAX_PAGES: usize = 64;

/// SAFETY: Pattern is a compile-time constant that is known to be valid.
#[allow(clippy::unwrap_used)]
static PAGE_ONE_SUFFIX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\s+page 1$").unwrap());

/// Where a resolution currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Walking `rel=prev` links back until a page whose predecessor lies
    /// outside its own root.
    AwaitingFirstPage,
    /// Visiting queued pages of the strip in discovery order.
    Accumulating,
    Done,
}

/// Private per-resolution state. Nothing here outlives one `resolve` call.
#[derive(Debug, Default)]
struct Accumulator {
    title: Option<String>,
    /// Path root of the first page; every page of the strip lies within it.
    root: String,
    urls: Vec<String>,
    prev: Option<String>,
    next: Option<String>,
    frontier: VecDeque<String>,
    seen: HashSet<String>,
}

impl Accumulator {
    /// Record the first-page facts and reset the URL list.
    fn begin(&mut self, page: &StripPage, fetched_from: &str) -> Result<()> {
        let title = page
            .title
            .as_deref()
            .map(clean_title)
            .filter(|title| !title.is_empty())
            .ok_or_else(|| Error::Markup(format!("first page {fetched_from} has no title")))?;
        self.title = Some(title);
        self.root = path_root(&page.canonical)?;
        self.prev = page.prev.as_ref().map(ToString::to_string);
        self.urls.clear();
        self.seen.insert(fetched_from.to_string());
        Ok(())
    }

    /// Fold one page into the strip and queue whatever it links to within the strip.
    fn visit(&mut self, page: &StripPage) -> Result<()> {
        let canonical = page.canonical.to_string();
        if self.urls.contains(&canonical) {
            debug!(url = %canonical, "Page already part of the strip");
            return Ok(());
        }
        self.seen.insert(canonical.clone());

        let root = self.root.clone();
        let continues = page
            .next
            .as_ref()
            .filter(|next| within_root(next.path(), &root));
        // The first link out of the strip root names the following strip.
        if continues.is_none() && self.next.is_none() {
            self.next = page
                .next
                .as_ref()
                .map(ToString::to_string)
                .filter(|next| !self.seen.contains(next));
        }

        self.urls.push(canonical);

        for anchor in &page.anchors {
            if anchor.host_str() == page.canonical.host_str()
                && within_root(anchor.path(), &root)
                && anchor != &page.canonical
            {
                self.enqueue(anchor);
            }
        }
        if let Some(next) = continues {
            self.enqueue(next);
        }
        Ok(())
    }

    fn enqueue(&mut self, url: &Url) {
        let url = url.to_string();
        if self.seen.insert(url.clone()) {
            debug!(%url, "Queued page of the same strip");
            self.frontier.push_back(url);
        }
    }

    fn finish(self) -> Result<ResolvedStrip> {
        let title = self
            .title
            .ok_or_else(|| Error::Markup("resolution finished without a first page".into()))?;
        Ok(ResolvedStrip {
            title,
            urls: self.urls,
            prev: self.prev,
            next: self.next,
        })
    }
}

/// Resolves the full extent of a strip from any one of its pages.
pub struct StripResolver<'a> {
    fetcher: &'a dyn PageFetcher,
    max_pages: usize,
}

impl<'a> StripResolver<'a> {
    /// Resolver over `fetcher` with the default page limit.
    #[must_use]
    pub fn new(fetcher: &'a dyn PageFetcher) -> Self {
        Self {
            fetcher,
            max_pages: DEFAULT_MAX_PAGES,
        }
    }

    /// Limit the number of physical pages fetched for one strip.
    #[must_use]
    pub const fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = max_pages;
        self
    }

    /// Resolve the strip containing `start_url`.
    ///
    /// Fails if any page of the strip cannot be fetched, lacks a canonical
    /// link, or the strip exceeds the page limit.
    pub async fn resolve(&self, start_url: &str) -> Result<ResolvedStrip> {
        let mut acc = Accumulator::default();
        let mut cache: HashMap<String, StripPage> = HashMap::new();
        let mut fetched = 0usize;
        let mut state = State::AwaitingFirstPage;
        let mut cursor = start_url.to_string();
        let mut rewound: HashSet<String> = HashSet::new();

        loop {
            match state {
                State::AwaitingFirstPage => {
                    let page = self.load(&cursor, &mut fetched, start_url).await?;
                    let root = path_root(&page.canonical)?;
                    let same_strip_prev = page
                        .prev
                        .as_ref()
                        .filter(|prev| within_root(prev.path(), &root))
                        .map(ToString::to_string);

                    match same_strip_prev {
                        Some(prev) if rewound.insert(page.canonical.to_string()) => {
                            debug!(from = %cursor, to = %prev, "Rewinding to an earlier page");
                            cache.insert(cursor.clone(), page);
                            cursor = prev;
                        },
                        _ => {
                            acc.begin(&page, &cursor)?;
                            acc.visit(&page)?;
                            state = State::Accumulating;
                        },
                    }
                },
                State::Accumulating => {
                    let Some(url) = acc.frontier.pop_front() else {
                        state = State::Done;
                        continue;
                    };
                    let page = match cache.remove(&url) {
                        Some(page) => page,
                        None => self.load(&url, &mut fetched, start_url).await?,
                    };
                    acc.visit(&page)?;
                },
                State::Done => {
                    let strip = acc.finish()?;
                    debug!(title = %strip.title, pages = strip.urls.len(), "Resolved strip");
                    return Ok(strip);
                },
            }
        }
    }

    async fn load(&self, url: &str, fetched: &mut usize, start_url: &str) -> Result<StripPage> {
        if *fetched >= self.max_pages {
            return Err(Error::Markup(format!(
                "strip at {start_url} spans more than {} pages",
                self.max_pages
            )));
        }
        *fetched += 1;
        debug!(%url, "Fetching strip page");
        let html = self.fetcher.fetch(url).await?;
        StripPage::parse(&html, url)
    }
}

/// Canonical path with any trailing numeric page segment collapsed and no
/// trailing slash: `/bar/2/` and `/bar/` both give `/bar`.
///
/// A lone numeric segment (`/1984/`) is the strip's own name and is kept.
pub fn path_root(url: &Url) -> Result<String> {
    let mut segments: Vec<&str> = url.path().split('/').filter(|s| !s.is_empty()).collect();
    if segments.len() > 1
        && segments
            .last()
            .is_some_and(|last| last.bytes().all(|b| b.is_ascii_digit()))
    {
        segments.pop();
    }
    if segments.is_empty() {
        return Err(Error::Markup(format!("page {url} has no path root")));
    }
    Ok(format!("/{}", segments.join("/")))
}

/// Whether `path` is `root` itself or lies below it on a segment boundary.
#[must_use]
pub fn within_root(path: &str, root: &str) -> bool {
    path.strip_prefix(root)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}

/// Document title with a trailing " page 1" removed, case-insensitively.
#[must_use]
pub fn clean_title(title: &str) -> String {
    PAGE_ONE_SUFFIX.replace(title.trim(), "").trim().to_string()
}
