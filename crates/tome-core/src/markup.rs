//! Markup queries over fetched archive pages.
//!
//! `scraper::Html` is not `Send`, so pages are reduced to small owned structs
//! here, before any await point in the resolver or crawler.

use std::collections::HashSet;
use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::{Error, Result};

/// SAFETY: Pattern is a compile-time constant that is known to be valid.
#[allow(clippy::unwrap_used)]
static CANONICAL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r"link[rel~=canonical]").unwrap());

/// SAFETY: Pattern is a compile-time constant that is known to be valid.
#[allow(clippy::unwrap_used)]
static PREV_LINK: LazyLock<Selector> = LazyLock::new(|| Selector::parse(r"a[rel~=prev]").unwrap());

/// SAFETY: Pattern is a compile-time constant that is known to be valid.
#[allow(clippy::unwrap_used)]
static NEXT_LINK: LazyLock<Selector> = LazyLock::new(|| Selector::parse(r"a[rel~=next]").unwrap());

/// SAFETY: Pattern is a compile-time constant that is known to be valid.
#[allow(clippy::unwrap_used)]
static ANCHOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a[href]").unwrap());

/// SAFETY: Pattern is a compile-time constant that is known to be valid.
#[allow(clippy::unwrap_used)]
static TITLE: LazyLock<Selector> = LazyLock::new(|| Selector::parse("title").unwrap());

/// The parts of one strip page that boundary resolution looks at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StripPage {
    /// Canonical identity of the page.
    pub canonical: Url,
    /// Target of the first `rel=prev` anchor.
    pub prev: Option<Url>,
    /// Target of the first `rel=next` anchor.
    pub next: Option<Url>,
    /// Document title text, trimmed.
    pub title: Option<String>,
    /// Every other anchor target in document order, prev/next excluded.
    pub anchors: Vec<Url>,
}

impl StripPage {
    /// Parse `html` fetched from `page_url`.
    ///
    /// Relative links are resolved against `page_url` and fragments dropped.
    pub fn parse(html: &str, page_url: &str) -> Result<Self> {
        let base = Url::parse(page_url)
            .map_err(|e| Error::Markup(format!("invalid page URL '{page_url}': {e}")))?;
        let document = Html::parse_document(html);

        let canonical = document
            .select(&CANONICAL)
            .next()
            .and_then(|link| link.value().attr("href"))
            .and_then(|href| absolutize(&base, href))
            .ok_or_else(|| Error::MissingCanonical {
                url: page_url.to_string(),
            })?;

        let prev_el = document.select(&PREV_LINK).next();
        let next_el = document.select(&NEXT_LINK).next();
        let prev = prev_el.and_then(|el| href_of(&base, el));
        let next = next_el.and_then(|el| href_of(&base, el));

        // prev/next are consumed above and must not count as content links.
        let consumed: HashSet<_> = [prev_el, next_el].into_iter().flatten().map(|el| el.id()).collect();
        let anchors = document
            .select(&ANCHOR)
            .filter(|el| !consumed.contains(&el.id()))
            .filter_map(|el| href_of(&base, el))
            .collect();

        let title = document
            .select(&TITLE)
            .next()
            .map(|el| el.text().collect::<String>().trim().to_string())
            .filter(|text| !text.is_empty());

        Ok(Self {
            canonical,
            prev,
            next,
            title,
            anchors,
        })
    }
}

/// Find the `href` of the anchor wrapping the newest-strip thumbnail.
///
/// The thumbnail is the first `<img>` carrying the given width and height
/// attributes; the anchor is its nearest `<a>` ancestor.
pub fn thumbnail_anchor_href(html: &str, width: u32, height: u32) -> Result<Option<String>> {
    let selector = Selector::parse(&format!(r#"img[width="{width}"][height="{height}"]"#))
        .map_err(|e| Error::Markup(format!("invalid thumbnail selector: {e}")))?;
    let document = Html::parse_document(html);

    Ok(document.select(&selector).next().and_then(|img| {
        img.ancestors()
            .filter_map(ElementRef::wrap)
            .find(|el| el.value().name() == "a")
            .and_then(|anchor| anchor.value().attr("href"))
            .map(str::to_string)
    }))
}

fn href_of(base: &Url, el: ElementRef<'_>) -> Option<Url> {
    el.value().attr("href").and_then(|href| absolutize(base, href))
}

fn absolutize(base: &Url, href: &str) -> Option<Url> {
    let mut url = base.join(href.trim()).ok()?;
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }
    url.set_fragment(None);
    Some(url)
}
