//! In-memory site fixtures shared by unit tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::{Error, PageFetcher, Result};

pub const HOST: &str = "https://comic.test";

/// Absolute URL on the fixture host.
pub fn at(path: &str) -> String {
    format!("{HOST}{path}")
}

/// Minimal strip page markup.
pub fn page(
    canonical: &str,
    title: &str,
    prev: Option<&str>,
    next: Option<&str>,
    anchors: &[&str],
) -> String {
    let mut body = String::new();
    if let Some(prev) = prev {
        body.push_str(&format!(r#"<a rel="prev" href="{prev}">prev</a>"#));
    }
    if let Some(next) = next {
        body.push_str(&format!(r#"<a rel="next" href="{next}">next</a>"#));
    }
    for href in anchors {
        body.push_str(&format!(r#"<a href="{href}">link</a>"#));
    }
    format!(
        r#"<html><head><title>{title}</title><link rel="canonical" href="{canonical}"></head><body>{body}</body></html>"#
    )
}

/// Serves pages from a map and counts requests per URL.
#[derive(Default)]
pub struct MapFetcher {
    pages: HashMap<String, String>,
    failures: HashMap<String, u16>,
    hits: Mutex<HashMap<String, usize>>,
}

impl MapFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a page under its canonical path.
    pub fn with_page(
        mut self,
        path: &str,
        title: &str,
        prev: Option<&str>,
        next: Option<&str>,
        anchors: &[&str],
    ) -> Self {
        self.pages
            .insert(at(path), page(path, title, prev, next, anchors));
        self
    }

    pub fn with_raw(mut self, path: &str, html: &str) -> Self {
        self.pages.insert(at(path), html.to_string());
        self
    }

    pub fn with_failure(mut self, path: &str, status: u16) -> Self {
        self.failures.insert(at(path), status);
        self
    }

    pub fn hits(&self, path: &str) -> usize {
        self.hits
            .lock()
            .unwrap()
            .get(&at(path))
            .copied()
            .unwrap_or(0)
    }

    pub fn total_hits(&self) -> usize {
        self.hits.lock().unwrap().values().sum()
    }
}

#[async_trait]
impl PageFetcher for MapFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        *self.hits.lock().unwrap().entry(url.to_string()).or_default() += 1;
        if let Some(status) = self.failures.get(url) {
            return Err(Error::FetchFailed {
                url: url.to_string(),
                status: *status,
            });
        }
        self.pages.get(url).cloned().ok_or_else(|| Error::FetchFailed {
            url: url.to_string(),
            status: 404,
        })
    }
}
