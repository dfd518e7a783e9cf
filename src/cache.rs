//! Rendered-page cache with a revalidation window.
//!
//! Serve mode renders a page on the first request for a route and keeps the
//! HTML for `cache.revalidate_secs`. Within the window the cached copy is
//! served as is; after it, the next request for that route renders afresh
//! and replaces the entry.
//!
//! # Design
//!
//! - **Keys** are resolved [`Route`]s, so `/trips/4/`, `/trips/4` and
//!   `/trips/4/index.html` share an entry.
//! - **ETags** are the SHA-256 of the HTML, hex-encoded and quoted. A page
//!   re-rendered to identical bytes keeps its ETag, so browsers holding it
//!   still get a 304.
//! - **Only 200s are cached.** Not-found pages and backend failures are
//!   rendered per request.
//! - **No coalescing.** Two requests that miss at once both render; the
//!   later store wins.
//! - The map sits behind a `std::sync::Mutex` that is held for a lookup or
//!   an insert only, never across an `.await`.
//!
//! Lookups take the current [`Instant`] as an argument, which keeps expiry
//! testable without sleeping.

use crate::pages::{PageStatus, RenderedPage, Route};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// A rendered page as held by the cache.
#[derive(Debug, Clone)]
pub struct CachedPage {
    pub html: Arc<str>,
    pub etag: String,
    pub rendered_at: Instant,
}

impl CachedPage {
    pub fn new(html: String, rendered_at: Instant) -> Self {
        let etag = etag_for(&html);
        Self {
            html: html.into(),
            etag,
            rendered_at,
        }
    }

    fn is_fresh(&self, now: Instant, window: Duration) -> bool {
        now.saturating_duration_since(self.rendered_at) < window
    }
}

/// Outcome of a cache lookup.
#[derive(Debug, Clone)]
pub enum Lookup {
    /// Rendered within the window; serve it.
    Fresh(CachedPage),
    /// Present but past the window; render again. The old copy is kept for
    /// use when the re-render fails.
    Stale(CachedPage),
    Miss,
}

/// Counters for cache activity, logged by the server.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub refreshes: u64,
}

impl CacheStats {
    pub fn total(&self) -> u64 {
        self.hits + self.misses + self.refreshes
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.refreshes > 0 {
            write!(
                f,
                "{} cached, {} refreshed, {} rendered ({} total)",
                self.hits,
                self.refreshes,
                self.misses,
                self.total()
            )
        } else if self.hits > 0 {
            write!(
                f,
                "{} cached, {} rendered ({} total)",
                self.hits,
                self.misses,
                self.total()
            )
        } else {
            write!(f, "{} rendered", self.misses)
        }
    }
}

#[derive(Debug, Default)]
struct Inner {
    entries: HashMap<Route, CachedPage>,
    stats: CacheStats,
}

/// Route → rendered page, shared by all request handlers.
#[derive(Debug)]
pub struct PageCache {
    window: Duration,
    inner: Mutex<Inner>,
}

impl PageCache {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            inner: Mutex::new(Inner::default()),
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    // A panic while holding the lock leaves the map itself intact.
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn lookup(&self, route: &Route, now: Instant) -> Lookup {
        let mut inner = self.lock();
        let lookup = match inner.entries.get(route) {
            Some(page) if page.is_fresh(now, self.window) => Lookup::Fresh(page.clone()),
            Some(page) => Lookup::Stale(page.clone()),
            None => Lookup::Miss,
        };
        match &lookup {
            Lookup::Fresh(_) => inner.stats.hits += 1,
            Lookup::Stale(_) => inner.stats.refreshes += 1,
            Lookup::Miss => inner.stats.misses += 1,
        }
        lookup
    }

    /// Store a freshly rendered page. A page that is not a 200 is handed
    /// back untouched and any existing entry is left alone.
    pub fn store(
        &self,
        route: Route,
        page: RenderedPage,
        now: Instant,
    ) -> Result<CachedPage, RenderedPage> {
        if page.status != PageStatus::Ok {
            return Err(page);
        }
        let cached = CachedPage::new(page.html, now);
        self.lock().entries.insert(route, cached.clone());
        Ok(cached)
    }

    pub fn stats(&self) -> CacheStats {
        self.lock().stats
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Quoted hex SHA-256 of the page body.
pub fn etag_for(html: &str) -> String {
    etag_for_bytes(html.as_bytes())
}

pub fn etag_for_bytes(bytes: &[u8]) -> String {
    format!("\"{:x}\"", Sha256::digest(bytes))
}

/// Whether an `If-None-Match` header value matches `etag`.
///
/// Handles `*`, comma-separated lists and weak validators (`W/"..."`).
pub fn etag_matches(if_none_match: &str, etag: &str) -> bool {
    if_none_match.split(',').map(str::trim).any(|candidate| {
        candidate == "*" || candidate.strip_prefix("W/").unwrap_or(candidate) == etag
    })
}
