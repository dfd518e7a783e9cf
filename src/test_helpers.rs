//! Shared test utilities for the travelog test suite.
//!
//! Provides the sample journal backend, row lookups and markup assertions
//! used by the query, page and cache tests.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let backend = sample_backend();
//! let trips = get_trips_with_countries(&backend).await.unwrap();
//! let trip = find_trip(&trips, "South America");
//! assert_eq!(trip.post_count, 3);
//!
//! let html = render_path(&backend, "/trips/4").await;
//! assert_html_contains(&html, &["South America", "Cusco"]);
//! ```

use std::path::Path;

use crate::backend::SnapshotBackend;
use crate::config::SiteConfig;
use crate::pages::{self, RenderedPage, Route};
use crate::types::{TimelineRow, TripWithCountries};

// =========================================================================
// Fixture setup
// =========================================================================

/// Path of the sample journal snapshot under `fixtures/`.
pub fn snapshot_path() -> std::path::PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/snapshot.json")
}

/// Five posts across two dated trips (South America, Balkans by Rail) and
/// one undated trip with no posts. Serbia has no continent.
pub fn sample_backend() -> SnapshotBackend {
    SnapshotBackend::load(&snapshot_path()).unwrap()
}

/// Render a path against a backend with stock config. Panics on an unknown
/// route or a render error.
pub async fn render_path(backend: &SnapshotBackend, path: &str) -> RenderedPage {
    let config = SiteConfig::default();
    let route = Route::parse(path).unwrap_or_else(|| panic!("no route for '{path}'"));
    pages::render_route(backend, &config, &route)
        .await
        .unwrap_or_else(|e| panic!("render of '{path}' failed: {e}"))
}

// =========================================================================
// Row lookups: panic with a clear message on miss
// =========================================================================

/// Find a trip by name. Panics if not found.
pub fn find_trip<'a>(trips: &'a [TripWithCountries], name: &str) -> &'a TripWithCountries {
    trips
        .iter()
        .find(|t| t.trip_name == name)
        .unwrap_or_else(|| {
            let names: Vec<&str> = trips.iter().map(|t| t.trip_name.as_str()).collect();
            panic!("trip '{name}' not found. Available: {names:?}")
        })
}

/// All post ids in row order.
pub fn post_ids(rows: &[TimelineRow]) -> Vec<&str> {
    rows.iter().map(|r| r.post_id.as_str()).collect()
}

// =========================================================================
// Markup assertions
// =========================================================================

/// Assert that the page body contains every needle.
pub fn assert_html_contains(page: &RenderedPage, needles: &[&str]) {
    for needle in needles {
        assert!(
            page.html.contains(needle),
            "expected page to contain {needle:?}\n---\n{}",
            page.html
        );
    }
}

/// Assert that the page body contains none of the needles.
pub fn assert_html_lacks(page: &RenderedPage, needles: &[&str]) {
    for needle in needles {
        assert!(
            !page.html.contains(needle),
            "expected page not to contain {needle:?}"
        );
    }
}

/// Byte offset of `needle` in the page. Panics if absent.
pub fn position_of(page: &RenderedPage, needle: &str) -> usize {
    page.html
        .find(needle)
        .unwrap_or_else(|| panic!("{needle:?} not found in page"))
}
