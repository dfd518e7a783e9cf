//! Route resolution and page rendering.
//!
//! Every page is a pure function from query results to [`Markup`]. The
//! dispatcher, [`render_route`], fetches what a route needs (independent
//! queries run together via `tokio::try_join!`, and the first failure aborts
//! the render) and hands the rows to the page function.
//!
//! ## Routes
//!
//! | Path | Page | Data |
//! |------|------|------|
//! | `/` | [`home`] | stats, trips, recent timeline |
//! | `/trips` | [`trips`] | trips |
//! | `/trips/:id` | [`trips`] | one trip, its timeline rows |
//! | `/countries` | [`countries`] | countries |
//! | `/map` | [`countries`] | countries grouped by continent |
//! | `/journal`, `/journal/page/:n` | [`journal`] | one timeline page, timeline total |
//! | `/post/:id` | [`post`] | one post with its image media |
//!
//! Misses render the not-found page with [`PageStatus::NotFound`]; backend
//! failures surface as [`PageError`] and the caller decides how to show them
//! (see [`errors::render_backend_error`]).

pub mod components;
pub mod countries;
pub mod errors;
pub mod home;
pub mod journal;
pub mod layout;
pub mod post;
pub mod trips;

use crate::backend::Backend;
use crate::config::SiteConfig;
use crate::queries::{self, QueryError};
use maud::Markup;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PageError {
    #[error("could not load page data: {0}")]
    Query(#[from] QueryError),
}

/// A resolved request path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Route {
    Home,
    Trips,
    Trip(i64),
    Countries,
    Map,
    /// 1-based page number.
    Journal(u64),
    Post(String),
}

impl Route {
    /// Resolve a URL path. Trailing slashes and `index.html` are ignored.
    ///
    /// Returns `None` for unknown paths and malformed ids.
    pub fn parse(path: &str) -> Option<Route> {
        let path = path.split(['?', '#']).next().unwrap_or("");
        let path = path.strip_suffix("index.html").unwrap_or(path);
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        match segments.as_slice() {
            [] => Some(Route::Home),
            ["trips"] => Some(Route::Trips),
            ["trips", id] => id.parse().ok().map(Route::Trip),
            ["countries"] => Some(Route::Countries),
            ["map"] => Some(Route::Map),
            ["journal"] => Some(Route::Journal(1)),
            ["journal", "page", n] => n
                .parse::<u64>()
                .ok()
                .filter(|n| *n >= 1)
                .map(Route::Journal),
            ["post", id] => Route::post(id),
            _ => None,
        }
    }

    /// Route for a post id taken from a backend row. `None` when the id is
    /// not URL-safe.
    pub fn post(id: &str) -> Option<Route> {
        is_post_id(id).then(|| Route::Post(id.to_string()))
    }

    /// Canonical URL path.
    pub fn path(&self) -> String {
        match self {
            Route::Home => "/".to_string(),
            Route::Trips => "/trips".to_string(),
            Route::Trip(id) => format!("/trips/{id}"),
            Route::Countries => "/countries".to_string(),
            Route::Map => "/map".to_string(),
            Route::Journal(1) => "/journal".to_string(),
            Route::Journal(n) => format!("/journal/page/{n}"),
            Route::Post(id) => format!("/post/{id}"),
        }
    }

    /// File written for this route in a static export, relative to the output root.
    pub fn output_file(&self) -> String {
        match self {
            Route::Home => "index.html".to_string(),
            other => format!("{}/index.html", other.path().trim_start_matches('/')),
        }
    }
}

/// Post ids are opaque, but only URL-safe ones are routable.
fn is_post_id(id: &str) -> bool {
    !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageStatus {
    Ok,
    NotFound,
}

/// Rendered HTML and the status it should be served with.
#[derive(Debug, Clone)]
pub struct RenderedPage {
    pub status: PageStatus,
    pub html: String,
}

impl RenderedPage {
    fn ok(markup: Markup) -> Self {
        Self {
            status: PageStatus::Ok,
            html: markup.into_string(),
        }
    }

    pub fn not_found(config: &SiteConfig) -> Self {
        Self {
            status: PageStatus::NotFound,
            html: errors::render_not_found(config).into_string(),
        }
    }
}

/// Fetch a route's data and render it.
///
/// A missing post or trip, and a journal page past the end, give the
/// not-found page. Any other query failure is an error.
pub async fn render_route(
    backend: &dyn Backend,
    config: &SiteConfig,
    route: &Route,
) -> Result<RenderedPage, PageError> {
    match render_found(backend, config, route).await {
        Ok(Some(markup)) => Ok(RenderedPage::ok(markup)),
        Ok(None) => Ok(RenderedPage::not_found(config)),
        Err(QueryError::NotFound { relation, key }) => {
            tracing::debug!(%relation, %key, "not found");
            Ok(RenderedPage::not_found(config))
        }
        Err(e) => Err(e.into()),
    }
}

async fn render_found(
    backend: &dyn Backend,
    config: &SiteConfig,
    route: &Route,
) -> Result<Option<Markup>, QueryError> {
    let markup = match route {
        Route::Home => {
            let (stats, trips, recent) = tokio::try_join!(
                queries::get_stats(backend),
                queries::get_trips_with_countries(backend),
                queries::get_timeline(backend, 0, config.pages.recent_posts),
            )?;
            home::render_home(config, &stats, &trips, &recent)
        }
        Route::Trips => {
            let trips = queries::get_trips_with_countries(backend).await?;
            trips::render_trips(config, &trips)
        }
        Route::Trip(id) => {
            let trip = queries::get_trip(backend, *id).await?;
            let posts = queries::get_trip_posts(backend, &trip.trip_name).await?;
            trips::render_trip(config, &trip, &posts)
        }
        Route::Countries => {
            let countries = queries::get_countries_with_stats(backend).await?;
            countries::render_countries(config, &countries)
        }
        Route::Map => {
            let countries = queries::get_countries_with_stats(backend).await?;
            countries::render_map(config, &countries)
        }
        Route::Journal(page) => {
            let size = config.pages.journal_page_size;
            let (rows, total) = tokio::try_join!(
                queries::get_timeline(backend, page - 1, size),
                queries::get_timeline_total(backend),
            )?;
            if rows.is_empty() && *page > 1 {
                return Ok(None);
            }
            let pages = journal::page_count(total, size);
            journal::render_journal(config, *page, pages, &rows)
        }
        Route::Post(id) => {
            let detail = queries::get_post(backend, id).await?;
            post::render_post(config, &detail)
        }
    };
    Ok(Some(markup))
}
