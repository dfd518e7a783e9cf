//! Typed read accessors, one per page data need.
//!
//! Each function builds a request descriptor, runs it on the given
//! [`Backend`] and decodes the rows. Aggregation lives in the database views;
//! nothing here joins or counts in memory.
//!
//! | Function | Relation | Shape |
//! |---|---|---|
//! | [`get_stats`] | `posts`, `countries`, `trips` | three exact counts, concurrent |
//! | [`get_trips_with_countries`] | `trips_with_countries` | `start_date` desc, nulls last |
//! | [`get_countries_with_stats`] | `countries_with_stats` | `total_posts` desc |
//! | [`get_timeline`] | `timeline` | zero-based page, view order |
//! | [`get_timeline_total`] | `timeline` | exact count |
//! | [`get_post`] | `posts_with_thumbnail` + `media` | one row + image media, concurrent |
//! | [`get_trip`] | `trips_with_countries` | one row |
//! | [`get_trip_posts`] | `timeline` | `trip_name` filter, `post_date` asc |

use crate::backend::{Backend, BackendError, Count, Order, Select};
use crate::types::{
    CountryWithStats, Media, PostDetail, PostWithThumbnail, Stats, TimelineRow, TripWithCountries,
};
use serde::de::DeserializeOwned;
use thiserror::Error;

pub const TIMELINE: &str = "timeline";
pub const TRIPS_WITH_COUNTRIES: &str = "trips_with_countries";
pub const COUNTRIES_WITH_STATS: &str = "countries_with_stats";
pub const POSTS_WITH_THUMBNAIL: &str = "posts_with_thumbnail";
pub const MEDIA: &str = "media";

#[derive(Error, Debug)]
pub enum QueryError {
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error("could not decode {relation} row: {source}")]
    Decode {
        relation: String,
        source: serde_json::Error,
    },
    #[error("no {relation} row for {key}")]
    NotFound { relation: String, key: String },
    #[error("{count} {relation} rows for {key}, expected one")]
    Ambiguous {
        relation: String,
        key: String,
        count: usize,
    },
    #[error("page size must be greater than zero")]
    InvalidPageSize,
}

impl QueryError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, QueryError::NotFound { .. })
    }
}

fn decode_rows<T: DeserializeOwned>(
    relation: &str,
    rows: Vec<serde_json::Value>,
) -> Result<Vec<T>, QueryError> {
    rows.into_iter()
        .map(|row| {
            serde_json::from_value(row).map_err(|source| QueryError::Decode {
                relation: relation.to_string(),
                source,
            })
        })
        .collect()
}

async fn fetch<T: DeserializeOwned>(
    backend: &dyn Backend,
    query: &Select,
) -> Result<Vec<T>, QueryError> {
    let rows = backend.select(query).await?;
    decode_rows(&query.relation, rows)
}

/// Fetch a row that must exist exactly once. Requests two rows so a
/// duplicate key is detected rather than silently picking one.
async fn fetch_single<T: DeserializeOwned>(
    backend: &dyn Backend,
    query: Select,
    key: &str,
) -> Result<T, QueryError> {
    let query = query.limit(2);
    let mut rows: Vec<T> = fetch(backend, &query).await?;
    match rows.len() {
        1 => Ok(rows.remove(0)),
        0 => Err(QueryError::NotFound {
            relation: query.relation,
            key: key.to_string(),
        }),
        count => Err(QueryError::Ambiguous {
            relation: query.relation,
            key: key.to_string(),
            count,
        }),
    }
}

// ============================================================================
// Homepage
// ============================================================================

pub async fn get_stats(backend: &dyn Backend) -> Result<Stats, QueryError> {
    let posts = Count::of("posts", "post_id");
    let countries = Count::of("countries", "country_id");
    let trips = Count::of("trips", "trip_id");
    let (posts, countries, trips) = tokio::try_join!(
        backend.count(&posts),
        backend.count(&countries),
        backend.count(&trips),
    )?;
    Ok(Stats {
        posts,
        countries,
        trips,
    })
}

pub async fn get_trips_with_countries(
    backend: &dyn Backend,
) -> Result<Vec<TripWithCountries>, QueryError> {
    let query = Select::from(TRIPS_WITH_COUNTRIES).order(Order::desc("start_date").nulls_last());
    fetch(backend, &query).await
}

pub async fn get_countries_with_stats(
    backend: &dyn Backend,
) -> Result<Vec<CountryWithStats>, QueryError> {
    let query = Select::from(COUNTRIES_WITH_STATS).order(Order::desc("total_posts"));
    fetch(backend, &query).await
}

// ============================================================================
// Timeline
// ============================================================================

/// One zero-based page of the timeline: rows `[page*size, (page+1)*size)`.
///
/// No explicit ordering is requested; the view defines it.
pub async fn get_timeline(
    backend: &dyn Backend,
    page: u64,
    page_size: u64,
) -> Result<Vec<TimelineRow>, QueryError> {
    if page_size == 0 {
        return Err(QueryError::InvalidPageSize);
    }
    let from = page.saturating_mul(page_size);
    let to = from.saturating_add(page_size - 1);
    fetch(backend, &Select::from(TIMELINE).range(from, to)).await
}

pub async fn get_timeline_total(backend: &dyn Backend) -> Result<u64, QueryError> {
    Ok(backend.count(&Count::of(TIMELINE, "post_id")).await?)
}

// ============================================================================
// Single post
// ============================================================================

pub async fn get_post(backend: &dyn Backend, post_id: &str) -> Result<PostDetail, QueryError> {
    let post_query = Select::from(POSTS_WITH_THUMBNAIL).eq("post_id", post_id);
    let media_query = Select::from(MEDIA)
        .eq("post_id", post_id)
        .eq("media_type", "image")
        .order(Order::asc("block_index"))
        .order(Order::asc("display_order"));

    let (post, media) = tokio::try_join!(
        fetch_single::<PostWithThumbnail>(backend, post_query, post_id),
        fetch::<Media>(backend, &media_query),
    )?;
    Ok(PostDetail { post, media })
}

// ============================================================================
// Trips
// ============================================================================

pub async fn get_trip(backend: &dyn Backend, trip_id: i64) -> Result<TripWithCountries, QueryError> {
    let query = Select::from(TRIPS_WITH_COUNTRIES).eq("trip_id", trip_id);
    fetch_single(backend, query, &trip_id.to_string()).await
}

/// Timeline rows of one trip, oldest first.
///
/// The `timeline` view only carries the trip's name, so callers resolve the
/// trip with [`get_trip`] first.
pub async fn get_trip_posts(
    backend: &dyn Backend,
    trip_name: &str,
) -> Result<Vec<TimelineRow>, QueryError> {
    let query = Select::from(TIMELINE)
        .eq("trip_name", trip_name)
        .order(Order::asc("post_date"));
    fetch(backend, &query).await
}
