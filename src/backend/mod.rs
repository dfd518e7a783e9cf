//! Read-only access to the journal database.
//!
//! The [`Backend`] trait executes two kinds of request descriptor:
//!
//! | Descriptor | Meaning | PostgREST form |
//! |---|---|---|
//! | [`Select`] | rows of one relation, filtered, ordered, windowed | `GET /rest/v1/{relation}?select=..&col=eq.v&order=..&offset=..&limit=..` |
//! | [`Count`]  | exact row count, no rows transferred | `HEAD` + `Prefer: count=exact`, total from `Content-Range` |
//!
//! Descriptors are plain data so the query layer can be exercised against
//! [`SnapshotBackend`] (an in-memory evaluator over a JSON dump) with the same
//! filter/order/range semantics the hosted database applies.
//!
//! The production implementation is [`PostgrestBackend`]. There are no write
//! operations anywhere in the trait.

pub mod postgrest;
pub mod snapshot;

pub use postgrest::PostgrestBackend;
pub use snapshot::SnapshotBackend;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("backend returned {status} for {relation}: {body}")]
    Status {
        relation: String,
        status: u16,
        body: String,
    },
    #[error("invalid JSON from backend: {0}")]
    Json(#[from] serde_json::Error),
    #[error("missing or malformed Content-Range header for {relation}: {value:?}")]
    ContentRange {
        relation: String,
        value: Option<String>,
    },
    #[error("unknown relation: {0}")]
    UnknownRelation(String),
    #[error("invalid backend URL: {0}")]
    Url(#[from] url::ParseError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// An equality filter on one column (`col=eq.value`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    pub column: String,
    pub value: String,
}

/// Where nulls sort. `Default` leaves it to the database: PostgreSQL puts
/// nulls last when ascending and first when descending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Nulls {
    #[default]
    Default,
    First,
    Last,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub column: String,
    pub ascending: bool,
    pub nulls: Nulls,
}

impl Order {
    pub fn asc(column: &str) -> Self {
        Self {
            column: column.to_string(),
            ascending: true,
            nulls: Nulls::Default,
        }
    }

    pub fn desc(column: &str) -> Self {
        Self {
            column: column.to_string(),
            ascending: false,
            nulls: Nulls::Default,
        }
    }

    pub fn nulls_last(mut self) -> Self {
        self.nulls = Nulls::Last;
        self
    }

    pub fn nulls_first(mut self) -> Self {
        self.nulls = Nulls::First;
        self
    }

    /// Whether nulls come before non-null values under this ordering.
    pub fn nulls_sort_first(&self) -> bool {
        match self.nulls {
            Nulls::First => true,
            Nulls::Last => false,
            Nulls::Default => !self.ascending,
        }
    }
}

/// A row request against one relation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Select {
    pub relation: String,
    pub columns: String,
    pub filters: Vec<Filter>,
    pub order: Vec<Order>,
    /// Inclusive row window `(from, to)`, zero-based.
    pub range: Option<(u64, u64)>,
    pub limit: Option<u64>,
}

impl Select {
    pub fn from(relation: &str) -> Self {
        Self {
            relation: relation.to_string(),
            columns: "*".to_string(),
            filters: Vec::new(),
            order: Vec::new(),
            range: None,
            limit: None,
        }
    }

    pub fn eq(mut self, column: &str, value: impl ToString) -> Self {
        self.filters.push(Filter {
            column: column.to_string(),
            value: value.to_string(),
        });
        self
    }

    pub fn order(mut self, order: Order) -> Self {
        self.order.push(order);
        self
    }

    pub fn range(mut self, from: u64, to: u64) -> Self {
        self.range = Some((from, to));
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Effective `(offset, limit)` after combining `range` and `limit`.
    ///
    /// An inverted range (`to < from`) selects nothing.
    pub fn window(&self) -> (u64, Option<u64>) {
        match (self.range, self.limit) {
            (Some((from, to)), limit) => {
                let span = to.saturating_add(1).saturating_sub(from);
                (from, Some(limit.map_or(span, |l| l.min(span))))
            }
            (None, limit) => (0, limit),
        }
    }
}

/// A count-only request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Count {
    pub relation: String,
    /// Column named in the `select`; keeps the request narrow.
    pub column: String,
    pub filters: Vec<Filter>,
}

impl Count {
    pub fn of(relation: &str, column: &str) -> Self {
        Self {
            relation: relation.to_string(),
            column: column.to_string(),
            filters: Vec::new(),
        }
    }
}

/// Read-only backend over named relations and views.
///
/// Implementations must surface failures as-is: no retries, no fallbacks.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Fetch rows as raw JSON objects, in the order the backend returns them.
    async fn select(&self, query: &Select) -> Result<Vec<serde_json::Value>, BackendError>;

    /// Exact number of rows matching the filters.
    async fn count(&self, query: &Count) -> Result<u64, BackendError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_collects_parts() {
        let q = Select::from("media")
            .eq("post_id", "abc")
            .eq("media_type", "image")
            .order(Order::asc("block_index"))
            .order(Order::asc("display_order"));
        assert_eq!(q.relation, "media");
        assert_eq!(q.columns, "*");
        assert_eq!(q.filters.len(), 2);
        assert_eq!(q.order[1].column, "display_order");
    }

    #[test]
    fn eq_accepts_numbers() {
        let q = Select::from("timeline").eq("trip_id", 12);
        assert_eq!(q.filters[0].value, "12");
    }

    #[test]
    fn window_from_range() {
        assert_eq!(Select::from("t").range(12, 23).window(), (12, Some(12)));
        assert_eq!(Select::from("t").range(0, 0).window(), (0, Some(1)));
    }

    #[test]
    fn window_limit_caps_range() {
        assert_eq!(Select::from("t").range(10, 19).limit(2).window(), (10, Some(2)));
        assert_eq!(Select::from("t").limit(2).window(), (0, Some(2)));
        assert_eq!(Select::from("t").window(), (0, None));
    }

    #[test]
    fn inverted_range_selects_nothing() {
        assert_eq!(Select::from("t").range(5, 3).window(), (5, Some(0)));
    }

    #[test]
    fn window_at_top_of_range_does_not_overflow() {
        assert_eq!(
            Select::from("t").range(u64::MAX, u64::MAX).window(),
            (u64::MAX, Some(0))
        );
        assert_eq!(Select::from("t").range(0, u64::MAX).window(), (0, Some(u64::MAX)));
    }

    #[test]
    fn default_null_placement_follows_postgres() {
        assert!(!Order::asc("a").nulls_sort_first());
        assert!(Order::desc("a").nulls_sort_first());
        assert!(!Order::desc("a").nulls_last().nulls_sort_first());
        assert!(Order::asc("a").nulls_first().nulls_sort_first());
    }
}
