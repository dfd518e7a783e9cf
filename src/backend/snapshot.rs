//! In-memory backend over a JSON snapshot of the journal.
//!
//! A snapshot is one JSON object mapping relation names to arrays of rows:
//!
//! ```json
//! { "timeline": [ {...}, ... ], "trips_with_countries": [ ... ], "posts": [ ... ] }
//! ```
//!
//! Rows keep the order they have in the file; that order stands in for the
//! implicit order of a view. Descriptors are evaluated with the semantics the
//! hosted database applies: equality on the textual form of a value, stable
//! multi-key sort with PostgreSQL null placement, then offset/limit.

use super::{Backend, BackendError, Count, Filter, Order, Select};
use async_trait::async_trait;
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

#[derive(Debug, Clone, Default)]
pub struct SnapshotBackend {
    relations: HashMap<String, Vec<Value>>,
}

impl SnapshotBackend {
    pub fn from_relations(relations: HashMap<String, Vec<Value>>) -> Self {
        Self { relations }
    }

    pub fn from_json(json: &str) -> Result<Self, BackendError> {
        let relations: HashMap<String, Vec<Value>> = serde_json::from_str(json)?;
        Ok(Self::from_relations(relations))
    }

    pub fn load(path: &Path) -> Result<Self, BackendError> {
        let json = std::fs::read_to_string(path)?;
        let backend = Self::from_json(&json)?;
        debug!(
            path = %path.display(),
            relations = backend.relations.len(),
            "loaded snapshot"
        );
        Ok(backend)
    }

    /// Add or replace a relation.
    pub fn with_relation(mut self, name: &str, rows: Vec<Value>) -> Self {
        self.relations.insert(name.to_string(), rows);
        self
    }

    pub fn relation_names(&self) -> impl Iterator<Item = &str> {
        self.relations.keys().map(String::as_str)
    }

    fn rows(&self, relation: &str) -> Result<&[Value], BackendError> {
        self.relations
            .get(relation)
            .map(Vec::as_slice)
            .ok_or_else(|| BackendError::UnknownRelation(relation.to_string()))
    }

    fn filtered<'a>(
        &'a self,
        relation: &'a str,
        filters: &'a [Filter],
    ) -> Result<impl Iterator<Item = &'a Value> + 'a, BackendError> {
        let rows = self.rows(relation)?;
        Ok(rows
            .iter()
            .filter(move |row| filters.iter().all(|f| matches_filter(row, f))))
    }
}

/// Textual form used for equality: `12` and `"12"` are the same value.
fn text_of(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        other => Some(other.to_string()),
    }
}

fn matches_filter(row: &Value, filter: &Filter) -> bool {
    row.get(&filter.column)
        .and_then(text_of)
        .is_some_and(|v| v == filter.value)
}

/// Compare two non-null values. Numbers compare numerically, strings
/// lexicographically (ISO dates sort correctly as text), anything else by
/// its textual form.
fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => text_of(a).cmp(&text_of(b)),
    }
}

fn compare_by(a: &Value, b: &Value, order: &Order) -> Ordering {
    let lhs = a.get(&order.column).filter(|v| !v.is_null());
    let rhs = b.get(&order.column).filter(|v| !v.is_null());
    match (lhs, rhs) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => {
            if order.nulls_sort_first() {
                Ordering::Less
            } else {
                Ordering::Greater
            }
        }
        (Some(_), None) => {
            if order.nulls_sort_first() {
                Ordering::Greater
            } else {
                Ordering::Less
            }
        }
        (Some(x), Some(y)) => {
            let ord = compare_values(x, y);
            if order.ascending { ord } else { ord.reverse() }
        }
    }
}

/// Stable sort by each key in turn.
pub fn sort_rows(rows: &mut [Value], order: &[Order]) {
    if order.is_empty() {
        return;
    }
    rows.sort_by(|a, b| {
        order
            .iter()
            .map(|o| compare_by(a, b, o))
            .find(|ord| ord.is_ne())
            .unwrap_or(Ordering::Equal)
    });
}

#[async_trait]
impl Backend for SnapshotBackend {
    async fn select(&self, query: &Select) -> Result<Vec<Value>, BackendError> {
        let mut rows: Vec<Value> = self
            .filtered(&query.relation, &query.filters)?
            .cloned()
            .collect();
        sort_rows(&mut rows, &query.order);

        let (offset, limit) = query.window();
        let offset = usize::try_from(offset).unwrap_or(usize::MAX);
        let windowed: Vec<Value> = match limit {
            Some(limit) => rows
                .into_iter()
                .skip(offset)
                .take(usize::try_from(limit).unwrap_or(usize::MAX))
                .collect(),
            None => rows.into_iter().skip(offset).collect(),
        };
        debug!(relation = %query.relation, rows = windowed.len(), "snapshot select");
        Ok(windowed)
    }

    async fn count(&self, query: &Count) -> Result<u64, BackendError> {
        let n = self.filtered(&query.relation, &query.filters)?.count();
        Ok(n as u64)
    }
}
