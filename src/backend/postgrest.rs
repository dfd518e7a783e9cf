//! PostgREST backend over HTTP.
//!
//! Talks to `{base_url}/rest/v1/{relation}` with the public read key in both
//! the `apikey` and `Authorization: Bearer` headers, which is what a hosted
//! Supabase project expects from an anonymous reader.
//!
//! Request translation is done by pure functions ([`select_params`],
//! [`count_params`], [`parse_content_range`]) so the wire format is unit
//! tested without a server.

use super::{Backend, BackendError, Count, Filter, Order, Select};
use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_RANGE, HeaderMap, HeaderValue};
use reqwest::{Client, Response};
use tracing::debug;
use url::Url;

/// HTTP client handle for one PostgREST endpoint.
///
/// Constructed once at startup and passed down; cloning shares the
/// underlying connection pool.
#[derive(Debug, Clone)]
pub struct PostgrestBackend {
    client: Client,
    rest_url: Url,
    api_key: String,
}

impl PostgrestBackend {
    pub fn new(base_url: &str, api_key: &str) -> Result<Self, BackendError> {
        Ok(Self {
            client: Client::new(),
            rest_url: rest_endpoint(base_url)?,
            api_key: api_key.to_string(),
        })
    }

    pub fn rest_url(&self) -> &Url {
        &self.rest_url
    }

    fn relation_url(&self, relation: &str) -> Result<Url, BackendError> {
        Ok(self.rest_url.join(relation)?)
    }

    fn auth_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Ok(key) = HeaderValue::from_str(&self.api_key) {
            headers.insert("apikey", key);
        }
        if let Ok(bearer) = HeaderValue::from_str(&format!("Bearer {}", self.api_key)) {
            headers.insert(AUTHORIZATION, bearer);
        }
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers
    }
}

/// Resolve `{base_url}/rest/v1/`, keeping any path prefix on the base.
fn rest_endpoint(base_url: &str) -> Result<Url, BackendError> {
    let mut base = Url::parse(base_url.trim())?;
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    Ok(base.join("rest/v1/")?)
}

fn filter_params(filters: &[Filter]) -> impl Iterator<Item = (String, String)> + '_ {
    filters
        .iter()
        .map(|f| (f.column.clone(), format!("eq.{}", f.value)))
}

/// `order=start_date.desc.nullslast,post_date.asc`
pub fn order_param(order: &[Order]) -> Option<String> {
    if order.is_empty() {
        return None;
    }
    let keys: Vec<String> = order
        .iter()
        .map(|o| {
            let dir = if o.ascending { "asc" } else { "desc" };
            match o.nulls {
                super::Nulls::Default => format!("{}.{}", o.column, dir),
                super::Nulls::First => format!("{}.{}.nullsfirst", o.column, dir),
                super::Nulls::Last => format!("{}.{}.nullslast", o.column, dir),
            }
        })
        .collect();
    Some(keys.join(","))
}

/// Query string pairs for a [`Select`], in a stable order.
pub fn select_params(query: &Select) -> Vec<(String, String)> {
    let mut params = vec![("select".to_string(), query.columns.clone())];
    params.extend(filter_params(&query.filters));
    if let Some(order) = order_param(&query.order) {
        params.push(("order".to_string(), order));
    }
    let (offset, limit) = query.window();
    if offset > 0 {
        params.push(("offset".to_string(), offset.to_string()));
    }
    if let Some(limit) = limit {
        params.push(("limit".to_string(), limit.to_string()));
    }
    params
}

/// Query string pairs for a [`Count`].
pub fn count_params(query: &Count) -> Vec<(String, String)> {
    let mut params = vec![("select".to_string(), query.column.clone())];
    params.extend(filter_params(&query.filters));
    params
}

/// Total from a `Content-Range` header: `0-24/608` and `*/608` both give 608.
///
/// A `*` total (count not requested) is `None`.
pub fn parse_content_range(value: &str) -> Option<u64> {
    let (_, total) = value.trim().rsplit_once('/')?;
    total.trim().parse().ok()
}

async fn check_status(relation: &str, response: Response) -> Result<Response, BackendError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(BackendError::Status {
        relation: relation.to_string(),
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
impl Backend for PostgrestBackend {
    async fn select(&self, query: &Select) -> Result<Vec<serde_json::Value>, BackendError> {
        let params = select_params(query);
        debug!(relation = %query.relation, ?params, "select");

        let response = self
            .client
            .get(self.relation_url(&query.relation)?)
            .headers(self.auth_headers())
            .query(&params)
            .send()
            .await?;
        let response = check_status(&query.relation, response).await?;
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn count(&self, query: &Count) -> Result<u64, BackendError> {
        let params = count_params(query);
        debug!(relation = %query.relation, "count");

        let response = self
            .client
            .head(self.relation_url(&query.relation)?)
            .headers(self.auth_headers())
            .header("Prefer", "count=exact")
            .query(&params)
            .send()
            .await?;
        let response = check_status(&query.relation, response).await?;
        let header = response
            .headers()
            .get(CONTENT_RANGE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        header
            .as_deref()
            .and_then(parse_content_range)
            .ok_or_else(|| BackendError::ContentRange {
                relation: query.relation.clone(),
                value: header,
            })
    }
}
