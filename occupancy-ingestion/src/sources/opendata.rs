//! Client for the open-data `records/1.0/search` endpoint.

use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{Map, Value};

pub type Fields = Map<String, Value>;

#[derive(thiserror::Error, Debug)]
pub enum FetchError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected status {0}")]
    Status(StatusCode),
    #[error("invalid search response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Parameters of one search request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchQuery<'a> {
    pub dataset: &'a str,
    pub q: Option<&'a str>,
    pub rows: u32,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub nhits: u64,
    #[serde(default)]
    pub records: Vec<SearchRecord>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchRecord {
    #[serde(default)]
    pub fields: Fields,
}

#[derive(Debug, Clone)]
pub struct OpenDataClient {
    http: reqwest::Client,
    base_url: String,
}

impl OpenDataClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("occupancy-ingestion/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.into(),
        })
    }

    pub async fn search(&self, query: &SearchQuery<'_>) -> Result<SearchResponse, FetchError> {
        let mut params: Vec<(&str, String)> = vec![("dataset", query.dataset.to_string())];
        if let Some(q) = query.q {
            params.push(("q", q.to_string()));
        }
        params.push(("rows", query.rows.to_string()));

        let resp = self.http.get(&self.base_url).query(&params).send().await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }

        let body = resp.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

/// Integer field; integral floats are accepted, anything else counts as absent.
pub fn field_i64(fields: &Fields, key: &str) -> Option<i64> {
    let value = fields.get(key)?;
    value.as_i64().or_else(|| {
        value
            .as_f64()
            .filter(|f| f.is_finite() && f.fract() == 0.0)
            .map(|f| f as i64)
    })
}

/// String field; non-string values count as absent.
pub fn field_str<'a>(fields: &'a Fields, key: &str) -> Option<&'a str> {
    fields.get(key)?.as_str()
}
