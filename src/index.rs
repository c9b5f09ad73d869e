//! Search index client.
//!
//! The index answers the paginated queries the store cannot: direct and
//! recursive child listings, child counts, and top-level object browsing.
//! Field conventions for this service's view of the index:
//!
//! - `id` - pid of the indexed object
//! - `title` / `title_sort` - display and sorting titles
//! - `parent_pids` - immediate parents (multivalued)
//! - `ancestor_pids` - all ancestors, any depth (multivalued)
//! - `sequence_<pid-token>` - position under one specific custom-sorted
//!   parent, where the token replaces `:` and `.` with `_`

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Multivalued field holding an object's immediate parent pids.
pub const PARENT_FIELD: &str = "parent_pids";

/// Multivalued field holding every ancestor pid, any depth.
pub const ANCESTOR_FIELD: &str = "ancestor_pids";

/// Sortable title field.
pub const TITLE_SORT_FIELD: &str = "title_sort";

/// Name of the per-parent sequence field for one parent pid.
pub fn sequence_field(parent_pid: &str) -> String {
    format!("sequence_{}", parent_pid.replace([':', '.'], "_"))
}

/// Phrase query matching `field` exactly equal to `value`.
pub fn phrase_query(field: &str, value: &str) -> String {
    format!("{}:\"{}\"", field, value.replace('"', "\\\""))
}

/// Errors from search index operations.
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("Search request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected search index response code: {0}")]
    BadStatus(u16),
}

/// Parameters for a paged index query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryParams {
    /// Comma-separated field list; `None` returns all stored fields.
    pub fl: Option<String>,

    pub rows: u32,

    pub start: u32,

    /// e.g. `"id ASC"` or `"sequence_foo_123 ASC,title_sort ASC"`.
    pub sort: Option<String>,
}

impl QueryParams {
    pub fn new(rows: u32) -> Self {
        Self {
            rows,
            ..Self::default()
        }
    }

    pub fn with_fl(mut self, fl: impl Into<String>) -> Self {
        self.fl = Some(fl.into());
        self
    }

    pub fn with_start(mut self, start: u32) -> Self {
        self.start = start;
        self
    }

    pub fn with_sort(mut self, sort: impl Into<String>) -> Self {
        self.sort = Some(sort.into());
        self
    }
}

/// One page of index results.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchPage {
    pub num_found: usize,

    pub start: usize,

    /// Raw documents; each holds whatever fields `fl` requested.
    pub docs: Vec<serde_json::Value>,
}

impl SearchPage {
    /// Pull the `id` field out of each doc, skipping malformed entries.
    pub fn ids(&self) -> Vec<&str> {
        self.docs
            .iter()
            .filter_map(|doc| doc.get("id").and_then(|v| v.as_str()))
            .collect()
    }
}

/// Paginated query execution against the search index.
#[async_trait]
pub trait SearchIndex: Send + Sync {
    async fn query(
        &self,
        core: &str,
        query: &str,
        params: &QueryParams,
    ) -> Result<SearchPage, IndexError>;
}

/// HTTP client for a Solr-style select API.
pub struct HttpSearchIndex {
    base_url: String,
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct SelectResponse {
    response: SearchPage,
}

impl HttpSearchIndex {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl SearchIndex for HttpSearchIndex {
    async fn query(
        &self,
        core: &str,
        query: &str,
        params: &QueryParams,
    ) -> Result<SearchPage, IndexError> {
        let url = format!("{}/{}/select", self.base_url, core);

        let mut pairs: Vec<(&str, String)> = vec![
            ("q", query.to_string()),
            ("wt", "json".to_string()),
            ("rows", params.rows.to_string()),
            ("start", params.start.to_string()),
        ];
        if let Some(fl) = &params.fl {
            pairs.push(("fl", fl.clone()));
        }
        if let Some(sort) = &params.sort {
            pairs.push(("sort", sort.clone()));
        }

        let response = self.client.get(&url).query(&pairs).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(IndexError::BadStatus(status.as_u16()));
        }

        let parsed: SelectResponse = response.json().await?;
        Ok(parsed.response)
    }
}
