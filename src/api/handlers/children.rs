//! Child listing and browse query handlers, backed by the search index.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::api::{error_response, ApiState};
use crate::error::EditError;
use crate::index::{
    phrase_query, sequence_field, QueryParams, SearchPage, ANCESTOR_FIELD, PARENT_FIELD,
    TITLE_SORT_FIELD,
};

/// Default row cap for unpaged child listings.
const ALL_ROWS: u32 = 100_000;

/// Paging parameters shared by the listing endpoints.
#[derive(Debug, Deserialize)]
pub struct PageQuery {
    #[serde(default)]
    pub start: u32,

    pub rows: Option<u32>,
}

fn index_error(err: crate::index::IndexError) -> (StatusCode, String) {
    error_response(EditError::Index(err))
}

/// List an object's direct children, ordered by sequence then title.
pub async fn get_children(
    State(state): State<Arc<ApiState>>,
    Path(pid): Path<String>,
    Query(page): Query<PageQuery>,
) -> Result<Json<SearchPage>, (StatusCode, String)> {
    let params = QueryParams::new(page.rows.unwrap_or(ALL_ROWS))
        .with_start(page.start)
        .with_fl("id,title")
        .with_sort(format!(
            "{} ASC,{} ASC",
            sequence_field(&pid),
            TITLE_SORT_FIELD
        ));
    let result = state
        .index
        .query(&state.index_core, &phrase_query(PARENT_FIELD, &pid), &params)
        .await
        .map_err(index_error)?;
    Ok(Json(result))
}

/// Direct and recursive child counts for an object.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChildCounts {
    pub direct_children: usize,
    pub total_descendants: usize,
}

/// Count direct children and total descendants without fetching docs.
pub async fn get_child_counts(
    State(state): State<Arc<ApiState>>,
    Path(pid): Path<String>,
) -> Result<Json<ChildCounts>, (StatusCode, String)> {
    let params = QueryParams::new(0);
    let direct = state
        .index
        .query(&state.index_core, &phrase_query(PARENT_FIELD, &pid), &params)
        .await
        .map_err(index_error)?;
    let total = state
        .index
        .query(
            &state.index_core,
            &phrase_query(ANCESTOR_FIELD, &pid),
            &params,
        )
        .await
        .map_err(index_error)?;

    Ok(Json(ChildCounts {
        direct_children: direct.num_found,
        total_descendants: total.num_found,
    }))
}

async fn child_pids(
    state: &ApiState,
    field: &str,
    pid: &str,
    page: &PageQuery,
) -> Result<Vec<String>, (StatusCode, String)> {
    let params = QueryParams::new(page.rows.unwrap_or(ALL_ROWS))
        .with_start(page.start)
        .with_fl("id")
        .with_sort("id ASC");
    let result = state
        .index
        .query(&state.index_core, &phrase_query(field, pid), &params)
        .await
        .map_err(index_error)?;
    Ok(result.ids().into_iter().map(String::from).collect())
}

/// List the pids of an object's direct children.
pub async fn get_direct_child_pids(
    State(state): State<Arc<ApiState>>,
    Path(pid): Path<String>,
    Query(page): Query<PageQuery>,
) -> Result<Json<Vec<String>>, (StatusCode, String)> {
    Ok(Json(child_pids(&state, PARENT_FIELD, &pid, &page).await?))
}

/// List the pids of all of an object's descendants.
pub async fn get_recursive_child_pids(
    State(state): State<Arc<ApiState>>,
    Path(pid): Path<String>,
    Query(page): Query<PageQuery>,
) -> Result<Json<Vec<String>>, (StatusCode, String)> {
    Ok(Json(child_pids(&state, ANCESTOR_FIELD, &pid, &page).await?))
}

/// Highest sequence position currently in use under a parent.
///
/// Returns 0 when the parent has no sequenced children, so callers can
/// append at `result + 1` either way.
pub async fn get_last_child_position(
    State(state): State<Arc<ApiState>>,
    Path(pid): Path<String>,
) -> Result<Json<u64>, (StatusCode, String)> {
    let field = sequence_field(&pid);
    let params = QueryParams::new(1)
        .with_fl(field.clone())
        .with_sort(format!("{field} DESC"));
    let result = state
        .index
        .query(&state.index_core, &phrase_query(PARENT_FIELD, &pid), &params)
        .await
        .map_err(index_error)?;

    // The sequence field may be stored single- or multivalued.
    let position = result
        .docs
        .first()
        .and_then(|doc| doc.get(&field))
        .and_then(|v| match v {
            serde_json::Value::Array(values) => values.first().and_then(|v| v.as_u64()),
            other => other.as_u64(),
        })
        .unwrap_or(0);

    Ok(Json(position))
}

/// List objects with no parents at all.
pub async fn get_top_level_objects(
    State(state): State<Arc<ApiState>>,
    Query(page): Query<PageQuery>,
) -> Result<Json<SearchPage>, (StatusCode, String)> {
    let params = QueryParams::new(page.rows.unwrap_or(ALL_ROWS))
        .with_start(page.start)
        .with_fl("id,title")
        .with_sort(format!("{TITLE_SORT_FIELD} ASC"));
    let query = format!("-{PARENT_FIELD}:*");
    let result = state
        .index
        .query(&state.index_core, &query, &params)
        .await
        .map_err(index_error)?;
    Ok(Json(result))
}

/// Pass-through search request.
#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub query: String,

    #[serde(default)]
    pub start: u32,

    pub rows: Option<u32>,

    #[serde(default)]
    pub fl: Option<String>,

    #[serde(default)]
    pub sort: Option<String>,
}

/// Run an arbitrary query against the object index.
pub async fn query(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<SearchRequest>,
) -> Result<Json<SearchPage>, (StatusCode, String)> {
    let mut params = QueryParams::new(request.rows.unwrap_or(ALL_ROWS)).with_start(request.start);
    if let Some(fl) = request.fl {
        params = params.with_fl(fl);
    }
    if let Some(sort) = request.sort {
        params = params.with_sort(sort);
    }
    let result = state
        .index
        .query(&state.index_core, &request.query, &params)
        .await
        .map_err(index_error)?;
    Ok(Json(result))
}
