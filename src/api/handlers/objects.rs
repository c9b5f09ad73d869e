//! Object creation, descriptor, and lifecycle handlers.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use crate::api::{error_response, ApiState};
use crate::containment::{can_contain, Containment};
use crate::error::EditError;
use crate::hierarchy::HierarchyError;
use crate::model::{ModelSet, ModelTag, ObjectState, SortOn, TreeNode};
use crate::propagate::StateSaveReport;
use crate::store::StoreError;

/// Request to create a new repository object.
///
/// All fields arrive optional so missing ones can be reported by name.
#[derive(Debug, Deserialize)]
pub struct CreateObjectRequest {
    /// Model tag for the new object (bare or namespaced).
    #[serde(default)]
    pub model: Option<String>,

    #[serde(default)]
    pub title: Option<String>,

    /// Initial lifecycle state: Active, Inactive or Deleted.
    #[serde(default)]
    pub state: Option<String>,

    /// Optional parent to attach the new object under.
    #[serde(default)]
    pub parent: Option<String>,
}

/// Create a new object, optionally attached under a parent.
///
/// Replies with the new object's pid as plain text.
pub async fn create_object(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<CreateObjectRequest>,
) -> Result<String, (StatusCode, String)> {
    let model = request
        .model
        .filter(|m| !m.is_empty())
        .ok_or((StatusCode::BAD_REQUEST, "Missing model parameter.".to_string()))?;
    let title = request
        .title
        .filter(|t| !t.is_empty())
        .ok_or((StatusCode::BAD_REQUEST, "Missing title parameter.".to_string()))?;
    let state_str = request
        .state
        .filter(|s| !s.is_empty())
        .ok_or((StatusCode::BAD_REQUEST, "Missing state parameter.".to_string()))?;

    let tag = ModelTag::parse(&model);
    if matches!(tag, ModelTag::Other(_) | ModelTag::Core) {
        return Err((
            StatusCode::BAD_REQUEST,
            format!("Unrecognized model {model}."),
        ));
    }

    let object_state: ObjectState = state_str
        .parse()
        .map_err(|e: crate::model::IllegalState| (StatusCode::BAD_REQUEST, e.to_string()))?;

    // The new object's full tag set drives the containment check.
    if let Some(parent_pid) = &request.parent {
        let parent = state
            .resolver
            .get_object_data(parent_pid)
            .await
            .map_err(|e| match e {
                StoreError::NotFound(_) => (
                    StatusCode::NOT_FOUND,
                    format!("Error loading parent PID: {parent_pid}"),
                ),
                other => error_response(EditError::Store(other)),
            })?;

        match can_contain(&parent.models, &ModelSet::for_new_object(tag.clone())) {
            Containment::Allowed => {}
            Containment::NotACollection => {
                return Err((
                    StatusCode::BAD_REQUEST,
                    format!("Illegal parent {parent_pid}; not a collection!"),
                ));
            }
            Containment::Denied(reason) => {
                return Err((StatusCode::BAD_REQUEST, reason));
            }
        }
    }

    let pid = state
        .store
        .create_object(&tag, &title, object_state, request.parent.as_deref())
        .await
        .map_err(|e| error_response(EditError::Store(e)))?;

    tracing::info!(pid, model = %tag, "Created object");
    Ok(pid)
}

/// Query string for parent resolution.
#[derive(Debug, Deserialize)]
pub struct ParentsQuery {
    /// Non-zero stops resolution at the immediate parents.
    #[serde(default)]
    pub shallow: u8,
}

/// Resolve the ancestor tree for an object.
pub async fn get_parents(
    State(state): State<Arc<ApiState>>,
    Path(pid): Path<String>,
    Query(query): Query<ParentsQuery>,
) -> Result<Json<TreeNode>, (StatusCode, String)> {
    let tree = state
        .resolver
        .get_hierarchy(&pid, query.shallow != 0)
        .await
        .map_err(|e| match e {
            HierarchyError::Store(StoreError::NotFound(_)) => (
                StatusCode::NOT_FOUND,
                format!("Error loading PID: {pid}"),
            ),
            HierarchyError::Store(other) => error_response(EditError::Store(other)),
            other => {
                tracing::error!(pid, error = %other, "Hierarchy resolution failed");
                (StatusCode::INTERNAL_SERVER_ERROR, other.to_string())
            }
        })?;
    Ok(Json(tree))
}

/// Query string for state updates.
#[derive(Debug, Deserialize)]
pub struct StateQuery {
    /// Expected descendant count; non-zero triggers full propagation.
    #[serde(default)]
    pub children: usize,
}

/// Response from a state update: plain `ok` for the single-object path,
/// or the propagator's report when descendants were included.
#[derive(Debug)]
pub enum StateResponse {
    Ok,
    Report(StateSaveReport),
}

impl axum::response::IntoResponse for StateResponse {
    fn into_response(self) -> axum::response::Response {
        match self {
            Self::Ok => "ok".into_response(),
            Self::Report(report) => Json(report).into_response(),
        }
    }
}

/// Update an object's lifecycle state.
///
/// With `?children=<n>` (n > 0), propagates the state to all descendants
/// first and returns the propagation report instead of `ok`.
pub async fn set_state(
    State(state): State<Arc<ApiState>>,
    Path(pid): Path<String>,
    Query(query): Query<StateQuery>,
    body: String,
) -> Result<StateResponse, (StatusCode, String)> {
    let new_state: ObjectState = body
        .trim()
        .parse()
        .map_err(|e: crate::model::IllegalState| (StatusCode::BAD_REQUEST, e.to_string()))?;

    if query.children > 0 {
        let progress = |message: &str| tracing::info!(pid = %pid, "{message}");
        let report = state
            .propagator
            .update_state(&pid, new_state, query.children, &progress)
            .await;
        return Ok(StateResponse::Report(report));
    }

    let record = state
        .resolver
        .get_object_data(&pid)
        .await
        .map_err(|e| error_response(EditError::Store(e)))?;

    if record.state != new_state {
        state
            .store
            .modify_object_state(&pid, new_state)
            .await
            .map_err(|e| error_response(EditError::Store(e)))?;
    }

    Ok(StateResponse::Ok)
}

/// Update an object's child sort mode.
pub async fn set_sort_on(
    State(state): State<Arc<ApiState>>,
    Path(pid): Path<String>,
    body: String,
) -> Result<&'static str, (StatusCode, String)> {
    let sort_on: SortOn = body
        .trim()
        .parse()
        .map_err(|e: crate::model::IllegalSort| (StatusCode::BAD_REQUEST, e.to_string()))?;

    state
        .store
        .update_sort_on(&pid, sort_on)
        .await
        .map_err(|e| error_response(EditError::Store(e)))?;

    Ok("ok")
}
