//! Parent-edge and sequence-edge mutation handlers.
//!
//! All of these take the position (when relevant) as the raw request
//! body and delegate validation to the relationship mutator, so the
//! precondition messages reach clients verbatim.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
};

use crate::api::{error_response, ApiState};

/// Attach an object under an additional parent.
pub async fn add_parent(
    State(state): State<Arc<ApiState>>,
    Path((pid, parent_pid)): Path<(String, String)>,
    body: String,
) -> Result<&'static str, (StatusCode, String)> {
    state
        .mutator
        .add_parent(&pid, &parent_pid, &body)
        .await
        .map_err(error_response)?;
    Ok("ok")
}

/// Atomically relocate an object under a new parent.
pub async fn move_to_parent(
    State(state): State<Arc<ApiState>>,
    Path((pid, parent_pid)): Path<(String, String)>,
    body: String,
) -> Result<&'static str, (StatusCode, String)> {
    state
        .mutator
        .move_to_parent(&pid, &parent_pid, &body)
        .await
        .map_err(error_response)?;
    Ok("ok")
}

/// Detach an object from one of its parents.
pub async fn delete_parent(
    State(state): State<Arc<ApiState>>,
    Path((pid, parent_pid)): Path<(String, String)>,
) -> Result<&'static str, (StatusCode, String)> {
    state
        .mutator
        .remove_parent(&pid, &parent_pid)
        .await
        .map_err(error_response)?;
    Ok("ok")
}

/// Set an object's sequence position under a custom-sorted parent.
pub async fn set_position(
    State(state): State<Arc<ApiState>>,
    Path((pid, parent_pid)): Path<(String, String)>,
    body: String,
) -> Result<&'static str, (StatusCode, String)> {
    state
        .mutator
        .set_position(&pid, &parent_pid, &body)
        .await
        .map_err(error_response)?;
    Ok("ok")
}

/// Remove an object's sequence position under a parent.
pub async fn clear_position(
    State(state): State<Arc<ApiState>>,
    Path((pid, parent_pid)): Path<(String, String)>,
) -> Result<&'static str, (StatusCode, String)> {
    state
        .mutator
        .clear_position(&pid, &parent_pid)
        .await
        .map_err(error_response)?;
    Ok("ok")
}
