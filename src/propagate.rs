//! Bulk lifecycle-state propagation.
//!
//! Applies a new state to every descendant of a target object, then to
//! the target itself. Descendants come from the search index in pages of
//! 1000, and each write is applied sequentially: concurrent writes into
//! the same subtree under custom sequencing could interleave sequence
//! edges, so the propagator intentionally serializes.
//!
//! There is no rollback. Each state write is independently idempotent,
//! so a failure after N of M descendants leaves those N in the new state
//! and stops; re-running the operation is safe.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::EditError;
use crate::index::{phrase_query, QueryParams, SearchIndex, ANCESTOR_FIELD};
use crate::model::ObjectState;
use crate::store::ObjectStore;

/// Descendants are fetched from the index in pages of this many rows.
pub const CHILD_PAGE_SIZE: u32 = 1000;

/// Severity of a propagation outcome, for caller-side rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Success,
    Error,
}

/// User-facing outcome of a propagation run. Never an `Err`: callers
/// render the message directly at the reported severity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateSaveReport {
    pub message: String,
    pub severity: Severity,
}

impl StateSaveReport {
    fn success() -> Self {
        Self {
            message: "Status saved successfully.".to_string(),
            severity: Severity::Success,
        }
    }

    fn failure(err: &EditError) -> Self {
        Self {
            message: format!("Status failed to save; \"{err}\""),
            severity: Severity::Error,
        }
    }
}

/// Progress callback invoked before each individual state write.
pub type ProgressFn<'a> = &'a (dyn Fn(&str) + Send + Sync);

/// Walks a descendant subtree applying a new lifecycle state.
#[derive(Clone)]
pub struct StatePropagator {
    store: Arc<dyn ObjectStore>,
    index: Arc<dyn SearchIndex>,
    index_core: String,
}

impl StatePropagator {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        index: Arc<dyn SearchIndex>,
        index_core: impl Into<String>,
    ) -> Self {
        Self {
            store,
            index,
            index_core: index_core.into(),
        }
    }

    /// Apply `new_state` to `pid`, and - when `expected_descendants` is
    /// positive - to its full descendant set first.
    ///
    /// Descendant propagation is fail-fast: the first failing write
    /// aborts the run and the target object is left untouched. The
    /// target's own write is skipped when its state already matches.
    pub async fn update_state(
        &self,
        pid: &str,
        new_state: ObjectState,
        expected_descendants: usize,
        progress: ProgressFn<'_>,
    ) -> StateSaveReport {
        if expected_descendants > 0 {
            if let Err(err) = self
                .apply_to_descendants(pid, new_state, expected_descendants, progress)
                .await
            {
                warn!(pid, error = %err, "Descendant state propagation aborted");
                return StateSaveReport::failure(&err);
            }
        }

        match self.save_target(pid, new_state, progress).await {
            Ok(()) => StateSaveReport::success(),
            Err(err) => {
                warn!(pid, error = %err, "State save failed");
                StateSaveReport::failure(&err)
            }
        }
    }

    async fn apply_to_descendants(
        &self,
        pid: &str,
        new_state: ObjectState,
        expected: usize,
        progress: ProgressFn<'_>,
    ) -> Result<(), EditError> {
        let query = phrase_query(ANCESTOR_FIELD, pid);
        let mut found = 0usize;

        while found < expected {
            let params = QueryParams::new(CHILD_PAGE_SIZE)
                .with_fl("id")
                .with_sort("id ASC")
                .with_start(found as u32);
            let page = self.index.query(&self.index_core, &query, &params).await?;

            if page.docs.is_empty() {
                // The index returned fewer descendants than expected;
                // stop rather than re-requesting the same empty page.
                warn!(pid, found, expected, "Descendant listing ended early");
                break;
            }

            found += page.docs.len();
            let remaining = expected.saturating_sub(found);

            for id in page.ids() {
                progress(&format!(
                    "Saving status for {id} ({remaining} more remaining)..."
                ));
                self.store.modify_object_state(id, new_state).await?;
            }
        }

        debug!(pid, found, "Descendant state propagation complete");
        Ok(())
    }

    async fn save_target(
        &self,
        pid: &str,
        new_state: ObjectState,
        progress: ProgressFn<'_>,
    ) -> Result<(), EditError> {
        progress(&format!("Saving status for {pid} (0 more remaining)..."));

        let record = self.store.get_object(pid).await?;
        if record.state == new_state {
            debug!(pid, state = %new_state, "State unchanged; skipping write");
            return Ok(());
        }

        self.store.modify_object_state(pid, new_state).await?;
        Ok(())
    }
}
