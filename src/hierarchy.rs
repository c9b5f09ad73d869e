//! Ancestor hierarchy resolution.
//!
//! Builds display trees of an object's ancestors by fetching descriptors
//! from the repository store. Recomputation on every call is intentional:
//! the tree always reflects live data, and callers own any caching.
//!
//! Cycles are prevented at write time by the relationship mutator, but
//! the deep resolver still guards each path with an ancestor set and a
//! depth cap so malformed stored data fails instead of recursing forever.

use std::collections::HashSet;
use std::sync::Arc;

use futures::future::BoxFuture;
use thiserror::Error;

use crate::model::{ObjectRecord, TreeNode};
use crate::store::{ObjectStore, StoreError};

/// Hard ceiling on ancestor chain length during deep resolution.
const MAX_DEPTH: usize = 64;

/// Errors from hierarchy resolution.
#[derive(Debug, Error)]
pub enum HierarchyError {
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The stored graph revisited a pid along a single ancestor path.
    #[error("Cycle detected in stored hierarchy at {0}")]
    Cycle(String),

    #[error("Ancestor chain for {0} exceeds depth limit {MAX_DEPTH}")]
    TooDeep(String),
}

/// Resolves ancestor trees against the repository store.
#[derive(Clone)]
pub struct HierarchyResolver {
    store: Arc<dyn ObjectStore>,
}

impl HierarchyResolver {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    /// Single-level fetch, used for model and state checks.
    pub async fn get_object_data(&self, pid: &str) -> Result<ObjectRecord, StoreError> {
        self.store.get_object(pid).await
    }

    /// Resolve the ancestor tree for `pid`.
    ///
    /// Shallow resolution returns the object plus its immediate parents
    /// as leaf nodes. Deep resolution follows every parent chain to the
    /// root(s); an object with multiple parents yields one branch per
    /// path, without deduplication.
    pub async fn get_hierarchy(&self, pid: &str, shallow: bool) -> Result<TreeNode, HierarchyError> {
        if shallow {
            let record = self.store.get_object(pid).await?;
            let mut node = TreeNode::leaf(&record);
            for parent_pid in &record.parent_pids {
                let parent = self.store.get_object(parent_pid).await?;
                node.parents.push(TreeNode::leaf(&parent));
            }
            Ok(node)
        } else {
            self.resolve_deep(pid, 0, &HashSet::new()).await
        }
    }

    fn resolve_deep<'a>(
        &'a self,
        pid: &'a str,
        depth: usize,
        path: &'a HashSet<String>,
    ) -> BoxFuture<'a, Result<TreeNode, HierarchyError>> {
        Box::pin(async move {
            if depth >= MAX_DEPTH {
                return Err(HierarchyError::TooDeep(pid.to_string()));
            }
            if path.contains(pid) {
                return Err(HierarchyError::Cycle(pid.to_string()));
            }

            let record = self.store.get_object(pid).await?;
            let mut node = TreeNode::leaf(&record);

            let mut branch_path = path.clone();
            branch_path.insert(pid.to_string());

            for parent_pid in &record.parent_pids {
                let parent = self
                    .resolve_deep(parent_pid, depth + 1, &branch_path)
                    .await?;
                node.parents.push(parent);
            }

            Ok(node)
        })
    }
}
