//! Parent/child relationship mutations.
//!
//! Every entry point validates against freshly fetched data before any
//! store call, so a rejected request never leaves a half-written graph.
//! Moves are delegated to the store as a single atomic relocate; the
//! mutator never detaches a child and re-attaches it in two steps, since
//! that would strand the object parentless if the second step failed.

use std::sync::Arc;

use tracing::debug;

use crate::containment::{can_contain, requires_sequence, Containment};
use crate::error::EditError;
use crate::hierarchy::{HierarchyError, HierarchyResolver};
use crate::model::TreeNode;
use crate::store::{ObjectStore, StoreError};

/// Orchestrates parent-edge and sequence-edge mutations.
#[derive(Clone)]
pub struct RelationshipMutator {
    store: Arc<dyn ObjectStore>,
    resolver: HierarchyResolver,
}

impl RelationshipMutator {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        let resolver = HierarchyResolver::new(store.clone());
        Self { store, resolver }
    }

    /// Attach `child_pid` under `parent_pid`.
    ///
    /// `position_spec` is the raw request body: a decimal position when
    /// the caller wants a sequence slot, or the empty string for none.
    /// A sequence edge is written only when the parent sorts on custom
    /// AND a position was supplied.
    pub async fn add_parent(
        &self,
        child_pid: &str,
        parent_pid: &str,
        position_spec: &str,
    ) -> Result<(), EditError> {
        let parent = self.check_edge_preconditions(child_pid, parent_pid).await?;

        let position = if requires_sequence(parent.sort_on) {
            parse_position(position_spec)?
        } else {
            None
        };

        self.store
            .add_parent_relationship(child_pid, parent_pid)
            .await?;

        if let Some(position) = position {
            self.store
                .add_sequence_relationship(child_pid, parent_pid, position)
                .await?;
        }

        debug!(child = child_pid, parent = parent_pid, "Added parent relationship");
        Ok(())
    }

    /// Atomically relocate `child_pid` under `parent_pid`, detaching it
    /// from all current parents in the same store operation.
    pub async fn move_to_parent(
        &self,
        child_pid: &str,
        parent_pid: &str,
        position_spec: &str,
    ) -> Result<(), EditError> {
        let parent = self.check_edge_preconditions(child_pid, parent_pid).await?;

        let position = if requires_sequence(parent.sort_on) {
            parse_position(position_spec)?
        } else {
            None
        };

        self.store
            .move_to_parent(child_pid, parent_pid, position)
            .await?;

        debug!(child = child_pid, parent = parent_pid, "Moved to new parent");
        Ok(())
    }

    /// Detach `child_pid` from `parent_pid`, removing the sequence edge
    /// too when the parent is custom-sorted.
    pub async fn remove_parent(&self, child_pid: &str, parent_pid: &str) -> Result<(), EditError> {
        let parent = self.immediate_parent(child_pid, parent_pid).await?;
        let had_sequence = requires_sequence(parent.sort_on);

        // Parent edge first; the sequence edge only exists because of it.
        self.store
            .delete_parent_relationship(child_pid, parent_pid)
            .await?;

        if had_sequence {
            self.store
                .delete_sequence_relationship(child_pid, parent_pid)
                .await?;
        }

        debug!(child = child_pid, parent = parent_pid, "Removed parent relationship");
        Ok(())
    }

    /// Update the sequence position of `child_pid` under `parent_pid`.
    pub async fn set_position(
        &self,
        child_pid: &str,
        parent_pid: &str,
        position_spec: &str,
    ) -> Result<(), EditError> {
        let parent = self.immediate_parent(child_pid, parent_pid).await?;

        if !requires_sequence(parent.sort_on) {
            return Err(EditError::validation(format!(
                "{} has sort value of {}; custom is required.",
                parent_pid, parent.sort_on
            )));
        }

        let position = parse_position(position_spec)?.ok_or_else(|| {
            EditError::validation(format!("Invalid position value: {position_spec}"))
        })?;

        self.store
            .update_sequence_relationship(child_pid, parent_pid, position)
            .await?;
        Ok(())
    }

    /// Remove the sequence edge for `child_pid` under `parent_pid`, if any.
    pub async fn clear_position(&self, child_pid: &str, parent_pid: &str) -> Result<(), EditError> {
        self.immediate_parent(child_pid, parent_pid).await?;

        self.store
            .delete_sequence_relationship(child_pid, parent_pid)
            .await?;
        Ok(())
    }

    /// Shared preconditions for add and move: no self-parenting, no
    /// cycles through the new parent's ancestor chain, and a parent whose
    /// models accept this child. Returns the parent's tree root so the
    /// caller can read its sort mode without another fetch.
    async fn check_edge_preconditions(
        &self,
        child_pid: &str,
        parent_pid: &str,
    ) -> Result<TreeNode, EditError> {
        if child_pid == parent_pid {
            return Err(EditError::validation("Object cannot be its own parent."));
        }

        let parent_tree = self
            .resolver
            .get_hierarchy(parent_pid, false)
            .await
            .map_err(|e| parent_fetch_error(parent_pid, e))?;

        if parent_tree.contains_pid(child_pid) {
            return Err(EditError::validation(
                "Object cannot be its own grandparent.",
            ));
        }

        let child = self.resolver.get_object_data(child_pid).await?;

        match can_contain(&parent_tree.models, &child.models) {
            Containment::Allowed => Ok(parent_tree),
            Containment::NotACollection => Err(EditError::validation(format!(
                "Illegal parent {parent_pid}; not a collection!"
            ))),
            Containment::Denied(reason) => Err(EditError::validation(reason)),
        }
    }

    /// Fetch the child's immediate parents and pick out `parent_pid`.
    async fn immediate_parent(
        &self,
        child_pid: &str,
        parent_pid: &str,
    ) -> Result<TreeNode, EditError> {
        let tree = self
            .resolver
            .get_hierarchy(child_pid, true)
            .await
            .map_err(|e| child_fetch_error(child_pid, e))?;

        tree.parents
            .into_iter()
            .find(|p| p.pid == parent_pid)
            .ok_or_else(|| {
                EditError::validation(format!(
                    "{parent_pid} is not an immediate parent of {child_pid}."
                ))
            })
    }
}

fn parse_position(spec: &str) -> Result<Option<u32>, EditError> {
    let trimmed = spec.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    trimmed
        .parse::<u32>()
        .map(Some)
        .map_err(|_| EditError::validation(format!("Invalid position value: {spec}")))
}

fn parent_fetch_error(parent_pid: &str, err: HierarchyError) -> EditError {
    match err {
        HierarchyError::Store(StoreError::NotFound(_)) => {
            EditError::not_found(format!("Error loading parent PID: {parent_pid}"))
        }
        HierarchyError::Store(e) => EditError::Store(e),
        other => EditError::validation(other.to_string()),
    }
}

fn child_fetch_error(child_pid: &str, err: HierarchyError) -> EditError {
    match err {
        HierarchyError::Store(StoreError::NotFound(_)) => {
            EditError::not_found(format!("Error loading PID: {child_pid}"))
        }
        HierarchyError::Store(e) => EditError::Store(e),
        other => EditError::validation(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ModelSet, ObjectRecord, SortOn};
    use crate::testutil::{MockStore, StoreCall};

    fn collection_models() -> ModelSet {
        ModelSet::parse_all(["CoreModel", "CollectionModel"])
    }

    fn setup() -> (Arc<MockStore>, RelationshipMutator) {
        let store = Arc::new(MockStore::new());
        let mutator = RelationshipMutator::new(store.clone());
        (store, mutator)
    }

    #[tokio::test]
    async fn rejects_self_parenting_before_any_fetch() {
        let (store, mutator) = setup();
        let err = mutator.add_parent("foo:123", "foo:123", "2").await.unwrap_err();
        assert_eq!(err.to_string(), "Object cannot be its own parent.");
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn rejects_ancestor_cycles_at_any_depth() {
        let (store, mutator) = setup();
        // foo:200 -> foo:100 -> foo:123: attaching foo:123 under foo:200
        // would close the loop through the grandparent chain.
        store.insert(ObjectRecord::new("foo:123").with_models(collection_models()));
        store.insert(
            ObjectRecord::new("foo:100")
                .with_models(collection_models())
                .with_parents(vec!["foo:123".to_string()]),
        );
        store.insert(
            ObjectRecord::new("foo:200")
                .with_models(collection_models())
                .with_parents(vec!["foo:100".to_string()]),
        );

        let err = mutator.add_parent("foo:123", "foo:200", "").await.unwrap_err();
        assert_eq!(err.to_string(), "Object cannot be its own grandparent.");
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn rejects_non_collection_parents() {
        let (store, mutator) = setup();
        store.insert(ObjectRecord::new("foo:123"));
        store.insert(ObjectRecord::new("foo:100"));

        let err = mutator.add_parent("foo:123", "foo:100", "2").await.unwrap_err();
        assert_eq!(err.to_string(), "Illegal parent foo:100; not a collection!");
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn rejects_containment_chain_violations() {
        let (store, mutator) = setup();
        store.insert(
            ObjectRecord::new("foo:123")
                .with_models(ModelSet::parse_all(["CoreModel", "DataModel", "ImageData"])),
        );
        store.insert(
            ObjectRecord::new("foo:100")
                .with_models(ModelSet::parse_all(["CoreModel", "CollectionModel", "FolderCollection"])),
        );

        let err = mutator.add_parent("foo:123", "foo:100", "").await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "DataModel objects must be contained by a ListCollection"
        );
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn missing_parent_maps_to_not_found() {
        let (store, mutator) = setup();
        store.insert(ObjectRecord::new("foo:123"));

        let err = mutator.add_parent("foo:123", "foo:404", "").await.unwrap_err();
        assert!(matches!(err, EditError::NotFound(_)));
        assert_eq!(err.to_string(), "Error loading parent PID: foo:404");
    }

    #[tokio::test]
    async fn adds_parent_without_sequence_for_title_sort() {
        let (store, mutator) = setup();
        store.insert(ObjectRecord::new("foo:123"));
        store.insert(ObjectRecord::new("foo:100").with_models(collection_models()));

        mutator.add_parent("foo:123", "foo:100", "2").await.unwrap();

        assert_eq!(
            store.calls(),
            vec![StoreCall::AddParent {
                pid: "foo:123".to_string(),
                parent: "foo:100".to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn adds_parent_and_sequence_for_custom_sort() {
        let (store, mutator) = setup();
        store.insert(ObjectRecord::new("foo:123"));
        store.insert(
            ObjectRecord::new("foo:100")
                .with_models(collection_models())
                .with_sort_on(SortOn::Custom),
        );

        mutator.add_parent("foo:123", "foo:100", "2").await.unwrap();

        assert_eq!(
            store.calls(),
            vec![
                StoreCall::AddParent {
                    pid: "foo:123".to_string(),
                    parent: "foo:100".to_string(),
                },
                StoreCall::AddSequence {
                    pid: "foo:123".to_string(),
                    parent: "foo:100".to_string(),
                    position: 2,
                },
            ]
        );
    }

    #[tokio::test]
    async fn rejects_bad_position_before_mutating() {
        let (store, mutator) = setup();
        store.insert(ObjectRecord::new("foo:123"));
        store.insert(
            ObjectRecord::new("foo:100")
                .with_models(collection_models())
                .with_sort_on(SortOn::Custom),
        );

        let err = mutator.add_parent("foo:123", "foo:100", "abc").await.unwrap_err();
        assert_eq!(err.to_string(), "Invalid position value: abc");
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn move_is_one_atomic_store_call() {
        let (store, mutator) = setup();
        store.insert(ObjectRecord::new("foo:123").with_parents(vec!["foo:50".to_string()]));
        store.insert(ObjectRecord::new("foo:50").with_models(collection_models()));
        store.insert(
            ObjectRecord::new("foo:100")
                .with_models(collection_models())
                .with_sort_on(SortOn::Custom),
        );

        mutator.move_to_parent("foo:123", "foo:100", "2").await.unwrap();

        assert_eq!(
            store.calls(),
            vec![StoreCall::Move {
                pid: "foo:123".to_string(),
                parent: "foo:100".to_string(),
                position: Some(2),
            }]
        );
    }

    #[tokio::test]
    async fn move_without_custom_sort_passes_no_position() {
        let (store, mutator) = setup();
        store.insert(ObjectRecord::new("foo:123"));
        store.insert(ObjectRecord::new("foo:100").with_models(collection_models()));

        mutator.move_to_parent("foo:123", "foo:100", "2").await.unwrap();

        assert_eq!(
            store.calls(),
            vec![StoreCall::Move {
                pid: "foo:123".to_string(),
                parent: "foo:100".to_string(),
                position: None,
            }]
        );
    }

    #[tokio::test]
    async fn remove_rejects_non_immediate_parents() {
        let (store, mutator) = setup();
        store.insert(ObjectRecord::new("foo:123"));

        let err = mutator.remove_parent("foo:123", "foo:100").await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "foo:100 is not an immediate parent of foo:123."
        );
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn remove_deletes_parent_edge_only_for_title_sort() {
        let (store, mutator) = setup();
        store.insert(ObjectRecord::new("foo:100"));
        store.insert(ObjectRecord::new("foo:123").with_parents(vec!["foo:100".to_string()]));

        mutator.remove_parent("foo:123", "foo:100").await.unwrap();

        assert_eq!(
            store.calls(),
            vec![StoreCall::DeleteParent {
                pid: "foo:123".to_string(),
                parent: "foo:100".to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn remove_also_deletes_sequence_for_custom_sort() {
        let (store, mutator) = setup();
        store.insert(ObjectRecord::new("foo:100").with_sort_on(SortOn::Custom));
        store.insert(ObjectRecord::new("foo:123").with_parents(vec!["foo:100".to_string()]));

        mutator.remove_parent("foo:123", "foo:100").await.unwrap();

        assert_eq!(
            store.calls(),
            vec![
                StoreCall::DeleteParent {
                    pid: "foo:123".to_string(),
                    parent: "foo:100".to_string(),
                },
                StoreCall::DeleteSequence {
                    pid: "foo:123".to_string(),
                    parent: "foo:100".to_string(),
                },
            ]
        );
    }

    #[tokio::test]
    async fn set_position_requires_custom_sort() {
        let (store, mutator) = setup();
        store.insert(ObjectRecord::new("foo:100"));
        store.insert(ObjectRecord::new("foo:123").with_parents(vec!["foo:100".to_string()]));

        let err = mutator.set_position("foo:123", "foo:100", "2").await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "foo:100 has sort value of title; custom is required."
        );
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn set_position_updates_sequence() {
        let (store, mutator) = setup();
        store.insert(ObjectRecord::new("foo:100").with_sort_on(SortOn::Custom));
        store.insert(ObjectRecord::new("foo:123").with_parents(vec!["foo:100".to_string()]));

        mutator.set_position("foo:123", "foo:100", "2").await.unwrap();

        assert_eq!(
            store.calls(),
            vec![StoreCall::UpdateSequence {
                pid: "foo:123".to_string(),
                parent: "foo:100".to_string(),
                position: 2,
            }]
        );
    }

    #[tokio::test]
    async fn clear_position_checks_parent_then_deletes() {
        let (store, mutator) = setup();
        store.insert(ObjectRecord::new("foo:100").with_sort_on(SortOn::Custom));
        store.insert(ObjectRecord::new("foo:123").with_parents(vec!["foo:100".to_string()]));

        mutator.clear_position("foo:123", "foo:100").await.unwrap();

        assert_eq!(
            store.calls(),
            vec![StoreCall::DeleteSequence {
                pid: "foo:123".to_string(),
                parent: "foo:100".to_string(),
            }]
        );

        let err = mutator.clear_position("foo:123", "foo:999").await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "foo:999 is not an immediate parent of foo:123."
        );
    }
}
