//! Containment rules for the repository hierarchy.
//!
//! Pure decision logic: given the model tags of a prospective parent and
//! child, decide whether the parent may contain the child. The chain runs
//! leaf-up: data inside lists, lists inside resources, resources inside
//! folders, folders inside folders, and anything else inside any generic
//! collection.

use crate::model::{ModelSet, ModelTag, SortOn};

/// Outcome of a containment check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Containment {
    Allowed,

    /// Denied by one of the chain rules; carries the user-facing reason.
    Denied(String),

    /// Denied because the parent carries no collection tag at all.
    /// The caller owns the message, since it names the parent pid.
    NotACollection,
}

impl Containment {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed)
    }
}

/// Decide whether `parent` may contain `child`, first match wins.
pub fn can_contain(parent: &ModelSet, child: &ModelSet) -> Containment {
    if child.has_data_model() {
        return rule(parent, ModelTag::ListCollection, "DataModel");
    }
    if child.contains(&ModelTag::ListCollection) {
        return rule(parent, ModelTag::ResourceCollection, "ListCollection");
    }
    if child.contains(&ModelTag::ResourceCollection) {
        return rule(parent, ModelTag::FolderCollection, "ResourceCollection");
    }
    if child.contains(&ModelTag::FolderCollection) {
        return rule(parent, ModelTag::FolderCollection, "FolderCollection");
    }
    if parent.has_collection_model() {
        Containment::Allowed
    } else {
        Containment::NotACollection
    }
}

fn rule(parent: &ModelSet, required: ModelTag, child_name: &str) -> Containment {
    if parent.contains(&required) {
        Containment::Allowed
    } else {
        Containment::Denied(format!(
            "{} objects must be contained by a {}",
            child_name,
            required.name()
        ))
    }
}

/// Whether edges under a parent with this sort mode carry sequence numbers.
pub fn requires_sequence(sort_on: SortOn) -> bool {
    sort_on == SortOn::Custom
}
