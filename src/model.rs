//! Core data model for repository objects.
//!
//! Every object in the repository carries a set of model tags describing
//! what it is (collection levels, data/leaf types), a lifecycle state, and
//! a sort mode controlling how its children are ordered. Descriptors are
//! built fresh on every fetch - the core never caches them.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A model tag attached to a repository object.
///
/// Tags arrive from the store as namespaced URIs
/// (`http://host/rest/system:FolderCollection`); parsing strips the
/// namespace once, at this boundary, so the rest of the code compares
/// enum values instead of substrings.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ModelTag {
    /// Base tag carried by every object.
    Core,

    /// Generic container tag; anything carrying it may hold children.
    Collection,

    /// Generic leaf-content tag.
    Data,

    /// Top-level folder; may contain folders and resources.
    FolderCollection,

    /// A resource (e.g. a book); may contain lists.
    ResourceCollection,

    /// An ordered list of leaf objects (e.g. pages).
    ListCollection,

    /// Image leaf content.
    ImageData,

    /// Audio leaf content.
    AudioData,

    /// PDF leaf content.
    PdfData,

    /// Generic document leaf content.
    DocumentData,

    /// A tag this service does not recognize; preserved verbatim so
    /// foreign repository data cannot break descriptor parsing.
    Other(String),
}

impl ModelTag {
    /// Parse a tag from a possibly-namespaced string.
    ///
    /// Accepts full URIs (`http://host/rest/system:ImageData`), prefixed
    /// names (`system:ImageData`), and bare names (`ImageData`).
    pub fn parse(raw: &str) -> Self {
        let local = raw
            .rsplit(|c| c == ':' || c == '/')
            .next()
            .unwrap_or(raw)
            .trim();

        match local {
            "CoreModel" => Self::Core,
            "CollectionModel" => Self::Collection,
            "DataModel" => Self::Data,
            "FolderCollection" => Self::FolderCollection,
            "ResourceCollection" => Self::ResourceCollection,
            "ListCollection" => Self::ListCollection,
            "ImageData" => Self::ImageData,
            "AudioData" => Self::AudioData,
            "PdfData" => Self::PdfData,
            "DocumentData" => Self::DocumentData,
            other => Self::Other(other.to_string()),
        }
    }

    /// Whether this tag marks leaf content rather than a container.
    pub fn is_data(&self) -> bool {
        matches!(
            self,
            Self::Data | Self::ImageData | Self::AudioData | Self::PdfData | Self::DocumentData
        )
    }

    /// Local (namespace-free) name of the tag.
    pub fn name(&self) -> &str {
        match self {
            Self::Core => "CoreModel",
            Self::Collection => "CollectionModel",
            Self::Data => "DataModel",
            Self::FolderCollection => "FolderCollection",
            Self::ResourceCollection => "ResourceCollection",
            Self::ListCollection => "ListCollection",
            Self::ImageData => "ImageData",
            Self::AudioData => "AudioData",
            Self::PdfData => "PdfData",
            Self::DocumentData => "DocumentData",
            Self::Other(name) => name,
        }
    }
}

impl fmt::Display for ModelTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The set of model tags carried by one object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelSet(BTreeSet<ModelTag>);

impl ModelSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a set from raw (possibly namespaced) tag strings.
    pub fn parse_all<I, S>(raw: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self(raw.into_iter().map(|s| ModelTag::parse(s.as_ref())).collect())
    }

    /// The full tag set a freshly created object of `tag` will carry:
    /// the tag itself, the core tag, and the matching generic group tag.
    pub fn for_new_object(tag: ModelTag) -> Self {
        let mut set = BTreeSet::new();
        set.insert(ModelTag::Core);
        if tag.is_data() {
            set.insert(ModelTag::Data);
        } else {
            set.insert(ModelTag::Collection);
        }
        set.insert(tag);
        Self(set)
    }

    pub fn contains(&self, tag: &ModelTag) -> bool {
        self.0.contains(tag)
    }

    /// Whether any tag in the set marks leaf content.
    pub fn has_data_model(&self) -> bool {
        self.0.iter().any(ModelTag::is_data)
    }

    /// Whether the object may contain children at all.
    pub fn has_collection_model(&self) -> bool {
        self.0.contains(&ModelTag::Collection)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn insert(&mut self, tag: ModelTag) {
        self.0.insert(tag);
    }

    pub fn iter(&self) -> impl Iterator<Item = &ModelTag> {
        self.0.iter()
    }
}

impl FromIterator<ModelTag> for ModelSet {
    fn from_iter<I: IntoIterator<Item = ModelTag>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Rejected lifecycle-state string.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("Illegal state: {0}")]
pub struct IllegalState(pub String);

/// Lifecycle state of a repository object.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObjectState {
    Active,
    #[default]
    Inactive,
    Deleted,
}

impl ObjectState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::Inactive => "Inactive",
            Self::Deleted => "Deleted",
        }
    }
}

impl fmt::Display for ObjectState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ObjectState {
    type Err = IllegalState;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Active" => Ok(Self::Active),
            "Inactive" => Ok(Self::Inactive),
            "Deleted" => Ok(Self::Deleted),
            other => Err(IllegalState(other.to_string())),
        }
    }
}

/// Rejected sort-mode string.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unrecognized sortOn value: {0}. Legal values: custom, title")]
pub struct IllegalSort(pub String);

/// How an object orders its children.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOn {
    /// Implicit ordering by title (the default).
    #[default]
    Title,

    /// Explicit integer sequence per parent edge.
    Custom,
}

impl SortOn {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Custom => "custom",
        }
    }
}

impl fmt::Display for SortOn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortOn {
    type Err = IllegalSort;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "title" => Ok(Self::Title),
            "custom" => Ok(Self::Custom),
            other => Err(IllegalSort(other.to_string())),
        }
    }
}

/// Snapshot of one repository object's metadata, valid for one fetch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectRecord {
    /// Persistent identifier, stable for the object's lifetime.
    pub pid: String,

    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub models: ModelSet,

    #[serde(default)]
    pub state: ObjectState,

    #[serde(default)]
    pub sort_on: SortOn,

    /// Immediate parent pids, in store order.
    #[serde(default)]
    pub parent_pids: Vec<String>,
}

impl ObjectRecord {
    pub fn new(pid: impl Into<String>) -> Self {
        Self {
            pid: pid.into(),
            ..Self::default()
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_models(mut self, models: ModelSet) -> Self {
        self.models = models;
        self
    }

    pub fn with_state(mut self, state: ObjectState) -> Self {
        self.state = state;
        self
    }

    pub fn with_sort_on(mut self, sort_on: SortOn) -> Self {
        self.sort_on = sort_on;
        self
    }

    pub fn with_parents(mut self, parents: Vec<String>) -> Self {
        self.parent_pids = parents;
        self
    }
}

/// One node in a resolved ancestor tree.
///
/// This is a display tree, not a canonical graph: an object reachable
/// through two parent paths appears once per path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeNode {
    pub pid: String,
    pub title: String,
    pub state: ObjectState,
    pub sort_on: SortOn,
    pub models: ModelSet,
    pub parents: Vec<TreeNode>,
}

impl TreeNode {
    /// A node with no parent branches, from a fetched record.
    pub fn leaf(record: &ObjectRecord) -> Self {
        Self {
            pid: record.pid.clone(),
            title: record.title.clone(),
            state: record.state,
            sort_on: record.sort_on,
            models: record.models.clone(),
            parents: Vec::new(),
        }
    }

    /// Whether `pid` appears anywhere in this tree (self included).
    pub fn contains_pid(&self, pid: &str) -> bool {
        self.pid == pid || self.parents.iter().any(|p| p.contains_pid(pid))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_namespaced_tags() {
        assert_eq!(
            ModelTag::parse("http://localhost:8080/rest/system:FolderCollection"),
            ModelTag::FolderCollection
        );
        assert_eq!(ModelTag::parse("system:CollectionModel"), ModelTag::Collection);
        assert_eq!(ModelTag::parse("ImageData"), ModelTag::ImageData);
    }

    #[test]
    fn preserves_unknown_tags() {
        let tag = ModelTag::parse("system:UnsupportedValue");
        assert_eq!(tag, ModelTag::Other("UnsupportedValue".to_string()));
        assert_eq!(tag.name(), "UnsupportedValue");
        assert!(!tag.is_data());
    }

    #[test]
    fn data_tags_are_detected() {
        assert!(ModelTag::Data.is_data());
        assert!(ModelTag::PdfData.is_data());
        assert!(!ModelTag::ListCollection.is_data());

        let set = ModelSet::parse_all(["system:CoreModel", "system:AudioData"]);
        assert!(set.has_data_model());
        assert!(!set.has_collection_model());
    }

    #[test]
    fn new_object_models_include_group_tags() {
        let set = ModelSet::for_new_object(ModelTag::ImageData);
        assert!(set.contains(&ModelTag::Core));
        assert!(set.contains(&ModelTag::Data));
        assert!(set.contains(&ModelTag::ImageData));

        let set = ModelSet::for_new_object(ModelTag::FolderCollection);
        assert!(set.has_collection_model());
        assert!(!set.has_data_model());
    }

    #[test]
    fn state_parsing_rejects_unknown_values() {
        assert_eq!("Active".parse::<ObjectState>().unwrap(), ObjectState::Active);
        let err = "Illegal".parse::<ObjectState>().unwrap_err();
        assert_eq!(err.to_string(), "Illegal state: Illegal");
    }

    #[test]
    fn sort_parsing_rejects_unknown_values() {
        assert_eq!("custom".parse::<SortOn>().unwrap(), SortOn::Custom);
        let err = "Illegal".parse::<SortOn>().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Unrecognized sortOn value: Illegal. Legal values: custom, title"
        );
    }

    #[test]
    fn tree_membership_is_recursive() {
        let grandparent = TreeNode::leaf(&ObjectRecord::new("foo:1"));
        let mut parent = TreeNode::leaf(&ObjectRecord::new("foo:2"));
        parent.parents.push(grandparent);
        let mut child = TreeNode::leaf(&ObjectRecord::new("foo:3"));
        child.parents.push(parent);

        assert!(child.contains_pid("foo:1"));
        assert!(child.contains_pid("foo:3"));
        assert!(!child.contains_pid("foo:4"));
    }
}
