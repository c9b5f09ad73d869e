//! Service configuration.

/// Configuration for a Curator service instance.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Base URL of the repository object store.
    pub store_url: String,

    /// Base URL of the search index.
    pub index_url: String,

    /// Search index core holding object documents.
    pub index_core: String,
}

impl ServiceConfig {
    /// Create a new config pointing at the given collaborators.
    pub fn new(
        store_url: impl Into<String>,
        index_url: impl Into<String>,
        index_core: impl Into<String>,
    ) -> Self {
        Self {
            store_url: store_url.into(),
            index_url: index_url.into(),
            index_core: index_core.into(),
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self::new(
            "http://localhost:8088",
            "http://localhost:8983/solr",
            "objects",
        )
    }
}
