//! REST API for the Curator daemon.
//!
//! Provides HTTP endpoints for:
//! - Object creation and descriptor lookups
//! - Parent hierarchy resolution
//! - Relationship mutations (attach, detach, move, reorder)
//! - Lifecycle state changes with descendant propagation
//! - Child/browse queries against the search index

pub mod handlers;

use std::sync::Arc;

use axum::http::StatusCode;
use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::ServiceConfig;
use crate::error::EditError;
use crate::hierarchy::HierarchyResolver;
use crate::index::{HttpSearchIndex, SearchIndex};
use crate::propagate::StatePropagator;
use crate::relations::RelationshipMutator;
use crate::store::{HttpObjectStore, ObjectStore};

/// Shared state for API handlers.
pub struct ApiState {
    /// Repository object store client.
    pub store: Arc<dyn ObjectStore>,

    /// Search index client.
    pub index: Arc<dyn SearchIndex>,

    /// Index core holding object documents.
    pub index_core: String,

    /// Relationship mutation orchestrator.
    pub mutator: RelationshipMutator,

    /// Ancestor tree resolver.
    pub resolver: HierarchyResolver,

    /// Lifecycle state propagator.
    pub propagator: StatePropagator,
}

impl ApiState {
    /// Create API state wired to HTTP collaborators from config.
    pub fn new(config: &ServiceConfig) -> Self {
        Self::from_parts(
            Arc::new(HttpObjectStore::new(&config.store_url)),
            Arc::new(HttpSearchIndex::new(&config.index_url)),
            &config.index_core,
        )
    }

    /// Create API state from explicit collaborators.
    pub fn from_parts(
        store: Arc<dyn ObjectStore>,
        index: Arc<dyn SearchIndex>,
        index_core: &str,
    ) -> Self {
        let mutator = RelationshipMutator::new(store.clone());
        let resolver = HierarchyResolver::new(store.clone());
        let propagator = StatePropagator::new(store.clone(), index.clone(), index_core);
        Self {
            store,
            index,
            index_core: index_core.to_string(),
            mutator,
            resolver,
            propagator,
        }
    }
}

/// Map an edit failure to an HTTP response.
///
/// Validation messages go back verbatim as 400s so clients can display
/// them; unexpected store/index failures are logged here and returned
/// as 500s with the raw message.
pub fn error_response(err: EditError) -> (StatusCode, String) {
    match err {
        EditError::Validation(message) => (StatusCode::BAD_REQUEST, message),
        EditError::NotFound(message) => (StatusCode::NOT_FOUND, message),
        other => {
            tracing::error!(error = %other, "Edit operation failed");
            (StatusCode::INTERNAL_SERVER_ERROR, other.to_string())
        }
    }
}

/// Build the API router with all routes.
pub fn router(state: Arc<ApiState>) -> Router {
    // CORS configuration - allow requests from any origin for development
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Status/health
        .route("/api/v1/status", get(handlers::status::health))
        // Object creation and descriptors
        .route("/api/v1/object/new", post(handlers::objects::create_object))
        .route(
            "/api/v1/object/:pid/parents",
            get(handlers::objects::get_parents),
        )
        .route(
            "/api/v1/object/:pid/state",
            put(handlers::objects::set_state),
        )
        .route(
            "/api/v1/object/:pid/sortOn",
            put(handlers::objects::set_sort_on),
        )
        // Relationship mutations
        .route(
            "/api/v1/object/:pid/parent/:parent_pid",
            put(handlers::relationships::add_parent)
                .delete(handlers::relationships::delete_parent),
        )
        .route(
            "/api/v1/object/:pid/moveToParent/:parent_pid",
            post(handlers::relationships::move_to_parent),
        )
        .route(
            "/api/v1/object/:pid/positionInParent/:parent_pid",
            put(handlers::relationships::set_position)
                .delete(handlers::relationships::clear_position),
        )
        // Child/browse queries
        .route(
            "/api/v1/object/:pid/children",
            get(handlers::children::get_children),
        )
        .route(
            "/api/v1/object/:pid/childCounts",
            get(handlers::children::get_child_counts),
        )
        .route(
            "/api/v1/object/:pid/directChildPids",
            get(handlers::children::get_direct_child_pids),
        )
        .route(
            "/api/v1/object/:pid/recursiveChildPids",
            get(handlers::children::get_recursive_child_pids),
        )
        .route(
            "/api/v1/object/:pid/lastChildPosition",
            get(handlers::children::get_last_child_position),
        )
        .route(
            "/api/v1/topLevelObjects",
            get(handlers::children::get_top_level_objects),
        )
        .route("/api/v1/query/search", post(handlers::children::query))
        // Middleware
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "request",
                        method = %request.method(),
                        uri = %request.uri(),
                    )
                })
                // Only log requests/responses that are NOT 200 OK
                .on_request(())
                .on_response(|response: &axum::http::Response<_>, latency: std::time::Duration, _span: &tracing::Span| {
                    let status = response.status();
                    if !status.is_success() {
                        tracing::warn!(
                            status = %status,
                            latency_ms = latency.as_millis(),
                            "request failed"
                        );
                    }
                })
        )
        .with_state(state)
}

/// Start the API server.
pub async fn serve(state: Arc<ApiState>, bind_addr: &str) -> anyhow::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;

    tracing::info!("Curator API listening on {}", bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
