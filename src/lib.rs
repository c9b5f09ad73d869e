//! Curator - hierarchy and state management for a digital library.
//!
//! Curator sits between an object repository (the store) and a search
//! index, and owns the rules of the object graph: which objects may
//! contain which, how parent and sequence edges change, and how
//! lifecycle state fans out across a subtree.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         CLIENTS                                 │
//! │  Editors and batch tools driving the REST API                   │
//! └───────────────────────────────┬─────────────────────────────────┘
//!                                 │ /api/v1
//! ┌───────────────────────────────┴─────────────────────────────────┐
//! │                         CURATOR                                 │
//! │  Validates: containment chain, cycles, sequence positions       │
//! │  Operations: attach, detach, move, reorder, state propagation   │
//! │  Reads: ancestor trees from the store, child sets from index    │
//! └───────────────┬───────────────────────────────┬─────────────────┘
//!                 │ REST                          │ select queries
//! ┌───────────────┴───────────────┐ ┌─────────────┴─────────────────┐
//! │        OBJECT STORE           │ │        SEARCH INDEX           │
//! │  Canonical objects and edges  │ │  Denormalized child listings  │
//! └───────────────────────────────┘ └───────────────────────────────┘
//! ```
//!
//! # Key Properties
//!
//! - **Validate-then-write**: every mutation checks fresh data first;
//!   rejected requests leave the graph untouched
//! - **Atomic moves**: relocation is one store operation, never a
//!   detach/attach pair
//! - **Fail-fast propagation**: bulk state changes stop at the first
//!   failure and report it instead of erroring out

// === Core Modules ===

/// Object descriptors, model tags, states, and sort modes.
pub mod model;

/// Containment rules for the hierarchy.
pub mod containment;

/// Ancestor tree resolution.
pub mod hierarchy;

/// Parent/sequence edge mutations.
pub mod relations;

/// Bulk state propagation.
pub mod propagate;

/// Shared edit error type.
pub mod error;

/// Service configuration.
pub mod config;

// === External Service Clients ===

/// Repository object store client.
pub mod store;

/// Search index client.
pub mod index;

// === Surfaces ===

/// REST API.
pub mod api;

// === Re-exports ===

pub use config::ServiceConfig;
pub use error::EditError;
pub use hierarchy::HierarchyResolver;
pub use model::{ModelSet, ModelTag, ObjectRecord, ObjectState, SortOn, TreeNode};
pub use propagate::{StatePropagator, StateSaveReport};
pub use relations::RelationshipMutator;

#[cfg(test)]
pub(crate) mod testutil;
