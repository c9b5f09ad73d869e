//! Shared error type for edit operations.

use thiserror::Error;

use crate::index::IndexError;
use crate::store::StoreError;

/// Errors surfaced by the mutator, resolver, and propagator entry points.
///
/// The HTTP layer maps kinds to status codes: `Validation` becomes 400
/// with the message verbatim, `NotFound` becomes 404, and everything else
/// is logged and returned as 500 with the raw message text.
#[derive(Debug, Error)]
pub enum EditError {
    /// Precondition failure; the message is user-facing and reusable.
    #[error("{0}")]
    Validation(String),

    /// An upstream lookup failed for a pid the caller supplied.
    #[error("{0}")]
    NotFound(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Index(#[from] IndexError),
}

impl EditError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }
}
