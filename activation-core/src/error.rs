//! Error types for activation operations

use thiserror::Error;

use crate::store::StoreError;
use crate::types::EntityId;

/// Result type for coordinator operations
pub type Result<T> = std::result::Result<T, ActivationError>;

/// Hard failures of a whole operation.
///
/// Individual remote calls that fail inside a fan-out never surface here;
/// they are reported through the operation's report instead.
#[derive(Error, Debug)]
pub enum ActivationError {
    /// Target id is not in the cache
    #[error("Entity not found: {0}")]
    EntityNotFound(EntityId),

    /// Listing the remote store failed
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}
