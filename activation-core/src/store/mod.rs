//! Remote store contract
//!
//! The store is the sole durable owner of entity state. It offers a full
//! listing and one independent flag update per entity, with no atomicity
//! across calls.

mod mock;
mod retry;

pub use mock::{MockStore, StoreCall};
pub use retry::RetryingStore;

use async_trait::async_trait;
use thiserror::Error;

use crate::types::{Entity, EntityId};

/// Result type for store calls
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Failures reported by a remote store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Entity does not exist in the store
    #[error("Not found: {0}")]
    NotFound(String),

    /// Credentials missing or rejected
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Store could not be reached or failed internally
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// Request did not complete in time
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// Any other non-success response
    #[error("Rejected with status {status}: {message}")]
    Rejected { status: u16, message: String },

    /// Response body could not be understood
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl StoreError {
    /// Failures worth retrying with the same request.
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Unavailable(_) | StoreError::Timeout(_))
    }
}

/// Client for the store that owns the entities.
///
/// Implementations decide transport and encoding. Retry and backoff policy
/// belongs in a wrapper such as [`RetryingStore`], not in the coordinator.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Fetch every entity in the collection.
    async fn list(&self) -> StoreResult<Vec<Entity>>;

    /// Set the active flag of one entity and return its new state.
    async fn set_active(&self, id: &EntityId, active: bool) -> StoreResult<Entity>;
}

#[async_trait]
impl<S: RemoteStore + ?Sized> RemoteStore for std::sync::Arc<S> {
    async fn list(&self) -> StoreResult<Vec<Entity>> {
        (**self).list().await
    }

    async fn set_active(&self, id: &EntityId, active: bool) -> StoreResult<Entity> {
        (**self).set_active(id, active).await
    }
}
