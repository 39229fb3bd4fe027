//! Exclusive activation over remotely stored entities
//!
//! Keeps at most one entity of a collection active when the backing store
//! only offers independent, non-transactional per-entity updates.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                       Coordinator                        │
//! │                                                          │
//! │  ┌─────────────┐   plan   ┌──────────┐   fan-out         │
//! │  │ EntityCache │ ───────► │ Activate │ ─────────┐        │
//! │  └─────────────┘          │ Reconcile│          ▼        │
//! │         ▲                 └──────────┘   ┌─────────────┐ │
//! │         └─── apply confirmed writes ──── │ RemoteStore │ │
//! │                                          └─────────────┘ │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! Partial failures never abort an operation. Every call outcome lands in a
//! report, and the [`reconciler`] drives a violated collection back to a
//! single active entity.
//!
//! # Example
//!
//! ```rust,no_run
//! use activation_core::{Coordinator, EntityId, MockStore};
//!
//! # async fn example() -> activation_core::Result<()> {
//! let coordinator = Coordinator::new(MockStore::new());
//! coordinator.refresh().await?;
//!
//! let report = coordinator.activate(&EntityId::from("q3")).await?;
//! if report.has_failures() {
//!     eprintln!("failed: {:?}", report.failed_ids());
//! }
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod fanout;
pub mod reconciler;
pub mod store;
pub mod types;

// Re-export main types
pub use cache::EntityCache;
pub use config::{CoordinatorConfig, RetryConfig};
pub use coordinator::Coordinator;
pub use error::{ActivationError, Result};
pub use fanout::{CallFailure, CallOutcome};
pub use reconciler::ReconcilePlan;
pub use store::{MockStore, RemoteStore, RetryingStore, StoreError, StoreResult};
pub use types::*;
