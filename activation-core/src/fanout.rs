//! Concurrent, independent flag updates.
//!
//! Each update targets a different entity, so the calls commute and run
//! side by side. A failed or abandoned call never affects its siblings.

use futures::future::join_all;
use std::fmt;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::store::{RemoteStore, StoreError};
use crate::types::EntityId;

/// Why one update did not apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallFailure {
    /// The store answered with an error
    Store(StoreError),
    /// Still outstanding when the deadline passed; the call was dropped
    TimedOut,
}

impl fmt::Display for CallFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallFailure::Store(error) => write!(f, "{error}"),
            CallFailure::TimedOut => f.write_str("abandoned at fan-out deadline"),
        }
    }
}

/// Result of one update in a fan-out.
#[derive(Debug, Clone, PartialEq)]
pub struct CallOutcome {
    pub id: EntityId,
    pub active: bool,
    pub result: std::result::Result<(), CallFailure>,
}

impl CallOutcome {
    pub fn succeeded(&self) -> bool {
        self.result.is_ok()
    }
}

/// Issue every update concurrently and wait for all of them.
///
/// With a `timeout`, calls still running at the deadline are dropped and
/// reported as [`CallFailure::TimedOut`]. Dropping only stops waiting; the
/// store may still apply the write. A timeout too large to represent waits
/// for every call. Outcomes come back in input order.
pub async fn fan_out<S>(
    store: &S,
    updates: Vec<(EntityId, bool)>,
    limiter: &Semaphore,
    timeout: Option<Duration>,
) -> Vec<CallOutcome>
where
    S: RemoteStore + ?Sized,
{
    // A deadline past the clock's range means no deadline
    let deadline = timeout.and_then(|t| Instant::now().checked_add(t));

    let calls = updates.into_iter().map(|(id, active)| async move {
        let call = async {
            // Waiting for a permit counts against the deadline too
            let _permit = limiter.acquire().await.ok();
            debug!(entity_id = %id, active, "Issuing update");
            store.set_active(&id, active).await
        };

        let result = match deadline {
            Some(deadline) => match tokio::time::timeout_at(deadline, call).await {
                Ok(response) => response.map(|_| ()).map_err(CallFailure::Store),
                Err(_) => Err(CallFailure::TimedOut),
            },
            None => call.await.map(|_| ()).map_err(CallFailure::Store),
        };

        if let Err(failure) = &result {
            warn!(entity_id = %id, active, failure = %failure, "Update did not apply");
        }

        CallOutcome { id, active, result }
    });

    join_all(calls).await
}
