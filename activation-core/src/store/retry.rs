//! Retry wrapper around any remote store.

use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

use super::{RemoteStore, StoreError, StoreResult};
use crate::config::RetryConfig;
use crate::types::{Entity, EntityId};

/// Retries transient store failures with linear backoff.
///
/// Only [`StoreError::is_transient`] failures are retried; `NotFound`,
/// `Unauthorized` and rejections return on the first attempt.
pub struct RetryingStore<S> {
    inner: S,
    config: RetryConfig,
}

impl<S: RemoteStore> RetryingStore<S> {
    pub fn new(inner: S, config: RetryConfig) -> Self {
        Self { inner, config }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    fn delay_for(&self, attempt: u32) -> Duration {
        Duration::from_millis(
            self.config
                .retry_delay_ms
                .saturating_mul(u64::from(attempt)),
        )
    }

    fn should_retry(&self, attempt: u32, error: &StoreError) -> bool {
        error.is_transient() && attempt < self.config.max_attempts
    }
}

#[async_trait]
impl<S: RemoteStore> RemoteStore for RetryingStore<S> {
    async fn list(&self) -> StoreResult<Vec<Entity>> {
        let mut attempt = 1;
        loop {
            match self.inner.list().await {
                Err(error) if self.should_retry(attempt, &error) => {
                    debug!(attempt, error = %error, "Retrying list");
                    tokio::time::sleep(self.delay_for(attempt)).await;
                    attempt += 1;
                }
                result => return result,
            }
        }
    }

    async fn set_active(&self, id: &EntityId, active: bool) -> StoreResult<Entity> {
        let mut attempt = 1;
        loop {
            match self.inner.set_active(id, active).await {
                Err(error) if self.should_retry(attempt, &error) => {
                    debug!(entity_id = %id, active, attempt, error = %error, "Retrying update");
                    tokio::time::sleep(self.delay_for(attempt)).await;
                    attempt += 1;
                }
                result => return result,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MockStore;

    fn quick_retries(max_attempts: u32) -> RetryConfig {
        RetryConfig {
            max_attempts,
            retry_delay_ms: 1,
        }
    }

    #[tokio::test]
    async fn test_retries_transient_failures() {
        let mock = MockStore::new().with_entities(vec![Entity::new("a", false)]);
        mock.fail_times("a", 2, StoreError::Timeout("slow".into()));
        let store = RetryingStore::new(mock, quick_retries(3));

        let entity = store.set_active(&"a".into(), true).await.unwrap();

        assert!(entity.active);
        assert_eq!(store.inner().call_count(), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let mock = MockStore::new().with_entities(vec![Entity::new("a", false)]);
        mock.fail_on("a", StoreError::Unavailable("down".into()));
        let store = RetryingStore::new(mock, quick_retries(2));

        let err = store.set_active(&"a".into(), true).await.unwrap_err();

        assert_eq!(err, StoreError::Unavailable("down".into()));
        assert_eq!(store.inner().call_count(), 2);
    }

    #[tokio::test]
    async fn test_terminal_failures_are_not_retried() {
        let mock = MockStore::new().with_entities(vec![Entity::new("a", false)]);
        mock.fail_on("a", StoreError::Unauthorized("bad token".into()));
        let store = RetryingStore::new(mock, quick_retries(5));

        assert!(store.set_active(&"a".into(), true).await.is_err());
        assert_eq!(store.inner().call_count(), 1);
    }

    #[test]
    fn test_huge_delay_saturates() {
        let store = RetryingStore::new(
            MockStore::new(),
            RetryConfig {
                max_attempts: 3,
                retry_delay_ms: u64::MAX,
            },
        );

        assert_eq!(store.delay_for(2), Duration::from_millis(u64::MAX));
        assert_eq!(store.delay_for(1), store.delay_for(3));
    }
}
