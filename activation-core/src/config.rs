//! Coordinator and retry configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Coordinator configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoordinatorConfig {
    /// Deadline for a whole fan-out in milliseconds (0 = wait for every call)
    #[serde(default = "default_fan_out_timeout")]
    pub fan_out_timeout_ms: u64,

    /// Maximum remote calls in flight at once
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_calls: usize,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            fan_out_timeout_ms: default_fan_out_timeout(),
            max_concurrent_calls: default_max_concurrent(),
        }
    }
}

impl CoordinatorConfig {
    /// Default fan-out deadline, if any.
    pub fn fan_out_timeout(&self) -> Option<Duration> {
        (self.fan_out_timeout_ms > 0).then(|| Duration::from_millis(self.fan_out_timeout_ms))
    }
}

/// Retry policy for [`RetryingStore`](crate::store::RetryingStore).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total attempts per call, including the first
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Base delay; attempt `n` waits `n * retry_delay_ms`
    #[serde(default = "default_retry_delay")]
    pub retry_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            retry_delay_ms: default_retry_delay(),
        }
    }
}

// Defaults
fn default_fan_out_timeout() -> u64 { 10_000 }
fn default_max_concurrent() -> usize { 16 }
fn default_max_attempts() -> u32 { 3 }
fn default_retry_delay() -> u64 { 250 }
