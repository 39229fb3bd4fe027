//! Types for the store HTTP API

use serde::{Deserialize, Serialize};

/// Client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the REST API
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Collection path segment (e.g. "questions")
    #[serde(default = "default_collection")]
    pub collection: String,
    /// Optional bearer token
    #[serde(default)]
    pub api_key: Option<String>,
    /// Per-request timeout in seconds (default: 30)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            collection: default_collection(),
            api_key: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_base_url() -> String { "http://localhost:8080".to_string() }
fn default_collection() -> String { "questions".to_string() }
fn default_timeout_secs() -> u64 { 30 }

/// Response body that is either bare or wrapped in `{ "data": ... }`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum Envelope<T> {
    Wrapped { data: T },
    Bare(T),
}

impl<T> Envelope<T> {
    pub(crate) fn into_inner(self) -> T {
        match self {
            Envelope::Wrapped { data } => data,
            Envelope::Bare(inner) => inner,
        }
    }
}

/// Request body for a flag update
#[derive(Debug, Clone, Serialize)]
pub(crate) struct SetActiveRequest {
    #[serde(rename = "isActive")]
    pub is_active: bool,
}
