//! HTTP client for the entity REST API

use activation_core::{Entity, EntityId, RemoteStore, StoreError, StoreResult};
use async_trait::async_trait;
use reqwest::{header, Client, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::{from_status, from_transport};
use crate::types::{ClientConfig, Envelope, SetActiveRequest};

/// HTTP implementation of [`RemoteStore`]
///
/// # Example
///
/// ```rust,no_run
/// use activation_client::{ClientConfig, StoreClient};
/// use activation_core::RemoteStore;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = StoreClient::new(ClientConfig {
///     base_url: "https://api.example.com".into(),
///     api_key: Some("token".into()),
///     ..Default::default()
/// })?;
///
/// let questions = client.list().await?;
/// # Ok(())
/// # }
/// ```
pub struct StoreClient {
    config: ClientConfig,
    client: Client,
}

impl StoreClient {
    /// Create a new store client
    pub fn new(config: ClientConfig) -> StoreResult<Self> {
        let mut headers = header::HeaderMap::new();
        if let Some(ref api_key) = config.api_key {
            let value = header::HeaderValue::from_str(&format!("Bearer {}", api_key))
                .map_err(|_| StoreError::Unauthorized("API key is not a valid header value".into()))?;
            headers.insert(header::AUTHORIZATION, value);
        }

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| StoreError::Unavailable(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn collection_url(&self) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            self.config.collection.trim_matches('/')
        )
    }

    fn item_url(&self, id: &EntityId) -> String {
        format!("{}/{}", self.collection_url(), urlencoding::encode(id.as_str()))
    }

    /// Fetch the whole collection
    pub async fn fetch_list(&self) -> StoreResult<Vec<Entity>> {
        let url = self.collection_url();
        let response = self.client.get(&url).send().await.map_err(from_transport)?;

        self.handle_response(response)
            .await?
            .ok_or_else(|| StoreError::InvalidResponse("empty list response".into()))
    }

    /// Fetch a single entity
    pub async fn fetch_item(&self, id: &EntityId) -> StoreResult<Entity> {
        let url = self.item_url(id);
        let response = self.client.get(&url).send().await.map_err(from_transport)?;

        self.handle_response(response)
            .await?
            .ok_or_else(|| StoreError::InvalidResponse(format!("empty response for {}", id)))
    }

    /// Update the active flag. Returns the entity when the server echoes it.
    pub async fn put_active(&self, id: &EntityId, active: bool) -> StoreResult<Option<Entity>> {
        let url = self.item_url(id);

        let response = self
            .client
            .put(&url)
            .header(header::CONTENT_TYPE, "application/json")
            .json(&SetActiveRequest { is_active: active })
            .send()
            .await
            .map_err(from_transport)?;

        match self.handle_response::<Entity>(response).await {
            Ok(entity) => Ok(entity),
            // The write went through; only the echo was unusable
            Err(StoreError::InvalidResponse(reason)) => {
                debug!(entity_id = %id, %reason, "Unrecognised update body");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    // ==================== Helper Methods ====================

    /// Check the status and decode a bare or `data`-wrapped body.
    ///
    /// An empty success body yields `Ok(None)`.
    async fn handle_response<T: DeserializeOwned>(&self, response: Response) -> StoreResult<Option<T>> {
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(from_status(status, body));
        }

        let body = response.text().await.map_err(from_transport)?;
        if body.trim().is_empty() {
            return Ok(None);
        }

        serde_json::from_str::<Envelope<T>>(&body)
            .map(|envelope| Some(envelope.into_inner()))
            .map_err(|e| StoreError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl RemoteStore for StoreClient {
    async fn list(&self) -> StoreResult<Vec<Entity>> {
        self.fetch_list().await
    }

    async fn set_active(&self, id: &EntityId, active: bool) -> StoreResult<Entity> {
        match self.put_active(id, active).await? {
            Some(entity) => Ok(entity),
            // The write was accepted; a failed read-back does not undo it
            None => match self.fetch_item(id).await {
                Ok(entity) => Ok(entity),
                Err(e) => {
                    warn!(entity_id = %id, error = %e, "Read-back after update failed");
                    Ok(Entity::new(id.clone(), active))
                }
            },
        }
    }
}
