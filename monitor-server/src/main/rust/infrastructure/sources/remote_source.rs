use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use monitor_shared::{ContainerStats, RetryingRequestClient};
use serde::de::DeserializeOwned;

use crate::domain::errors::{DomainError, Result};
use crate::domain::ports::{ContainerStatsSource, MetricSource};

/// Reads a metric from another monitor API (e.g. a Docker agent) over HTTP
pub struct RemoteSource<T> {
    name: &'static str,
    endpoint: String,
    client: Arc<RetryingRequestClient>,
    _payload: PhantomData<fn() -> T>,
}

impl<T> RemoteSource<T> {
    pub fn new(
        name: &'static str,
        endpoint: impl Into<String>,
        client: Arc<RetryingRequestClient>,
    ) -> Self {
        Self {
            name,
            endpoint: endpoint.into(),
            client,
            _payload: PhantomData,
        }
    }
}

#[async_trait]
impl<T> MetricSource<T> for RemoteSource<T>
where
    T: DeserializeOwned + Send + 'static,
{
    fn name(&self) -> &'static str {
        self.name
    }

    async fn fetch(&self) -> Result<T> {
        self.client
            .request::<T>(&self.endpoint)
            .await
            .map_err(|e| DomainError::source_failed(self.name, e.to_string()))
    }
}

/// Per-container stats served by a remote agent at `/api/docker/containers/{id}/stats`
pub struct RemoteStatsSource {
    client: Arc<RetryingRequestClient>,
}

impl RemoteStatsSource {
    pub fn new(client: Arc<RetryingRequestClient>) -> Self {
        Self { client }
    }
}

/// Container ids and names as Docker accepts them
fn is_valid_container_id(id: &str) -> bool {
    !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
}

#[async_trait]
impl ContainerStatsSource for RemoteStatsSource {
    fn name(&self) -> &'static str {
        "docker"
    }

    async fn stats(&self, container_id: &str) -> Result<Option<ContainerStats>> {
        if !is_valid_container_id(container_id) {
            return Ok(None);
        }

        let endpoint = format!("/api/docker/containers/{}/stats", container_id);
        match self.client.request::<ContainerStats>(&endpoint).await {
            Ok(stats) => Ok(Some(stats)),
            Err(e) if e.status_code == Some(404) => Ok(None),
            Err(e) => Err(DomainError::source_failed(self.name(), e.to_string())),
        }
    }
}

/// Source that always fails; stands in for a collector that is not configured
pub struct UnavailableSource<T> {
    name: &'static str,
    reason: String,
    _payload: PhantomData<fn() -> T>,
}

impl<T> UnavailableSource<T> {
    pub fn new(name: &'static str, reason: impl Into<String>) -> Self {
        Self {
            name,
            reason: reason.into(),
            _payload: PhantomData,
        }
    }
}

#[async_trait]
impl<T> MetricSource<T> for UnavailableSource<T>
where
    T: Send + 'static,
{
    fn name(&self) -> &'static str {
        self.name
    }

    async fn fetch(&self) -> Result<T> {
        Err(DomainError::source_failed(self.name, self.reason.clone()))
    }
}

#[async_trait]
impl ContainerStatsSource for UnavailableSource<ContainerStats> {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn stats(&self, _container_id: &str) -> Result<Option<ContainerStats>> {
        Err(DomainError::source_failed(self.name, self.reason.clone()))
    }
}
