use monitor_shared::{
    ContainerStats, CpuMetrics, DockerContainer, HealthStatus, MemoryMetrics, RequestError,
    RetryingRequestClient, SystemOverview,
};

/// Typed access to the monitor REST endpoints, each call retried per the client's policy
pub struct MonitorApi {
    client: RetryingRequestClient,
}

impl MonitorApi {
    pub fn new(client: RetryingRequestClient) -> Self {
        Self { client }
    }

    pub fn base_url(&self) -> &str {
        self.client.base_url()
    }

    pub async fn system_overview(&self) -> Result<SystemOverview, RequestError> {
        self.client.request("/api/system/overview").await
    }

    pub async fn cpu_metrics(&self) -> Result<CpuMetrics, RequestError> {
        self.client.request("/api/system/cpu").await
    }

    pub async fn memory_metrics(&self) -> Result<MemoryMetrics, RequestError> {
        self.client.request("/api/system/memory").await
    }

    pub async fn containers(&self) -> Result<Vec<DockerContainer>, RequestError> {
        self.client.request("/api/docker/containers").await
    }

    pub async fn container_stats(
        &self,
        container_id: &str,
    ) -> Result<ContainerStats, RequestError> {
        self.client
            .request(&format!("/api/docker/containers/{}/stats", container_id))
            .await
    }

    pub async fn health(&self) -> Result<HealthStatus, RequestError> {
        self.client.request("/api/health").await
    }

    /// True only if the health endpoint answers and reports healthy
    pub async fn test_connection(&self) -> bool {
        match self.health().await {
            Ok(health) => health.is_healthy(),
            Err(e) => {
                tracing::error!("Connection test failed: {}", e);
                false
            }
        }
    }
}
