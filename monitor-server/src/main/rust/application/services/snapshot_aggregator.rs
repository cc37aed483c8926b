use std::sync::Arc;

use monitor_shared::{
    CpuMetrics, DockerContainer, MemoryMetrics, Snapshot, SnapshotField, SystemOverview,
};

use crate::domain::errors::Result;
use crate::domain::ports::{MetricSource, MetricsReporter};

/// The fixed set of sources sampled on every tick
#[derive(Clone)]
pub struct MetricSources {
    pub system: Arc<dyn MetricSource<SystemOverview>>,
    pub cpu: Arc<dyn MetricSource<CpuMetrics>>,
    pub memory: Arc<dyn MetricSource<MemoryMetrics>>,
    pub docker: Arc<dyn MetricSource<Vec<DockerContainer>>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SourceFailure {
    pub field: SnapshotField,
    pub source: &'static str,
    pub reason: String,
}

/// Result of one sampling round; never carries data from an earlier round
#[derive(Debug, Clone)]
pub struct SampleReport {
    pub snapshot: Snapshot,
    pub failures: Vec<SourceFailure>,
}

impl SampleReport {
    pub fn is_partial(&self) -> bool {
        !self.failures.is_empty()
    }
}

/// Fans out to every source concurrently and merges whatever succeeded
pub struct SnapshotAggregator {
    sources: MetricSources,
    metrics: Arc<dyn MetricsReporter>,
}

impl SnapshotAggregator {
    pub fn new(sources: MetricSources, metrics: Arc<dyn MetricsReporter>) -> Self {
        Self { sources, metrics }
    }

    pub fn sources(&self) -> &MetricSources {
        &self.sources
    }

    /// Sample all sources. Waits for every source to settle; never fails as a whole.
    pub async fn sample(&self) -> SampleReport {
        let (system, cpu, memory, docker) = tokio::join!(
            self.sources.system.fetch(),
            self.sources.cpu.fetch(),
            self.sources.memory.fetch(),
            self.sources.docker.fetch(),
        );

        let mut failures = Vec::new();
        let snapshot = Snapshot {
            system: self.settle(
                SnapshotField::System,
                self.sources.system.name(),
                system,
                &mut failures,
            ),
            cpu: self.settle(SnapshotField::Cpu, self.sources.cpu.name(), cpu, &mut failures),
            memory: self.settle(
                SnapshotField::Memory,
                self.sources.memory.name(),
                memory,
                &mut failures,
            ),
            docker: self.settle(
                SnapshotField::Docker,
                self.sources.docker.name(),
                docker,
                &mut failures,
            ),
        };

        SampleReport { snapshot, failures }
    }

    fn settle<T>(
        &self,
        field: SnapshotField,
        source: &'static str,
        result: Result<T>,
        failures: &mut Vec<SourceFailure>,
    ) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(source = source, field = %field, "Metric source failed: {}", e);
                self.metrics.report_source_failure(source);
                failures.push(SourceFailure {
                    field,
                    source,
                    reason: e.to_string(),
                });
                None
            }
        }
    }
}
