use std::fmt;

use serde::{Deserialize, Serialize};

use super::container::DockerContainer;
use super::host_metrics::{CpuMetrics, MemoryMetrics, SystemOverview};

/// Named fields of a snapshot, one per metric source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SnapshotField {
    System,
    Cpu,
    Memory,
    Docker,
}

impl SnapshotField {
    pub const ALL: [SnapshotField; 4] = [Self::System, Self::Cpu, Self::Memory, Self::Docker];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::Cpu => "cpu",
            Self::Memory => "memory",
            Self::Docker => "docker",
        }
    }
}

impl fmt::Display for SnapshotField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One point-in-time aggregate of all metric fields.
///
/// Every field is serialized, absent ones as `null`. Missing keys decode as absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub system: Option<SystemOverview>,
    pub cpu: Option<CpuMetrics>,
    pub memory: Option<MemoryMetrics>,
    pub docker: Option<Vec<DockerContainer>>,
}

impl Snapshot {
    pub fn is_present(&self, field: SnapshotField) -> bool {
        match field {
            SnapshotField::System => self.system.is_some(),
            SnapshotField::Cpu => self.cpu.is_some(),
            SnapshotField::Memory => self.memory.is_some(),
            SnapshotField::Docker => self.docker.is_some(),
        }
    }

    pub fn absent_fields(&self) -> Vec<SnapshotField> {
        SnapshotField::ALL
            .into_iter()
            .filter(|field| !self.is_present(*field))
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.absent_fields().is_empty()
    }
}
