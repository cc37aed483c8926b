use chrono::{DateTime, Utc};
use monitor_shared::{CpuMetrics, DockerContainer, MemoryMetrics, Snapshot, SystemOverview};

/// Last known good value of every snapshot field, as seen by one client.
///
/// Unlike the server, which never resends stale data, an update only overwrites
/// the fields it carries; absent fields keep their previous value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LatestSnapshot {
    pub system: Option<SystemOverview>,
    pub cpu: Option<CpuMetrics>,
    pub memory: Option<MemoryMetrics>,
    pub docker: Option<Vec<DockerContainer>>,
    pub last_update: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

impl LatestSnapshot {
    pub fn apply_update(&mut self, snapshot: Snapshot, timestamp: DateTime<Utc>) {
        if let Some(system) = snapshot.system {
            self.system = Some(system);
        }
        if let Some(cpu) = snapshot.cpu {
            self.cpu = Some(cpu);
        }
        if let Some(memory) = snapshot.memory {
            self.memory = Some(memory);
        }
        if let Some(docker) = snapshot.docker {
            self.docker = Some(docker);
        }
        self.last_update = Some(timestamp);
        self.last_error = None;
    }

    pub fn record_error(&mut self, reason: impl Into<String>) {
        self.last_error = Some(reason.into());
    }

    pub fn has_data(&self) -> bool {
        self.last_update.is_some()
    }

    pub fn to_snapshot(&self) -> Snapshot {
        Snapshot {
            system: self.system.clone(),
            cpu: self.cpu.clone(),
            memory: self.memory.clone(),
            docker: self.docker.clone(),
        }
    }
}
