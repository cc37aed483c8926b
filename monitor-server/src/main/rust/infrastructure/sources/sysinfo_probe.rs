use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use monitor_shared::{
    usage_percent, CoreUsage, CpuMetrics, CpuSummary, LoadAverage, MemoryMetrics, SwapUsage,
    SystemOverview, UsageSummary,
};
use sysinfo::{Components, CpuRefreshKind, Disks, MemoryRefreshKind, RefreshKind, System};

use crate::domain::errors::{DomainError, Result};
use crate::domain::ports::MetricSource;

struct ProbeState {
    system: System,
    components: Components,
    disks: Disks,
}

/// Local host readings shared by the system, CPU and memory sources.
///
/// CPU usage is computed between consecutive refreshes, so the first reading is 0.
pub struct SysinfoProbe {
    state: Mutex<ProbeState>,
}

impl SysinfoProbe {
    pub fn new() -> Arc<Self> {
        let refresh_kind = RefreshKind::nothing()
            .with_cpu(CpuRefreshKind::everything())
            .with_memory(MemoryRefreshKind::everything());

        Arc::new(Self {
            state: Mutex::new(ProbeState {
                system: System::new_with_specifics(refresh_kind),
                components: Components::new_with_refreshed_list(),
                disks: Disks::new_with_refreshed_list(),
            }),
        })
    }

    fn lock(&self, source: &'static str) -> Result<MutexGuard<'_, ProbeState>> {
        self.state
            .lock()
            .map_err(|_| DomainError::source_failed(source, "probe state poisoned"))
    }

    fn overview(&self) -> Result<SystemOverview> {
        let mut state = self.lock(SYSTEM)?;
        state.system.refresh_cpu_usage();
        state.system.refresh_memory();
        state.disks.refresh(true);
        state.components.refresh(true);

        let load = System::load_average();
        let temperature = hottest_sensor(&state.components);
        let (disk_total, disk_free) = state
            .disks
            .iter()
            .max_by_key(|disk| disk.total_space())
            .map(|disk| (disk.total_space(), disk.available_space()))
            .unwrap_or((0, 0));

        let system = &state.system;
        Ok(SystemOverview {
            hostname: System::host_name().unwrap_or_else(|| "unknown".to_string()),
            uptime: System::uptime(),
            load_average: [load.one, load.five, load.fifteen],
            cpu: CpuSummary {
                usage: system.global_cpu_usage().round() as u32,
                cores: system.cpus().len() as u32,
                temperature,
            },
            memory: UsageSummary::new(
                system.total_memory(),
                system.used_memory(),
                system.free_memory(),
            ),
            disk: UsageSummary::new(
                disk_total,
                disk_total.saturating_sub(disk_free),
                disk_free,
            ),
        })
    }

    fn cpu(&self) -> Result<CpuMetrics> {
        let mut state = self.lock(CPU)?;
        state.system.refresh_cpu_all();
        state.components.refresh(true);

        let load = System::load_average();
        let temperature = hottest_sensor(&state.components);
        let cpus = state.system.cpus();

        Ok(CpuMetrics {
            usage: state.system.global_cpu_usage().round() as u32,
            cores: cpus
                .iter()
                .enumerate()
                .map(|(index, cpu)| CoreUsage {
                    core: index as u32,
                    usage: cpu.cpu_usage().round() as u32,
                })
                .collect(),
            temperature,
            frequency: cpus.first().map(|cpu| cpu.frequency()).unwrap_or(0),
            load_average: LoadAverage {
                one: load.one,
                five: load.five,
                fifteen: load.fifteen,
            },
        })
    }

    fn memory(&self) -> Result<MemoryMetrics> {
        let mut state = self.lock(MEMORY)?;
        state.system.refresh_memory();

        let system = &state.system;
        let total = system.total_memory();
        let used = system.used_memory();
        let free = system.free_memory();
        let available = system.available_memory();

        Ok(MemoryMetrics {
            total,
            used,
            free,
            available,
            usage: usage_percent(used, total),
            swap: SwapUsage {
                total: system.total_swap(),
                used: system.used_swap(),
                free: system.free_swap(),
            },
            // sysinfo does not split buffers from page cache
            buffers: 0,
            cached: available.saturating_sub(free),
        })
    }
}

fn hottest_sensor(components: &Components) -> f32 {
    components
        .iter()
        .filter_map(|component| component.temperature())
        .filter(|celsius| celsius.is_finite())
        .fold(0.0, f32::max)
}

const SYSTEM: &str = "system";
const CPU: &str = "cpu";
const MEMORY: &str = "memory";

async fn on_blocking_pool<T, F>(
    source: &'static str,
    probe: Arc<SysinfoProbe>,
    read: F,
) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce(&SysinfoProbe) -> Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(move || read(&probe))
        .await
        .map_err(|e| DomainError::source_failed(source, e.to_string()))?
}

pub struct SystemOverviewSource(pub Arc<SysinfoProbe>);

#[async_trait]
impl MetricSource<SystemOverview> for SystemOverviewSource {
    fn name(&self) -> &'static str {
        SYSTEM
    }

    async fn fetch(&self) -> Result<SystemOverview> {
        on_blocking_pool(SYSTEM, self.0.clone(), SysinfoProbe::overview).await
    }
}

pub struct CpuSource(pub Arc<SysinfoProbe>);

#[async_trait]
impl MetricSource<CpuMetrics> for CpuSource {
    fn name(&self) -> &'static str {
        CPU
    }

    async fn fetch(&self) -> Result<CpuMetrics> {
        on_blocking_pool(CPU, self.0.clone(), SysinfoProbe::cpu).await
    }
}

pub struct MemorySource(pub Arc<SysinfoProbe>);

#[async_trait]
impl MetricSource<MemoryMetrics> for MemorySource {
    fn name(&self) -> &'static str {
        MEMORY
    }

    async fn fetch(&self) -> Result<MemoryMetrics> {
        on_blocking_pool(MEMORY, self.0.clone(), SysinfoProbe::memory).await
    }
}
