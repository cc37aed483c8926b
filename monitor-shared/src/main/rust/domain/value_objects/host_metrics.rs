use serde::{Deserialize, Serialize};

/// Whole-number percentage of `part` in `total`; 0 when `total` is 0
pub fn usage_percent(part: u64, total: u64) -> u32 {
    if total == 0 {
        return 0;
    }
    ((part as f64 / total as f64) * 100.0).round() as u32
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemOverview {
    pub hostname: String,
    /// Seconds since boot
    pub uptime: u64,
    pub load_average: [f64; 3],
    pub cpu: CpuSummary,
    pub memory: UsageSummary,
    pub disk: UsageSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CpuSummary {
    pub usage: u32,
    pub cores: u32,
    pub temperature: f32,
}

/// Capacity figures in bytes plus rounded usage percentage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageSummary {
    pub total: u64,
    pub used: u64,
    pub free: u64,
    pub usage: u32,
}

impl UsageSummary {
    pub fn new(total: u64, used: u64, free: u64) -> Self {
        Self {
            total,
            used,
            free,
            usage: usage_percent(used, total),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CpuMetrics {
    pub usage: u32,
    pub cores: Vec<CoreUsage>,
    pub temperature: f32,
    /// MHz
    pub frequency: u64,
    pub load_average: LoadAverage,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoreUsage {
    pub core: u32,
    pub usage: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadAverage {
    #[serde(rename = "1min")]
    pub one: f64,
    #[serde(rename = "5min")]
    pub five: f64,
    #[serde(rename = "15min")]
    pub fifteen: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryMetrics {
    pub total: u64,
    pub used: u64,
    pub free: u64,
    pub available: u64,
    pub usage: u32,
    pub swap: SwapUsage,
    pub buffers: u64,
    pub cached: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwapUsage {
    pub total: u64,
    pub used: u64,
    pub free: u64,
}
