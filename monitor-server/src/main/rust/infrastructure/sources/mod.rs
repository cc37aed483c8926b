mod remote_source;
mod sysinfo_probe;

pub use remote_source::{RemoteSource, RemoteStatsSource, UnavailableSource};
pub use sysinfo_probe::{CpuSource, MemorySource, SysinfoProbe, SystemOverviewSource};
