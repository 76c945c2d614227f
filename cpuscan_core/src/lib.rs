pub mod capability;
pub mod config;
pub mod context;
pub mod cpuinfo;
pub mod cpuset;
pub mod cputype;
pub mod error;
pub mod path;
pub mod pattern;
pub mod report;
pub mod topology;

use log::info;

pub use capability::{cap_last_cap, LastCapability};
pub use config::Config;
pub use context::Context;
pub use cpuset::{CpuIndexMap, CpuSet};
pub use cputype::{Cpu, CpuType, SharedCpuType};
pub use error::{Error, Result};
pub use report::Report;
pub use topology::{SysfsTopology, Topology, TopologySource};

/// Reads cpuinfo and sysfs topology for the configured root.
pub fn scan(config: &Config) -> Result<(Context, Topology)> {
    let paths = config.paths();
    if let Some(prefix) = &config.prefix {
        info!("using snapshot under {}", prefix.display());
    }

    let mut cxt = Context::new();
    cxt.read_cpuinfo(&paths.procfs)?;

    let source = SysfsTopology::new(paths.syscpu, &paths.sysnode);
    let topology = Topology::map(&mut cxt, &source);
    info!(
        "{} CPU(s) of {} type(s), {} online",
        cxt.cpus().len(),
        cxt.cputypes().len(),
        topology.online.count()
    );
    Ok((cxt, topology))
}
