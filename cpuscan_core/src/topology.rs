//! Grouping of CPUs into cores, sockets, books and drawers.
//!
//! The kernel describes every level as a sibling list per CPU. Each distinct
//! sibling list becomes one bitmask on the CPU type; bitmasks are addressed
//! by dense position in the possible-CPU list (see [`CpuIndexMap`]).

use std::path::Path;

use log::{debug, warn};

use crate::context::Context;
use crate::cpuset::{parse_cpulist, CpuIndexMap, CpuSet};
use crate::cputype::CpuType;
use crate::path::SysPath;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Core,
    /// Socket on most machines, module on some
    Socket,
    Book,
    Drawer,
}

pub const LEVELS: [Level; 4] = [Level::Core, Level::Socket, Level::Book, Level::Drawer];

impl Level {
    pub fn siblings_file(self) -> &'static str {
        match self {
            Level::Core => "thread_siblings_list",
            Level::Socket => "core_siblings_list",
            Level::Book => "book_siblings_list",
            Level::Drawer => "drawer_siblings_list",
        }
    }

    pub fn id_file(self) -> &'static str {
        match self {
            Level::Core => "core_id",
            Level::Socket => "physical_package_id",
            Level::Book => "book_id",
            Level::Drawer => "drawer_id",
        }
    }

    fn maps_mut(self, ct: &mut CpuType) -> &mut Vec<CpuSet> {
        match self {
            Level::Core => &mut ct.coremaps,
            Level::Socket => &mut ct.socketmaps,
            Level::Book => &mut ct.bookmaps,
            Level::Drawer => &mut ct.drawermaps,
        }
    }
}

/// Per-CPU topology attributes. CPU arguments are real CPU numbers.
///
/// Every accessor returns `None` when the attribute is not available.
pub trait TopologySource {
    fn possible(&self) -> Option<Vec<u32>>;
    fn present(&self) -> Option<Vec<u32>>;
    fn online(&self) -> Option<Vec<u32>>;
    fn siblings(&self, cpu: u32, level: Level) -> Option<Vec<u32>>;
    fn id(&self, cpu: u32, level: Level) -> Option<i32>;
    fn node_of(&self, cpu: u32) -> Option<i32>;
}

/// Topology read from `/sys/devices/system/{cpu,node}`.
pub struct SysfsTopology {
    syscpu: SysPath,
    nodes: Vec<(i32, Vec<u32>)>,
}

fn number_suffix(path: &Path, prefix: &str) -> Option<u32> {
    path.file_name()?.to_str()?.strip_prefix(prefix)?.parse().ok()
}

impl SysfsTopology {
    pub fn new(syscpu: SysPath, sysnode: &SysPath) -> Self {
        let mut nodes = Vec::new();
        for dir in sysnode.glob("node[0-9]*") {
            let Some(node) = number_suffix(&dir, "node") else {
                continue;
            };
            let name = format!("node{}", node);
            let cpus = sysnode
                .read_string(Path::new(&name).join("cpulist"))
                .and_then(|s| parse_cpulist(&s))
                .unwrap_or_else(|| {
                    sysnode
                        .glob(&format!("{}/cpu[0-9]*", name))
                        .iter()
                        .filter_map(|p| number_suffix(p, "cpu"))
                        .collect()
                });
            nodes.push((node as i32, cpus));
        }
        debug!("{} NUMA node(s)", nodes.len());
        Self { syscpu, nodes }
    }

    fn read_list(&self, rel: impl AsRef<Path>) -> Option<Vec<u32>> {
        parse_cpulist(&self.syscpu.read_string(rel)?)
    }

    fn topology_file(cpu: u32, name: &str) -> String {
        format!("cpu{}/topology/{}", cpu, name)
    }
}

impl TopologySource for SysfsTopology {
    fn possible(&self) -> Option<Vec<u32>> {
        if let Some(list) = self.read_list("possible") {
            return Some(list);
        }
        let mut cpus: Vec<u32> = self
            .syscpu
            .glob("cpu[0-9]*")
            .iter()
            .filter_map(|p| number_suffix(p, "cpu"))
            .collect();
        if cpus.is_empty() {
            warn!("no possible CPU list, assuming {} contiguous CPUs", num_cpus::get());
            return Some((0..num_cpus::get() as u32).collect());
        }
        cpus.sort_unstable();
        Some(cpus)
    }

    fn present(&self) -> Option<Vec<u32>> {
        self.read_list("present")
    }

    fn online(&self) -> Option<Vec<u32>> {
        self.read_list("online")
    }

    fn siblings(&self, cpu: u32, level: Level) -> Option<Vec<u32>> {
        self.read_list(Self::topology_file(cpu, level.siblings_file()))
    }

    fn id(&self, cpu: u32, level: Level) -> Option<i32> {
        self.syscpu.read_i32(Self::topology_file(cpu, level.id_file()))
    }

    fn node_of(&self, cpu: u32) -> Option<i32> {
        self.nodes
            .iter()
            .find(|(_, cpus)| cpus.contains(&cpu))
            .map(|(node, _)| *node)
    }
}

/// CPU numbering and state masks that the topology bitmasks refer to.
#[derive(Debug, Clone)]
pub struct Topology {
    pub index: CpuIndexMap,
    pub present: CpuSet,
    pub online: CpuSet,
}

impl Topology {
    /// Reads placement ids for every CPU and builds the per-type groups.
    ///
    /// Type identity is not touched; groups and derived counts are rebuilt
    /// from scratch on every call.
    pub fn map(cxt: &mut Context, src: &dyn TopologySource) -> Topology {
        let possible = src.possible().unwrap_or_else(|| {
            cxt.cpus()
                .iter()
                .filter_map(|c| u32::try_from(c.logical_id).ok())
                .collect()
        });
        let index = CpuIndexMap::new(&possible);
        let present = src
            .present()
            .map(|l| index.set_from(&l))
            .unwrap_or_else(|| index.set_from(index.numbers()));
        let online = src
            .online()
            .map(|l| index.set_from(&l))
            .unwrap_or_else(|| present.clone());
        debug!(
            "possible: {}, present: {}, online: {}",
            index.len(),
            present.count(),
            online.count()
        );

        for ct in cxt.cputypes() {
            let mut ct = ct.borrow_mut();
            for level in LEVELS {
                level.maps_mut(&mut ct).clear();
            }
        }

        for cpu in cxt.cpus_mut() {
            let Ok(num) = u32::try_from(cpu.logical_id) else {
                continue;
            };
            cpu.core_id = src.id(num, Level::Core);
            cpu.socket_id = src.id(num, Level::Socket);
            cpu.book_id = src.id(num, Level::Book);
            cpu.drawer_id = src.id(num, Level::Drawer);
            cpu.node_id = src.node_of(num);

            let Some(ct) = cpu.cputype.clone() else {
                continue;
            };
            let mut ct = ct.borrow_mut();
            for level in LEVELS {
                let Some(list) = src.siblings(num, level) else {
                    continue;
                };
                let set = index.set_from(&list);
                let maps = level.maps_mut(&mut ct);
                if !set.is_empty() && !maps.contains(&set) {
                    maps.push(set);
                }
            }
        }

        for ct in cxt.cputypes() {
            let ncpus = cxt.type_refs(ct) as u32;
            let mut ct = ct.borrow_mut();
            let count = |maps: &[CpuSet]| (!maps.is_empty()).then_some(maps.len() as u32);

            ct.ncores = count(&ct.coremaps);
            ct.nsockets = count(&ct.socketmaps);
            ct.nbooks = count(&ct.bookmaps);
            ct.ndrawers = count(&ct.drawermaps);
            ct.nthreads = ct.ncores.filter(|&n| n > 0).map(|n| ncpus.div_ceil(n));
        }

        Topology {
            index,
            present,
            online,
        }
    }

    pub fn is_online(&self, cpu: u32) -> bool {
        self.index.index_of(cpu).is_some_and(|i| self.online.is_set(i))
    }
}
