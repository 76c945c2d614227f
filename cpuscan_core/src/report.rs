use std::fmt;

use crate::context::Context;
use crate::cpuset::CpuSet;
use crate::cputype::CpuType;
use crate::topology::Topology;

/// Plain-text summary in the usual `name: value` layout.
pub struct Report<'a> {
    pub cxt: &'a Context,
    pub topology: Option<&'a Topology>,
    pub last_cap: Option<u32>,
}

/// Real CPU numbers in cpulist notation.
fn cpulist(cpus: &[u32]) -> String {
    let nbits = cpus.iter().max().map_or(0, |&m| m as usize + 1);
    let mut set = CpuSet::new(nbits);
    for &cpu in cpus {
        set.set(cpu as usize);
    }
    set.to_string()
}

fn field(f: &mut fmt::Formatter<'_>, indent: usize, name: &str, value: impl fmt::Display) -> fmt::Result {
    let label = format!("{:indent$}{}:", "", name, indent = indent);
    writeln!(f, "{:<22} {}", label, value)
}

fn opt_field(f: &mut fmt::Formatter<'_>, indent: usize, name: &str, value: Option<&str>) -> fmt::Result {
    match value {
        Some(v) => field(f, indent, name, v),
        None => Ok(()),
    }
}

fn write_type(f: &mut fmt::Formatter<'_>, ct: &CpuType) -> fmt::Result {
    opt_field(f, 0, "Vendor ID", ct.vendor.as_deref())?;
    opt_field(f, 0, "Machine type", ct.machinetype.as_deref())?;
    field(f, 2, "Model name", ct.display_name())?;
    opt_field(f, 4, "CPU family", ct.family.as_deref())?;
    opt_field(f, 4, "Model", ct.model.as_deref())?;
    if let Some(threads) = ct.nthreads {
        field(f, 4, "Thread(s) per core", threads)?;
    }
    if let (Some(cores), Some(sockets)) = (ct.ncores, ct.nsockets) {
        field(f, 4, "Core(s) per socket", cores / sockets.max(1))?;
        field(f, 4, "Socket(s)", sockets)?;
    }
    if let Some(books) = ct.nbooks {
        field(f, 4, "Book(s)", books)?;
    }
    if let Some(drawers) = ct.ndrawers {
        field(f, 4, "Drawer(s)", drawers)?;
    }
    opt_field(f, 4, "Stepping", ct.stepping.as_deref())?;
    opt_field(f, 4, "Revision", ct.revision.as_deref())?;
    opt_field(f, 4, "BogoMIPS", ct.bogomips.as_deref())?;
    opt_field(f, 4, "Max thread id", ct.mtid.as_deref())?;
    opt_field(f, 4, "Address sizes", ct.addrsz.as_deref())?;
    opt_field(f, 4, "Flags", ct.flags.as_deref())
}

impl fmt::Display for Report<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        field(f, 0, "CPU(s)", self.cxt.cpus().len())?;
        if let Some(topo) = self.topology {
            field(f, 2, "On-line CPU(s) list", cpulist(&topo.index.numbers_in(&topo.online)))?;
        }
        for ct in self.cxt.cputypes() {
            write_type(f, &ct.borrow())?;
        }
        if let Some(cap) = self.last_cap {
            field(f, 0, "Last capability", cap)?;
        }
        Ok(())
    }
}
