use std::fs;
use std::path::Path;

use cpuscan_core::path::{SysPath, PATH_SYS_CPU, PATH_SYS_NODE};
use cpuscan_core::topology::Level;
use cpuscan_core::{scan, Config, Report, SysfsTopology, TopologySource};

const CPUINFO: &str = "\
processor\t: 0
vendor_id\t: GenuineIntel
cpu family\t: 6
model\t\t: 158
model name\t: Intel(R) Core(TM) i7-8700 CPU @ 3.20GHz
stepping\t: 10
cpu MHz\t\t: 800.012
flags\t\t: fpu vme de pse
bogomips\t: 6399.96
address sizes\t: 39 bits physical, 48 bits virtual

processor\t: 1
vendor_id\t: GenuineIntel
cpu family\t: 6
model\t\t: 158
model name\t: Intel(R) Core(TM) i7-8700 CPU @ 3.20GHz
stepping\t: 10
cpu MHz\t\t: 800.033
flags\t\t: fpu vme de pse
bogomips\t: 6399.96
address sizes\t: 39 bits physical, 48 bits virtual

processor\t: 2
vendor_id\t: GenuineIntel
cpu family\t: 6
model\t\t: 158
model name\t: Intel(R) Core(TM) i7-8700 CPU @ 3.20GHz
stepping\t: 10
cpu MHz\t\t: 800.101
flags\t\t: fpu vme de pse
bogomips\t: 6399.96
address sizes\t: 39 bits physical, 48 bits virtual

processor\t: 3
vendor_id\t: GenuineIntel
cpu family\t: 6
model\t\t: 158
model name\t: Intel(R) Core(TM) i7-8700 CPU @ 3.20GHz
stepping\t: 10
cpu MHz\t\t: 799.998
flags\t\t: fpu vme de pse
bogomips\t: 6399.96
address sizes\t: 39 bits physical, 48 bits virtual

";

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

/// Four CPUs: two cores with two threads each, one socket, one NUMA node.
fn snapshot() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write(root, "proc/cpuinfo", CPUINFO);

    let cpu = "sys/devices/system/cpu";
    write(root, &format!("{}/possible", cpu), "0-3\n");
    write(root, &format!("{}/present", cpu), "0-3\n");
    write(root, &format!("{}/online", cpu), "0-3\n");
    for n in 0..4 {
        let core = if n < 2 { "0-1" } else { "2-3" };
        let topo = format!("{}/cpu{}/topology", cpu, n);
        write(root, &format!("{}/thread_siblings_list", topo), core);
        write(root, &format!("{}/core_siblings_list", topo), "0-3");
        write(root, &format!("{}/core_id", topo), &format!("{}\n", n / 2));
        write(root, &format!("{}/physical_package_id", topo), "0\n");
    }
    write(root, "sys/devices/system/node/node0/cpulist", "0-3\n");
    dir
}

#[test]
fn scan_snapshot() {
    let dir = snapshot();
    let config = Config {
        prefix: Some(dir.path().to_path_buf()),
        ..Config::default()
    };
    let (cxt, topology) = scan(&config).unwrap();

    assert_eq!(cxt.cpus().len(), 4);
    assert_eq!(cxt.cputypes().len(), 1);
    assert_eq!(topology.online.count(), 4);

    let ct = cxt.cputypes()[0].borrow();
    assert_eq!(ct.ncores, Some(2));
    assert_eq!(ct.nsockets, Some(1));
    assert_eq!(ct.nthreads, Some(2));
    assert_eq!(ct.nbooks, None);

    let cpu3 = &cxt.cpus()[3];
    assert_eq!(cpu3.mhz.as_deref(), Some("799.998"));
    assert_eq!(cpu3.core_id, Some(1));
    assert_eq!(cpu3.socket_id, Some(0));
    assert_eq!(cpu3.node_id, Some(0));
    drop(ct);

    let text = Report {
        cxt: &cxt,
        topology: Some(&topology),
        last_cap: None,
    }
    .to_string();
    assert!(text.contains("On-line CPU(s) list:"));
    assert!(text.contains("0-3"));
    assert!(text.contains("Core(s) per socket: 2"));
}

#[test]
fn missing_optional_files() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "sys/devices/system/cpu/cpu0/topology/core_id", "0");
    write(dir.path(), "sys/devices/system/cpu/cpu2/topology/core_id", "1");

    let syscpu = SysPath::new(PATH_SYS_CPU).with_prefix(Some(dir.path()));
    let sysnode = SysPath::new(PATH_SYS_NODE).with_prefix(Some(dir.path()));
    let src = SysfsTopology::new(syscpu, &sysnode);

    // no possible file: the cpuN directories are enumerated
    assert_eq!(src.possible(), Some(vec![0, 2]));
    assert_eq!(src.online(), None);
    assert_eq!(src.id(2, Level::Core), Some(1));
    assert_eq!(src.id(2, Level::Book), None);
    assert_eq!(src.siblings(0, Level::Core), None);
    assert_eq!(src.node_of(0), None);
}

#[test]
fn node_directories_without_cpulist() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "sys/devices/system/node/node1/cpu4/online", "1");
    write(dir.path(), "sys/devices/system/node/node1/cpu5/online", "1");

    let syscpu = SysPath::new(PATH_SYS_CPU).with_prefix(Some(dir.path()));
    let sysnode = SysPath::new(PATH_SYS_NODE).with_prefix(Some(dir.path()));
    let src = SysfsTopology::new(syscpu, &sysnode);
    assert_eq!(src.node_of(5), Some(1));
    assert_eq!(src.node_of(0), None);
}

#[test]
fn scan_without_cpuinfo_fails() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config {
        prefix: Some(dir.path().to_path_buf()),
        ..Config::default()
    };
    assert!(scan(&config).is_err());
}
