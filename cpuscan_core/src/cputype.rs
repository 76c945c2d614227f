use std::cell::RefCell;
use std::rc::Rc;

use crate::cpuset::CpuSet;

/// Handle to a CPU type shared by the registry and every CPU bound to it.
///
/// Handles are not atomic; a context and its types stay on one thread.
pub type SharedCpuType = Rc<RefCell<CpuType>>;

/// One distinct CPU model/configuration as described by cpuinfo.
///
/// Different architectures name the same attribute differently (e.g. ARM
/// reports the vendor as `CPU implementer`), see [`crate::pattern`].
#[derive(Debug, Default, Clone, PartialEq)]
pub struct CpuType {
    pub vendor: Option<String>,
    /// Machine type (s390)
    pub machinetype: Option<String>,
    pub family: Option<String>,
    pub model: Option<String>,
    pub modelname: Option<String>,
    /// Alternative for model (ppc)
    pub revision: Option<String>,
    pub stepping: Option<String>,
    pub bogomips: Option<String>,
    pub flags: Option<String>,
    /// Maximum thread id (s390)
    pub mtid: Option<String>,
    pub addrsz: Option<String>,

    pub physsockets: Option<u32>,
    pub physchips: Option<u32>,
    pub physcoresperchip: Option<u32>,

    pub ncores: Option<u32>,
    pub nsockets: Option<u32>,
    pub nbooks: Option<u32>,
    pub ndrawers: Option<u32>,
    pub nthreads: Option<u32>,

    pub coremaps: Vec<CpuSet>,
    pub socketmaps: Vec<CpuSet>,
    pub bookmaps: Vec<CpuSet>,
    pub drawermaps: Vec<CpuSet>,
}

fn fill<T: Clone>(dst: &mut Option<T>, src: &Option<T>) {
    if dst.is_none() {
        dst.clone_from(src);
    }
}

impl CpuType {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_shared(self) -> SharedCpuType {
        Rc::new(RefCell::new(self))
    }

    /// Two types are the same when vendor, model, model name and stepping
    /// all match; an attribute missing on both sides counts as a match.
    pub fn same_identity(&self, other: &CpuType) -> bool {
        self.vendor == other.vendor
            && self.model == other.model
            && self.modelname == other.modelname
            && self.stepping == other.stepping
    }

    /// Copies every attribute that is unset here from `other`. Attributes
    /// already set are never overwritten.
    pub fn merge_from(&mut self, other: &CpuType) {
        fill(&mut self.vendor, &other.vendor);
        fill(&mut self.machinetype, &other.machinetype);
        fill(&mut self.family, &other.family);
        fill(&mut self.model, &other.model);
        fill(&mut self.modelname, &other.modelname);
        fill(&mut self.revision, &other.revision);
        fill(&mut self.stepping, &other.stepping);
        fill(&mut self.bogomips, &other.bogomips);
        fill(&mut self.flags, &other.flags);
        fill(&mut self.mtid, &other.mtid);
        fill(&mut self.addrsz, &other.addrsz);

        fill(&mut self.physsockets, &other.physsockets);
        fill(&mut self.physchips, &other.physchips);
        fill(&mut self.physcoresperchip, &other.physcoresperchip);
        fill(&mut self.ncores, &other.ncores);
        fill(&mut self.nsockets, &other.nsockets);
        fill(&mut self.nbooks, &other.nbooks);
        fill(&mut self.ndrawers, &other.ndrawers);
        fill(&mut self.nthreads, &other.nthreads);
    }

    /// Name used for display, falls back through model name, cpu part and revision.
    pub fn display_name(&self) -> &str {
        self.modelname
            .as_deref()
            .or(self.model.as_deref())
            .or(self.revision.as_deref())
            .unwrap_or("-")
    }
}

/// One logical CPU as enumerated by the kernel.
#[derive(Debug, Default, Clone)]
pub struct Cpu {
    pub logical_id: i32,
    pub mhz: Option<String>,
    pub dynamic_mhz: Option<String>,
    pub static_mhz: Option<String>,

    pub core_id: Option<i32>,
    pub socket_id: Option<i32>,
    pub book_id: Option<i32>,
    pub drawer_id: Option<i32>,
    pub node_id: Option<i32>,

    pub(crate) cputype: Option<SharedCpuType>,
}

impl Cpu {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cputype(&self) -> Option<&SharedCpuType> {
        self.cputype.as_ref()
    }

    pub fn has_type(&self, ct: &SharedCpuType) -> bool {
        self.cputype.as_ref().is_some_and(|x| Rc::ptr_eq(x, ct))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named(vendor: Option<&str>, modelname: Option<&str>) -> CpuType {
        CpuType {
            vendor: vendor.map(String::from),
            modelname: modelname.map(String::from),
            ..CpuType::default()
        }
    }

    #[test]
    fn identity_treats_missing_as_equal() {
        assert!(named(None, Some("Foo")).same_identity(&named(None, Some("Foo"))));
        assert!(CpuType::new().same_identity(&CpuType::new()));
    }

    #[test]
    fn identity_differs_on_one_field() {
        assert!(!named(None, Some("Foo")).same_identity(&named(None, Some("Bar"))));
        assert!(!named(Some("GenuineIntel"), None).same_identity(&named(None, None)));
    }

    #[test]
    fn identity_ignores_non_key_fields() {
        let mut a = named(Some("X"), Some("Y"));
        let b = named(Some("X"), Some("Y"));
        a.flags = Some("fpu vme".into());
        a.bogomips = Some("4800.00".into());
        assert!(a.same_identity(&b));
    }

    #[test]
    fn merge_fills_unset_only() {
        let mut a = named(Some("GenuineIntel"), None);
        a.physsockets = Some(2);
        let mut b = named(Some("AuthenticAMD"), Some("Foo"));
        b.model = Some("7".into());
        b.physsockets = Some(4);
        b.physchips = Some(1);

        a.merge_from(&b);

        assert_eq!(a.vendor.as_deref(), Some("GenuineIntel"));
        assert_eq!(a.model.as_deref(), Some("7"));
        assert_eq!(a.modelname.as_deref(), Some("Foo"));
        assert_eq!(a.physsockets, Some(2));
        assert_eq!(a.physchips, Some(1));
    }

    #[test]
    fn cpu_type_binding_is_by_handle() {
        let a = CpuType::new().into_shared();
        let b = CpuType::new().into_shared();
        let cpu = Cpu {
            cputype: Some(a.clone()),
            ..Cpu::default()
        };
        assert!(cpu.has_type(&a));
        assert!(!cpu.has_type(&b));
    }
}
