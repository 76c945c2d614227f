use std::rc::Rc;

use log::debug;

use crate::cputype::{Cpu, CpuType, SharedCpuType};

/// Everything gathered about the CPUs of one host.
///
/// Types are kept in discovery order and the first one is the default type.
/// CPUs are kept in parse order; a CPU may stay untyped until the first type
/// is registered, which is then applied to it.
#[derive(Debug, Default)]
pub struct Context {
    cputypes: Vec<SharedCpuType>,
    cpus: Vec<Cpu>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cputypes(&self) -> &[SharedCpuType] {
        &self.cputypes
    }

    pub fn cpus(&self) -> &[Cpu] {
        &self.cpus
    }

    pub(crate) fn cpus_mut(&mut self) -> &mut [Cpu] {
        &mut self.cpus
    }

    pub fn default_cputype(&self) -> Option<SharedCpuType> {
        self.cputypes.first().cloned()
    }

    /// Registers `ct` unless a type with the same identity is already known,
    /// in which case the known one is returned and `ct` is dropped.
    pub fn add_cputype(&mut self, ct: CpuType) -> SharedCpuType {
        if let Some((i, x)) = self
            .cputypes
            .iter()
            .enumerate()
            .find(|(_, x)| x.borrow().same_identity(&ct))
        {
            debug!("type #{} reuse", i);
            return Rc::clone(x);
        }

        debug!("type #{} add new: {}", self.cputypes.len(), ct.display_name());
        let shared = ct.into_shared();
        self.cputypes.push(Rc::clone(&shared));

        // first type, use it for all CPUs
        if self.cputypes.len() == 1 {
            self.cpus_apply_type(&shared);
        }
        shared
    }

    /// Fills unset attributes of the default type from a generic block.
    pub fn merge_into_default(&mut self, ct: &CpuType) {
        if let Some(dflt) = self.cputypes.first() {
            debug!("type #0 merge");
            dflt.borrow_mut().merge_from(ct);
        }
    }

    pub fn add_cpu(&mut self, mut cpu: Cpu, ct: Option<SharedCpuType>) {
        debug!(
            "cpu #{} add (logical id {}){}",
            self.cpus.len(),
            cpu.logical_id,
            if ct.is_none() { ", untyped" } else { "" }
        );
        cpu.cputype = ct;
        self.cpus.push(cpu);
    }

    /// Binds every CPU that has no type yet to `ct`.
    pub fn cpus_apply_type(&mut self, ct: &SharedCpuType) {
        for cpu in self.cpus.iter_mut().filter(|c| c.cputype.is_none()) {
            cpu.cputype = Some(Rc::clone(ct));
        }
    }

    /// Registers an empty default type when CPUs were found but none of
    /// them described its type.
    pub fn ensure_default_cputype(&mut self) {
        if self.cputypes.is_empty() && !self.cpus.is_empty() {
            self.add_cputype(CpuType::new());
        }
    }

    pub fn cpus_of_type<'a>(&'a self, ct: &'a SharedCpuType) -> impl Iterator<Item = &'a Cpu> + 'a {
        self.cpus.iter().filter(move |c| c.has_type(ct))
    }

    pub fn first_cpu_of_type<'a>(&'a self, ct: &'a SharedCpuType) -> Option<&'a Cpu> {
        self.cpus_of_type(ct).next()
    }

    /// Number of CPUs bound to `ct`.
    pub fn type_refs(&self, ct: &SharedCpuType) -> usize {
        self.cpus_of_type(ct).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_name(name: &str) -> CpuType {
        CpuType {
            modelname: Some(name.to_string()),
            ..CpuType::default()
        }
    }

    fn cpu(id: i32) -> Cpu {
        Cpu {
            logical_id: id,
            ..Cpu::default()
        }
    }

    #[test]
    fn reuse_same_identity() {
        let mut cxt = Context::new();
        let a = cxt.add_cputype(with_name("Foo"));
        let b = cxt.add_cputype(with_name("Foo"));
        assert!(Rc::ptr_eq(&a, &b));
        assert_eq!(cxt.cputypes().len(), 1);
    }

    #[test]
    fn distinct_identity_appends() {
        let mut cxt = Context::new();
        let a = cxt.add_cputype(with_name("Foo"));
        let b = cxt.add_cputype(with_name("Bar"));
        assert!(!Rc::ptr_eq(&a, &b));
        assert_eq!(cxt.cputypes().len(), 2);
        assert!(Rc::ptr_eq(&cxt.default_cputype().unwrap(), &a));
    }

    #[test]
    fn first_type_backfills_untyped_cpus() {
        let mut cxt = Context::new();
        cxt.add_cpu(cpu(0), None);
        cxt.add_cpu(cpu(1), None);
        let ct = cxt.add_cputype(with_name("Foo"));
        assert!(cxt.cpus().iter().all(|c| c.has_type(&ct)));

        // only the first type is applied
        cxt.add_cpu(cpu(2), None);
        cxt.add_cputype(with_name("Bar"));
        assert!(cxt.cpus()[2].cputype().is_none());
    }

    #[test]
    fn handles_are_shared() {
        let mut cxt = Context::new();
        let ct = cxt.add_cputype(with_name("Foo"));
        cxt.add_cpu(cpu(0), Some(Rc::clone(&ct)));
        cxt.add_cpu(cpu(1), Some(Rc::clone(&ct)));
        assert_eq!(cxt.type_refs(&ct), 2);
        // registry + two CPUs + local handle
        assert_eq!(Rc::strong_count(&ct), 4);

        let weak = Rc::downgrade(&ct);
        drop(ct);
        drop(cxt);
        assert!(weak.upgrade().is_none());
    }

    #[test]
    fn lookup_first_cpu() {
        let mut cxt = Context::new();
        let foo = cxt.add_cputype(with_name("Foo"));
        let bar = cxt.add_cputype(with_name("Bar"));
        cxt.add_cpu(cpu(0), Some(Rc::clone(&foo)));
        cxt.add_cpu(cpu(4), Some(Rc::clone(&bar)));
        cxt.add_cpu(cpu(5), Some(Rc::clone(&bar)));
        assert_eq!(cxt.first_cpu_of_type(&bar).map(|c| c.logical_id), Some(4));
        assert_eq!(cxt.type_refs(&foo), 1);
    }

    #[test]
    fn lookup_outlives_temporary_handle() {
        let mut cxt = Context::new();
        let foo = cxt.add_cputype(with_name("Foo"));
        cxt.add_cpu(cpu(2), Some(foo));

        let found = {
            let dflt = cxt.default_cputype().unwrap();
            cxt.first_cpu_of_type(&dflt).map(|c| c.logical_id)
        };
        assert_eq!(found, Some(2));

        let unused = CpuType::new().into_shared();
        assert!(cxt.first_cpu_of_type(&unused).is_none());
    }

    #[test]
    fn logical_ids_are_opaque() {
        let mut cxt = Context::new();
        cxt.add_cpu(cpu(3), None);
        cxt.add_cpu(cpu(3), None);
        assert_eq!(cxt.cpus().len(), 2);
    }

    #[test]
    fn empty_default_only_when_cpus_exist() {
        let mut cxt = Context::new();
        cxt.ensure_default_cputype();
        assert!(cxt.cputypes().is_empty());

        cxt.add_cpu(cpu(0), None);
        cxt.ensure_default_cputype();
        let dflt = cxt.default_cputype().unwrap();
        assert!(cxt.cpus()[0].has_type(&dflt));
    }
}
