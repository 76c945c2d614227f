//! Known `/proc/cpuinfo` field names.
//!
//! The kernel names the same attribute differently on each architecture, so
//! several names may point at the same attribute. Both tables must stay
//! sorted by name (byte order), lookups use a binary search.

use crate::cputype::{Cpu, CpuType};

/// Attribute of a [`CpuType`] written by a cpuinfo field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeField {
    AddressSizes,
    BogoMips,
    Family,
    Flags,
    MaxThreadId,
    Model,
    ModelName,
    Revision,
    Stepping,
    Vendor,
}

impl TypeField {
    pub fn slot(self, ct: &mut CpuType) -> &mut Option<String> {
        match self {
            TypeField::AddressSizes => &mut ct.addrsz,
            TypeField::BogoMips => &mut ct.bogomips,
            TypeField::Family => &mut ct.family,
            TypeField::Flags => &mut ct.flags,
            TypeField::MaxThreadId => &mut ct.mtid,
            TypeField::Model => &mut ct.model,
            TypeField::ModelName => &mut ct.modelname,
            TypeField::Revision => &mut ct.revision,
            TypeField::Stepping => &mut ct.stepping,
            TypeField::Vendor => &mut ct.vendor,
        }
    }
}

/// Attribute of a [`Cpu`] written by a cpuinfo field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CpuField {
    LogicalId,
    Mhz,
    DynamicMhz,
    StaticMhz,
}

impl CpuField {
    /// String slot of the attribute; `None` for the numeric logical id.
    pub fn slot(self, cpu: &mut Cpu) -> Option<&mut Option<String>> {
        match self {
            CpuField::LogicalId => None,
            CpuField::Mhz => Some(&mut cpu.mhz),
            CpuField::DynamicMhz => Some(&mut cpu.dynamic_mhz),
            CpuField::StaticMhz => Some(&mut cpu.static_mhz),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Type(TypeField),
    Cpu(CpuField),
}

pub struct Pattern<F> {
    pub name: &'static str,
    pub field: F,
}

const fn ty(name: &'static str, field: TypeField) -> Pattern<TypeField> {
    Pattern { name, field }
}

const fn cpu(name: &'static str, field: CpuField) -> Pattern<CpuField> {
    Pattern { name, field }
}

pub static TYPE_PATTERNS: &[Pattern<TypeField>] = &[
    ty("BogoMIPS", TypeField::BogoMips),           // aarch64
    ty("CPU implementer", TypeField::Vendor),      // ARM and aarch64
    ty("CPU part", TypeField::Model),              // ARM and aarch64
    ty("CPU revision", TypeField::Revision),       // aarch64
    ty("CPU variant", TypeField::Stepping),        // aarch64
    ty("Features", TypeField::Flags),              // aarch64
    ty("address sizes", TypeField::AddressSizes),  // x86
    ty("bogomips", TypeField::BogoMips),
    ty("bogomips per cpu", TypeField::BogoMips),   // s390
    ty("cpu", TypeField::ModelName),               // ppc, sparc
    ty("cpu family", TypeField::Family),
    ty("family", TypeField::Family),
    ty("features", TypeField::Flags),              // s390
    ty("flags", TypeField::Flags),                 // x86
    ty("max thread id", TypeField::MaxThreadId),   // s390
    ty("model", TypeField::Model),
    ty("model name", TypeField::ModelName),
    ty("revision", TypeField::Revision),
    ty("stepping", TypeField::Stepping),
    ty("type", TypeField::Flags),                  // sparc64
    ty("vendor", TypeField::Vendor),
    ty("vendor_id", TypeField::Vendor),            // s390
];

pub static CPU_PATTERNS: &[Pattern<CpuField>] = &[
    cpu("cpu MHz", CpuField::Mhz),
    cpu("cpu MHz dynamic", CpuField::DynamicMhz),  // s390
    cpu("cpu MHz static", CpuField::StaticMhz),    // s390
    cpu("cpu number", CpuField::LogicalId),        // s390
    cpu("processor", CpuField::LogicalId),
];

fn search<F: Copy>(table: &[Pattern<F>], name: &str) -> Option<F> {
    table
        .binary_search_by(|p| p.name.cmp(name))
        .ok()
        .map(|i| table[i].field)
}

/// Looks up a field name, type-level names first.
pub fn lookup(name: &str) -> Option<Field> {
    search(TYPE_PATTERNS, name)
        .map(Field::Type)
        .or_else(|| search(CPU_PATTERNS, name).map(Field::Cpu))
}
