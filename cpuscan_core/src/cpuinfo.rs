//! `/proc/cpuinfo` reader.
//!
//! The file is a sequence of blocks separated by blank lines. A block
//! describes one CPU (x86: `processor`, s390: `cpu number`) or carries
//! global information shared by all CPUs (leading block on s390, trailing
//! block on POWER). Every line is `name : value`.

use std::io::{BufRead, BufReader};
use std::path::Path;

use log::{debug, trace};

use crate::context::Context;
use crate::cputype::{Cpu, CpuType};
use crate::error::{Error, Result};
use crate::path::SysPath;
use crate::pattern::{self, CpuField, Field};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    /// The line was stored into the type or CPU record.
    Stored(Field),
    /// A known field with an empty value; its record exists but nothing was set.
    Empty(Field),
    /// A `name : value` line with an unknown name.
    Unknown,
    /// No colon or no name.
    NotField,
}

/// Integer prefix of `s` the way `atoi(3)` reads it; 0 when there is none.
pub fn parse_logical_id(s: &str) -> i32 {
    let s = s.trim_start();
    let (neg, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let end = digits
        .bytes()
        .position(|b| !b.is_ascii_digit())
        .unwrap_or(digits.len());

    // accumulate towards the sign so that i32::MIN stays reachable
    let mut n: i32 = 0;
    for b in digits[..end].bytes() {
        let d = i32::from(b - b'0');
        n = n.saturating_mul(10);
        n = if neg { n.saturating_sub(d) } else { n.saturating_add(d) };
    }
    n
}

/// Parses one non-blank cpuinfo line into the block's records.
///
/// The records are created by the first recognized field that belongs to
/// them. Within a block a repeated field overwrites the previous value.
pub fn parse_line(line: &str, ct: &mut Option<CpuType>, cpu: &mut Option<Cpu>) -> LineKind {
    let Some((name, value)) = line.trim_start().split_once(':') else {
        return LineKind::NotField;
    };
    let name = name.trim_end();
    if name.is_empty() {
        return LineKind::NotField;
    }

    let Some(field) = pattern::lookup(name) else {
        trace!("'{}' not found", name);
        return LineKind::Unknown;
    };

    let value = value.trim();
    match field {
        Field::Type(f) => {
            let ct = ct.get_or_insert_with(CpuType::new);
            if value.is_empty() {
                return LineKind::Empty(field);
            }
            *f.slot(ct) = Some(value.to_string());
        }
        Field::Cpu(f) => {
            let cpu = cpu.get_or_insert_with(Cpu::new);
            if value.is_empty() {
                return LineKind::Empty(field);
            }
            match f {
                CpuField::LogicalId => cpu.logical_id = parse_logical_id(value),
                _ => {
                    if let Some(slot) = f.slot(cpu) {
                        *slot = Some(value.to_string());
                    }
                }
            }
        }
    }
    LineKind::Stored(field)
}

impl Context {
    /// Reads `cpuinfo` from the procfs handle. A missing file is fatal.
    pub fn read_cpuinfo(&mut self, procfs: &SysPath) -> Result<()> {
        let path = procfs.full("cpuinfo");
        debug!("reading {}", path.display());

        let file = procfs
            .open("cpuinfo")
            .map_err(|source| Error::CpuinfoUnavailable {
                path: path.clone(),
                source,
            })?;
        self.read_cpuinfo_from(BufReader::new(file), &path)
    }

    /// Reads cpuinfo-formatted text; `origin` is only used in error messages.
    ///
    /// Lines are decoded lossily, so bytes that are not UTF-8 never abort the read.
    pub fn read_cpuinfo_from<R: BufRead>(&mut self, mut reader: R, origin: &Path) -> Result<()> {
        let mut ct: Option<CpuType> = None;
        let mut cpu: Option<Cpu> = None;
        let mut buf = Vec::new();

        loop {
            buf.clear();
            let n = reader
                .read_until(b'\n', &mut buf)
                .map_err(|source| Error::Io {
                    path: origin.to_path_buf(),
                    source,
                })?;
            if n == 0 {
                break;
            }
            let line = String::from_utf8_lossy(&buf);

            if line.trim().is_empty() {
                self.finish_block(ct.take(), cpu.take());
            } else {
                let kind = parse_line(line.trim_end(), &mut ct, &mut cpu);
                trace!("{:?}: {:?}", line.trim(), kind);
            }
        }
        self.finish_block(ct.take(), cpu.take());
        self.ensure_default_cputype();

        debug!(
            "cpuinfo: {} CPU(s), {} type(s)",
            self.cpus().len(),
            self.cputypes().len()
        );
        Ok(())
    }

    fn finish_block(&mut self, ct: Option<CpuType>, cpu: Option<Cpu>) {
        match (cpu, ct) {
            (Some(cpu), ct) => {
                let ty = match ct {
                    Some(ct) => Some(self.add_cputype(ct)),
                    None => self.default_cputype(),
                };
                self.add_cpu(cpu, ty);
            }
            // Generic block without CPU data, global for all CPUs.
            (None, Some(ct)) => {
                if self.cputypes().len() == 1 {
                    self.merge_into_default(&ct);
                } else {
                    self.add_cputype(ct);
                }
            }
            (None, None) => {}
        }
    }
}
