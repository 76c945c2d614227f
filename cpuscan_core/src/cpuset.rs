use std::collections::BTreeMap;
use std::fmt;

const WORD_BITS: usize = u64::BITS as usize;

/// Highest CPU number accepted in a cpulist. Kernels top out at a few
/// thousand CPUs; anything past this is a corrupt file.
pub const MAX_CPU_NUMBER: u32 = (1 << 16) - 1;

/// Fixed-size bitmask of CPUs addressed by dense index.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CpuSet {
    words: Vec<u64>,
    nbits: usize,
}

impl CpuSet {
    pub fn new(nbits: usize) -> Self {
        Self {
            words: vec![0; nbits.div_ceil(WORD_BITS)],
            nbits,
        }
    }

    pub fn capacity(&self) -> usize {
        self.nbits
    }

    /// Sets bit `idx`; out of range indexes are ignored.
    pub fn set(&mut self, idx: usize) -> bool {
        if idx >= self.nbits {
            return false;
        }
        self.words[idx / WORD_BITS] |= 1u64 << (idx % WORD_BITS);
        true
    }

    pub fn is_set(&self, idx: usize) -> bool {
        idx < self.nbits && self.words[idx / WORD_BITS] & (1u64 << (idx % WORD_BITS)) != 0
    }

    pub fn count(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|&w| w == 0)
    }

    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.nbits).filter(move |&i| self.is_set(i))
    }
}

impl fmt::Display for CpuSet {
    /// Kernel cpulist notation, e.g. `0-3,8`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        let mut bits = self.iter().peekable();
        while let Some(start) = bits.next() {
            let mut end = start;
            while bits.peek() == Some(&(end + 1)) {
                end += 1;
                bits.next();
            }
            if !first {
                f.write_str(",")?;
            }
            first = false;
            if start == end {
                write!(f, "{}", start)?;
            } else {
                write!(f, "{}-{}", start, end)?;
            }
        }
        Ok(())
    }
}

/// Parses the kernel cpulist format (`0-3,8,10-11`, `0-7:2` strides).
///
/// Returns `None` on any malformed element or on a CPU number above
/// [`MAX_CPU_NUMBER`]. An empty string is an empty list.
pub fn parse_cpulist(s: &str) -> Option<Vec<u32>> {
    let s = s.trim();
    let mut cpus = Vec::new();
    if s.is_empty() {
        return Some(cpus);
    }

    for part in s.split(',') {
        let part = part.trim();
        let (range, stride) = match part.split_once(':') {
            Some((r, st)) => (r, st.parse::<u32>().ok().filter(|&n| n > 0)?),
            None => (part, 1),
        };
        let (lo, hi) = match range.split_once('-') {
            Some((a, b)) => (a.parse::<u32>().ok()?, b.parse::<u32>().ok()?),
            None => {
                let n = range.parse::<u32>().ok()?;
                (n, n)
            }
        };
        if hi < lo || hi > MAX_CPU_NUMBER {
            return None;
        }
        cpus.extend((lo..=hi).step_by(stride as usize));
    }

    cpus.sort_unstable();
    cpus.dedup();
    Some(cpus)
}

/// Two-way translation between dense bitmask index and real CPU number.
///
/// Possible CPUs may be numbered sparsely (e.g. only 1, 3 and 5 exist);
/// bitmasks are sized to the possible count and addressed by position.
#[derive(Debug, Clone, Default)]
pub struct CpuIndexMap {
    numbers: Vec<u32>,
    index: BTreeMap<u32, usize>,
}

impl CpuIndexMap {
    pub fn new(possible: &[u32]) -> Self {
        let mut numbers = possible.to_vec();
        numbers.sort_unstable();
        numbers.dedup();
        let index = numbers.iter().enumerate().map(|(i, &n)| (n, i)).collect();
        Self { numbers, index }
    }

    pub fn len(&self) -> usize {
        self.numbers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.numbers.is_empty()
    }

    pub fn index_of(&self, cpu: u32) -> Option<usize> {
        self.index.get(&cpu).copied()
    }

    pub fn number_at(&self, idx: usize) -> Option<u32> {
        self.numbers.get(idx).copied()
    }

    pub fn numbers(&self) -> &[u32] {
        &self.numbers
    }

    pub fn new_set(&self) -> CpuSet {
        CpuSet::new(self.len())
    }

    /// Builds a dense set from real CPU numbers, unknown numbers are dropped.
    pub fn set_from(&self, cpus: &[u32]) -> CpuSet {
        let mut set = self.new_set();
        for &cpu in cpus {
            if let Some(idx) = self.index_of(cpu) {
                set.set(idx);
            }
        }
        set
    }

    /// Real CPU numbers of the bits set in `set`.
    pub fn numbers_in(&self, set: &CpuSet) -> Vec<u32> {
        set.iter().filter_map(|i| self.number_at(i)).collect()
    }
}
