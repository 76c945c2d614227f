//! Highest capability number known to the running kernel.
//!
//! The kernel answers "is capability `n` valid" for any `n`, and the answer
//! is monotonic: valid up to some unknown boundary, invalid above it. The
//! boundary is found by bisection between 0 and `i32::MAX`.

use std::cell::Cell;
use std::sync::OnceLock;

use cfg_if::cfg_if;
use log::debug;

use crate::path::SysPath;

/// Bisection over a monotonic predicate with a memoized result.
///
/// The cache is a plain `Cell`, so a probe cannot be shared between
/// threads. Use [`cap_last_cap`] for the process-wide value.
pub struct LastCapability<P> {
    supported: P,
    cached: Cell<Option<u32>>,
}

impl<P: Fn(u32) -> bool> LastCapability<P> {
    pub fn new(supported: P) -> Self {
        Self {
            supported,
            cached: Cell::new(None),
        }
    }

    /// Largest `n` for which the predicate holds.
    ///
    /// 0 is assumed valid and `i32::MAX` invalid, neither is probed.
    pub fn last_supported(&self) -> u32 {
        if let Some(last) = self.cached.get() {
            return last;
        }

        let mut lo: u32 = 0;
        let mut hi: u32 = i32::MAX as u32;
        while hi - lo > 1 {
            let mid = lo + (hi - lo) / 2;
            if (self.supported)(mid) {
                lo = mid;
            } else {
                hi = mid;
            }
        }

        self.cached.set(Some(lo));
        lo
    }
}

cfg_if! {
    if #[cfg(target_os = "linux")] {
        fn capability_supported(cap: u32) -> bool {
            // prctl returns 0 or 1 for valid caps, -1 otherwise
            let arg = libc::c_ulong::from(cap);
            unsafe { libc::prctl(libc::PR_CAPBSET_READ, arg, 0, 0, 0) >= 0 }
        }
    } else {
        fn capability_supported(_cap: u32) -> bool {
            false
        }
    }
}

static LAST_CAP: OnceLock<u32> = OnceLock::new();

/// Process-wide last capability, computed once.
pub fn cap_last_cap() -> u32 {
    *LAST_CAP.get_or_init(|| {
        let last = LastCapability::new(capability_supported).last_supported();
        debug!("last capability: {}", last);
        last
    })
}

/// The value the kernel exports in `sys/kernel/cap_last_cap`, if any.
pub fn kernel_last_cap(procfs: &SysPath) -> Option<u32> {
    procfs.read_string("sys/kernel/cap_last_cap")?.parse().ok()
}
