use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use glob::{glob, Pattern};
use log::trace;

pub const PATH_PROC: &str = "/proc";
pub const PATH_SYS_CPU: &str = "/sys/devices/system/cpu";
pub const PATH_SYS_NODE: &str = "/sys/devices/system/node";

/// A directory handle that optionally lives under a snapshot prefix.
///
/// With prefix `/tmp/snap`, `SysPath::new("/proc")` resolves `cpuinfo` to
/// `/tmp/snap/proc/cpuinfo`. Without a prefix paths resolve against `/`.
#[derive(Debug, Clone)]
pub struct SysPath {
    dir: PathBuf,
    prefix: Option<PathBuf>,
}

impl SysPath {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            prefix: None,
        }
    }

    pub fn with_prefix(mut self, prefix: Option<&Path>) -> Self {
        self.prefix = prefix.map(Path::to_path_buf);
        self
    }

    /// Real on-disk location of the handle's directory.
    pub fn base(&self) -> PathBuf {
        match &self.prefix {
            Some(prefix) => {
                let relative = self.dir.strip_prefix("/").unwrap_or(&self.dir);
                prefix.join(relative)
            }
            None => self.dir.clone(),
        }
    }

    pub fn full(&self, rel: impl AsRef<Path>) -> PathBuf {
        self.base().join(rel)
    }

    pub fn open(&self, rel: impl AsRef<Path>) -> io::Result<File> {
        let path = self.full(rel);
        trace!("open {}", path.display());
        File::open(path)
    }

    /// Reads a small attribute file, `None` when it is missing or unreadable.
    pub fn read_string(&self, rel: impl AsRef<Path>) -> Option<String> {
        let path = self.full(rel);
        match fs::read_to_string(&path) {
            Ok(s) => Some(s.trim().to_string()),
            Err(e) => {
                trace!("{}: {}", path.display(), e);
                None
            }
        }
    }

    pub fn read_i32(&self, rel: impl AsRef<Path>) -> Option<i32> {
        self.read_string(rel)?.parse().ok()
    }

    /// Expands `pattern` relative to the handle's directory.
    pub fn glob(&self, pattern: &str) -> Vec<PathBuf> {
        let base = Pattern::escape(&self.base().to_string_lossy());
        let full = format!("{}/{}", base, pattern);
        match glob(&full) {
            Ok(entries) => entries.flatten().collect(),
            Err(_) => Vec::new(),
        }
    }
}
