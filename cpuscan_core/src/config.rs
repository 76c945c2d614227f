use std::env;
use std::path::PathBuf;

use crate::error::{Error, Result};
use crate::path::{SysPath, PATH_PROC, PATH_SYS_CPU, PATH_SYS_NODE};

pub const PREFIX_ENV: &str = "CPUSCAN_PREFIX";

pub const USAGE: &str = "\
usage: cpuscan [options]
  -p, --prefix DIR   read /proc and /sys from a snapshot under DIR
  -v, --verbose      debug logging (CPUSCAN_LOG overrides)
      --no-caps      do not probe the capability bounding set
  -h, --help         show this help";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    /// Root of a /proc and /sys snapshot, `None` for the live system.
    pub prefix: Option<PathBuf>,
    pub verbose: bool,
    pub show_capability: bool,
    pub help: bool,
}

/// Handles for every directory the scanner reads.
#[derive(Debug, Clone)]
pub struct Paths {
    pub procfs: SysPath,
    pub syscpu: SysPath,
    pub sysnode: SysPath,
}

impl Config {
    /// Parses command-line arguments (without the program name).
    ///
    /// `CPUSCAN_PREFIX` is used when no prefix is given on the command line.
    pub fn from_args<I>(args: I) -> Result<Config>
    where
        I: IntoIterator<Item = String>,
    {
        let mut config = Config {
            show_capability: true,
            ..Config::default()
        };
        let mut args = args.into_iter();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "-p" | "--prefix" => {
                    let dir = args
                        .next()
                        .ok_or_else(|| Error::Config(format!("option '{}' requires a directory", arg)))?;
                    config.prefix = Some(PathBuf::from(dir));
                }
                "-v" | "--verbose" => config.verbose = true,
                "--no-caps" => config.show_capability = false,
                "-h" | "--help" => config.help = true,
                other => {
                    if let Some(dir) = other.strip_prefix("--prefix=") {
                        config.prefix = Some(PathBuf::from(dir));
                    } else {
                        return Err(Error::Config(format!("unknown option '{}'\n{}", other, USAGE)));
                    }
                }
            }
        }

        if config.prefix.is_none() {
            config.prefix = env::var_os(PREFIX_ENV)
                .filter(|v| !v.is_empty())
                .map(PathBuf::from);
        }
        Ok(config)
    }

    pub fn paths(&self) -> Paths {
        let prefix = self.prefix.as_deref();
        Paths {
            procfs: SysPath::new(PATH_PROC).with_prefix(prefix),
            syscpu: SysPath::new(PATH_SYS_CPU).with_prefix(prefix),
            sysnode: SysPath::new(PATH_SYS_NODE).with_prefix(prefix),
        }
    }
}
