use std::process;

use env_logger::Env;
use log::warn;

use cpuscan_core::capability::kernel_last_cap;
use cpuscan_core::{cap_last_cap, scan, Config, Report};

const LOG_ENV: &str = "CPUSCAN_LOG";

fn main() {
    let config = match Config::from_args(std::env::args().skip(1)) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("cpuscan: {}", e);
            process::exit(1);
        }
    };
    if config.help {
        println!("{}", cpuscan_core::config::USAGE);
        return;
    }

    let default_level = if config.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(Env::default().filter_or(LOG_ENV, default_level)).init();

    let (cxt, topology) = match scan(&config) {
        Ok(scanned) => scanned,
        Err(e) => {
            eprintln!("cpuscan: {}", e);
            process::exit(1);
        }
    };

    let last_cap = config.show_capability.then(|| {
        let probed = cap_last_cap();
        if let Some(exported) = kernel_last_cap(&config.paths().procfs) {
            if exported != probed {
                warn!("kernel reports last capability {}, probing found {}", exported, probed);
            }
        }
        probed
    });

    print!(
        "{}",
        Report {
            cxt: &cxt,
            topology: Some(&topology),
            last_cap,
        }
    );
}
