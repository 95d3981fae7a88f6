//! `mdns-probe`: checks whether the mock robot is discoverable on this network.
//!
//! ```text
//! mdns-probe [--hostname robot-spider.local] [--port 8080]
//!            [--service-type _http._tcp.local.] [--browse-secs 3]
//! ```
//!
//! Exit status is 0 if at least one check passed, 1 otherwise.

use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use spider_core::domain::advertisement::{MDNS_HOSTNAME, MDNS_SERVICE_TYPE, WEBSOCKET_PORT};
use spider_probe::report::{header, render_check, render_summary, Summary};
use spider_probe::{Check, ProbeConfig};

/// mDNS Test Utility: tests whether robot-spider.local is resolvable.
#[derive(Debug, Parser)]
#[command(name = "mdns-probe", version)]
struct Cli {
    /// Host name to resolve and ping.
    #[arg(long, default_value = MDNS_HOSTNAME)]
    hostname: String,

    /// Port used for the detailed lookup.
    #[arg(long, default_value_t = WEBSOCKET_PORT)]
    port: u16,

    /// DNS-SD service type to browse for.
    #[arg(long, default_value = MDNS_SERVICE_TYPE)]
    service_type: String,

    /// How long to browse, in seconds.
    #[arg(long, default_value_t = 3)]
    browse_secs: u64,
}

impl Cli {
    fn into_probe_config(self) -> ProbeConfig {
        ProbeConfig {
            hostname: self.hostname,
            port: self.port,
            service_type: self.service_type,
            browse_window: Duration::from_secs(self.browse_secs),
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // The report goes to stdout; logs stay quiet unless RUST_LOG asks.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let config = Cli::parse().into_probe_config();
    println!("{}", header(&config.hostname));

    let mut outcomes = Vec::with_capacity(Check::ALL.len());
    for (index, check) in Check::ALL.into_iter().enumerate() {
        if check == Check::Browse {
            println!(
                "\nSearching for {} services for {} seconds...",
                config.service_type,
                config.browse_window.as_secs()
            );
        }
        let outcome = check.run(&config).await;
        print!("{}", render_check(index, &outcome));
        outcomes.push(outcome);
    }

    print!("{}", render_summary(&outcomes));
    ExitCode::from(Summary::of(&outcomes).exit_code())
}
