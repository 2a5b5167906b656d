//! dnsleak - locally detect DNS leaks.
//!
//! Resolves a handful of random probe names and reports whether any of them
//! shows up as a DNS query on the given capture device.

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use dnsleak::config::{
    DEFAULT_GRACE_MS, DEFAULT_INTERVAL_MS, DEFAULT_LEAK_THRESHOLD, DEFAULT_PROBE_COUNT,
};
use dnsleak::{
    CancelRequest, CancellationController, CaptureWorker, ConsoleReporter, LeakTestConfig, Orchestrator, PnetCapture,
    ProbeNameGenerator, ProbeRegistry, RunContext, Summary, TokioResolver,
};

#[derive(Parser)]
#[command(name = "dnsleak")]
#[command(about = "Locally detect DNS leaks")]
struct Cli {
    /// Capture device to watch (e.g., eth0)
    #[arg(required_unless_present = "list_interfaces")]
    device: Option<String>,

    /// Number of DNS requests to send
    #[arg(short = 'c', long = "count", default_value_t = DEFAULT_PROBE_COUNT)]
    count: usize,

    /// Milliseconds between DNS requests
    #[arg(short = 'i', long = "interval", value_name = "MILLIS", default_value_t = DEFAULT_INTERVAL_MS)]
    interval: u64,

    /// Extra milliseconds to wait for a DNS packet to show up
    #[arg(short = 't', long = "time", value_name = "MILLIS", default_value_t = DEFAULT_GRACE_MS)]
    time: u64,

    /// Stop sending once this many leaks are found
    #[arg(short = 'l', long = "leaks", default_value_t = DEFAULT_LEAK_THRESHOLD)]
    leaks: usize,

    /// Print every probe and every captured DNS query
    #[arg(short, long)]
    verbose: bool,

    /// List available capture devices and exit
    #[arg(long)]
    list_interfaces: bool,
}

impl Cli {
    fn into_config(self) -> LeakTestConfig {
        LeakTestConfig {
            device: self.device.unwrap_or_default(),
            probe_count: self.count,
            interval_ms: self.interval,
            grace_ms: self.time,
            leak_threshold: self.leaks,
            verbose: self.verbose,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if cli.list_interfaces {
        for iface in PnetCapture::list_interfaces() {
            println!("{}", iface);
        }
        return ExitCode::SUCCESS;
    }

    match run(cli.into_config()) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "dnsleak=debug" } else { "dnsleak=warn" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run(config: LeakTestConfig) -> Result<Summary> {
    let config = config.validate()?;

    let mut registry = ProbeRegistry::new();
    registry.generate(config.probe_count, &mut ProbeNameGenerator::from_time())?;
    let ctx = Arc::new(RunContext::new(registry));

    install_signal_handler(Arc::clone(&ctx.cancel))?;

    let capture = PnetCapture::open(&config.device)
        .with_context(|| format!("could not open device '{}' for capture", config.device))?;
    let resolver = TokioResolver::new()?;
    let reporter = Arc::new(ConsoleReporter::new().with_verbose(config.verbose));

    let handle = CaptureWorker::new(Arc::clone(&ctx), reporter.clone())
        .spawn(capture)
        .context("failed to start capture")?;

    let summary =
        Orchestrator::new(&config, Arc::clone(&ctx), &resolver, &*reporter).run(handle)?;
    if !RunContext::release(ctx) {
        tracing::debug!("Probe registry still shared at shutdown");
    }
    Ok(summary)
}

/// SIGINT, SIGTERM and SIGHUP: the first one winds the run down, the
/// second one exits on the spot.
fn install_signal_handler(cancel: Arc<CancellationController>) -> Result<()> {
    ctrlc::set_handler(move || match cancel.request() {
        CancelRequest::Graceful => eprintln!("\nTerminating..."),
        CancelRequest::Immediate => {
            eprintln!("\nOk, I'm leaving now!");
            std::process::exit(1);
        }
    })
    .context("failed to install termination signal handler")
}
