//! mcmond - per-core CPU and memory sampler.
//!
//! Samples `/proc/stat` and `/proc/meminfo` at a fixed interval and prints a
//! compact summary (or a JSON snapshot) for every tick.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use clap::{Parser, ValueEnum};
use tracing::{Level, debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use mcmon_core::collector::RealFs;
use mcmon_core::fmt::{format_core_lines, format_label};
use mcmon_core::{Sampler, Scheduler, SchedulerConfig, Snapshot};

/// Output format for each snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Multi-line human-readable summary.
    Label,
    /// One JSON object per line.
    Json,
}

/// Per-core CPU and memory sampler.
#[derive(Parser, Debug)]
#[command(name = "mcmond", about = "Per-core CPU and memory sampler", version)]
struct Args {
    /// Refresh interval in milliseconds.
    #[arg(short, long, default_value = "1500", value_parser = clap::value_parser!(u64).range(1..))]
    interval_ms: u64,

    /// Path to /proc filesystem (for testing/mocking).
    #[arg(long, default_value = "/proc")]
    proc_path: String,

    /// Output format.
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Label)]
    format: OutputFormat,

    /// Take two samples one interval apart, print once and exit.
    #[arg(long)]
    once: bool,

    /// Repeat the last good snapshot when a tick yields no data.
    #[arg(long)]
    republish_last: bool,

    /// Increase logging verbosity (-v for debug, -vv for trace). Default is info level.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Quiet mode - only show errors.
    #[arg(short, long)]
    quiet: bool,
}

/// Initializes the tracing subscriber with the appropriate log level.
/// Default level is INFO. Use -q for quiet mode (errors only).
fn init_logging(verbose: u8, quiet: bool) {
    let level = if quiet {
        Level::ERROR
    } else {
        match verbose {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };

    let mut filter = EnvFilter::from_default_env();
    for target in ["mcmond", "mcmon_core"] {
        match format!("{}={}", target, level).parse() {
            Ok(directive) => filter = filter.add_directive(directive),
            Err(e) => eprintln!("invalid log directive for {}: {}", target, e),
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Renders a snapshot in the requested format.
fn render_snapshot(snapshot: &Snapshot, format: OutputFormat) -> String {
    match format {
        OutputFormat::Label => format!("{}\n", format_label(snapshot)),
        OutputFormat::Json => match serde_json::to_string(snapshot) {
            Ok(json) => json,
            Err(e) => {
                error!("Failed to serialize snapshot: {}", e);
                String::new()
            }
        },
    }
}

fn publish(snapshot: &Snapshot, format: OutputFormat) {
    for line in format_core_lines(snapshot) {
        debug!("{}", line);
    }
    debug!("memory: {:?}", snapshot.memory);
    println!("{}", render_snapshot(snapshot, format));
}

fn main() {
    let args = Args::parse();

    init_logging(args.verbose, args.quiet);

    let interval = Duration::from_millis(args.interval_ms);
    info!("mcmond {} starting", env!("CARGO_PKG_VERSION"));
    info!(
        "Config: interval={}ms, proc={}, format={:?}",
        args.interval_ms, args.proc_path, args.format
    );

    let mut sampler = Sampler::new(RealFs::new(), &args.proc_path);

    if args.once {
        // The first pass only establishes baselines.
        sampler.sample();
        std::thread::sleep(interval);
        publish(&sampler.sample(), args.format);
        return;
    }

    // Setup graceful shutdown
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();

    if let Err(e) = ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        r.store(false, Ordering::SeqCst);
    }) {
        warn!("Failed to set Ctrl-C handler: {}", e);
    }

    let config = SchedulerConfig::default()
        .with_interval(interval)
        .with_republish_last(args.republish_last);
    let format = args.format;
    let consumer = move |snapshot: &Snapshot| publish(snapshot, format);

    let mut scheduler = match Scheduler::start(sampler, config, consumer) {
        Ok(scheduler) => scheduler,
        Err(e) => {
            error!("Failed to start sampler: {}", e);
            std::process::exit(1);
        }
    };

    while running.load(Ordering::SeqCst) && scheduler.is_running() {
        std::thread::sleep(Duration::from_millis(100));
    }

    info!("Shutting down...");
    scheduler.stop();
    info!("Shutdown complete");
}
