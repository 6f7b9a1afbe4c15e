//! # winctl
//!
//! Profiling winch controller. Loads the TOML configuration, opens the DIO
//! controller (serial or simulated), initializes it and starts the command,
//! monitor and pause threads.
//!
//! The bus adapter reads commands and CTD samples as JSON lines on stdin and
//! writes status snapshots and CTD directives as JSON lines on stdout. Logs
//! go to stderr.

use clap::Parser;
use riftox_common::config::{ConfigLoader, LogLevel, WinctlConfig};
use riftox_dio::{drivers, DioCommander, DioLink};
use riftox_winch::bus;
use riftox_winch::runtime::{self, Endpoints};
use riftox_winch::winch::Winch;
use std::env;
use std::io;
use std::path::PathBuf;
use std::process;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use tracing::{error, info, Level};
use tracing_subscriber::EnvFilter;

/// RIFT-OX winch controller
#[derive(Parser, Debug)]
#[command(name = "winctl")]
#[command(author = "RIFT-OX")]
#[command(version)]
#[command(about = "Unattended profiling winch controller")]
struct Args {
    /// Path to the winctl configuration TOML.
    #[arg(long, env = "RIFT_OX_CONFIG_FILE", default_value = "config/winctl.toml")]
    config: PathBuf,

    /// Use the simulated DIO controller regardless of the configuration.
    #[arg(long)]
    simulate: bool,

    /// Home against the latch once and exit.
    #[arg(long)]
    repark: bool,

    /// Enable verbose logging (DEBUG level).
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format.
    #[arg(long)]
    json: bool,
}

fn main() {
    let args = Args::parse();
    let loaded = WinctlConfig::load(&args.config);
    let log_level = loaded
        .as_ref()
        .map(|config| config.shared.log_level)
        .unwrap_or_default();
    setup_tracing(&args, log_level);

    info!("winctl v{} starting...", env!("CARGO_PKG_VERSION"));

    let result = match loaded {
        Ok(config) => run(&args, config),
        Err(e) => Err(e.into()),
    };
    if let Err(e) = result {
        error!("FATAL: {e}");
        process::exit(1);
    }

    info!("winctl shutdown complete");
}

fn run(args: &Args, mut config: WinctlConfig) -> Result<(), Box<dyn std::error::Error>> {
    if args.simulate {
        config.dio.simulation = true;
    }
    config.validate()?;
    info!(
        service = %config.shared.service_name,
        path = %args.config.display(),
        simulation = config.dio.simulation,
        "configuration loaded"
    );

    let port = drivers::open(&config)?;
    let dio = DioCommander::new(DioLink::new(port), config.pins);
    dio.init()?;

    if args.repark {
        let mut winch = Winch::new(dio, &config.winch);
        let report = winch.repark()?;
        info!(
            baseline = report.baseline,
            latched_at = report.latched_at,
            elapsed = ?report.elapsed,
            "re-park complete"
        );
        return Ok(());
    }

    let shutdown = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&shutdown);
    ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        flag.store(true, Ordering::SeqCst);
    })?;

    let (runtime, endpoints) = runtime::spawn(&config, dio, Arc::clone(&shutdown))?;
    let Endpoints {
        commands,
        telemetry,
        status,
        ctd,
    } = endpoints;

    // stdin blocks; the reader is left detached and dies with the process.
    thread::Builder::new()
        .name("busin".to_string())
        .spawn(move || bus::read_inbound(io::stdin().lock(), &commands, &telemetry))?;

    bus::write_outbound(
        io::stdout().lock(),
        status,
        ctd,
        config.loops.command_period(),
        &shutdown,
    );

    runtime.join();
    Ok(())
}

/// `RUST_LOG` wins over the configured level; `--verbose` raises either to DEBUG.
fn env_filter(rust_log: Option<&str>, log_level: LogLevel, verbose: bool) -> EnvFilter {
    let filter = rust_log
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(log_level.as_filter()));
    if verbose {
        filter.add_directive(Level::DEBUG.into())
    } else {
        filter
    }
}

fn setup_tracing(args: &Args, log_level: LogLevel) {
    let rust_log = env::var(EnvFilter::DEFAULT_ENV).ok();
    let filter = env_filter(rust_log.as_deref(), log_level, args.verbose);

    // stdout carries the bus
    if args.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .compact()
            .init();
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
