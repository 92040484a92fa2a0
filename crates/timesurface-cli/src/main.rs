//! CLI for timesurface: load-versus-idle timing scans around 277.3 kHz.

mod commands;

use clap::{Args, Parser, Subcommand};
use timesurface_core::TimeBase;

#[derive(Parser)]
#[command(name = "timesurface")]
#[command(about = "timesurface: probe how synthetic CPU load bends microsecond timing")]
#[command(version = timesurface_core::VERSION)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Options shared by every measuring command.
#[derive(Args, Debug, Clone)]
pub struct CommonArgs {
    /// Use this CPU frequency in Hz instead of measuring the cycle counter
    #[arg(long)]
    cpu_freq_hz: Option<u64>,

    /// Center target frequency in Hz (must exceed the 1 kHz tick spacing)
    #[arg(long, default_value = "277300", value_parser = parse_center_hz)]
    center_hz: f64,

    /// Path to a load table JSON file (default: built-in table tuned for ~5.25 GHz)
    #[arg(long)]
    load_table: Option<String>,

    /// Rescale load table repeat counts to the calibrated CPU frequency
    #[arg(long)]
    rescale: bool,

    /// Seed for the qubit measurement RNG (default: OS entropy)
    #[arg(long)]
    seed: Option<u64>,

    /// Abort a measurement if any spin loop exceeds this many iterations
    #[arg(long)]
    spin_limit: Option<u64>,

    /// Do not request SCHED_FIFO real-time priority
    #[arg(long)]
    no_priority: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Calibrate the cycle counter and print tick thresholds and the load table
    Calibrate {
        #[command(flatten)]
        common: CommonArgs,

        /// Print the effective load table as JSON
        #[arg(long)]
        json: bool,
    },

    /// Full benchmark: 12 static + 20 dynamic patterns, then per-pattern analysis
    Bench {
        #[command(flatten)]
        common: CommonArgs,

        /// Samples per pattern
        #[arg(long, default_value = "1000000")]
        iterations: usize,

        /// Skip the 72M-cycle warm-up spin
        #[arg(long)]
        no_warmup: bool,

        /// Write a machine-readable JSON report
        #[arg(long)]
        output: Option<String>,
    },

    /// Measure a single static tick or dynamic pattern at one load level.
    /// Use --pattern for a dynamic pattern, otherwise --tick selects a static one.
    Probe {
        #[command(flatten)]
        common: CommonArgs,

        /// Load level in percent
        #[arg(long, default_value = "85", value_parser = ["75", "80", "85", "90"])]
        level: String,

        /// Static tick variant
        #[arg(long, default_value = "0", allow_hyphen_values = true, value_parser = ["-1", "0", "+1"])]
        tick: String,

        /// Dynamic pattern: original, alternating, block, mixed, sweep
        #[arg(long)]
        pattern: Option<String>,

        /// Samples to collect
        #[arg(long, default_value = "100000")]
        iterations: usize,
    },

    /// Wait for XX:29:00 / XX:59:00 (local time) and run a 2-minute boundary scan each time
    Scheduled {
        #[command(flatten)]
        common: CommonArgs,

        /// Directory for time_surface_YYYY-MM-DD.csv logs
        #[arg(long, default_value = ".")]
        output_dir: String,

        /// Samples per pattern during a scan
        #[arg(long, default_value = "30000")]
        iterations: usize,

        /// Length of each boundary scan in seconds
        #[arg(long, default_value = "120")]
        scan_secs: u64,

        /// Run one scan immediately instead of waiting for a boundary
        #[arg(long)]
        now: bool,

        /// Use UTC instead of the host's local time for triggers, rows and file names
        #[arg(long)]
        utc: bool,
    },
}

fn parse_center_hz(s: &str) -> Result<f64, String> {
    let hz: f64 = s.parse().map_err(|e| format!("{e}"))?;
    timesurface_core::Calibrator::with_center(hz)
        .map(|c| c.center_hz)
        .map_err(|e| e.to_string())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Calibrate { common, json } => commands::calibrate::run(&common, json),
        Commands::Bench {
            common,
            iterations,
            no_warmup,
            output,
        } => commands::bench::run(&common, iterations, !no_warmup, output.as_deref()),
        Commands::Probe {
            common,
            level,
            tick,
            pattern,
            iterations,
        } => commands::probe::run(&common, &level, &tick, pattern.as_deref(), iterations),
        Commands::Scheduled {
            common,
            output_dir,
            iterations,
            scan_secs,
            now,
            utc,
        } => commands::scheduled::run(commands::scheduled::ScheduledCommandConfig {
            common: &common,
            output_dir: &output_dir,
            iterations,
            scan_secs,
            run_now: now,
            time_base: if utc { TimeBase::Utc } else { TimeBase::Local },
        }),
    }
}
