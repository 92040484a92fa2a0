//! `timesurface scheduled`: boundary scans around every half hour, logged to CSV.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use timesurface_core::{
    BoundaryTrigger, LogRow, ScanConfig, ScanLog, ScanMatrix, TimeBase, WallTime,
};

use super::HardwareOrchestrator;
use crate::CommonArgs;

pub struct ScheduledCommandConfig<'a> {
    pub common: &'a CommonArgs,
    pub output_dir: &'a str,
    pub iterations: usize,
    pub scan_secs: u64,
    pub run_now: bool,
    pub time_base: TimeBase,
}

pub fn run(config: ScheduledCommandConfig<'_>) {
    if config.iterations == 0 {
        eprintln!("Error: --iterations must be at least 1");
        std::process::exit(1);
    }

    let mut ctx = super::prepare(config.common);
    let matrix = ScanMatrix::standard(&ctx.cal);
    let scan_config = ScanConfig {
        iterations_per_pattern: config.iterations,
        scan_duration: Duration::from_secs(config.scan_secs),
        ..Default::default()
    };
    let output_dir = PathBuf::from(config.output_dir);
    let stop = super::install_stop_handler();
    let clock = config.time_base;

    println!(
        "=== Scheduled Mode: Half-Hour Boundary Scans ({}) ===",
        clock.label()
    );
    println!(
        "Triggers at XX:29:00 and XX:59:00, scanning {}s across each boundary",
        config.scan_secs
    );
    println!(
        "Patterns: {} ({} Static + {} Dynamic), {} samples each",
        matrix.len(),
        matrix.entries().iter().filter(|e| e.pattern_type() == "Static").count(),
        matrix.entries().iter().filter(|e| e.pattern_type() == "Dynamic").count(),
        config.iterations
    );
    println!("{}", "=".repeat(56));
    println!();

    let mut log = open_log(&output_dir, &clock.now());
    println!("Log file: {}\n", log.path().display());

    let mut trigger = BoundaryTrigger::new();

    if config.run_now {
        let now = clock.now();
        let target = ScanTarget {
            clock,
            output_dir: &output_dir,
            started: now,
            boundary_minute: None,
        };
        scan(&mut ctx.orchestrator, &matrix, &scan_config, &stop, &mut log, target);
    }

    while !stop.load(Ordering::SeqCst) {
        let now = clock.now();

        if let Some(boundary) = trigger.poll(now.hour, now.minute, now.second) {
            let target = ScanTarget {
                clock,
                output_dir: &output_dir,
                started: now,
                boundary_minute: Some(boundary),
            };
            scan(&mut ctx.orchestrator, &matrix, &scan_config, &stop, &mut log, target);
            continue;
        }

        if trigger.should_report_waiting(now.minute) {
            println!("Waiting... (Current: {:02}:{:02})", now.minute, now.second);
        }

        std::thread::sleep(scan_config.poll_interval);
    }

    println!("\nStopped. {} rows written to {}", log.rows_written(), log.path().display());
}

fn open_log(dir: &Path, date: &WallTime) -> ScanLog {
    ScanLog::open_daily(dir, date).unwrap_or_else(|e| {
        eprintln!("Error opening log in {}: {e}", dir.display());
        std::process::exit(1);
    })
}

/// Where and when one boundary scan runs.
struct ScanTarget<'a> {
    clock: TimeBase,
    output_dir: &'a Path,
    started: WallTime,
    boundary_minute: Option<u32>,
}

fn scan(
    orchestrator: &mut HardwareOrchestrator,
    matrix: &ScanMatrix,
    config: &ScanConfig,
    stop: &AtomicBool,
    log: &mut ScanLog,
    target: ScanTarget<'_>,
) {
    let ScanTarget {
        clock,
        output_dir,
        started,
        boundary_minute,
    } = target;

    // New day, new file.
    if !log.path().ends_with(timesurface_core::report::daily_log_name(&started)) {
        log::debug!("rolling over from {}", log.path().display());
        *log = open_log(output_dir, &started);
        println!("Log file: {}", log.path().display());
    }

    println!(
        "\n[{}] Starting {}s boundary scan...",
        started.timestamp_string(),
        config.scan_duration.as_secs()
    );
    if let Some(minute) = boundary_minute {
        let hour = if minute == 0 { (started.hour + 1) % 24 } else { started.hour };
        println!("  Scanning across {hour:02}:{minute:02}:00 boundary");
    }

    let cycle_len = matrix.len();
    let result = orchestrator.boundary_scan(
        matrix,
        config,
        stop,
        |_, _| clock.now(),
        |idx, entry, stats, at| {
            log.append(&LogRow::new(&at, entry, stats.quick()))?;
            if idx % cycle_len == 0 {
                println!(
                    "  [{:02}:{:02}] Cycle {}...",
                    at.minute,
                    at.second,
                    idx / cycle_len + 1
                );
            }
            Ok(())
        },
    );

    match result {
        Ok(n) => {
            println!("Boundary scan complete. {n} patterns recorded.");
            println!("Waiting for next boundary...");
        }
        Err(e) => {
            eprintln!("Error during boundary scan: {e}");
            std::process::exit(1);
        }
    }
}
