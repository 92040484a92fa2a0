//! `timesurface bench`: every static and dynamic pattern, then the analysis.

use std::io::Write;
use std::path::Path;
use std::sync::atomic::Ordering;

use timesurface_core::{
    BenchReport, DynamicPreset, HardwareClock, ScanMatrix, TickPattern, WARMUP_CYCLES, warm_up,
};

use crate::CommonArgs;

pub fn run(common: &CommonArgs, iterations: usize, warmup: bool, output: Option<&str>) {
    if iterations == 0 {
        eprintln!("Error: --iterations must be at least 1");
        std::process::exit(1);
    }

    let mut ctx = super::prepare(common);
    let matrix = ScanMatrix::standard(&ctx.cal);
    let stop = super::install_stop_handler();

    println!("Target: {:.1} kHz region (+/-1 kHz)", ctx.cal.center_hz / 1000.0);
    println!("Iterations: {iterations} per pattern");
    println!("Patterns: {} (12 Static + 20 Dynamic)", matrix.len());
    println!("{}", "=".repeat(56));
    println!();

    if warmup {
        println!("Warming up...");
        warm_up(&HardwareClock, WARMUP_CYCLES);
        println!("Done.\n");
    }

    println!("Part 1: Static Patterns (12 = 4 FFT x 3 Ticks)");
    println!("{}", "-".repeat(44));
    let mut in_dynamic_part = false;

    let result = ctx
        .orchestrator
        .run_matrix(&matrix, iterations, &stop, |idx, entry| {
            if idx > 0 {
                println!(" done");
            }
            if !in_dynamic_part && matches!(entry.pattern, TickPattern::Dynamic(_)) {
                in_dynamic_part = true;
                println!("\nPart 2: Dynamic Transition (20 = 4 FFT x 5 Patterns)");
                println!("{}", "-".repeat(44));
                println!("Patterns:");
                for preset in DynamicPreset::ALL {
                    println!("  {}: {}", preset, preset.describe());
                }
                println!();
            }
            print!("{} ...", entry.display_name());
            let _ = std::io::stdout().flush();
        });

    let reports = match result {
        Ok(r) => r,
        Err(e) => {
            eprintln!("\nError during measurement: {e}");
            std::process::exit(1);
        }
    };
    if !reports.is_empty() {
        println!(" done");
    }

    if stop.load(Ordering::SeqCst) {
        println!("Interrupted after {} of {} patterns.", reports.len(), matrix.len());
    }

    println!("\n{}", "=".repeat(56));
    println!("Statistical Analysis");
    println!("{}\n", "=".repeat(56));
    for report in &reports {
        super::print_analysis(report);
    }

    if let Some(path) = output {
        let report = BenchReport::new(ctx.cal, ctx.table, iterations, reports);
        match report.write_json(Path::new(path)) {
            Ok(()) => println!("Report written to {path}"),
            Err(e) => {
                eprintln!("Error writing report: {e}");
                std::process::exit(1);
            }
        }
    }

    println!("{}", "=".repeat(56));
    println!("Done.");
}
