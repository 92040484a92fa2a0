//! `timesurface probe`: one pattern at one load level, then its analysis.

use std::time::Instant;

use timesurface_core::{DynamicPreset, ScanMatrix};

use crate::CommonArgs;

pub fn run(
    common: &CommonArgs,
    level: &str,
    tick: &str,
    pattern: Option<&str>,
    iterations: usize,
) {
    if iterations == 0 {
        eprintln!("Error: --iterations must be at least 1");
        std::process::exit(1);
    }
    let level = super::parse_level(level);

    let preset = pattern.map(|name| {
        DynamicPreset::from_name(name).unwrap_or_else(|| {
            eprintln!(
                "Unknown pattern '{name}'. Choose one of: original, alternating, block, mixed, sweep"
            );
            std::process::exit(1);
        })
    });
    let variant = super::parse_tick(tick).unwrap_or_else(|| {
        eprintln!("Unknown tick '{tick}' (expected -1, 0 or +1)");
        std::process::exit(1);
    });

    let mut ctx = super::prepare(common);
    let matrix = match preset {
        Some(p) => ScanMatrix::single_dynamic(&ctx.cal, p, level),
        None => ScanMatrix::single_static(&ctx.cal, variant, level),
    };
    let entry = matrix.entries()[0];

    println!("Probing: {}", entry.display_name());
    if let Some(p) = preset {
        println!("  Order:      {}", p.describe());
    } else {
        println!("  Tick:       {}", entry.tick_at(0));
    }
    println!("  Iterations: {iterations}");
    println!();

    let t0 = Instant::now();
    let report = match ctx.orchestrator.measure_entry(&entry, iterations) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Error during measurement: {e}");
            std::process::exit(1);
        }
    };
    let elapsed = t0.elapsed();

    super::print_analysis(&report);
    println!(
        "Time: {:.3}s ({:.0} samples/s)",
        elapsed.as_secs_f64(),
        iterations as f64 / elapsed.as_secs_f64().max(1e-9)
    );
}
