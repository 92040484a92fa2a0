pub mod bench;
pub mod calibrate;
pub mod probe;
pub mod scheduled;

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use rand::SeedableRng;
use rand::rngs::StdRng;
use timesurface_core::{
    CalibrationData, Calibrator, FftLoadLevel, HardwareClock, LoadGenerator, LoadTable,
    Orchestrator, PatternReport, Sampler, TickVariant, load_table_from_path,
    request_realtime_priority,
};

use crate::CommonArgs;

/// Orchestrator over the hardware counter and the real workloads.
pub type HardwareOrchestrator = Orchestrator<HardwareClock, LoadGenerator<StdRng>>;

/// Calibrated state shared by the measuring commands.
pub struct RunContext {
    pub cal: CalibrationData,
    pub table: LoadTable,
    pub orchestrator: HardwareOrchestrator,
}

/// Priority request, calibration, load table and orchestrator in one go.
/// Prints the calibration summary. Exits on a bad load table or band.
pub fn prepare(common: &CommonArgs) -> RunContext {
    if !common.no_priority && !request_realtime_priority() {
        println!("Note: running without real-time priority (needs root or CAP_SYS_NICE)\n");
    }

    let cal = calibrate(common);
    print_calibration(&cal);
    println!();

    let table = effective_load_table(common, &cal);
    let rng = match common.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let load = LoadGenerator::new(table.clone(), rng).unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        std::process::exit(1);
    });
    let mut sampler = Sampler::new(HardwareClock, load);
    if let Some(limit) = common.spin_limit {
        sampler = sampler.with_spin_limit(limit);
    }

    RunContext {
        cal,
        table,
        orchestrator: Orchestrator::new(sampler),
    }
}

/// Exits when the center frequency or CPU override cannot give usable ticks.
pub fn calibrate(common: &CommonArgs) -> CalibrationData {
    let calibrator = Calibrator::with_center(common.center_hz).unwrap_or_else(|e| {
        eprintln!("Error: --center-hz {}: {e}", common.center_hz);
        std::process::exit(1);
    });
    println!("Calibrating cycle counter...");
    calibrator
        .calibrate(&HardwareClock, common.cpu_freq_hz)
        .unwrap_or_else(|e| {
            eprintln!("Error: {e}");
            std::process::exit(1);
        })
}

/// Built-in or file-provided load table, optionally rescaled to `cal`.
pub fn effective_load_table(common: &CommonArgs, cal: &CalibrationData) -> LoadTable {
    let table = match common.load_table.as_deref() {
        Some(path) => load_table_from_path(Path::new(path)).unwrap_or_else(|e| {
            eprintln!("Error loading load table '{path}': {e}");
            std::process::exit(1);
        }),
        None => LoadTable::default(),
    };
    if common.rescale {
        table.rescaled(cal.cpu_freq_hz)
    } else {
        table
    }
}

/// Ctrl+C sets the returned flag. Measurements in flight finish first.
pub fn install_stop_handler() -> Arc<AtomicBool> {
    let stop = Arc::new(AtomicBool::new(false));
    let s = stop.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        s.store(true, Ordering::SeqCst);
    }) {
        eprintln!("Error setting Ctrl+C handler: {e}");
        std::process::exit(1);
    }
    stop
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

pub fn parse_level(s: &str) -> FftLoadLevel {
    FftLoadLevel::from_percent_str(s).unwrap_or_else(|| {
        eprintln!("Unknown load level '{s}' (expected 75, 80, 85 or 90)");
        std::process::exit(1);
    })
}

pub fn parse_tick(s: &str) -> Option<TickVariant> {
    match s.trim() {
        "-1" | "minus1" => Some(TickVariant::Minus1),
        "0" | "center" => Some(TickVariant::Center),
        "+1" | "1" | "plus1" => Some(TickVariant::Plus1),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

pub fn print_calibration(cal: &CalibrationData) {
    for line in calibration_lines(cal) {
        println!("{line}");
    }
}

fn calibration_lines(cal: &CalibrationData) -> Vec<String> {
    let mut lines = vec![
        format!("CPU Frequency: {:.2} GHz ({})", cal.cpu_freq_ghz(), cal.source),
        format!(
            "Calibrated for {:.1}us base period ({:.1} kHz region):",
            cal.period_us(TickVariant::Center),
            cal.center_hz / 1000.0
        ),
    ];
    for variant in TickVariant::ALL {
        let suffix = if variant == TickVariant::Center {
            ", center"
        } else {
            ""
        };
        lines.push(format!(
            "  Tick {} → {:.1} kHz ({:.3} μs{suffix})",
            cal.tick(variant),
            cal.target_hz(variant) / 1000.0,
            cal.period_us(variant)
        ));
    }
    lines
}

pub fn print_load_table(table: &LoadTable) {
    println!("Load table (tuned for {:.2} GHz):", table.tuned_for_hz as f64 / 1e9);
    for level in FftLoadLevel::ALL {
        let p = table.profile(level);
        println!(
            "  {:<4} FFT size {:>3} × {} forward+inverse passes",
            level.name(),
            p.size,
            p.repeats
        );
    }
}

/// Analysis block: average, std dev, range, top 10 bins.
pub fn print_analysis(report: &PatternReport) {
    for line in analysis_lines(report) {
        println!("{line}");
    }
    println!();
}

fn analysis_lines(report: &PatternReport) -> Vec<String> {
    let s = &report.stats;
    let mut lines = vec![
        format!("{}:", report.name),
        format!("  Average: {:.2}", s.avg),
        format!("  Std Dev: {:.2}", s.std_dev),
        format!("  Range: [{}, {}]", s.min, s.max),
        "  Histogram (Top 10 bins):".to_string(),
    ];
    for bin in s.top_n(10) {
        lines.push(format!(
            "    [{}-{}]: {} ({:.2}%)",
            bin.bin,
            bin.upper(),
            bin.count,
            s.percent_of(bin)
        ));
    }
    lines
}
