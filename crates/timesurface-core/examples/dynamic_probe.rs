//! Probe one dynamic tick pattern at each load level.
//!
//! Calibrates the cycle counter, then runs the "Original" six-step
//! transition under every FFT load level and prints the summary stats.
//!
//! Run: `cargo run --example dynamic_probe`

use rand::SeedableRng;
use rand::rngs::StdRng;
use timesurface_core::{
    DynamicPreset, FftLoadLevel, HardwareClock, LoadGenerator, LoadTable, Orchestrator, Sampler,
    ScanMatrix, calibrate,
};

fn main() {
    let cal = calibrate(None).unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        std::process::exit(1);
    });
    println!(
        "CPU {:.2} GHz, ticks {}/{}/{}",
        cal.cpu_freq_ghz(),
        cal.tick_minus1,
        cal.tick_center,
        cal.tick_plus1
    );

    let load = LoadGenerator::new(LoadTable::default(), StdRng::seed_from_u64(7))
        .unwrap_or_else(|e| {
            eprintln!("Error: {e}");
            std::process::exit(1);
        });
    let mut orchestrator = Orchestrator::new(Sampler::new(HardwareClock, load));

    for level in FftLoadLevel::ALL {
        let matrix = ScanMatrix::single_dynamic(&cal, DynamicPreset::Original, level);
        let entry = &matrix.entries()[0];
        match orchestrator.measure_entry(entry, 20_000) {
            Ok(report) => println!(
                "{:<28} avg {:>8.2}  sd {:>7.2}  peak [{}] {:.1}%",
                report.name,
                report.stats.avg,
                report.stats.std_dev,
                report.stats.peak_bin,
                report.stats.peak_percent
            ),
            Err(e) => {
                eprintln!("{}: {e}", entry.display_name());
                std::process::exit(1);
            }
        }
    }
}
