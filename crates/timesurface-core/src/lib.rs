//! # timesurface-core
//!
//! **Probe how a synthetic CPU load bends microsecond-scale timing.**
//!
//! `timesurface-core` calibrates the cycle counter, converts target
//! frequencies around 277.3 kHz into tick thresholds, and contrasts idle
//! busy-wait windows against windows that also run a deterministic compute
//! load. The per-sample differentials are summarized into a mean, a
//! population standard deviation and a 20-wide histogram.
//!
//! ## Quick Start
//!
//! ```no_run
//! use rand::SeedableRng;
//! use rand::rngs::StdRng;
//! use timesurface_core::{
//!     FftLoadLevel, HardwareClock, LoadGenerator, LoadTable, Sampler, analyze, calibrate,
//! };
//!
//! let cal = calibrate(None)?;
//! let load = LoadGenerator::new(LoadTable::default(), StdRng::from_os_rng())?;
//! let mut sampler = Sampler::new(HardwareClock, load);
//!
//! let samples: Vec<i32> = (0..10_000)
//!     .map(|_| sampler.measure(cal.tick_center, FftLoadLevel::Load85))
//!     .collect::<Result<_, _>>()?;
//! let stats = analyze(&samples)?;
//! println!("avg {:.2}, peak bin {} ({:.2}%)", stats.avg, stats.peak_bin, stats.peak_percent);
//! # Ok::<(), timesurface_core::Error>(())
//! ```
//!
//! ## Architecture
//!
//! Calibrator → tick thresholds → Sampler ← LoadGenerator (FFT + qubit)
//! → StatisticsEngine → report row.
//!
//! [`Orchestrator`] runs a [`ScanMatrix`] through that pipeline, either once
//! per entry (batch benchmark) or cyclically until a deadline (boundary scan).

pub mod calibration;
pub mod clock;
pub mod error;
pub mod fft;
pub mod load;
pub mod orchestrator;
pub mod pattern;
pub mod platform;
pub mod qubit;
pub mod report;
pub mod sampler;
pub mod stats;

pub use calibration::{
    CalibrationData, Calibrator, FrequencySource, TickVariant, calibrate, ticks_from_frequency,
    ticks_from_microseconds,
};
pub use clock::{CycleClock, HardwareClock, WARMUP_CYCLES, warm_up};
pub use error::{Error, Result};
pub use load::{
    FftLoadLevel, LoadGenerator, LoadProfile, LoadTable, Workload, load_table_from_path,
};
pub use orchestrator::{
    BENCH_ITERATIONS, BoundaryTrigger, Orchestrator, PatternReport, ScanConfig,
    is_boundary_trigger,
};
pub use pattern::{DynamicPattern, DynamicPreset, ScanEntry, ScanMatrix, TickPattern};
pub use platform::{MachineInfo, detect_machine_info, request_realtime_priority};
pub use qubit::{QubitState, run_quantum_load};
pub use report::{BenchReport, LogRow, ScanLog, TimeBase, WallTime};
pub use sampler::{Phase, Sampler};
pub use stats::{HistogramBin, QuickStats, Stats, analyze};

/// Library version (from Cargo.toml).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
