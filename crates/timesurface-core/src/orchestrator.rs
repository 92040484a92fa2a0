//! Drives the sampler over a scan matrix.
//!
//! Both run modes go through [`Orchestrator`]: the batch benchmark measures
//! every entry once with a large sample count, the boundary scan cycles the
//! matrix with a smaller count until a deadline passes.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::clock::CycleClock;
use crate::error::Result;
use crate::load::Workload;
use crate::pattern::{ScanEntry, ScanMatrix};
use crate::sampler::Sampler;
use crate::stats::{self, Stats};

/// Samples per pattern in the batch benchmark.
pub const BENCH_ITERATIONS: usize = 1_000_000;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Boundary scan settings.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    pub iterations_per_pattern: usize,
    pub scan_duration: Duration,
    pub poll_interval: Duration,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            iterations_per_pattern: 30_000,
            scan_duration: Duration::from_secs(120),
            poll_interval: Duration::from_millis(100),
        }
    }
}

/// Analysis of one scan entry.
#[derive(Debug, Clone, Serialize)]
pub struct PatternReport {
    pub name: String,
    pub pattern_type: String,
    pub fft_level: String,
    pub pattern: String,
    pub stats: Stats,
}

impl PatternReport {
    pub fn new(entry: &ScanEntry, stats: Stats) -> Self {
        Self {
            name: entry.display_name(),
            pattern_type: entry.pattern_type().to_string(),
            fft_level: entry.level.name().to_string(),
            pattern: entry.pattern_name(),
            stats,
        }
    }
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

pub struct Orchestrator<C: CycleClock, W: Workload> {
    sampler: Sampler<C, W>,
}

impl<C: CycleClock, W: Workload> Orchestrator<C, W> {
    pub fn new(sampler: Sampler<C, W>) -> Self {
        Self { sampler }
    }

    pub fn sampler(&self) -> &Sampler<C, W> {
        &self.sampler
    }

    /// Take `iterations` samples of `entry`. Sample `i` uses `entry.tick_at(i)`.
    pub fn collect(&mut self, entry: &ScanEntry, iterations: usize) -> Result<Vec<i32>> {
        let mut data = Vec::with_capacity(iterations);
        for i in 0..iterations {
            data.push(self.sampler.measure(entry.tick_at(i), entry.level)?);
        }
        Ok(data)
    }

    /// Collect and analyze one entry.
    pub fn measure_entry(&mut self, entry: &ScanEntry, iterations: usize) -> Result<PatternReport> {
        let data = self.collect(entry, iterations)?;
        let stats = stats::analyze(&data)?;
        Ok(PatternReport::new(entry, stats))
    }

    /// Measure every entry once, in order. `on_entry` runs before each entry
    /// with its index. Returns early with what it has if `stop` is raised.
    pub fn run_matrix<F>(
        &mut self,
        matrix: &ScanMatrix,
        iterations: usize,
        stop: &AtomicBool,
        mut on_entry: F,
    ) -> Result<Vec<PatternReport>>
    where
        F: FnMut(usize, &ScanEntry),
    {
        let mut reports = Vec::with_capacity(matrix.len());
        for (idx, entry) in matrix.entries().iter().enumerate() {
            if stop.load(Ordering::Relaxed) {
                log::info!("matrix run interrupted after {idx} patterns");
                break;
            }
            on_entry(idx, entry);
            reports.push(self.measure_entry(entry, iterations)?);
        }
        Ok(reports)
    }

    /// Cycle through `matrix` until `config.scan_duration` has elapsed.
    ///
    /// `mark` runs before each pattern is collected (typically to read the
    /// wall clock); its value is handed to `sink` with the pattern's stats
    /// and running index. Returns the number of patterns recorded.
    pub fn boundary_scan<M, B, F>(
        &mut self,
        matrix: &ScanMatrix,
        config: &ScanConfig,
        stop: &AtomicBool,
        mut mark: B,
        mut sink: F,
    ) -> Result<usize>
    where
        B: FnMut(usize, &ScanEntry) -> M,
        F: FnMut(usize, &ScanEntry, &Stats, M) -> Result<()>,
    {
        if matrix.is_empty() {
            return Ok(0);
        }
        let deadline = Instant::now() + config.scan_duration;
        let mut index = 0usize;
        while Instant::now() < deadline && !stop.load(Ordering::Relaxed) {
            let entry = matrix.cycled(index);
            let marked = mark(index, entry);
            let data = self.collect(entry, config.iterations_per_pattern)?;
            let stats = stats::analyze(&data)?;
            sink(index, entry, &stats, marked)?;
            index += 1;
        }
        log::info!("boundary scan complete: {index} patterns recorded");
        Ok(index)
    }
}

// ---------------------------------------------------------------------------
// Boundary trigger
// ---------------------------------------------------------------------------

/// Minute of the half-hour boundary a scan started at `minute:second` will
/// straddle: 29 → 30, 59 → 0. `None` outside the trigger instants.
pub fn is_boundary_trigger(minute: u32, second: u32) -> Option<u32> {
    match (minute, second) {
        (29, 0) => Some(30),
        (59, 0) => Some(0),
        _ => None,
    }
}

/// Debounces the trigger (the wall clock is polled several times per second)
/// and rate-limits the waiting line to once per minute.
#[derive(Debug, Default)]
pub struct BoundaryTrigger {
    last_fired: Option<(u32, u32)>,
    last_waiting_minute: Option<u32>,
}

impl BoundaryTrigger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Boundary minute if a scan should start now. Fires at most once per
    /// trigger instant.
    pub fn poll(&mut self, hour: u32, minute: u32, second: u32) -> Option<u32> {
        let boundary = is_boundary_trigger(minute, second)?;
        if self.last_fired == Some((hour, minute)) {
            return None;
        }
        self.last_fired = Some((hour, minute));
        Some(boundary)
    }

    /// True the first time it is called in each new minute.
    pub fn should_report_waiting(&mut self, minute: u32) -> bool {
        if self.last_waiting_minute == Some(minute) {
            return false;
        }
        self.last_waiting_minute = Some(minute);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calibration::{Calibrator, FrequencySource};
    use crate::clock::testing::StepClock;
    use crate::load::FftLoadLevel;
    use crate::pattern::DynamicPreset;

    /// Workload that does nothing; with a step-1 clock every sample is 0.
    struct NoLoad;

    impl Workload for NoLoad {
        fn apply_load(&mut self, _level: FftLoadLevel) {}
    }

    /// Workload that records the levels it was asked for.
    #[derive(Default)]
    struct Recorder {
        levels: Vec<FftLoadLevel>,
    }

    impl Workload for Recorder {
        fn apply_load(&mut self, level: FftLoadLevel) {
            self.levels.push(level);
        }
    }

    fn small_cal() -> crate::calibration::CalibrationData {
        // Tiny thresholds so a step clock finishes each sample quickly.
        let mut cal = Calibrator::default()
            .for_frequency(2_400_000_000, FrequencySource::Override)
            .unwrap();
        cal.tick_minus1 = 12;
        cal.tick_center = 10;
        cal.tick_plus1 = 8;
        cal
    }

    // -----------------------------------------------------------------------
    // collect / measure_entry
    // -----------------------------------------------------------------------

    #[test]
    fn collect_uses_pattern_ticks() {
        let clock = StepClock::new(0, 1);
        let mut orch = Orchestrator::new(Sampler::new(&clock, NoLoad));
        let cal = small_cal();
        let entry = crate::pattern::ScanEntry::dynamic(&cal, FftLoadLevel::Load80, DynamicPreset::Block);
        let data = orch.collect(&entry, 12).unwrap();
        assert_eq!(data, vec![0; 12]);
        // 4 phases × (threshold + 1) reads per sample
        let expected_reads: u64 = (0..12).map(|i| 4 * (entry.tick_at(i) + 1)).sum();
        assert_eq!(clock.reads(), expected_reads);
    }

    #[test]
    fn measure_entry_labels_report() {
        let clock = StepClock::new(0, 1);
        let mut orch = Orchestrator::new(Sampler::new(&clock, NoLoad));
        let cal = small_cal();
        let entry = crate::pattern::ScanEntry::fixed(
            &cal,
            FftLoadLevel::Load90,
            crate::calibration::TickVariant::Minus1,
        );
        let report = orch.measure_entry(&entry, 50).unwrap();
        assert_eq!(report.name, "FFT90% Tick-1");
        assert_eq!(report.pattern_type, "Static");
        assert_eq!(report.fft_level, "90%");
        assert_eq!(report.pattern, "Tick-1");
        assert_eq!(report.stats.sample_count, 50);
        assert_eq!(report.stats.peak_percent, 100.0);
    }

    #[test]
    fn zero_iterations_is_empty_sample_set() {
        let clock = StepClock::new(0, 1);
        let mut orch = Orchestrator::new(Sampler::new(&clock, NoLoad));
        let entry = *ScanMatrix::standard(&small_cal()).cycled(0);
        assert!(matches!(
            orch.measure_entry(&entry, 0),
            Err(crate::Error::EmptySampleSet)
        ));
    }

    #[test]
    fn run_matrix_visits_every_entry_in_order() {
        let clock = StepClock::new(0, 1);
        let mut orch = Orchestrator::new(Sampler::new(&clock, Recorder::default()));
        let matrix = ScanMatrix::standard(&small_cal());
        let stop = AtomicBool::new(false);
        let mut seen = Vec::new();
        let reports = orch
            .run_matrix(&matrix, 2, &stop, |i, _| seen.push(i))
            .unwrap();
        assert_eq!(reports.len(), 32);
        assert_eq!(seen, (0..32).collect::<Vec<_>>());
        let levels = &orch.sampler().load().levels;
        assert_eq!(levels.len(), 64);
        assert_eq!(levels[0], FftLoadLevel::Load75);
        assert_eq!(levels[63], FftLoadLevel::Load90);
    }

    #[test]
    fn run_matrix_honours_stop_flag() {
        let clock = StepClock::new(0, 1);
        let mut orch = Orchestrator::new(Sampler::new(&clock, NoLoad));
        let matrix = ScanMatrix::standard(&small_cal());
        let stop = AtomicBool::new(true);
        let reports = orch.run_matrix(&matrix, 2, &stop, |_, _| {}).unwrap();
        assert!(reports.is_empty());
    }

    // -----------------------------------------------------------------------
    // boundary_scan
    // -----------------------------------------------------------------------

    #[test]
    fn zero_length_scan_records_nothing() {
        let clock = StepClock::new(0, 1);
        let mut orch = Orchestrator::new(Sampler::new(&clock, NoLoad));
        let config = ScanConfig {
            iterations_per_pattern: 5,
            scan_duration: Duration::ZERO,
            ..Default::default()
        };
        let stop = AtomicBool::new(false);
        let n = orch
            .boundary_scan(
                &ScanMatrix::standard(&small_cal()),
                &config,
                &stop,
                |_, _| (),
                |_, _, _, _| Ok(()),
            )
            .unwrap();
        assert_eq!(n, 0);
    }

    #[test]
    fn scan_cycles_matrix_until_deadline() {
        let clock = StepClock::new(0, 1);
        let mut orch = Orchestrator::new(Sampler::new(&clock, NoLoad));
        let config = ScanConfig {
            iterations_per_pattern: 3,
            scan_duration: Duration::from_millis(30),
            ..Default::default()
        };
        let stop = AtomicBool::new(false);
        let matrix = ScanMatrix::standard(&small_cal());
        let mut rows = Vec::new();
        let n = orch
            .boundary_scan(&matrix, &config, &stop, |_, _| (), |i, entry, stats, ()| {
                rows.push((i, entry.display_name(), stats.sample_count));
                Ok(())
            })
            .unwrap();
        assert!(n > 0);
        assert_eq!(rows.len(), n);
        for (i, name, count) in &rows {
            assert_eq!(*name, matrix.cycled(*i).display_name());
            assert_eq!(*count, 3);
        }
    }

    #[test]
    fn scan_marks_each_pattern_before_collecting() {
        let clock = StepClock::new(0, 1);
        let mut orch = Orchestrator::new(Sampler::new(&clock, NoLoad));
        let config = ScanConfig {
            iterations_per_pattern: 3,
            scan_duration: Duration::from_millis(30),
            ..Default::default()
        };
        let stop = AtomicBool::new(false);
        let matrix = ScanMatrix::standard(&small_cal());
        let mut marks = Vec::new();
        let n = orch
            .boundary_scan(
                &matrix,
                &config,
                &stop,
                |_, _| clock.reads(),
                |i, _, _, reads_before| {
                    marks.push((i, reads_before));
                    Ok(())
                },
            )
            .unwrap();
        assert!(n >= 2);
        // No clock reads happen before the first pattern is marked.
        assert_eq!(marks[0], (0, 0));
        // The second mark sits exactly after the first pattern's samples:
        // 3 samples × 4 phases × (Tick-1 threshold 12 + 1) reads.
        assert_eq!(marks[1], (1, 3 * 4 * 13));
    }

    #[test]
    fn scan_propagates_sink_errors() {
        let clock = StepClock::new(0, 1);
        let mut orch = Orchestrator::new(Sampler::new(&clock, NoLoad));
        let config = ScanConfig {
            iterations_per_pattern: 1,
            scan_duration: Duration::from_secs(60),
            ..Default::default()
        };
        let stop = AtomicBool::new(false);
        let err = orch
            .boundary_scan(
                &ScanMatrix::standard(&small_cal()),
                &config,
                &stop,
                |_, _| (),
                |_, _, _, _| Err(std::io::Error::other("disk full").into()),
            )
            .unwrap_err();
        assert!(matches!(err, crate::Error::Io(_)));
    }

    // -----------------------------------------------------------------------
    // Trigger
    // -----------------------------------------------------------------------

    #[test]
    fn trigger_instants() {
        assert_eq!(is_boundary_trigger(29, 0), Some(30));
        assert_eq!(is_boundary_trigger(59, 0), Some(0));
        assert_eq!(is_boundary_trigger(29, 1), None);
        assert_eq!(is_boundary_trigger(30, 0), None);
        assert_eq!(is_boundary_trigger(0, 0), None);
    }

    #[test]
    fn trigger_fires_once_per_instant() {
        let mut t = BoundaryTrigger::new();
        assert_eq!(t.poll(13, 29, 0), Some(30));
        assert_eq!(t.poll(13, 29, 0), None);
        assert_eq!(t.poll(13, 29, 1), None);
        assert_eq!(t.poll(13, 59, 0), Some(0));
        assert_eq!(t.poll(14, 29, 0), Some(30));
    }

    #[test]
    fn waiting_line_once_per_minute() {
        let mut t = BoundaryTrigger::new();
        assert!(t.should_report_waiting(5));
        assert!(!t.should_report_waiting(5));
        assert!(t.should_report_waiting(6));
    }
}
