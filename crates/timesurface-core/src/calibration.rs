//! CPU frequency calibration and frequency → tick conversion.
//!
//! The sampler bounds every busy-wait window by a raw cycle count. This module
//! turns a CPU frequency (overridden, measured, or assumed) into the three
//! tick thresholds around the probed center frequency.
//!
//! An implausible measurement only costs precision, so it degrades to a fixed
//! default instead of erroring. Only a band that cannot produce three
//! ordered, non-zero tick thresholds is rejected.

use std::fmt;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::clock::{CycleClock, HardwareClock};
use crate::error::{Error, Result};

/// Center of the probed band, in Hz (period ≈ 3.606 µs).
pub const DEFAULT_CENTER_HZ: f64 = 277_300.0;

/// Distance between the center and its two neighbours, in Hz.
pub const DEFAULT_SPACING_HZ: f64 = 1_000.0;

/// Frequency assumed when the measurement is implausible.
pub const FALLBACK_CPU_FREQ_HZ: u64 = 2_400_000_000;

/// Measurements at or below this are treated as an unreliable counter.
pub const PLAUSIBLE_FLOOR_HZ: u64 = 1_000_000_000;

/// Wall-clock interval over which the counter is sampled.
pub const MEASURE_INTERVAL: Duration = Duration::from_millis(100);

// ---------------------------------------------------------------------------
// Tick variants
// ---------------------------------------------------------------------------

/// One of the three target frequencies around the center.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TickVariant {
    /// center − spacing (longest period, most ticks).
    Minus1,
    /// The center frequency.
    Center,
    /// center + spacing (shortest period, fewest ticks).
    Plus1,
}

impl TickVariant {
    pub const ALL: [TickVariant; 3] = [Self::Minus1, Self::Center, Self::Plus1];

    /// Short label used in pattern names and reports.
    pub fn label(self) -> &'static str {
        match self {
            Self::Minus1 => "-1",
            Self::Center => "0",
            Self::Plus1 => "+1",
        }
    }

    fn offset(self) -> f64 {
        match self {
            Self::Minus1 => -1.0,
            Self::Center => 0.0,
            Self::Plus1 => 1.0,
        }
    }
}

impl fmt::Display for TickVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// Calibration data
// ---------------------------------------------------------------------------

/// Where the calibrated CPU frequency came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrequencySource {
    Override,
    Measured,
    Fallback,
}

impl fmt::Display for FrequencySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Override => write!(f, "override"),
            Self::Measured => write!(f, "measured"),
            Self::Fallback => write!(f, "fallback"),
        }
    }
}

/// Tick thresholds for one run. Created once, read by every sampler call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalibrationData {
    pub cpu_freq_hz: u64,
    pub tick_center: u64,
    pub tick_minus1: u64,
    pub tick_plus1: u64,
    pub center_hz: f64,
    pub spacing_hz: f64,
    pub source: FrequencySource,
}

impl CalibrationData {
    /// Tick threshold for a variant.
    pub fn tick(&self, variant: TickVariant) -> u64 {
        match variant {
            TickVariant::Minus1 => self.tick_minus1,
            TickVariant::Center => self.tick_center,
            TickVariant::Plus1 => self.tick_plus1,
        }
    }

    /// Target frequency of a variant in Hz.
    pub fn target_hz(&self, variant: TickVariant) -> f64 {
        self.center_hz + variant.offset() * self.spacing_hz
    }

    /// Period of a variant in microseconds.
    pub fn period_us(&self, variant: TickVariant) -> f64 {
        1_000_000.0 / self.target_hz(variant)
    }

    pub fn cpu_freq_ghz(&self) -> f64 {
        self.cpu_freq_hz as f64 / 1e9
    }
}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

/// Ticks spanned by `microseconds` at `cpu_freq_hz`, truncated toward zero.
pub fn ticks_from_microseconds(cpu_freq_hz: u64, microseconds: f64) -> u64 {
    let seconds = microseconds / 1_000_000.0;
    (cpu_freq_hz as f64 * seconds) as u64
}

/// Ticks spanned by one period of `target_freq_hz` at `cpu_freq_hz`.
pub fn ticks_from_frequency(cpu_freq_hz: u64, target_freq_hz: f64) -> u64 {
    let period_us = 1_000_000.0 / target_freq_hz;
    ticks_from_microseconds(cpu_freq_hz, period_us)
}

/// Count counter ticks across `interval` of wall-clock sleep and scale to Hz.
///
/// Returns 0 if no wall-clock time was observed.
pub fn measure_cpu_frequency<C: CycleClock>(clock: &C, interval: Duration) -> u64 {
    let start_time = Instant::now();
    let start_cycles = clock.now();

    std::thread::sleep(interval);

    let end_cycles = clock.now();
    let micros = start_time.elapsed().as_micros();
    if micros == 0 {
        return 0;
    }

    let cycles = end_cycles.wrapping_sub(start_cycles) as u128;
    (cycles * 1_000_000 / micros).min(u64::MAX as u128) as u64
}

// ---------------------------------------------------------------------------
// Calibrator
// ---------------------------------------------------------------------------

/// Calibration constants. `Default` reproduces the 277.3 kHz ± 1 kHz setup.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Calibrator {
    pub center_hz: f64,
    pub spacing_hz: f64,
    pub fallback_hz: u64,
    pub plausible_floor_hz: u64,
    pub measure_interval: Duration,
}

impl Default for Calibrator {
    fn default() -> Self {
        Self {
            center_hz: DEFAULT_CENTER_HZ,
            spacing_hz: DEFAULT_SPACING_HZ,
            fallback_hz: FALLBACK_CPU_FREQ_HZ,
            plausible_floor_hz: PLAUSIBLE_FLOOR_HZ,
            measure_interval: MEASURE_INTERVAL,
        }
    }
}

impl Calibrator {
    /// Calibrator for a custom center frequency, other constants default.
    pub fn with_center(center_hz: f64) -> Result<Self> {
        let calibrator = Self {
            center_hz,
            ..Default::default()
        };
        calibrator.validate()?;
        Ok(calibrator)
    }

    /// The lowest target frequency must stay above 0 Hz and every constant
    /// must be finite.
    pub fn validate(&self) -> Result<()> {
        if !self.center_hz.is_finite() || !self.spacing_hz.is_finite() {
            return Err(Error::InvalidCalibration(format!(
                "center {} Hz and spacing {} Hz must be finite",
                self.center_hz, self.spacing_hz
            )));
        }
        if self.spacing_hz <= 0.0 {
            return Err(Error::InvalidCalibration(format!(
                "spacing {} Hz must be positive",
                self.spacing_hz
            )));
        }
        if self.center_hz - self.spacing_hz <= 0.0 {
            return Err(Error::InvalidCalibration(format!(
                "center {} Hz must exceed the {} Hz spacing",
                self.center_hz, self.spacing_hz
            )));
        }
        Ok(())
    }

    /// Calibrate against `clock`. A positive override skips measurement.
    pub fn calibrate<C: CycleClock>(
        &self,
        clock: &C,
        override_freq_hz: Option<u64>,
    ) -> Result<CalibrationData> {
        self.validate()?;
        let (cpu_freq_hz, source) = match override_freq_hz {
            Some(hz) if hz > 0 => (hz, FrequencySource::Override),
            _ => {
                let measured = measure_cpu_frequency(clock, self.measure_interval);
                self.resolve_measurement(measured)
            }
        };
        let cal = self.for_frequency(cpu_freq_hz, source)?;
        log::info!(
            "calibrated {:.2} GHz ({}): ticks {} / {} / {}",
            cal.cpu_freq_ghz(),
            cal.source,
            cal.tick_minus1,
            cal.tick_center,
            cal.tick_plus1
        );
        Ok(cal)
    }

    /// Accept a measured frequency or fall back when it is implausibly low.
    pub fn resolve_measurement(&self, measured_hz: u64) -> (u64, FrequencySource) {
        if measured_hz > self.plausible_floor_hz {
            (measured_hz, FrequencySource::Measured)
        } else {
            log::warn!(
                "measured counter frequency {measured_hz} Hz is implausible, assuming {} Hz",
                self.fallback_hz
            );
            (self.fallback_hz, FrequencySource::Fallback)
        }
    }

    /// Derive the three tick thresholds for a known CPU frequency.
    ///
    /// Every tick must be at least 1, strictly ordered
    /// `minus1 > center > plus1`, and the longest window must fit in one
    /// second of counter ticks.
    pub fn for_frequency(
        &self,
        cpu_freq_hz: u64,
        source: FrequencySource,
    ) -> Result<CalibrationData> {
        self.validate()?;
        let cal = CalibrationData {
            cpu_freq_hz,
            tick_center: ticks_from_frequency(cpu_freq_hz, self.center_hz),
            tick_minus1: ticks_from_frequency(cpu_freq_hz, self.center_hz - self.spacing_hz),
            tick_plus1: ticks_from_frequency(cpu_freq_hz, self.center_hz + self.spacing_hz),
            center_hz: self.center_hz,
            spacing_hz: self.spacing_hz,
            source,
        };
        if cal.tick_plus1 == 0 {
            return Err(Error::InvalidCalibration(format!(
                "{:.1} Hz is faster than one tick of a {cpu_freq_hz} Hz counter",
                cal.target_hz(TickVariant::Plus1)
            )));
        }
        if !(cal.tick_minus1 > cal.tick_center && cal.tick_center > cal.tick_plus1) {
            return Err(Error::InvalidCalibration(format!(
                "ticks {} / {} / {} are not strictly decreasing at {cpu_freq_hz} Hz",
                cal.tick_minus1, cal.tick_center, cal.tick_plus1
            )));
        }
        if cal.tick_minus1 > cpu_freq_hz {
            return Err(Error::InvalidCalibration(format!(
                "{:.1} Hz window is longer than one second",
                cal.target_hz(TickVariant::Minus1)
            )));
        }
        Ok(cal)
    }
}

/// Calibrate the hardware counter with default constants.
pub fn calibrate(override_freq_hz: Option<u64>) -> Result<CalibrationData> {
    Calibrator::default().calibrate(&HardwareClock, override_freq_hz)
}
