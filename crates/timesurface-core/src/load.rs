//! Named CPU load levels built from the transform and qubit workloads.
//!
//! A [`LoadTable`] maps each [`FftLoadLevel`] to a transform size and repeat
//! count. The default table was tuned on a ~5.25 GHz core; [`LoadTable::rescaled`]
//! stretches the repeat counts so the same level burns a comparable share of
//! the measurement window on a different clock.

use std::fmt;
use std::path::Path;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::fft::{self, Complex, MAX_TRANSFORM_SIZE};
use crate::qubit;

/// Clock frequency the default table was tuned on.
pub const DEFAULT_TUNED_FOR_HZ: u64 = 5_250_000_000;

// ---------------------------------------------------------------------------
// Levels and profiles
// ---------------------------------------------------------------------------

/// Nominal share of the measurement window occupied by the load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FftLoadLevel {
    Load75,
    Load80,
    Load85,
    Load90,
}

impl FftLoadLevel {
    pub const ALL: [FftLoadLevel; 4] = [Self::Load75, Self::Load80, Self::Load85, Self::Load90];

    /// Integer percentage, e.g. `75`.
    pub fn percent(self) -> u32 {
        match self {
            Self::Load75 => 75,
            Self::Load80 => 80,
            Self::Load85 => 85,
            Self::Load90 => 90,
        }
    }

    /// Display name used in reports, e.g. `"75%"`.
    pub fn name(self) -> &'static str {
        match self {
            Self::Load75 => "75%",
            Self::Load80 => "80%",
            Self::Load85 => "85%",
            Self::Load90 => "90%",
        }
    }

    /// Parse either `"75"` or `"75%"`.
    pub fn from_percent_str(s: &str) -> Option<Self> {
        let digits = s.trim().trim_end_matches('%');
        Self::ALL
            .into_iter()
            .find(|lvl| digits == lvl.percent().to_string())
    }
}

impl fmt::Display for FftLoadLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Transform size and number of forward+inverse passes for one level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadProfile {
    pub size: usize,
    pub repeats: u32,
}

impl LoadProfile {
    pub const fn new(size: usize, repeats: u32) -> Self {
        Self { size, repeats }
    }
}

// ---------------------------------------------------------------------------
// Load table
// ---------------------------------------------------------------------------

/// Level → profile mapping, loadable from JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadTable {
    /// Clock frequency the repeat counts were chosen for.
    pub tuned_for_hz: u64,
    pub load_75: LoadProfile,
    pub load_80: LoadProfile,
    pub load_85: LoadProfile,
    pub load_90: LoadProfile,
}

impl Default for LoadTable {
    fn default() -> Self {
        Self {
            tuned_for_hz: DEFAULT_TUNED_FOR_HZ,
            load_75: LoadProfile::new(64, 4),
            load_80: LoadProfile::new(64, 5),
            load_85: LoadProfile::new(128, 3),
            load_90: LoadProfile::new(128, 4),
        }
    }
}

impl LoadTable {
    pub fn profile(&self, level: FftLoadLevel) -> LoadProfile {
        match level {
            FftLoadLevel::Load75 => self.load_75,
            FftLoadLevel::Load80 => self.load_80,
            FftLoadLevel::Load85 => self.load_85,
            FftLoadLevel::Load90 => self.load_90,
        }
    }

    fn profile_mut(&mut self, level: FftLoadLevel) -> &mut LoadProfile {
        match level {
            FftLoadLevel::Load75 => &mut self.load_75,
            FftLoadLevel::Load80 => &mut self.load_80,
            FftLoadLevel::Load85 => &mut self.load_85,
            FftLoadLevel::Load90 => &mut self.load_90,
        }
    }

    /// Check every profile against the transform buffer constraints.
    pub fn validate(&self) -> Result<()> {
        if self.tuned_for_hz == 0 {
            return Err(Error::InvalidLoadTable(
                "tuned_for_hz must be positive".to_string(),
            ));
        }
        for level in FftLoadLevel::ALL {
            let p = self.profile(level);
            if !p.size.is_power_of_two() || p.size > MAX_TRANSFORM_SIZE {
                return Err(Error::InvalidLoadTable(format!(
                    "{level}: size {} is not a power of two <= {MAX_TRANSFORM_SIZE}",
                    p.size
                )));
            }
            if p.repeats == 0 {
                return Err(Error::InvalidLoadTable(format!(
                    "{level}: repeats must be at least 1"
                )));
            }
        }
        Ok(())
    }

    /// Scale repeat counts from `tuned_for_hz` to `cpu_freq_hz`, rounding and
    /// keeping at least one pass per level. Sizes are left alone.
    pub fn rescaled(&self, cpu_freq_hz: u64) -> LoadTable {
        if cpu_freq_hz == 0 || self.tuned_for_hz == 0 {
            return self.clone();
        }
        let ratio = cpu_freq_hz as f64 / self.tuned_for_hz as f64;
        let mut out = self.clone();
        out.tuned_for_hz = cpu_freq_hz;
        for level in FftLoadLevel::ALL {
            let p = out.profile_mut(level);
            let scaled = (p.repeats as f64 * ratio).round();
            p.repeats = scaled.clamp(1.0, u32::MAX as f64) as u32;
        }
        out
    }
}

/// Read and validate a JSON load table.
pub fn load_table_from_path(path: &Path) -> Result<LoadTable> {
    let raw = std::fs::read_to_string(path)?;
    let table: LoadTable = serde_json::from_str(&raw)?;
    if let Err(e) = table.validate() {
        log::warn!("rejected load table {}: {e}", path.display());
        return Err(e);
    }
    Ok(table)
}

// ---------------------------------------------------------------------------
// Workloads
// ---------------------------------------------------------------------------

/// One transform load: fill the first `size` slots of a 256-slot buffer with
/// a sine period, then run forward + inverse `repeats` times.
pub fn run_fft_load(profile: LoadProfile) {
    let mut buffer = [Complex::ZERO; MAX_TRANSFORM_SIZE];
    let data = &mut buffer[..profile.size];
    fft::fill_sine(data);
    for _ in 0..profile.repeats {
        fft::transform(data, false);
        fft::transform(data, true);
    }
    std::hint::black_box(&buffer);
}

/// Something the sampler can run inside its loaded window.
pub trait Workload {
    fn apply_load(&mut self, level: FftLoadLevel);
}

/// Runs the transform load followed by the qubit load.
pub struct LoadGenerator<R: Rng> {
    table: LoadTable,
    rng: R,
}

impl<R: Rng> LoadGenerator<R> {
    /// # Errors
    ///
    /// [`Error::InvalidLoadTable`] when a profile would overrun the transform
    /// buffer or run zero passes.
    pub fn new(table: LoadTable, rng: R) -> Result<Self> {
        table.validate()?;
        Ok(Self { table, rng })
    }

    pub fn table(&self) -> &LoadTable {
        &self.table
    }
}

impl<R: Rng> Workload for LoadGenerator<R> {
    fn apply_load(&mut self, level: FftLoadLevel) {
        run_fft_load(self.table.profile(level));
        std::hint::black_box(qubit::run_quantum_load(&mut self.rng));
    }
}
