//! Summary statistics and binned histogram for a sample set.
//!
//! Samples are operation-count differentials, so the distribution is discrete
//! and usually narrow. Bins are 20 wide with floor semantics (`-5` lands in
//! the `-20` bin, `25` in the `20` bin).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Width of one histogram bin.
pub const BIN_WIDTH: i64 = 20;

/// Lower edge of the bin containing `value`.
#[inline]
pub fn bin_of(value: i32) -> i64 {
    (value as i64).div_euclid(BIN_WIDTH) * BIN_WIDTH
}

/// One histogram bucket, `[bin, bin + BIN_WIDTH)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistogramBin {
    pub bin: i64,
    pub count: u64,
}

impl HistogramBin {
    /// Inclusive upper edge, e.g. `19` for the `0` bin.
    pub fn upper(&self) -> i64 {
        self.bin + BIN_WIDTH - 1
    }
}

/// Full summary of one sample set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    pub avg: f64,
    /// Population standard deviation.
    pub std_dev: f64,
    pub min: i32,
    pub max: i32,
    pub peak_bin: i64,
    pub peak_count: u64,
    pub peak_percent: f64,
    pub sample_count: usize,
    /// Every non-empty bin, most populated first; ties by ascending bin.
    pub histogram: Vec<HistogramBin>,
}

/// The subset written to the scheduled scan log.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuickStats {
    pub avg: f64,
    pub std_dev: f64,
    pub peak_bin: i64,
    pub peak_percent: f64,
}

impl Stats {
    /// At most `n` of the most populated bins.
    pub fn top_n(&self, n: usize) -> &[HistogramBin] {
        &self.histogram[..n.min(self.histogram.len())]
    }

    /// Share of all samples that fell in `bin`, in percent.
    pub fn percent_of(&self, bin: &HistogramBin) -> f64 {
        bin.count as f64 / self.sample_count as f64 * 100.0
    }

    pub fn quick(&self) -> QuickStats {
        QuickStats {
            avg: self.avg,
            std_dev: self.std_dev,
            peak_bin: self.peak_bin,
            peak_percent: self.peak_percent,
        }
    }
}

/// Summarize `samples`.
pub fn analyze(samples: &[i32]) -> Result<Stats> {
    if samples.is_empty() {
        return Err(Error::EmptySampleSet);
    }

    let n = samples.len() as f64;
    let sum: i64 = samples.iter().map(|&v| v as i64).sum();
    let avg = sum as f64 / n;
    let variance = samples
        .iter()
        .map(|&v| (v as f64 - avg).powi(2))
        .sum::<f64>()
        / n;

    let mut min = i32::MAX;
    let mut max = i32::MIN;
    let mut bins: BTreeMap<i64, u64> = BTreeMap::new();
    for &v in samples {
        min = min.min(v);
        max = max.max(v);
        *bins.entry(bin_of(v)).or_insert(0) += 1;
    }

    // Stable sort keeps ascending bin order among equal counts.
    let mut histogram: Vec<HistogramBin> = bins
        .into_iter()
        .map(|(bin, count)| HistogramBin { bin, count })
        .collect();
    histogram.sort_by(|a, b| b.count.cmp(&a.count));

    let peak = histogram[0];
    Ok(Stats {
        avg,
        std_dev: variance.sqrt(),
        min,
        max,
        peak_bin: peak.bin,
        peak_count: peak.count,
        peak_percent: peak.count as f64 / n * 100.0,
        sample_count: samples.len(),
        histogram,
    })
}
