//! Tick patterns and the scan matrix the drivers iterate over.
//!
//! A static pattern holds one tick threshold for every sample. A dynamic
//! pattern cycles through six thresholds, sample `i` using slot `i mod 6`.

use std::fmt;

use serde::Serialize;

use crate::calibration::{CalibrationData, TickVariant};
use crate::load::FftLoadLevel;

/// Slots in a dynamic pattern.
pub const DYNAMIC_PATTERN_LEN: usize = 6;

// ---------------------------------------------------------------------------
// Dynamic presets
// ---------------------------------------------------------------------------

/// The five built-in tick transition orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DynamicPreset {
    Original,
    Alternating,
    Block,
    Mixed,
    Sweep,
}

impl DynamicPreset {
    pub const ALL: [DynamicPreset; 5] = [
        Self::Original,
        Self::Alternating,
        Self::Block,
        Self::Mixed,
        Self::Sweep,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Original => "Original",
            Self::Alternating => "Alternating",
            Self::Block => "Block",
            Self::Mixed => "Mixed",
            Self::Sweep => "Sweep",
        }
    }

    /// Case-insensitive lookup by name.
    pub fn from_name(s: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|p| p.name().eq_ignore_ascii_case(s.trim()))
    }

    pub fn order(self) -> [TickVariant; DYNAMIC_PATTERN_LEN] {
        use TickVariant::{Center as C, Minus1 as M, Plus1 as P};
        match self {
            Self::Original => [M, M, C, P, P, C],
            Self::Alternating => [P, M, P, M, P, M],
            Self::Block => [P, P, P, M, M, M],
            Self::Mixed => [C, M, P, C, P, M],
            Self::Sweep => [M, C, P, P, C, M],
        }
    }

    /// Transition order as `-1->-1->0->…`.
    pub fn describe(self) -> String {
        self.order()
            .iter()
            .map(|v| v.label())
            .collect::<Vec<_>>()
            .join("->")
    }
}

impl fmt::Display for DynamicPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Six concrete tick thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DynamicPattern {
    pub preset: DynamicPreset,
    pub ticks: [u64; DYNAMIC_PATTERN_LEN],
}

impl DynamicPattern {
    pub fn new(preset: DynamicPreset, cal: &CalibrationData) -> Self {
        Self {
            preset,
            ticks: preset.order().map(|v| cal.tick(v)),
        }
    }

    #[inline]
    pub fn tick_at(&self, i: usize) -> u64 {
        self.ticks[i % DYNAMIC_PATTERN_LEN]
    }
}

// ---------------------------------------------------------------------------
// Scan entries
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TickPattern {
    Static { variant: TickVariant, tick: u64 },
    Dynamic(DynamicPattern),
}

impl TickPattern {
    #[inline]
    pub fn tick_at(&self, i: usize) -> u64 {
        match self {
            Self::Static { tick, .. } => *tick,
            Self::Dynamic(p) => p.tick_at(i),
        }
    }
}

/// One (load level, tick pattern) cell of the scan matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScanEntry {
    pub level: FftLoadLevel,
    pub pattern: TickPattern,
}

impl ScanEntry {
    pub fn fixed(cal: &CalibrationData, level: FftLoadLevel, variant: TickVariant) -> Self {
        Self {
            level,
            pattern: TickPattern::Static {
                variant,
                tick: cal.tick(variant),
            },
        }
    }

    pub fn dynamic(cal: &CalibrationData, level: FftLoadLevel, preset: DynamicPreset) -> Self {
        Self {
            level,
            pattern: TickPattern::Dynamic(DynamicPattern::new(preset, cal)),
        }
    }

    /// `"Static"` or `"Dynamic"`, the log's `type` column.
    pub fn pattern_type(&self) -> &'static str {
        match self.pattern {
            TickPattern::Static { .. } => "Static",
            TickPattern::Dynamic(_) => "Dynamic",
        }
    }

    /// `"Tick-1"` for static entries, the preset name for dynamic ones.
    pub fn pattern_name(&self) -> String {
        match self.pattern {
            TickPattern::Static { variant, .. } => format!("Tick{}", variant.label()),
            TickPattern::Dynamic(p) => p.preset.name().to_string(),
        }
    }

    /// Heading used in benchmark output, e.g. `"FFT85% Tick+1"` or
    /// `"Dynamic FFT85% Sweep"`.
    pub fn display_name(&self) -> String {
        match self.pattern {
            TickPattern::Static { variant, .. } => {
                format!("FFT{} Tick{}", self.level.name(), variant.label())
            }
            TickPattern::Dynamic(p) => format!("Dynamic FFT{} {}", self.level.name(), p.preset),
        }
    }

    #[inline]
    pub fn tick_at(&self, i: usize) -> u64 {
        self.pattern.tick_at(i)
    }
}

// ---------------------------------------------------------------------------
// Scan matrix
// ---------------------------------------------------------------------------

/// Ordered list of entries a driver cycles through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanMatrix {
    entries: Vec<ScanEntry>,
}

impl ScanMatrix {
    /// 12 static entries (level-major, ticks −1/0/+1) followed by
    /// 20 dynamic entries (level-major, five presets each).
    pub fn standard(cal: &CalibrationData) -> Self {
        let statics = FftLoadLevel::ALL.into_iter().flat_map(|level| {
            TickVariant::ALL
                .into_iter()
                .map(move |v| ScanEntry::fixed(cal, level, v))
        });
        let dynamics = FftLoadLevel::ALL.into_iter().flat_map(|level| {
            DynamicPreset::ALL
                .into_iter()
                .map(move |p| ScanEntry::dynamic(cal, level, p))
        });
        Self {
            entries: statics.chain(dynamics).collect(),
        }
    }

    /// One dynamic pattern at one level.
    pub fn single_dynamic(cal: &CalibrationData, preset: DynamicPreset, level: FftLoadLevel) -> Self {
        Self {
            entries: vec![ScanEntry::dynamic(cal, level, preset)],
        }
    }

    /// One static tick at one level.
    pub fn single_static(cal: &CalibrationData, variant: TickVariant, level: FftLoadLevel) -> Self {
        Self {
            entries: vec![ScanEntry::fixed(cal, level, variant)],
        }
    }

    pub fn entries(&self) -> &[ScanEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry for running index `i`, wrapping around the matrix.
    ///
    /// # Panics
    ///
    /// If the matrix is empty.
    pub fn cycled(&self, i: usize) -> &ScanEntry {
        &self.entries[i % self.entries.len()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calibration::{Calibrator, FrequencySource};

    fn cal() -> CalibrationData {
        Calibrator::default().for_frequency(2_400_000_000, FrequencySource::Override).unwrap()
    }

    #[test]
    fn standard_matrix_layout() {
        let cal = cal();
        let m = ScanMatrix::standard(&cal);
        assert_eq!(m.len(), 32);

        let statics = m.entries().iter().filter(|e| e.pattern_type() == "Static");
        assert_eq!(statics.count(), 12);

        let first = &m.entries()[0];
        assert_eq!(first.level, FftLoadLevel::Load75);
        assert_eq!(first.pattern_name(), "Tick-1");
        assert_eq!(first.display_name(), "FFT75% Tick-1");

        let third = &m.entries()[2];
        assert_eq!(third.pattern_name(), "Tick+1");
        assert_eq!(m.entries()[3].level, FftLoadLevel::Load80);

        let dyn0 = &m.entries()[12];
        assert_eq!(dyn0.pattern_type(), "Dynamic");
        assert_eq!(dyn0.pattern_name(), "Original");
        assert_eq!(dyn0.display_name(), "Dynamic FFT75% Original");

        let last = &m.entries()[31];
        assert_eq!(last.level, FftLoadLevel::Load90);
        assert_eq!(last.pattern_name(), "Sweep");
    }

    #[test]
    fn cycled_wraps() {
        let m = ScanMatrix::standard(&cal());
        assert_eq!(m.cycled(0), m.cycled(32));
        assert_eq!(m.cycled(13), m.cycled(45));
    }

    #[test]
    fn preset_orders() {
        assert_eq!(DynamicPreset::Original.describe(), "-1->-1->0->+1->+1->0");
        assert_eq!(DynamicPreset::Alternating.describe(), "+1->-1->+1->-1->+1->-1");
        assert_eq!(DynamicPreset::Block.describe(), "+1->+1->+1->-1->-1->-1");
        assert_eq!(DynamicPreset::Mixed.describe(), "0->-1->+1->0->+1->-1");
        assert_eq!(DynamicPreset::Sweep.describe(), "-1->0->+1->+1->0->-1");
        assert_eq!(DynamicPreset::from_name("sweep"), Some(DynamicPreset::Sweep));
        assert_eq!(DynamicPreset::from_name("zigzag"), None);
    }

    #[test]
    fn twelve_iterations_use_each_slot_twice_in_order() {
        let cal = cal();
        let p = DynamicPattern::new(DynamicPreset::Original, &cal);
        let used: Vec<u64> = (0..12).map(|i| p.tick_at(i)).collect();
        let expected: Vec<u64> = p.ticks.iter().chain(p.ticks.iter()).copied().collect();
        assert_eq!(used, expected);
        assert_eq!(
            &used[..6],
            &[
                cal.tick_minus1,
                cal.tick_minus1,
                cal.tick_center,
                cal.tick_plus1,
                cal.tick_plus1,
                cal.tick_center
            ]
        );
    }

    #[test]
    fn static_entry_uses_one_tick() {
        let cal = cal();
        let e = ScanEntry::fixed(&cal, FftLoadLevel::Load85, TickVariant::Plus1);
        assert!((0..20).all(|i| e.tick_at(i) == cal.tick_plus1));
    }

    #[test]
    fn single_variants() {
        let cal = cal();
        let m = ScanMatrix::single_dynamic(&cal, DynamicPreset::Block, FftLoadLevel::Load90);
        assert_eq!(m.len(), 1);
        assert_eq!(m.cycled(5).display_name(), "Dynamic FFT90% Block");

        let s = ScanMatrix::single_static(&cal, TickVariant::Center, FftLoadLevel::Load80);
        assert_eq!(s.entries()[0].tick_at(3), cal.tick_center);
        assert!(!s.is_empty());
    }
}
