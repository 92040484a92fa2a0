//! One baseline-versus-loaded timing measurement.
//!
//! Each call to [`Sampler::measure`] runs four back-to-back busy-wait windows of
//! `tick_threshold` counter ticks:
//!
//! 1. **baseline count**: spin, counting iterations
//! 2. **baseline idle**: spin, discard the count
//! 3. **loaded count**: start the window, run the load to completion, then
//!    keep spinning and counting until the window closes
//! 4. **loaded idle**: spin, discard the count
//!
//! The result is `baseline_ops - loaded_ops`. A large positive differential
//! means the load ate most of the window.

use std::fmt;

use crate::clock::CycleClock;
use crate::error::{Error, Result};
use crate::load::{FftLoadLevel, Workload};

/// Stage of a measurement, reported when a spin loop stalls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    BaselineCount,
    BaselineIdle,
    LoadedCount,
    LoadedIdle,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::BaselineCount => "baseline-count",
            Self::BaselineIdle => "baseline-idle",
            Self::LoadedCount => "loaded-count",
            Self::LoadedIdle => "loaded-idle",
        })
    }
}

/// Couples a cycle clock with a workload.
pub struct Sampler<C: CycleClock, W: Workload> {
    clock: C,
    load: W,
    spin_limit: Option<u64>,
}

impl<C: CycleClock, W: Workload> Sampler<C, W> {
    /// Sampler with unbounded spin loops.
    pub fn new(clock: C, load: W) -> Self {
        Self {
            clock,
            load,
            spin_limit: None,
        }
    }

    /// Abort any spin loop that runs more than `limit` iterations.
    pub fn with_spin_limit(mut self, limit: u64) -> Self {
        self.spin_limit = Some(limit);
        self
    }

    pub fn spin_limit(&self) -> Option<u64> {
        self.spin_limit
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn load(&self) -> &W {
        &self.load
    }

    /// Take one sample. See the module docs for the phase layout.
    pub fn measure(&mut self, tick_threshold: u64, level: FftLoadLevel) -> Result<i32> {
        let start = self.clock.now();
        let base_ops = self.spin(Phase::BaselineCount, start, tick_threshold)?;

        let start = self.clock.now();
        self.spin(Phase::BaselineIdle, start, tick_threshold)?;

        // The load runs inside the window it is being measured against.
        let start = self.clock.now();
        self.load.apply_load(level);
        let load_ops = self.spin(Phase::LoadedCount, start, tick_threshold)?;

        let start = self.clock.now();
        self.spin(Phase::LoadedIdle, start, tick_threshold)?;

        Ok(saturating_differential(base_ops, load_ops))
    }

    /// Spin until `tick_threshold` ticks have passed since `start`, returning
    /// the number of iterations.
    fn spin(&self, phase: Phase, start: u64, tick_threshold: u64) -> Result<u64> {
        let mut ops: u64 = 0;
        while self.clock.elapsed_since(start) < tick_threshold {
            if self.spin_limit.is_some_and(|limit| ops >= limit) {
                return Err(Error::ClockStalled {
                    phase,
                    iterations: ops,
                });
            }
            self.clock.no_op();
            ops += 1;
        }
        Ok(ops)
    }
}

/// `base - loaded`, clamped into `i32`.
pub fn saturating_differential(base_ops: u64, load_ops: u64) -> i32 {
    let diff = base_ops as i128 - load_ops as i128;
    diff.clamp(i32::MIN as i128, i32::MAX as i128) as i32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::testing::StepClock;

    /// Workload that advances a shared scripted clock by reading it.
    struct ClockBurner<'a> {
        clock: &'a StepClock,
        reads: u64,
        calls: Vec<FftLoadLevel>,
    }

    impl<'a> ClockBurner<'a> {
        fn new(clock: &'a StepClock, reads: u64) -> Self {
            Self {
                clock,
                reads,
                calls: Vec::new(),
            }
        }
    }

    impl Workload for ClockBurner<'_> {
        fn apply_load(&mut self, level: FftLoadLevel) {
            for _ in 0..self.reads {
                self.clock.now();
            }
            self.calls.push(level);
        }
    }

    // -----------------------------------------------------------------------
    // Differential
    // -----------------------------------------------------------------------

    #[test]
    fn idle_load_gives_zero_differential() {
        let clock = StepClock::new(0, 1);
        let mut sampler = Sampler::new(&clock, ClockBurner::new(&clock, 0));
        assert_eq!(sampler.measure(10, FftLoadLevel::Load75).unwrap(), 0);
    }

    #[test]
    fn load_inside_window_reduces_loaded_count() {
        let clock = StepClock::new(0, 1);
        let mut sampler = Sampler::new(&clock, ClockBurner::new(&clock, 4));
        // baseline: 9 iterations; loaded: 4 ticks eaten, 5 iterations left
        assert_eq!(sampler.measure(10, FftLoadLevel::Load85).unwrap(), 4);
        assert_eq!(sampler.load().calls, vec![FftLoadLevel::Load85]);
    }

    #[test]
    fn load_overrunning_window_counts_zero() {
        let clock = StepClock::new(0, 1);
        let mut sampler = Sampler::new(&clock, ClockBurner::new(&clock, 50));
        assert_eq!(sampler.measure(10, FftLoadLevel::Load90).unwrap(), 9);
    }

    #[test]
    fn measure_survives_counter_wraparound() {
        let clock = StepClock::new(u64::MAX - 15, 1);
        let mut sampler = Sampler::new(&clock, ClockBurner::new(&clock, 2));
        assert_eq!(sampler.measure(10, FftLoadLevel::Load80).unwrap(), 2);
    }

    #[test]
    fn differential_saturates() {
        assert_eq!(saturating_differential(5, 3), 2);
        assert_eq!(saturating_differential(3, 5), -2);
        assert_eq!(saturating_differential(u64::MAX, 0), i32::MAX);
        assert_eq!(saturating_differential(0, u64::MAX), i32::MIN);
    }

    // -----------------------------------------------------------------------
    // Spin limit
    // -----------------------------------------------------------------------

    #[test]
    fn stalled_clock_is_reported() {
        let clock = StepClock::new(42, 0);
        let mut sampler =
            Sampler::new(&clock, ClockBurner::new(&clock, 0)).with_spin_limit(100);
        match sampler.measure(10, FftLoadLevel::Load75) {
            Err(Error::ClockStalled { phase, iterations }) => {
                assert_eq!(phase, Phase::BaselineCount);
                assert_eq!(iterations, 100);
            }
            other => panic!("expected ClockStalled, got {other:?}"),
        }
    }

    #[test]
    fn limit_large_enough_does_not_trip() {
        let clock = StepClock::new(0, 1);
        let mut sampler =
            Sampler::new(&clock, ClockBurner::new(&clock, 0)).with_spin_limit(9);
        assert_eq!(sampler.spin_limit(), Some(9));
        assert_eq!(sampler.measure(10, FftLoadLevel::Load75).unwrap(), 0);
    }

    #[test]
    fn phase_names() {
        assert_eq!(Phase::LoadedCount.to_string(), "loaded-count");
        let err = Error::ClockStalled {
            phase: Phase::BaselineIdle,
            iterations: 7,
        };
        assert!(err.to_string().contains("baseline-idle"));
    }
}
