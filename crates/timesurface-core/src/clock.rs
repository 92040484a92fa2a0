//! Cycle counter and no-op primitives.
//!
//! Everything in the measurement pipeline is bounded by raw counter ticks
//! rather than OS time, so the counter read and the single-cycle no-op are
//! the only platform primitives the core needs. They sit behind the
//! [`CycleClock`] trait so tests can drive the sampler with a scripted clock.

// ---------------------------------------------------------------------------
// Raw counter reads
// ---------------------------------------------------------------------------

/// Read the x86-64 time-stamp counter.
#[cfg(target_arch = "x86_64")]
#[inline(always)]
pub fn read_cycle_counter() -> u64 {
    // SAFETY: RDTSC is available on every x86-64 CPU and has no side effects
    // beyond reading the counter.
    unsafe { core::arch::x86_64::_rdtsc() }
}

/// Read the ARM generic timer counter (CNTVCT_EL0).
///
/// On Apple Silicon this ticks at 24 MHz, far below the core clock, so the
/// calibrator usually lands on its fallback frequency there.
#[cfg(target_arch = "aarch64")]
#[inline(always)]
pub fn read_cycle_counter() -> u64 {
    let val: u64;
    // SAFETY: CNTVCT_EL0 is readable from EL0 on Linux and macOS.
    // Read-only system register, no side effects.
    unsafe {
        std::arch::asm!("mrs {}, cntvct_el0", out(reg) val, options(nostack, nomem));
    }
    val
}

/// Nanoseconds since a process-local epoch, for targets without a readable
/// cycle counter.
#[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
pub fn read_cycle_counter() -> u64 {
    use std::sync::OnceLock;
    use std::time::Instant;
    static EPOCH: OnceLock<Instant> = OnceLock::new();
    let epoch = EPOCH.get_or_init(Instant::now);
    epoch.elapsed().as_nanos() as u64
}

// ---------------------------------------------------------------------------
// No-op
// ---------------------------------------------------------------------------

/// Execute a single `nop` instruction.
#[cfg(any(target_arch = "x86_64", target_arch = "aarch64"))]
#[inline(always)]
pub fn no_op() {
    // SAFETY: `nop` touches no memory, registers, or flags.
    unsafe {
        std::arch::asm!("nop", options(nomem, nostack, preserves_flags));
    }
}

#[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
#[inline(always)]
pub fn no_op() {
    std::hint::black_box(());
}

// ---------------------------------------------------------------------------
// Clock trait
// ---------------------------------------------------------------------------

/// Source of monotonic ticks used to bound busy-wait windows.
pub trait CycleClock {
    /// Current counter value. Wraps only on overflow of the native width.
    fn now(&self) -> u64;

    /// Burn roughly one cycle without observable side effects.
    #[inline(always)]
    fn no_op(&self) {
        no_op();
    }

    /// Ticks elapsed since `start`, tolerant of counter wraparound.
    #[inline(always)]
    fn elapsed_since(&self, start: u64) -> u64 {
        self.now().wrapping_sub(start)
    }
}

/// The hardware cycle counter of the current CPU.
#[derive(Debug, Clone, Copy, Default)]
pub struct HardwareClock;

impl CycleClock for HardwareClock {
    #[inline(always)]
    fn now(&self) -> u64 {
        read_cycle_counter()
    }
}

impl<C: CycleClock + ?Sized> CycleClock for &C {
    #[inline(always)]
    fn now(&self) -> u64 {
        (**self).now()
    }

    #[inline(always)]
    fn no_op(&self) {
        (**self).no_op();
    }
}

/// Spin for `cycles` ticks executing no-ops. Used to warm the core up to
/// its boost frequency before a long measurement batch.
pub fn warm_up<C: CycleClock>(clock: &C, cycles: u64) {
    let start = clock.now();
    while clock.elapsed_since(start) < cycles {
        clock.no_op();
    }
}

/// Default warm-up length before a batch benchmark.
pub const WARMUP_CYCLES: u64 = 72_000_000;
