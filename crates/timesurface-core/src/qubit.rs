//! Single-qubit state evolution used as a second CPU workload.
//!
//! Structurally different from the transform load: short dependency chains of
//! scalar multiply-adds with a `nop` between gate blocks instead of a strided
//! butterfly over a buffer. Only the cycles matter downstream; the final
//! measurement exists so the workload has the same shape as a real circuit.

use std::f64::consts::{FRAC_1_SQRT_2, PI};
use std::ops::{Add, Mul, Sub};

use rand::Rng;

use crate::clock::no_op;

/// Iterations of (X, H) after the initial Hadamard.
pub const HADAMARD_WALK_STEPS: usize = 150;
/// Iterations of the six-gate (Z, H, X, Z, X, H) block.
pub const REFLECTION_STEPS: usize = 75;
/// Iterations of (RY, S, T) with a halving rotation angle.
pub const ROTATION_STEPS: usize = 150;

/// Complex amplitude of a basis state.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Amplitude {
    pub real: f64,
    pub imag: f64,
}

impl Amplitude {
    #[inline]
    pub const fn new(real: f64, imag: f64) -> Self {
        Self { real, imag }
    }

    #[inline]
    pub fn squared_modulus(self) -> f64 {
        self.real * self.real + self.imag * self.imag
    }

    #[inline]
    fn scale(self, k: f64) -> Self {
        Self::new(self.real * k, self.imag * k)
    }
}

impl Add for Amplitude {
    type Output = Amplitude;
    #[inline]
    fn add(self, o: Amplitude) -> Amplitude {
        Amplitude::new(self.real + o.real, self.imag + o.imag)
    }
}

impl Sub for Amplitude {
    type Output = Amplitude;
    #[inline]
    fn sub(self, o: Amplitude) -> Amplitude {
        Amplitude::new(self.real - o.real, self.imag - o.imag)
    }
}

impl Mul for Amplitude {
    type Output = Amplitude;
    #[inline]
    fn mul(self, o: Amplitude) -> Amplitude {
        Amplitude::new(
            self.real * o.real - self.imag * o.imag,
            self.real * o.imag + self.imag * o.real,
        )
    }
}

/// Amplitudes of |0⟩ and |1⟩.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QubitState {
    pub alpha: Amplitude,
    pub beta: Amplitude,
}

impl Default for QubitState {
    fn default() -> Self {
        Self::zero()
    }
}

impl QubitState {
    /// The |0⟩ state.
    pub const fn zero() -> Self {
        Self {
            alpha: Amplitude::new(1.0, 0.0),
            beta: Amplitude::new(0.0, 0.0),
        }
    }

    /// `|alpha|² + |beta|²`; 1 for any state reached through the gates below.
    pub fn norm(&self) -> f64 {
        self.alpha.squared_modulus() + self.beta.squared_modulus()
    }

    /// Probability of measuring 0.
    pub fn p0(&self) -> f64 {
        self.alpha.squared_modulus()
    }

    pub fn hadamard(&mut self) {
        let a = self.alpha;
        let b = self.beta;
        self.alpha = (a + b).scale(FRAC_1_SQRT_2);
        self.beta = (a - b).scale(FRAC_1_SQRT_2);
    }

    pub fn pauli_x(&mut self) {
        std::mem::swap(&mut self.alpha, &mut self.beta);
    }

    pub fn pauli_z(&mut self) {
        self.beta = self.beta.scale(-1.0);
    }

    pub fn phase_s(&mut self) {
        self.beta = Amplitude::new(-self.beta.imag, self.beta.real);
    }

    pub fn phase_t(&mut self) {
        self.beta = self.beta * Amplitude::new(FRAC_1_SQRT_2, FRAC_1_SQRT_2);
    }

    pub fn ry(&mut self, theta: f64) {
        let (sin_half, cos_half) = (theta / 2.0).sin_cos();
        let a = self.alpha;
        let b = self.beta;
        self.alpha = a.scale(cos_half) - b.scale(sin_half);
        self.beta = a.scale(sin_half) + b.scale(cos_half);
    }

    /// Collapse to a classical bit: 0 with probability `|alpha|²`.
    pub fn measure<R: Rng + ?Sized>(self, rng: &mut R) -> u8 {
        let draw: f64 = rng.random();
        if draw < self.p0() { 0 } else { 1 }
    }
}

/// Rotation angle for step `i` of the RY block: `π / 2^(1 + i mod 8)`.
#[inline]
pub fn rotation_angle(i: usize) -> f64 {
    PI / (1u32 << (i % 8 + 1)) as f64
}

/// Apply the fixed gate schedule to a fresh |0⟩ state.
pub fn evolve() -> QubitState {
    let mut q = QubitState::zero();

    q.hadamard();
    for _ in 0..HADAMARD_WALK_STEPS {
        q.pauli_x();
        q.hadamard();
        no_op();
    }

    for _ in 0..REFLECTION_STEPS {
        q.pauli_z();
        q.hadamard();
        q.pauli_x();
        q.pauli_z();
        q.pauli_x();
        q.hadamard();
        no_op();
    }

    for i in 0..ROTATION_STEPS {
        q.ry(rotation_angle(i));
        q.phase_s();
        q.phase_t();
        no_op();
    }

    q
}

/// Run the full schedule and measure. The caller normally discards the bit.
pub fn run_quantum_load<R: Rng + ?Sized>(rng: &mut R) -> u8 {
    let q = std::hint::black_box(evolve());
    q.measure(rng)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    const TOL: f64 = 1e-9;

    fn assert_unit(q: &QubitState) {
        assert!((q.norm() - 1.0).abs() < TOL, "norm drifted: {}", q.norm());
    }

    // -----------------------------------------------------------------------
    // Gate tests
    // -----------------------------------------------------------------------

    #[test]
    fn starts_in_zero_state() {
        let q = QubitState::zero();
        assert_eq!(q.alpha, Amplitude::new(1.0, 0.0));
        assert_eq!(q.beta, Amplitude::new(0.0, 0.0));
        assert_eq!(q.p0(), 1.0);
    }

    #[test]
    fn hadamard_makes_equal_superposition() {
        let mut q = QubitState::zero();
        q.hadamard();
        assert!((q.p0() - 0.5).abs() < TOL);
        q.hadamard();
        assert!((q.p0() - 1.0).abs() < TOL);
    }

    #[test]
    fn pauli_x_swaps() {
        let mut q = QubitState::zero();
        q.pauli_x();
        assert_eq!(q.alpha, Amplitude::new(0.0, 0.0));
        assert_eq!(q.beta, Amplitude::new(1.0, 0.0));
    }

    #[test]
    fn phase_gates_rotate_beta() {
        let mut q = QubitState {
            alpha: Amplitude::new(0.0, 0.0),
            beta: Amplitude::new(1.0, 0.0),
        };
        q.phase_s();
        assert_eq!(q.beta, Amplitude::new(-0.0, 1.0));
        q.pauli_z();
        assert_eq!(q.beta, Amplitude::new(0.0, -1.0));

        // T twice equals S.
        let mut t = QubitState {
            alpha: Amplitude::new(0.0, 0.0),
            beta: Amplitude::new(1.0, 0.0),
        };
        t.phase_t();
        t.phase_t();
        assert!((t.beta.real).abs() < TOL);
        assert!((t.beta.imag - 1.0).abs() < TOL);
    }

    #[test]
    fn ry_pi_flips_zero_to_one() {
        let mut q = QubitState::zero();
        q.ry(PI);
        assert!(q.p0() < TOL);
        assert!((q.beta.real - 1.0).abs() < TOL);
    }

    #[test]
    fn rotation_angles_cycle_every_eight_steps() {
        assert_eq!(rotation_angle(0), PI / 2.0);
        assert_eq!(rotation_angle(7), PI / 256.0);
        assert_eq!(rotation_angle(8), rotation_angle(0));
    }

    // -----------------------------------------------------------------------
    // Unitarity
    // -----------------------------------------------------------------------

    #[test]
    fn random_gate_sequences_preserve_norm() {
        let mut rng = StdRng::seed_from_u64(0x5eed);
        for _ in 0..50 {
            let mut q = QubitState::zero();
            for _ in 0..500 {
                match rng.random_range(0..6) {
                    0 => q.hadamard(),
                    1 => q.pauli_x(),
                    2 => q.pauli_z(),
                    3 => q.phase_s(),
                    4 => q.phase_t(),
                    _ => q.ry(rng.random_range(-10.0..10.0)),
                }
                assert_unit(&q);
            }
        }
    }

    #[test]
    fn full_schedule_preserves_norm() {
        assert_unit(&evolve());
    }

    #[test]
    fn schedule_is_deterministic() {
        assert_eq!(evolve(), evolve());
    }

    // -----------------------------------------------------------------------
    // Measurement
    // -----------------------------------------------------------------------

    #[test]
    fn basis_states_measure_deterministically() {
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..100 {
            assert_eq!(QubitState::zero().measure(&mut rng), 0);
            let mut one = QubitState::zero();
            one.pauli_x();
            assert_eq!(one.measure(&mut rng), 1);
        }
    }

    #[test]
    fn superposition_measures_both_outcomes() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut q = QubitState::zero();
        q.hadamard();
        let ones: usize = (0..10_000).map(|_| q.measure(&mut rng) as usize).sum();
        assert!((4_500..=5_500).contains(&ones), "ones = {ones}");
    }

    #[test]
    fn quantum_load_returns_a_bit() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..10 {
            assert!(run_quantum_load(&mut rng) <= 1);
        }
    }

    #[test]
    fn seeded_quantum_load_is_reproducible() {
        let a: Vec<u8> = {
            let mut rng = StdRng::seed_from_u64(99);
            (0..32).map(|_| run_quantum_load(&mut rng)).collect()
        };
        let b: Vec<u8> = {
            let mut rng = StdRng::seed_from_u64(99);
            (0..32).map(|_| run_quantum_load(&mut rng)).collect()
        };
        assert_eq!(a, b);
    }
}
