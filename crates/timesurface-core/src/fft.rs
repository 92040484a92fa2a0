//! In-place radix-2 Cooley-Tukey transform.
//!
//! Used only as a reproducible CPU workload: the numerical output is thrown
//! away, but forward followed by inverse must reproduce the input so the
//! work stays well-defined for every load level.

use std::f64::consts::PI;
use std::ops::{Add, Mul, Sub};

/// Largest transform the load generator may request.
pub const MAX_TRANSFORM_SIZE: usize = 256;

/// Complex sample for the transform workload.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Complex {
    pub re: f64,
    pub im: f64,
}

impl Complex {
    pub const ZERO: Complex = Complex { re: 0.0, im: 0.0 };
    pub const ONE: Complex = Complex { re: 1.0, im: 0.0 };

    #[inline]
    pub const fn new(re: f64, im: f64) -> Self {
        Self { re, im }
    }

    #[inline]
    pub fn norm_sqr(self) -> f64 {
        self.re * self.re + self.im * self.im
    }

    /// `e^{i·angle}`.
    #[inline]
    pub fn from_angle(angle: f64) -> Self {
        Self::new(angle.cos(), angle.sin())
    }
}

impl Add for Complex {
    type Output = Complex;
    #[inline]
    fn add(self, o: Complex) -> Complex {
        Complex::new(self.re + o.re, self.im + o.im)
    }
}

impl Sub for Complex {
    type Output = Complex;
    #[inline]
    fn sub(self, o: Complex) -> Complex {
        Complex::new(self.re - o.re, self.im - o.im)
    }
}

impl Mul for Complex {
    type Output = Complex;
    #[inline]
    fn mul(self, o: Complex) -> Complex {
        Complex::new(
            self.re * o.re - self.im * o.im,
            self.re * o.im + self.im * o.re,
        )
    }
}

/// Transform `data` in place.
///
/// The forward direction uses twiddles `e^{+2πi/len}`; the inverse negates
/// the angle and divides every output by `n`.
///
/// # Panics
///
/// If `data.len()` is not a power of two or exceeds [`MAX_TRANSFORM_SIZE`].
pub fn transform(data: &mut [Complex], inverse: bool) {
    let n = data.len();
    assert!(
        n.is_power_of_two() && n <= MAX_TRANSFORM_SIZE,
        "transform length {n} must be a power of two <= {MAX_TRANSFORM_SIZE}"
    );

    bit_reverse_permute(data);

    let sign = if inverse { -1.0 } else { 1.0 };
    let mut len = 2;
    while len <= n {
        let wlen = Complex::from_angle(sign * 2.0 * PI / len as f64);
        let half = len / 2;
        for block in data.chunks_exact_mut(len) {
            let (lo, hi) = block.split_at_mut(half);
            let mut w = Complex::ONE;
            for (a, b) in lo.iter_mut().zip(hi.iter_mut()) {
                let u = *a;
                let v = *b * w;
                *a = u + v;
                *b = u - v;
                w = w * wlen;
            }
        }
        len <<= 1;
    }

    if inverse {
        let scale = n as f64;
        for x in data.iter_mut() {
            x.re /= scale;
            x.im /= scale;
        }
    }
}

/// Swap every `data[i]` with `data[j]`, `j` the bit reversal of `i`.
fn bit_reverse_permute(data: &mut [Complex]) {
    let n = data.len();
    let mut j = 0usize;
    for i in 1..n {
        let mut bit = n >> 1;
        while j & bit != 0 {
            j ^= bit;
            bit >>= 1;
        }
        j ^= bit;
        if i < j {
            data.swap(i, j);
        }
    }
}

/// Fill `data` with one period of a sine wave on the real axis.
pub fn fill_sine(data: &mut [Complex]) {
    let n = data.len() as f64;
    for (i, x) in data.iter_mut().enumerate() {
        *x = Complex::new((2.0 * PI * i as f64 / n).sin(), 0.0);
    }
}
