//! Piecewise-polynomial move shapes (`SPEC_FULL.md` §4.2, §4.7).
//!
//! A move's position-over-local-time curve is either an [`SCurve`] (the
//! jerk-limited, up-to-6th-order polynomial produced by the S-curve
//! planner) or a [`Quadratic`] (the constant-acceleration trapezoid
//! segment). Both are plain value types; the integrator in
//! [`crate::integrate`] is what gives them meaning.

use crate::util::{binomial, powi};

/// `s(τ) = c1·τ + c2·τ² + c3·τ³ + c4·τ⁴ + c5·τ⁵ + c6·τ⁶`.
///
/// By construction `s(0) == 0` — the curve always starts at zero local
/// progress, with any constant offset carried separately as a move's
/// `start_pos`. [`SCurve::offset`] is the only operation that can produce a
/// nonzero constant term, and it extracts that term rather than storing it,
/// preserving this invariant.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SCurve {
    /// `c[0]` is always `0.0`; `c[1..=6]` are the polynomial's `c1..c6`.
    c: [f64; 7],
}

impl SCurve {
    /// Builds a curve from its `c1..c6` coefficients.
    pub fn new(c1: f64, c2: f64, c3: f64, c4: f64, c5: f64, c6: f64) -> Self {
        Self {
            c: [0.0, c1, c2, c3, c4, c5, c6],
        }
    }

    /// The raw coefficient array, `c[0]` always zero.
    pub fn coeffs(&self) -> &[f64; 7] {
        &self.c
    }

    /// `s(τ)`.
    pub fn eval(&self, tau: f64) -> f64 {
        let mut acc = 0.0;
        for k in (1..=6).rev() {
            acc = acc * tau + self.c[k];
        }
        acc * tau
    }

    /// Antiderivative of `τⁿ · s(τ)`, evaluated at `tau` (no additive
    /// constant fixed — callers always difference two evaluations). Used
    /// directly by Expansion A (`SPEC_FULL.md` §4.3) to build
    /// `∫ τʲ s(τ) dτ` over an interval via `tn_antiderivative(j, end) -
    /// tn_antiderivative(j, start)`.
    pub fn tn_antiderivative(&self, n: u32, tau: f64) -> f64 {
        let mut acc = 0.0;
        for k in 1..=6u32 {
            let ck = self.c[k as usize];
            if ck == 0.0 {
                continue;
            }
            let power = n + k + 1;
            acc += ck * powi(tau, power as i32) / power as f64;
        }
        acc
    }

    /// `∫ s(τ) dτ` over `[a, b]`.
    pub fn integrate(&self, a: f64, b: f64) -> f64 {
        self.tn_antiderivative(0, b) - self.tn_antiderivative(0, a)
    }

    /// `∫ τ·s(τ) dτ` over `[a, b]`.
    pub fn integrate_t(&self, a: f64, b: f64) -> f64 {
        self.tn_antiderivative(1, b) - self.tn_antiderivative(1, a)
    }

    /// Returns the coefficients of `s(τ + delta)` re-expressed as a
    /// polynomial in `τ`, and the constant term that expansion acquires
    /// (`s(delta)`), which the caller folds into its own `p0` to preserve
    /// this type's "no constant term" invariant.
    ///
    /// `(τ+Δ)^k` expands via the binomial theorem into `Σⱼ C(k,j) τʲ
    /// Δ^(k-j)`; collecting by power of `τ` gives the shifted coefficients.
    pub fn offset(&self, delta: f64) -> (Self, f64) {
        let mut shifted = [0.0; 7];
        for k in 1..=6u32 {
            let ck = self.c[k as usize];
            if ck == 0.0 {
                continue;
            }
            for j in 0..=k {
                shifted[j as usize] += ck * binomial(k, j) * powi(delta, (k - j) as i32);
            }
        }
        let extracted = shifted[0];
        shifted[0] = 0.0;
        (Self { c: shifted }, extracted)
    }

    /// Returns a copy with every coefficient scaled by `r`.
    pub fn copy_scaled(&self, r: f64) -> Self {
        let mut c = self.c;
        for v in &mut c {
            *v *= r;
        }
        Self { c }
    }
}

/// `p(t) = p0 + v0·t + ½a·t²` — the trapezoid-segment move shape
/// (`SPEC_FULL.md` §4.7), used by [`crate::integrate::integrate_weighted`]
/// for kernels that don't need full S-curve fidelity.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Quadratic {
    pub p0: f64,
    pub v0: f64,
    pub half_a: f64,
}

impl Quadratic {
    pub fn new(p0: f64, v0: f64, half_a: f64) -> Self {
        Self { p0, v0, half_a }
    }

    pub fn eval(&self, t: f64) -> f64 {
        self.p0 + t * (self.v0 + t * self.half_a)
    }

    /// Re-expresses `p(t)` as a polynomial in `u = t + delta`, i.e. returns
    /// `q` such that `q(t + delta) == p(t)`.
    pub fn offset(&self, delta: f64) -> Self {
        Self {
            p0: self.p0 - self.v0 * delta + self.half_a * delta * delta,
            v0: self.v0 - 2.0 * self.half_a * delta,
            half_a: self.half_a,
        }
    }
}
