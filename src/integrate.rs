//! Weighted integrator (`SPEC_FULL.md` §4.3).
//!
//! Computes `I = ∫ (p0 + s(τ)) · w(τ + toff) dτ` over `[start, end]` for a
//! single move, given a smoother kernel `sm` and a time offset `toff` such
//! that global time = move-local time − toff.
//!
//! Two algebraically-equivalent expansions exist and the choice between
//! them is load-bearing: each is numerically unstable on the other's side
//! of `toff² = h²`. [`integrate_scurve`] performs that branch; callers
//! should not call [`expansion_a`] / [`expansion_b`] directly outside of
//! tests that specifically check branch agreement (testable property 4).

use crate::kernel::Kernel;
use crate::poly::{Quadratic, SCurve};
use crate::util::{binomial, powi};

/// Expansion A: expand `w` around the move. Stable when `toff² ≤ h²`.
///
/// `w(τ + toff)` is re-expressed as a polynomial in `τ` via the binomial
/// theorem, then integrated termwise against `s` using
/// [`SCurve::tn_antiderivative`]. For the compact kernel (`c0 = c4 = c6 =
/// 0`) this collapses to the three-term form given directly in the spec;
/// the loop below is the general form that also covers higher-order
/// kernels convolved against an S-curve move.
pub fn expansion_a(sm: &Kernel, p0: f64, s: &SCurve, start: f64, end: f64, toff: f64) -> f64 {
    let (c0, c1, c2) = sm.compact_coeffs();
    let [_, _, c4, c6] = sm.even_coeffs();
    // w(u) = Σ_m c_m u^m for m in {0, 1, 2, 4, 6}; u = τ + toff.
    let active: [(u32, f64); 5] = [(0, c0), (1, c1), (2, c2), (4, c4), (6, c6)];

    let mut total = p0 * sm.integrate(start + toff, end + toff);
    for j in 0..=6u32 {
        let mut a_j = 0.0;
        for &(m, c_m) in &active {
            if m < j || c_m == 0.0 {
                continue;
            }
            a_j += c_m * binomial(m, j) * powi(toff, (m - j) as i32);
        }
        if a_j == 0.0 {
            continue;
        }
        total += a_j * (s.tn_antiderivative(j, end) - s.tn_antiderivative(j, start));
    }
    total
}

/// Expansion B: expand `s` around the window. Stable when `toff² > h²`.
pub fn expansion_b(sm: &Kernel, p0: f64, s: &SCurve, start: f64, end: f64, toff: f64) -> f64 {
    let (shifted, extracted) = s.offset(-toff);
    let p0_prime = p0 + extracted;
    let a = start + toff;
    let b = end + toff;

    let mut total = p0_prime * sm.integrate(a, b);
    for (k, &ck) in shifted.coeffs().iter().enumerate() {
        if ck == 0.0 {
            continue;
        }
        total += ck * (sm.iwtn(k as u32, b) - sm.iwtn(k as u32, a));
    }
    total
}

/// `I = ∫ (p0 + s(τ)) · w(τ + toff) dτ` over `[start, end]`, dispatching
/// between Expansion A and Expansion B at the load-bearing `toff² = h²`
/// boundary (`SPEC_FULL.md` §4.3).
pub fn integrate_scurve(sm: &Kernel, p0: f64, s: &SCurve, start: f64, end: f64, toff: f64) -> f64 {
    if toff * toff <= sm.h2() {
        expansion_a(sm, p0, s, start, end, toff)
    } else {
        expansion_b(sm, p0, s, start, end, toff)
    }
}

/// `I = ∫ p(t) · w(t + toff) dt` over `[start, end]` for a plain quadratic
/// `p(t) = p0 + v0·t + ½a·t²` (the trapezoid-segment case, no S-curve
/// involved). `toff` is folded directly into `p` before the family-tagged
/// dispatch so the callback only ever deals with `w(u)` over the shifted
/// interval (`SPEC_FULL.md` §4.3).
pub fn integrate_weighted(
    sm: &Kernel,
    p0: f64,
    v0: f64,
    half_a: f64,
    start: f64,
    end: f64,
    toff: f64,
) -> f64 {
    let q = Quadratic::new(p0, v0, half_a).offset(-toff);
    let a = start + toff;
    let b = end + toff;
    match sm.family().power_order() {
        0 | 1 => integrate_2nd_order(sm, &q, a, b),
        2 => integrate_4th_order(sm, &q, a, b),
        _ => integrate_6th_order(sm, &q, a, b),
    }
}

/// Folds `q`'s degree-2 contribution against `w` using only the
/// antiderivatives the 2nd-order power-window family actually needs
/// (`c0`, `c2`).
fn integrate_2nd_order(sm: &Kernel, q: &Quadratic, a: f64, b: f64) -> f64 {
    horner_fold(sm, q, a, b)
}

fn integrate_4th_order(sm: &Kernel, q: &Quadratic, a: f64, b: f64) -> f64 {
    horner_fold(sm, q, a, b)
}

fn integrate_6th_order(sm: &Kernel, q: &Quadratic, a: f64, b: f64) -> f64 {
    horner_fold(sm, q, a, b)
}

/// Shared implementation behind the three family-tagged callbacks above:
/// `Σₖ aₖ · (iₖ(end) − iₖ(start))`, `aₖ` the quadratic's own coefficients
/// and `iₖ` the kernel's precomputed `τᵏ · w(τ)` antiderivative
/// ([`Kernel::iwtn`]). The three wrappers exist because the spec names
/// them as distinct dispatch targets per family order; the fold itself
/// does not vary with order since `iwtn` already generalizes over it.
fn horner_fold(sm: &Kernel, q: &Quadratic, a: f64, b: f64) -> f64 {
    q.p0 * (sm.iwtn(0, b) - sm.iwtn(0, a))
        + q.v0 * (sm.iwtn(1, b) - sm.iwtn(1, a))
        + q.half_a * (sm.iwtn(2, b) - sm.iwtn(2, a))
}
