//! Axis smoothing wrapper (`SPEC_FULL.md` §4.5).
//!
//! Adapts the windowed convolver into a stepper forward-position query.
//! Maintains independent X and Y kernels and picks, once per
//! [`AxisSmoother::set_sk`] call, which axes the inner kinematics actually
//! needs — so `calc_position` never does convolution work the inner
//! callback would ignore.

use crate::convolve::{range_integrate, Axis};
use crate::error::SmoothingError;
use crate::kernel::{Kernel, KernelFamily};
use crate::kinematics::InnerKinematics;
use crate::queue::{Move, MoveHandle, MoveQueue};
use crate::util::fmax;

/// Typed argument bundle for [`AxisSmoother::set_params`] (`SPEC_FULL.md`
/// §7.2). `family_x`/`family_y` are `None` to leave that axis unsmoothed
/// regardless of `freq`; a `Some` family with `freq <= 0.0` also disables
/// that axis, matching the distilled spec's "f=0 disables that axis" rule.
#[derive(Debug, Clone, Copy, Default)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub struct AxisSmootherParams {
    pub family_x: Option<KernelFamily>,
    pub freq_x: f64,
    pub zeta_x: f64,
    pub family_y: Option<KernelFamily>,
    pub freq_y: f64,
    pub zeta_y: f64,
}

/// `get_axis_half_smooth_time(family, f, ζ) → h` (`SPEC_FULL.md` §6):
/// exposes a kernel's half-smooth-time so the planner can size its
/// look-ahead/look-behind margins without building a full `AxisSmoother`.
pub fn get_axis_half_smooth_time(family: KernelFamily, freq: f64, zeta: f64) -> f64 {
    Kernel::new(family, freq, zeta).h()
}

/// Per-kinematics-instance X/Y smoother state (`SPEC_FULL.md` §3, §4.5).
pub struct AxisSmoother<K> {
    kernel_x: Option<Kernel>,
    kernel_y: Option<Kernel>,
    pre_active: f64,
    post_active: f64,
    inner: Option<K>,
}

impl<K: InnerKinematics> Default for AxisSmoother<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: InnerKinematics> AxisSmoother<K> {
    /// `allocate_axis_smoother() → handle`: both axes un-smoothed, no inner
    /// kinematics bound yet.
    pub fn new() -> Self {
        Self {
            kernel_x: None,
            kernel_y: None,
            pre_active: 0.0,
            post_active: 0.0,
            inner: None,
        }
    }

    /// `gen_steps_pre_active` / `gen_steps_post_active`: the largest active
    /// axis kernel's `h`, or `0.0` if nothing is smoothed.
    pub fn pre_active_margin(&self) -> f64 {
        self.pre_active
    }

    pub fn post_active_margin(&self) -> f64 {
        self.post_active
    }

    /// `set_axis_smoother_params`: replaces each axis kernel (or clears it
    /// when its family is `None` or its frequency is non-positive).
    /// Infallible for valid (non-negative) inputs.
    pub fn set_params(&mut self, params: AxisSmootherParams) {
        trace_params_reconfigured(
            self.kernel_x.as_ref().map(Kernel::h),
            self.kernel_y.as_ref().map(Kernel::h),
            params.freq_x,
            params.freq_y,
        );
        self.kernel_x = build_kernel(params.family_x, params.freq_x, params.zeta_x);
        self.kernel_y = build_kernel(params.family_y, params.freq_y, params.zeta_y);
        self.recompute_margins();
    }

    /// `set_axis_inner_kinematics`: binds the forward-kinematics callback
    /// and picks its axis usage. Errors if `inner` uses neither X nor Y.
    pub fn set_sk(&mut self, inner: K) -> Result<(), SmoothingError> {
        if !inner.uses_x() && !inner.uses_y() {
            return Err(SmoothingError::UnsupportedAxes);
        }
        trace_sk_bound(inner.uses_x(), inner.uses_y());
        self.inner = Some(inner);
        self.recompute_margins();
        Ok(())
    }

    fn recompute_margins(&mut self) {
        let Some(inner) = self.inner.as_ref() else {
            self.pre_active = 0.0;
            self.post_active = 0.0;
            return;
        };
        let mut h = 0.0f64;
        if inner.uses_x() {
            if let Some(k) = &self.kernel_x {
                h = fmax(h, k.h());
            }
        }
        if inner.uses_y() {
            if let Some(k) = &self.kernel_y {
                h = fmax(h, k.h());
            }
        }
        self.pre_active = h;
        self.post_active = h;
    }

    /// `calc_position(sk, m, t)`: the hot path.
    pub fn calc_position<Q: MoveQueue>(&self, q: &Q, m: MoveHandle, t: f64) -> f64 {
        let inner = self
            .inner
            .as_ref()
            .expect("calc_position called before set_sk bound an inner kinematics");
        let active_x = inner.uses_x() && self.kernel_x.is_some();
        let active_y = inner.uses_y() && self.kernel_y.is_some();

        if !active_x && !active_y {
            return inner.calc_at(q.get(m), t);
        }

        let mut scratch = *q.get(m);
        if inner.uses_x() {
            scratch.start_pos.x = match &self.kernel_x {
                Some(k) => range_integrate(q, m, Axis::X, t, k),
                None => raw_axis_value(q.get(m), Axis::X, t),
            };
        }
        if inner.uses_y() {
            scratch.start_pos.y = match &self.kernel_y {
                Some(k) => range_integrate(q, m, Axis::Y, t, k),
                None => raw_axis_value(q.get(m), Axis::Y, t),
            };
        }
        inner.calc_from_start_pos(&scratch)
    }
}

#[cfg(feature = "std")]
fn trace_params_reconfigured(old_h_x: Option<f64>, old_h_y: Option<f64>, freq_x: f64, freq_y: f64) {
    tracing::debug!(?old_h_x, ?old_h_y, freq_x, freq_y, "axis smoother reconfigured");
}

#[cfg(not(feature = "std"))]
fn trace_params_reconfigured(_old_h_x: Option<f64>, _old_h_y: Option<f64>, _freq_x: f64, _freq_y: f64) {}

#[cfg(feature = "std")]
fn trace_sk_bound(uses_x: bool, uses_y: bool) {
    tracing::debug!(uses_x, uses_y, "axis inner kinematics bound");
}

#[cfg(not(feature = "std"))]
fn trace_sk_bound(_uses_x: bool, _uses_y: bool) {}

fn build_kernel(family: Option<KernelFamily>, freq: f64, zeta: f64) -> Option<Kernel> {
    let family = family?;
    if freq <= 0.0 {
        return None;
    }
    Some(Kernel::new(family, freq, zeta))
}

fn raw_axis_value(mv: &Move, axis: Axis, t: f64) -> f64 {
    match axis {
        Axis::X => mv.start_pos.x + mv.axes_r.x * mv.scurve.eval(t),
        Axis::Y => mv.start_pos.y + mv.axes_r.y * mv.scurve.eval(t),
    }
}
