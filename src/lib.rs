//! # Motion-smoothing core
//!
//! The motion-smoothing subsystem of a 3D-printer motion planner: given a
//! queue of scheduled acceleration/deceleration move segments, computes the
//! smoothed Cartesian (and extruder) position of a stepper at an arbitrary
//! point in time, for driving a step-pulse solver. Smoothing suppresses
//! mechanical resonance ("ghosting") and implements extruder pressure
//! advance.
//!
//! Three tightly coupled parts, leaves first:
//! - [`kernel`]: the closed catalog of smoother kernels.
//! - [`poly`] / [`queue`]: the piecewise-polynomial move read-model.
//! - [`integrate`] / [`convolve`]: the windowed weighted integrator.
//! - [`axis`]: the per-stepper forward-position query built on the above.
//! - [`extruder`]: the triangular-window pressure-advance variant.
//!
//! This crate is a pure computational library: no threads, no async
//! runtime, no I/O. Every public function returns once it has computed its
//! result (see `SPEC_FULL.md` §5).

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "alloc")]
extern crate alloc;

pub mod accel;
pub mod axis;
pub mod convolve;
pub mod error;
pub mod extruder;
pub mod integrate;
pub mod kernel;
pub mod kinematics;
pub mod poly;
pub mod queue;
mod util;

pub use axis::{get_axis_half_smooth_time, AxisSmoother, AxisSmootherParams};
pub use error::SmoothingError;
pub use extruder::ExtruderSmoother;
pub use kernel::{Kernel, KernelFamily};
pub use kinematics::{CartesianStepperKinematics, CoreXyStepperKinematics, InnerKinematics, StepperAxis};
pub use poly::{Quadratic, SCurve};
pub use queue::{AccelDecel, AxesRatios, Move, MoveHandle, MoveQueue, Position};

#[cfg(any(feature = "std", feature = "alloc"))]
pub use queue::MoveArena;
