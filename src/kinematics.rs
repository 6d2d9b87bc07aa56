//! Inner forward-kinematics callback (`SPEC_FULL.md` §9, resolved design
//! note).
//!
//! The reference system passes a forged move with an oversized `move_t` to
//! the inner kinematics callback so it reads only `start_pos`. This crate
//! instead splits the callback into two explicit calling conventions so no
//! move ever needs to be forged: [`InnerKinematics::calc_at`] for a normal
//! forward-kinematics query, and [`InnerKinematics::calc_from_start_pos`]
//! for the axis wrapper's windowed-convolution result, which is already a
//! position rather than something to re-evaluate at a local time.
//!
//! [`CartesianStepperKinematics`] and [`CoreXyStepperKinematics`] are kept
//! from the teacher's `Kinematics`/`CartesianKinematics`/`CoreXYKinematics`
//! shape, narrowed from "map a whole Cartesian point to every stepper" down
//! to "one stepper's position, and which of X/Y it actually reads" — the
//! axis wrapper only ever needs the latter.

use crate::queue::Move;

/// Identifies a physical stepper axis. Kept from the teacher's
/// `StepperAxis` for CoreXY's A/B naming.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub enum StepperAxis {
    X,
    Y,
    Z,
    /// CoreXY A stepper: `x + y`.
    A,
    /// CoreXY B stepper: `x - y`.
    B,
}

/// The forward-kinematics callback the axis smoothing wrapper drives
/// (`SPEC_FULL.md` §4.5, §9).
pub trait InnerKinematics {
    /// Whether this stepper's position depends on the move's X axis.
    fn uses_x(&self) -> bool;
    /// Whether this stepper's position depends on the move's Y axis.
    fn uses_y(&self) -> bool;

    /// Forward-kinematics query: the stepper position implied by `mv`'s
    /// polynomial at local time `t`.
    fn calc_at(&self, mv: &Move, t: f64) -> f64;

    /// Reads only `mv.start_pos`, ignoring the move's polynomial and any
    /// notion of local time. Used by the axis wrapper to read back an
    /// already-smoothed position it has written into a scratch move.
    fn calc_from_start_pos(&self, mv: &Move) -> f64;
}

/// One Cartesian stepper (X, Y, or Z) mapped directly to the matching move
/// axis.
#[derive(Debug, Clone, Copy)]
pub struct CartesianStepperKinematics {
    pub axis: StepperAxis,
    pub steps_per_mm: f64,
}

impl CartesianStepperKinematics {
    pub fn new(axis: StepperAxis, steps_per_mm: f64) -> Self {
        Self { axis, steps_per_mm }
    }

    fn raw_position(&self, mv: &Move) -> f64 {
        match self.axis {
            StepperAxis::X => mv.start_pos.x,
            StepperAxis::Y => mv.start_pos.y,
            StepperAxis::Z => mv.start_pos.z,
            StepperAxis::A | StepperAxis::B => 0.0,
        }
    }

    fn raw_velocity_term(&self, mv: &Move, t: f64) -> f64 {
        match self.axis {
            StepperAxis::X => mv.axes_r.x * mv.scurve.eval(t),
            StepperAxis::Y => mv.axes_r.y * mv.scurve.eval(t),
            StepperAxis::Z => mv.axes_r.z * mv.scurve.eval(t),
            StepperAxis::A | StepperAxis::B => 0.0,
        }
    }
}

impl InnerKinematics for CartesianStepperKinematics {
    fn uses_x(&self) -> bool {
        matches!(self.axis, StepperAxis::X)
    }

    fn uses_y(&self) -> bool {
        matches!(self.axis, StepperAxis::Y)
    }

    fn calc_at(&self, mv: &Move, t: f64) -> f64 {
        (self.raw_position(mv) + self.raw_velocity_term(mv, t)) * self.steps_per_mm
    }

    fn calc_from_start_pos(&self, mv: &Move) -> f64 {
        self.raw_position(mv) * self.steps_per_mm
    }
}

/// One CoreXY stepper (A or B). See <https://corexy.com/theory.html>:
/// `a = x + y`, `b = x - y`. Both steppers depend on both X and Y.
#[derive(Debug, Clone, Copy)]
pub struct CoreXyStepperKinematics {
    pub stepper: StepperAxis,
    pub steps_per_mm: f64,
}

impl CoreXyStepperKinematics {
    pub fn new(stepper: StepperAxis, steps_per_mm: f64) -> Self {
        debug_assert!(matches!(stepper, StepperAxis::A | StepperAxis::B));
        Self {
            stepper,
            steps_per_mm,
        }
    }

    fn combine(&self, x: f64, y: f64) -> f64 {
        match self.stepper {
            StepperAxis::A => x + y,
            StepperAxis::B => x - y,
            _ => 0.0,
        }
    }
}

impl InnerKinematics for CoreXyStepperKinematics {
    fn uses_x(&self) -> bool {
        true
    }

    fn uses_y(&self) -> bool {
        true
    }

    fn calc_at(&self, mv: &Move, t: f64) -> f64 {
        let x = mv.start_pos.x + mv.axes_r.x * mv.scurve.eval(t);
        let y = mv.start_pos.y + mv.axes_r.y * mv.scurve.eval(t);
        self.combine(x, y) * self.steps_per_mm
    }

    fn calc_from_start_pos(&self, mv: &Move) -> f64 {
        self.combine(mv.start_pos.x, mv.start_pos.y) * self.steps_per_mm
    }
}
