//! Windowed convolver (`SPEC_FULL.md` §4.4).
//!
//! Extends the single-move weighted integral across neighbouring moves by
//! walking the move queue forward and backward whenever the convolution
//! window `[t-h, t+h]` spills past the current move's `[0, move_t]` range.

use crate::integrate::integrate_scurve;
use crate::kernel::Kernel;
use crate::poly::SCurve;
use crate::queue::{AxesRatios, Move, MoveHandle, MoveQueue, Position};
use crate::util::{fmax, fmin};

/// Which Cartesian axis to extract from a move's `start_pos` / `axes_r`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
}

impl Axis {
    fn start_pos(self, pos: &Position) -> f64 {
        match self {
            Axis::X => pos.x,
            Axis::Y => pos.y,
        }
    }

    fn ratio(self, r: &AxesRatios) -> f64 {
        match self {
            Axis::X => r.x,
            Axis::Y => r.y,
        }
    }
}

fn move_p0_and_scurve(mv: &Move, axis: Axis) -> (f64, SCurve) {
    let p0 = axis.start_pos(&mv.start_pos);
    let s = mv.scurve.copy_scaled(axis.ratio(&mv.axes_r));
    (p0, s)
}

/// `∫ p(x)·w(t−x) dx` over `[t-h, t+h]`, walking the move queue as needed
/// to cover moves adjacent to `m` (`SPEC_FULL.md` §4.4).
///
/// Preconditions (caller's responsibility, matching the spec): every move
/// the window touches is already allocated and linked into `q`; `range_integrate`
/// does not allocate or mutate the queue.
pub fn range_integrate<Q: MoveQueue>(q: &Q, m: MoveHandle, axis: Axis, t: f64, sm: &Kernel) -> f64 {
    let h = sm.h();
    let mut start = t - h;
    let mut end = t + h;
    let mut toff = -t;
    let mut total = 0.0;

    // Step 2: the current move.
    {
        let mv = q.get(m);
        let (p0, s) = move_p0_and_scurve(mv, axis);
        let a = fmax(start, 0.0);
        let b = fmin(end, mv.move_t);
        if b > a {
            total += integrate_scurve(sm, p0, &s, a, b, toff);
        }
    }

    // Step 3: walk backward while the window still extends before local
    // time 0. The lower bound is clamped to 0 for each move's own
    // contribution (mirroring step 2's clamp); the *unclamped* running
    // `start` is what the loop condition re-tests, so a window spanning
    // more than one prior move keeps walking back.
    let mut cur = m;
    while start < 0.0 {
        let prev = q
            .previous(cur)
            .expect("convolution window extends before the start of the queue");
        let prev_move_t = q.get(prev).move_t;
        start += prev_move_t;
        toff -= prev_move_t;
        let mv = q.get(prev);
        let (p0, s) = move_p0_and_scurve(mv, axis);
        let a = fmax(start, 0.0);
        if prev_move_t > a {
            total += integrate_scurve(sm, p0, &s, a, prev_move_t, toff);
        }
        cur = prev;
    }

    // Step 4: reset and walk forward while the window extends past the
    // current move's end.
    toff = -t;
    let mut cur = m;
    while end > q.get(cur).move_t {
        let move_t = q.get(cur).move_t;
        end -= move_t;
        toff += move_t;
        let next = q
            .next(cur)
            .expect("convolution window extends past the end of the queue");
        let mv = q.get(next);
        let (p0, s) = move_p0_and_scurve(mv, axis);
        let b = fmin(end, mv.move_t);
        if b > 0.0 {
            total += integrate_scurve(sm, p0, &s, 0.0, b, toff);
        }
        cur = next;
    }

    total
}
