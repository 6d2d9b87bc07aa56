//! Error types for the motion-smoothing core.
//!
//! The taxonomy is intentionally narrow (see `SPEC_FULL.md` §7): numeric
//! queries (`calc_position` and friends) are total and never fail, so the
//! only errors this crate produces are rejected reconfiguration calls.

use heapless::String;
use thiserror::Error;

/// Errors returned by the reconfiguration entry points (`set_params`,
/// `set_sk`, `set_smooth_time`). Queries never return this type.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum SmoothingError {
    /// The kernel catalog does not recognise the requested family tag. The
    /// caller's prior kernel, if any, is left untouched.
    #[error("unknown smoother kernel family: {family}")]
    UnknownKernelFamily {
        /// The unrecognised family tag, as supplied by the caller.
        family: String<16>,
    },

    /// The inner kinematics declares use of neither the X nor the Y axis, so
    /// there is nothing for the axis wrapper to smooth.
    #[error("inner kinematics uses neither the X nor Y axis")]
    UnsupportedAxes,
}
