//! Angle normalization.

use std::f64::consts::{PI, TAU};

/// Map any finite angle onto the half-open interval `(-π, π]`.
///
/// Whole turns are removed in one step so large inputs cost the same as small
/// ones; the remaining fix-up loops run at most once or twice.  The function
/// is idempotent: a value already in range is returned unchanged.
///
/// Non-finite input is returned as-is.
pub fn normalize_angle(angle: f64) -> f64 {
    if !angle.is_finite() {
        return angle;
    }
    let mut a = angle - TAU * (angle / TAU).trunc();
    while a <= -PI {
        a += TAU;
    }
    while a > PI {
        a -= TAU;
    }
    a
}
