//! Windowed-sinc low-pass prototype.
//!
//! Phases are measured in input samples, so `sinc(1.0)` is the first zero
//! crossing and `spread` (half the tap count) is the half-width of the
//! filter support.

use std::f64::consts::PI;

/// Normalized cardinal sine, `sin(πx) / (πx)`.
#[must_use]
pub fn sinc(x: f64) -> f64 {
    if x.abs() < 1.0e-9 {
        return 1.0;
    }
    let radians = x * PI;
    radians.sin() / radians
}

/// Raised-cosine taper over `[-spread, spread]`.
///
/// `1.0` at `phase == 0`, falling to zero at `|phase| == spread` and staying
/// zero outside the support.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn hamming_window(phase: f64, spread: usize) -> f64 {
    const ALPHA: f64 = 0.5;

    let spread = spread as f64;
    if spread <= 0.0 || phase.abs() >= spread {
        return 0.0;
    }
    (1.0 - ALPHA).mul_add((PI * phase / spread).cos(), ALPHA)
}

/// `sinc(phase)` shaped by [`hamming_window`].
#[must_use]
pub fn calculate_windowed_sinc(phase: f64, spread: usize) -> f64 {
    windowed_sinc_with_cutoff(phase, spread, 1.0)
}

/// Windowed sinc whose pass band is scaled by `cutoff` (`1.0` is the input
/// Nyquist rate). The window keeps its full width.
#[must_use]
pub fn windowed_sinc_with_cutoff(phase: f64, spread: usize, cutoff: f64) -> f64 {
    sinc(phase * cutoff) * hamming_window(phase, spread)
}
