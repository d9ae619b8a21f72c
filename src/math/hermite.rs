//! Cubic Hermite basis functions and their derivatives.
//!
//! For a segment with end values `p0`, `p1` and end slopes `m0`, `m1`
//! (already scaled to the unit interval):
//!
//! `H(s) = h00(s) p0 + h10(s) m0 + h01(s) p1 + h11(s) m1`, `s ∈ [0, 1]`.

/// Evaluates the Hermite polynomial at `s`.
#[must_use]
pub fn hermite(p0: f64, m0: f64, p1: f64, m1: f64, s: f64) -> f64 {
    let s2 = s * s;
    let s3 = s2 * s;
    let h00 = 2.0 * s3 - 3.0 * s2 + 1.0;
    let h10 = s3 - 2.0 * s2 + s;
    let h01 = -2.0 * s3 + 3.0 * s2;
    let h11 = s3 - s2;
    h00 * p0 + h10 * m0 + h01 * p1 + h11 * m1
}

/// Derivative of [`hermite`] with respect to `s`.
#[must_use]
pub fn hermite_derivative(p0: f64, m0: f64, p1: f64, m1: f64, s: f64) -> f64 {
    let s2 = s * s;
    let d00 = 6.0 * s2 - 6.0 * s;
    let d10 = 3.0 * s2 - 4.0 * s + 1.0;
    let d01 = -6.0 * s2 + 6.0 * s;
    let d11 = 3.0 * s2 - 2.0 * s;
    d00 * p0 + d10 * m0 + d01 * p1 + d11 * m1
}
