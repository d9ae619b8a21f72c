pub mod hermite;

/// 3D point type.
pub type Point3 = nalgebra::Point3<f64>;

/// 3D vector type.
pub type Vector3 = nalgebra::Vector3<f64>;

/// Global geometric tolerance for floating-point comparisons.
pub const TOLERANCE: f64 = 1e-10;

/// Sums the Euclidean distances between consecutive points.
#[must_use]
pub fn polyline_length(points: &[Point3]) -> f64 {
    points
        .windows(2)
        .map(|pair| nalgebra::distance(&pair[0], &pair[1]))
        .sum()
}
