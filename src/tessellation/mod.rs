mod sample_path;
mod sample_section;

pub use sample_path::SamplePath;
pub use sample_section::SampleSection;

use serde::{Deserialize, Serialize};

use crate::error::{MotionPathError, PathError, Result};
use crate::geometry::VectorPath;
use crate::math::{polyline_length, Point3};

/// Parameters controlling path sampling density.
///
/// Sample counts are derived from linear (node-to-node) length, so `density`
/// is in samples per unit of distance. Deserialized values go through the
/// same checks as the builder methods.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawSamplingParams")]
pub struct SamplingParams {
    /// Samples per unit of linear length.
    pub density: f64,
    /// Minimum number of steps for a section with non-zero linear length.
    pub min_section_steps: usize,
    /// Upper bound on the number of steps of a single sampling call.
    pub max_steps: usize,
}

#[derive(Deserialize)]
#[serde(default)]
struct RawSamplingParams {
    density: f64,
    min_section_steps: usize,
    max_steps: usize,
}

impl Default for RawSamplingParams {
    fn default() -> Self {
        let params = SamplingParams::default();
        Self {
            density: params.density,
            min_section_steps: params.min_section_steps,
            max_steps: params.max_steps,
        }
    }
}

impl TryFrom<RawSamplingParams> for SamplingParams {
    type Error = MotionPathError;

    fn try_from(raw: RawSamplingParams) -> Result<Self> {
        Ok(Self::new(raw.density)?
            .with_min_section_steps(raw.min_section_steps)
            .with_max_steps(raw.max_steps))
    }
}

impl Default for SamplingParams {
    fn default() -> Self {
        Self {
            density: 20.0,
            min_section_steps: 1,
            max_steps: 100_000,
        }
    }
}

impl SamplingParams {
    /// Creates parameters with the given density and default limits.
    ///
    /// # Errors
    ///
    /// Returns [`PathError::DegenerateInput`] if `density` is not a positive
    /// finite number.
    pub fn new(density: f64) -> Result<Self> {
        Self::default().with_density(density)
    }

    /// Replaces the density.
    ///
    /// # Errors
    ///
    /// Returns [`PathError::DegenerateInput`] if `density` is not a positive
    /// finite number.
    pub fn with_density(mut self, density: f64) -> Result<Self> {
        if !density.is_finite() || density <= 0.0 {
            return Err(PathError::DegenerateInput(format!(
                "sampling density must be positive, got {density}"
            ))
            .into());
        }
        self.density = density;
        Ok(self)
    }

    /// Replaces the minimum section step count.
    ///
    /// The minimum never overrides [`Self::max_steps`].
    #[must_use]
    pub fn with_min_section_steps(mut self, steps: usize) -> Self {
        self.min_section_steps = steps;
        self
    }

    /// Replaces the step cap.
    #[must_use]
    pub fn with_max_steps(mut self, steps: usize) -> Self {
        self.max_steps = steps.max(1);
        self
    }

    /// Number of steps for a stretch of the given linear length, before any
    /// minimum is applied.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub(crate) fn steps_for(&self, linear_length: f64) -> usize {
        let raw = (linear_length * self.density).floor();
        if raw.is_nan() || raw < 1.0 {
            0
        } else if raw >= self.max_steps as f64 {
            self.max_steps
        } else {
            raw as usize
        }
    }
}

/// An ordered sequence of points sampled along a path.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Polyline {
    /// The ordered vertices of the polyline.
    pub points: Vec<Point3>,
}

impl Polyline {
    /// Sum of the distances between consecutive points.
    #[must_use]
    pub fn length(&self) -> f64 {
        polyline_length(&self.points)
    }

    /// Returns whether no points were produced.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Evaluates `path` at `steps + 1` evenly spaced times from `from` to `to`.
fn sample_interval(path: &VectorPath, from: f64, to: f64, steps: usize) -> Result<Polyline> {
    let mut points = Vec::with_capacity(steps + 1);
    for k in 0..=steps {
        #[allow(clippy::cast_precision_loss)]
        let t = if k == steps {
            to
        } else {
            (from + (to - from) * (k as f64 / steps as f64)).min(to)
        };
        points.push(path.vector_at_time(t)?);
    }
    Ok(Polyline { points })
}
