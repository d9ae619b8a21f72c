use tracing::trace;

use crate::error::Result;
use crate::geometry::{Curve, VectorPath};
use crate::operations::query::LinearLength;

use super::{sample_interval, Polyline, SamplingParams};

/// Samples a whole path into a polyline.
///
/// The step count is `floor(linear_length * density)`, capped at
/// [`SamplingParams::max_steps`]. When that is below one the result is empty;
/// otherwise it holds `steps + 1` points evenly spaced in time across the
/// path's domain. Nothing is cached between calls.
pub struct SamplePath {
    params: SamplingParams,
}

impl SamplePath {
    /// Creates a new `SamplePath` operation.
    #[must_use]
    pub fn new(params: SamplingParams) -> Self {
        Self { params }
    }

    /// Executes the sampling.
    ///
    /// # Errors
    ///
    /// Returns an error if the path cannot be evaluated.
    pub fn execute(&self, path: &VectorPath) -> Result<Polyline> {
        let linear_length = LinearLength::new().execute(path)?;
        let steps = self.params.steps_for(linear_length);
        if steps == 0 {
            trace!(linear_length, "path too short to sample");
            return Ok(Polyline::default());
        }
        let domain = path.domain();
        trace!(steps, linear_length, "sampling path");
        sample_interval(path, domain.t_min, domain.t_max, steps)
    }
}
