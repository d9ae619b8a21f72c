use tracing::trace;

use crate::error::{PathError, Result};
use crate::geometry::VectorPath;
use crate::math::TOLERANCE;
use crate::operations::query::LinearLength;

use super::{sample_interval, Polyline, SamplingParams};

/// Samples the stretch of a path between two nodes.
///
/// The step count comes from the section's own linear length, independent
/// of other sections. A section with non-zero linear length always takes at
/// least [`SamplingParams::min_section_steps`] steps so that its curved
/// length is never reported as zero. [`SamplingParams::max_steps`] bounds
/// both.
pub struct SampleSection {
    from: usize,
    to: usize,
    params: SamplingParams,
}

impl SampleSection {
    /// Creates a new `SampleSection` operation between nodes `from` and `to`.
    #[must_use]
    pub fn new(from: usize, to: usize, params: SamplingParams) -> Self {
        Self { from, to, params }
    }

    /// Executes the sampling.
    ///
    /// # Errors
    ///
    /// Returns [`PathError::DegenerateInput`] if the whole path has zero
    /// linear length or `to` precedes `from`, and [`PathError::Index`] if
    /// either node index is out of range.
    pub fn execute(&self, path: &VectorPath) -> Result<Polyline> {
        let total = LinearLength::new().execute(path)?;
        if total <= 0.0 {
            return Err(PathError::DegenerateInput(
                "cannot sample a section of a zero-length path".into(),
            )
            .into());
        }
        if self.to < self.from {
            return Err(PathError::DegenerateInput(format!(
                "section end {} precedes start {}",
                self.to, self.from
            ))
            .into());
        }
        let section = LinearLength::section(self.from, self.to).execute(path)?;
        let from_time = path.node(self.from)?.time;
        let to_time = path.node(self.to)?.time;

        let mut steps = self.params.steps_for(section);
        if section > TOLERANCE {
            steps = steps.max(self.params.min_section_steps.min(self.params.max_steps));
        }
        if steps == 0 {
            trace!(from = self.from, to = self.to, "section too short to sample");
            return Ok(Polyline::default());
        }
        trace!(from = self.from, to = self.to, steps, "sampling section");
        sample_interval(path, from_time, to_time, steps)
    }
}
