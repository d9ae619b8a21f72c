use crate::error::{PathError, Result};
use crate::geometry::VectorPath;
use crate::math::polyline_length;
use crate::tessellation::{SamplePath, SampleSection, SamplingParams};

/// Computes the node-to-node (chord) length of a path or of a node range.
pub struct LinearLength {
    range: Option<(usize, usize)>,
}

impl LinearLength {
    /// Creates a query over the whole path.
    #[must_use]
    pub fn new() -> Self {
        Self { range: None }
    }

    /// Creates a query over the nodes `from..=to`.
    #[must_use]
    pub fn section(from: usize, to: usize) -> Self {
        Self {
            range: Some((from, to)),
        }
    }

    /// Executes the query.
    ///
    /// An empty or single-node path has length zero.
    ///
    /// # Errors
    ///
    /// Returns [`PathError::Index`] if a section bound is out of range.
    pub fn execute(&self, path: &VectorPath) -> Result<f64> {
        let positions = path.node_positions();
        let Some((from, to)) = self.range else {
            return Ok(polyline_length(&positions));
        };
        let count = positions.len();
        for index in [from, to] {
            if index >= count {
                return Err(PathError::node_index(index, count).into());
            }
        }
        let (lo, hi) = if from <= to { (from, to) } else { (to, from) };
        Ok(polyline_length(&positions[lo..=hi]))
    }
}

impl Default for LinearLength {
    fn default() -> Self {
        Self::new()
    }
}

/// Approximates the arc length of a whole path by sampling it.
///
/// Accuracy improves with the sampling density.
pub struct CurvedLength {
    params: SamplingParams,
}

impl CurvedLength {
    /// Creates a new `CurvedLength` query.
    #[must_use]
    pub fn new(params: SamplingParams) -> Self {
        Self { params }
    }

    /// Executes the query. A path too short to sample has length zero.
    ///
    /// # Errors
    ///
    /// Returns an error if the path cannot be evaluated.
    pub fn execute(&self, path: &VectorPath) -> Result<f64> {
        Ok(SamplePath::new(self.params).execute(path)?.length())
    }
}

/// Approximates the arc length between two nodes by sampling the section.
pub struct SectionCurvedLength {
    from: usize,
    to: usize,
    params: SamplingParams,
}

impl SectionCurvedLength {
    /// Creates a new `SectionCurvedLength` query.
    #[must_use]
    pub fn new(from: usize, to: usize, params: SamplingParams) -> Self {
        Self { from, to, params }
    }

    /// Executes the query.
    ///
    /// # Errors
    ///
    /// Same conditions as [`SampleSection::execute`].
    pub fn execute(&self, path: &VectorPath) -> Result<f64> {
        Ok(SampleSection::new(self.from, self.to, self.params)
            .execute(path)?
            .length())
    }
}
