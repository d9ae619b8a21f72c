use tracing::{debug, warn};

use crate::error::{PathError, Result};
use crate::geometry::path::MIN_NODES;
use crate::geometry::VectorPath;
use crate::math::TOLERANCE;
use crate::operations::query::{CurvedLength, SectionCurvedLength};
use crate::tessellation::SamplingParams;

/// Outcome of a [`DistributeTimestamps`] run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Distribution {
    /// Number of interior nodes that received a new timestamp.
    pub updated: usize,
    /// Whether the run stopped before reaching the last interior node.
    pub stopped_early: bool,
}

/// Re-times interior nodes so that time spacing follows arc-length spacing.
///
/// The first and last nodes keep their times. Node `i` is placed at
/// `time(i - 1) + section_length(i - 1, i) * span / total_length`, with all
/// lengths measured on the path before any node is moved. If a node would
/// land on or past the last node's time, or not after its predecessor, the
/// run stops there and later nodes keep their old times.
pub struct DistributeTimestamps {
    params: SamplingParams,
}

impl DistributeTimestamps {
    /// Creates a new `DistributeTimestamps` operation.
    #[must_use]
    pub fn new(params: SamplingParams) -> Self {
        Self { params }
    }

    /// Executes the redistribution, modifying the path in place.
    ///
    /// # Errors
    ///
    /// Returns [`PathError::Invariant`] for a path with fewer than two nodes,
    /// [`PathError::DegenerateInput`] if the path's curved length is zero, and
    /// [`PathError::Ordering`] if the accepted timestamps would overtake a node
    /// left untouched after an early stop. The path is unchanged on error.
    pub fn execute(&self, path: &mut VectorPath) -> Result<Distribution> {
        let count = path.nodes_no();
        if count < MIN_NODES {
            return Err(PathError::Invariant(format!(
                "a path needs at least {MIN_NODES} nodes to distribute timestamps"
            ))
            .into());
        }
        if count == MIN_NODES {
            return Ok(Distribution {
                updated: 0,
                stopped_early: false,
            });
        }

        let total = CurvedLength::new(self.params).execute(path)?;
        if total < TOLERANCE {
            return Err(PathError::DegenerateInput(
                "cannot distribute timestamps over a path with zero curved length".into(),
            )
            .into());
        }

        let timestamps = path.node_timestamps();
        let (start, end) = (timestamps[0], timestamps[count - 1]);
        let time_per_unit_length = (end - start) / total;

        let mut updates = Vec::with_capacity(count - 2);
        let mut prev_timestamp = start;
        let mut stopped_early = false;
        for index in 1..count - 1 {
            let section = SectionCurvedLength::new(index - 1, index, self.params).execute(path)?;
            let timestamp = prev_timestamp + section * time_per_unit_length;
            if timestamp >= end || timestamp <= prev_timestamp {
                warn!(index, timestamp, "stopping timestamp distribution at degenerate node");
                stopped_early = true;
                break;
            }
            updates.push((index, timestamp));
            prev_timestamp = timestamp;
        }

        path.change_node_timestamps(&updates)?;
        debug!(updated = updates.len(), total, stopped_early, "distributed timestamps");
        Ok(Distribution {
            updated: updates.len(),
            stopped_early,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::Point3;

    fn params() -> SamplingParams {
        SamplingParams::new(20.0).unwrap()
    }

    fn linear(waypoints: &[(f64, Point3)]) -> VectorPath {
        let mut path = VectorPath::from_waypoints(waypoints).unwrap();
        path.set_nodes_linear();
        path
    }

    #[test]
    fn middle_node_moves_toward_shorter_segment() {
        let mut path = linear(&[
            (0.0, Point3::new(0.0, 0.0, 0.0)),
            (0.5, Point3::new(1.0, 0.0, 0.0)),
            (1.0, Point3::new(3.0, 0.0, 0.0)),
        ]);
        let result = DistributeTimestamps::new(params()).execute(&mut path).unwrap();
        assert_eq!(result.updated, 1);
        assert!(!result.stopped_early);

        let times = path.node_timestamps();
        assert!((times[0]).abs() < f64::EPSILON);
        assert!((times[2] - 1.0).abs() < f64::EPSILON);
        assert!(times[1] > 0.0 && times[1] < 0.5);
        assert!((times[1] - 1.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn nodes_may_pass_old_neighbor_times() {
        let mut path = linear(&[
            (0.0, Point3::new(0.0, 0.0, 0.0)),
            (0.1, Point3::new(5.0, 0.0, 0.0)),
            (0.2, Point3::new(6.0, 0.0, 0.0)),
            (1.0, Point3::new(7.0, 0.0, 0.0)),
        ]);
        DistributeTimestamps::new(params()).execute(&mut path).unwrap();
        let times = path.node_timestamps();
        assert!(times.windows(2).all(|pair| pair[0] < pair[1]));
        assert!(times[1] > 0.2);
    }

    #[test]
    fn two_node_path_is_untouched() {
        let mut path = VectorPath::with_default_segment();
        let before = path.clone();
        let result = DistributeTimestamps::new(params()).execute(&mut path).unwrap();
        assert_eq!(result.updated, 0);
        assert_eq!(path, before);
    }

    #[test]
    fn empty_path_is_invariant_error() {
        let err = DistributeTimestamps::new(params())
            .execute(&mut VectorPath::new())
            .unwrap_err();
        assert!(matches!(err.as_path_error(), Some(PathError::Invariant(_))));
    }

    #[test]
    fn overlapping_nodes_stop_early() {
        let mut path = linear(&[
            (0.0, Point3::new(0.0, 0.0, 0.0)),
            (0.3, Point3::new(1.0, 0.0, 0.0)),
            (0.6, Point3::new(1.0, 0.0, 0.0)),
            (1.0, Point3::new(2.0, 0.0, 0.0)),
        ]);
        let before = path.node_timestamps();
        let result = DistributeTimestamps::new(params()).execute(&mut path).unwrap();
        assert!(result.stopped_early);
        assert_eq!(result.updated, 1);
        let after = path.node_timestamps();
        assert!((after[1] - 0.5).abs() < 1e-6);
        assert!((after[2] - before[2]).abs() < f64::EPSILON);
    }
}
