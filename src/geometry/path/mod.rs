use tracing::debug;

use crate::error::{GeometryError, PathError, Result};
use crate::geometry::curve::{Curve, CurveDomain, Keyframe, KeyframeCurve, WrapMode};
use crate::math::{Point3, Vector3, TOLERANCE};

/// Position of the first node of a freshly reset path.
pub const DEFAULT_START: Point3 = Point3::new(0.0, 0.0, 0.0);

/// Position of the last node of a freshly reset path.
pub const DEFAULT_END: Point3 = Point3::new(1.0, 0.0, 0.0);

/// Minimum node count for a path to be evaluable as a curve.
pub const MIN_NODES: usize = 2;

/// One of the three coordinate axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    /// All axes in storage order.
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }
}

/// A read-only view of one synchronized key triple.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Node {
    pub index: usize,
    pub time: f64,
    pub position: Point3,
    pub in_tangent: Vector3,
    pub out_tangent: Vector3,
}

/// A 3D path made of one keyframe curve per axis.
///
/// The three curves always hold the same number of keys at the same times;
/// the key triple at index `i` is node `i`. The curves are private and every
/// mutation goes through [`VectorPath::stage`], which works on a copy of all
/// three axes and commits only when the operation succeeds and the
/// synchronization invariant still holds.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VectorPath {
    axes: [KeyframeCurve; 3],
    wrap_mode: WrapMode,
}

impl VectorPath {
    /// Creates a path with no nodes.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the default straight segment from [`DEFAULT_START`] at time 0
    /// to [`DEFAULT_END`] at time 1.
    #[must_use]
    pub fn with_default_segment() -> Self {
        let axes = std::array::from_fn(|axis| {
            let mut curve = KeyframeCurve::from_sorted(vec![
                Keyframe::new(0.0, DEFAULT_START[axis]),
                Keyframe::new(1.0, DEFAULT_END[axis]),
            ]);
            curve.set_linear_tangents();
            curve
        });
        Self {
            axes,
            wrap_mode: WrapMode::default(),
        }
    }

    /// Builds a path from raw per-axis curves.
    ///
    /// # Errors
    ///
    /// Returns [`PathError::Invariant`] if the curves do not share key counts
    /// and key times.
    pub fn from_axes(axes: [KeyframeCurve; 3]) -> Result<Self> {
        check_sync(&axes)?;
        Ok(Self {
            axes,
            wrap_mode: WrapMode::default(),
        })
    }

    /// Builds a path through `(time, position)` waypoints with smoothed
    /// tangents.
    ///
    /// # Errors
    ///
    /// Returns an error if any waypoint holds a non-finite number.
    pub fn from_waypoints(waypoints: &[(f64, Point3)]) -> Result<Self> {
        let mut path = Self::new();
        path.stage(|axes| {
            for &(time, position) in waypoints {
                for (axis, curve) in axes.iter_mut().enumerate() {
                    curve.insert(Keyframe::new(time, position[axis]))?;
                }
            }
            for curve in axes.iter_mut() {
                for index in 0..curve.len() {
                    curve.smooth_tangent(index, 0.0)?;
                }
            }
            Ok(())
        })?;
        Ok(path)
    }

    /// Returns the curve for one axis.
    #[must_use]
    pub fn axis(&self, axis: Axis) -> &KeyframeCurve {
        &self.axes[axis.index()]
    }

    /// Returns the number of nodes.
    #[must_use]
    pub fn nodes_no(&self) -> usize {
        self.axes[0].len()
    }

    /// Returns whether the path has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes_no() == 0
    }

    /// Returns the wrap mode used by [`Self::vector_at_time`].
    #[must_use]
    pub fn wrap_mode(&self) -> WrapMode {
        self.wrap_mode
    }

    /// Sets the policy for queries outside the node time range.
    pub fn set_wrap_mode(&mut self, mode: WrapMode) {
        self.wrap_mode = mode;
    }

    /// Returns a view of node `index`.
    ///
    /// # Errors
    ///
    /// Returns [`PathError::Index`] if `index` is out of range.
    pub fn node(&self, index: usize) -> Result<Node> {
        self.check_index(index)?;
        let [x, y, z] = self.axes.each_ref().map(|curve| curve.keys()[index]);
        Ok(Node {
            index,
            time: x.time,
            position: Point3::new(x.value, y.value, z.value),
            in_tangent: Vector3::new(x.in_tangent, y.in_tangent, z.in_tangent),
            out_tangent: Vector3::new(x.out_tangent, y.out_tangent, z.out_tangent),
        })
    }

    /// Returns every node position in order.
    #[must_use]
    pub fn node_positions(&self) -> Vec<Point3> {
        let [x, y, z] = self.axes.each_ref().map(KeyframeCurve::keys);
        x.iter()
            .zip(y)
            .zip(z)
            .map(|((x, y), z)| Point3::new(x.value, y.value, z.value))
            .collect()
    }

    /// Returns every node timestamp in order.
    #[must_use]
    pub fn node_timestamps(&self) -> Vec<f64> {
        self.axes[0].keys().iter().map(|k| k.time).collect()
    }

    /// Returns the position of node `index`.
    ///
    /// # Errors
    ///
    /// Returns [`PathError::Index`] if `index` is out of range.
    pub fn vector_at_key(&self, index: usize) -> Result<Point3> {
        Ok(self.node(index)?.position)
    }

    /// Evaluates the path at `t` after applying the wrap mode.
    ///
    /// # Errors
    ///
    /// Returns [`PathError::Domain`] if the path has no nodes.
    pub fn vector_at_time(&self, t: f64) -> Result<Point3> {
        let t = self.wrap_mode.apply(t, self.domain());
        let [x, y, z] = self.axes.each_ref().map(|curve| curve.evaluate(t));
        Ok(Point3::new(x?, y?, z?))
    }

    /// Returns the derivative of position with respect to time at `t`.
    ///
    /// # Errors
    ///
    /// Returns [`PathError::Domain`] if the path has no nodes.
    pub fn velocity_at_time(&self, t: f64) -> Result<Vector3> {
        let t = self.wrap_mode.apply(t, self.domain());
        let [x, y, z] = self.axes.each_ref().map(|curve| curve.derivative(t));
        Ok(Vector3::new(x?, y?, z?))
    }

    /// Inserts a node at `t` without changing the path's shape and returns its
    /// index.
    ///
    /// Each axis takes its value and tangent from its own curve at `t`. If a
    /// node already sits at `t` the path is left as is and that node's index
    /// is returned.
    ///
    /// # Errors
    ///
    /// Returns [`PathError::Domain`] if the path has no nodes.
    pub fn add_node_at_time(&mut self, t: f64) -> Result<usize> {
        if !t.is_finite() {
            return Err(GeometryError::NonFinite("node time").into());
        }
        #[allow(clippy::float_cmp)]
        let existing = self.node_timestamps().iter().position(|&time| time == t);
        if let Some(index) = existing {
            return Ok(index);
        }
        let index = self.stage(|axes| {
            let mut index = 0;
            for curve in axes.iter_mut() {
                index = curve.insert_key_preserving_shape(t)?;
            }
            Ok(index)
        })?;
        debug!(index, t, "added node on existing path shape");
        Ok(index)
    }

    /// Inserts a node at `t` with an explicit position and returns its index.
    ///
    /// The new node's tangents are smoothed from its neighbors. A node already
    /// at `t` is overwritten.
    ///
    /// # Errors
    ///
    /// Returns an error on non-finite input.
    pub fn create_node(&mut self, t: f64, position: Point3) -> Result<usize> {
        let index = self.stage(|axes| {
            let mut index = 0;
            for (axis, curve) in axes.iter_mut().enumerate() {
                index = curve.insert(Keyframe::new(t, position[axis]))?;
                curve.smooth_tangent(index, 0.0)?;
            }
            Ok(index)
        })?;
        debug!(index, t, ?position, "created node");
        Ok(index)
    }

    /// Removes node `index`.
    ///
    /// # Errors
    ///
    /// Returns [`PathError::Index`] if `index` is out of range and
    /// [`PathError::Invariant`] if fewer than [`MIN_NODES`] would remain.
    pub fn remove_node(&mut self, index: usize) -> Result<()> {
        self.check_index(index)?;
        if self.nodes_no() <= MIN_NODES {
            return Err(PathError::Invariant(format!(
                "a path needs at least {MIN_NODES} nodes"
            ))
            .into());
        }
        self.stage(|axes| {
            for curve in axes.iter_mut() {
                curve.remove_key(index)?;
            }
            Ok(())
        })?;
        debug!(index, "removed node");
        Ok(())
    }

    /// Moves node `index` to `position`, keeping its time and tangents.
    ///
    /// # Errors
    ///
    /// Returns [`PathError::Index`] if `index` is out of range.
    pub fn move_node_to_position(&mut self, index: usize, position: Point3) -> Result<()> {
        self.check_index(index)?;
        self.stage(|axes| {
            for (axis, curve) in axes.iter_mut().enumerate() {
                curve.set_key_value(index, position[axis])?;
            }
            Ok(())
        })?;
        debug!(index, ?position, "moved node");
        Ok(())
    }

    /// Changes the time of node `index`.
    ///
    /// # Errors
    ///
    /// Returns [`PathError::Index`] if `index` is out of range and
    /// [`PathError::Ordering`] if `new_time` is not strictly between the
    /// neighboring nodes' times. Keys are never reordered.
    pub fn change_node_timestamp(&mut self, index: usize, new_time: f64) -> Result<()> {
        self.check_index(index)?;
        self.stage(|axes| {
            for curve in axes.iter_mut() {
                curve.set_key_time(index, new_time)?;
            }
            Ok(())
        })?;
        debug!(index, new_time, "retimed node");
        Ok(())
    }

    /// Changes several node times in one step.
    ///
    /// Only the final ordering is checked.
    ///
    /// # Errors
    ///
    /// Returns [`PathError::Index`] for a bad index and
    /// [`PathError::Ordering`] if the resulting times are not strictly
    /// ascending. On error no node is changed.
    pub fn change_node_timestamps(&mut self, times: &[(usize, f64)]) -> Result<()> {
        for &(index, _) in times {
            self.check_index(index)?;
        }
        self.stage(|axes| {
            for curve in axes.iter_mut() {
                curve.set_key_times(times)?;
            }
            Ok(())
        })?;
        debug!(count = times.len(), "retimed nodes");
        Ok(())
    }

    /// Makes every segment a straight line.
    pub fn set_nodes_linear(&mut self) {
        for curve in &mut self.axes {
            curve.set_linear_tangents();
        }
    }

    /// Smooths the tangents of node `index` on all three axes.
    ///
    /// # Errors
    ///
    /// Returns [`PathError::Index`] if `index` is out of range.
    pub fn smooth_node_tangents(&mut self, index: usize) -> Result<()> {
        self.check_index(index)?;
        self.stage(|axes| {
            for curve in axes.iter_mut() {
                curve.smooth_tangent(index, 0.0)?;
            }
            Ok(())
        })
    }

    /// Smooths the tangents of every node.
    ///
    /// # Errors
    ///
    /// Does not fail on a synchronized path; errors are propagated from the
    /// per-axis smoothing.
    pub fn smooth_all_node_tangents(&mut self) -> Result<()> {
        self.stage(|axes| {
            for curve in axes.iter_mut() {
                for index in 0..curve.len() {
                    curve.smooth_tangent(index, 0.0)?;
                }
            }
            Ok(())
        })
    }

    /// Translates every node by `delta`.
    ///
    /// # Errors
    ///
    /// Returns an error if `delta` is not finite.
    pub fn offset_nodes(&mut self, delta: Vector3) -> Result<()> {
        self.stage(|axes| {
            for (axis, curve) in axes.iter_mut().enumerate() {
                for index in 0..curve.len() {
                    let value = curve.key(index)?.value + delta[axis];
                    curve.set_key_value(index, value)?;
                }
            }
            Ok(())
        })
    }

    /// Replaces all nodes with the default straight segment.
    ///
    /// The wrap mode is kept.
    pub fn reset(&mut self) {
        self.axes = Self::with_default_segment().axes;
        debug!("reset path to default segment");
    }

    /// Runs `op` on a copy of the three axes and commits the copy only if `op`
    /// succeeds and the axes are still synchronized.
    fn stage<T>(&mut self, op: impl FnOnce(&mut [KeyframeCurve; 3]) -> Result<T>) -> Result<T> {
        let mut staged = self.axes.clone();
        let out = op(&mut staged)?;
        check_sync(&staged)?;
        self.axes = staged;
        Ok(out)
    }

    fn check_index(&self, index: usize) -> Result<()> {
        let count = self.nodes_no();
        if index >= count {
            return Err(PathError::node_index(index, count).into());
        }
        Ok(())
    }
}

impl Curve for VectorPath {
    fn evaluate(&self, t: f64) -> Result<Point3> {
        self.vector_at_time(t)
    }

    fn tangent(&self, t: f64) -> Result<Vector3> {
        let velocity = self.velocity_at_time(t)?;
        let len = velocity.norm();
        if len < TOLERANCE {
            return Err(GeometryError::ZeroVector.into());
        }
        Ok(velocity / len)
    }

    /// The span between the first and last node times, or `[0, 0]` for an
    /// empty path.
    fn domain(&self) -> CurveDomain {
        let (t_min, t_max) = self.axes[0].time_range().unwrap_or((0.0, 0.0));
        CurveDomain::new(t_min, t_max)
    }

    fn is_closed(&self) -> bool {
        let positions = self.node_positions();
        match (positions.first(), positions.last()) {
            (Some(first), Some(last)) if positions.len() >= MIN_NODES => {
                nalgebra::distance(first, last) < TOLERANCE
            }
            _ => false,
        }
    }
}

fn check_sync(axes: &[KeyframeCurve; 3]) -> Result<()> {
    let [x, y, z] = axes.each_ref().map(KeyframeCurve::keys);
    if x.len() != y.len() || x.len() != z.len() {
        return Err(PathError::Invariant(format!(
            "axis key counts differ ({}, {}, {})",
            x.len(),
            y.len(),
            z.len()
        ))
        .into());
    }
    #[allow(clippy::float_cmp)]
    let desync = x
        .iter()
        .zip(y)
        .zip(z)
        .position(|((x, y), z)| x.time != y.time || x.time != z.time);
    if let Some(index) = desync {
        return Err(PathError::Invariant(format!("axis key times differ at key {index}")).into());
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn three_node_path() -> VectorPath {
        let mut path = VectorPath::from_waypoints(&[
            (0.0, Point3::new(0.0, 0.0, 0.0)),
            (0.5, Point3::new(1.0, 0.0, 0.0)),
            (1.0, Point3::new(3.0, 0.0, 0.0)),
        ])
        .unwrap();
        path.set_nodes_linear();
        path
    }

    fn assert_synchronized(path: &VectorPath) {
        check_sync(&path.axes).unwrap();
    }

    #[test]
    fn default_segment_has_two_linear_nodes() {
        let path = VectorPath::with_default_segment();
        assert_eq!(path.nodes_no(), 2);
        assert_eq!(path.node_timestamps(), vec![0.0, 1.0]);
        let mid = path.vector_at_time(0.5).unwrap();
        assert_relative_eq!(mid, Point3::new(0.5, 0.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn from_axes_rejects_desynchronized_curves() {
        let x = KeyframeCurve::from_keys(vec![Keyframe::new(0.0, 0.0), Keyframe::new(1.0, 1.0)])
            .unwrap();
        let y = KeyframeCurve::from_keys(vec![Keyframe::new(0.0, 0.0), Keyframe::new(0.9, 1.0)])
            .unwrap();
        let err = VectorPath::from_axes([x.clone(), y, x]).unwrap_err();
        assert!(matches!(err.as_path_error(), Some(PathError::Invariant(_))));
    }

    #[test]
    fn vector_at_key_matches_per_axis_evaluation() {
        let path = VectorPath::from_waypoints(&[
            (0.0, Point3::new(0.0, 1.0, 2.0)),
            (0.3, Point3::new(4.0, -1.0, 0.5)),
            (0.7, Point3::new(2.0, 2.0, 2.0)),
            (1.0, Point3::new(-1.0, 0.0, 3.0)),
        ])
        .unwrap();
        for (i, time) in path.node_timestamps().into_iter().enumerate() {
            let at_key = path.vector_at_key(i).unwrap();
            for axis in Axis::ALL {
                assert_relative_eq!(
                    at_key[axis.index()],
                    path.axis(axis).evaluate(time).unwrap(),
                    epsilon = 1e-12
                );
            }
        }
    }

    #[test]
    fn add_node_at_time_preserves_shape() {
        let mut path = three_node_path();
        let before = path.vector_at_time(0.25).unwrap();
        let index = path.add_node_at_time(0.25).unwrap();
        assert_eq!(index, 1);
        assert_eq!(path.nodes_no(), 4);
        assert_relative_eq!(path.vector_at_key(1).unwrap(), before, epsilon = 1e-12);
        assert_relative_eq!(
            path.vector_at_time(0.4).unwrap(),
            Point3::new(0.8, 0.0, 0.0),
            epsilon = 1e-9
        );
        assert_synchronized(&path);
    }

    #[test]
    fn add_node_at_existing_time_is_noop() {
        let mut path = three_node_path();
        let before = path.clone();
        assert_eq!(path.add_node_at_time(0.5).unwrap(), 1);
        assert_eq!(path, before);
    }

    #[test]
    fn add_node_on_empty_path_is_domain_error() {
        let mut path = VectorPath::new();
        let err = path.add_node_at_time(0.5).unwrap_err();
        assert_eq!(err.as_path_error(), Some(&PathError::Domain));
    }

    #[test]
    fn create_node_uses_explicit_position() {
        let mut path = three_node_path();
        let index = path.create_node(0.75, Point3::new(2.0, 5.0, -1.0)).unwrap();
        assert_eq!(index, 2);
        assert_relative_eq!(path.vector_at_key(2).unwrap(), Point3::new(2.0, 5.0, -1.0));
        assert_relative_eq!(path.vector_at_time(0.75).unwrap(), Point3::new(2.0, 5.0, -1.0));
        assert_synchronized(&path);
    }

    #[test]
    fn create_node_rejects_nan_and_leaves_path_unchanged() {
        let mut path = three_node_path();
        let before = path.clone();
        assert!(path.create_node(0.75, Point3::new(1.0, f64::NAN, 0.0)).is_err());
        assert_eq!(path, before);
    }

    #[test]
    fn remove_node_below_minimum_is_invariant_error() {
        let mut path = VectorPath::with_default_segment();
        let before = path.clone();
        let err = path.remove_node(0).unwrap_err();
        assert!(matches!(err.as_path_error(), Some(PathError::Invariant(_))));
        assert_eq!(path, before);
    }

    #[test]
    fn remove_node_out_of_range_is_index_error() {
        let mut path = three_node_path();
        let err = path.remove_node(3).unwrap_err();
        assert!(matches!(
            err.as_path_error(),
            Some(PathError::Index { entity: "node", index: 3, count: 3 })
        ));
    }

    #[test]
    fn remove_node_keeps_axes_synchronized() {
        let mut path = three_node_path();
        path.remove_node(1).unwrap();
        assert_eq!(path.node_timestamps(), vec![0.0, 1.0]);
        assert_synchronized(&path);
    }

    #[test]
    fn move_node_keeps_time() {
        let mut path = three_node_path();
        path.move_node_to_position(1, Point3::new(1.0, 2.0, 3.0)).unwrap();
        let node = path.node(1).unwrap();
        assert_relative_eq!(node.time, 0.5);
        assert_relative_eq!(node.position, Point3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn change_node_timestamp_within_neighbors() {
        let mut path = three_node_path();
        path.change_node_timestamp(1, 0.9).unwrap();
        assert_relative_eq!(path.node(1).unwrap().time, 0.9);
        assert_synchronized(&path);
    }

    #[test]
    fn change_node_timestamp_past_next_node_is_rejected() {
        let mut path = three_node_path();
        let before = path.clone();
        let err = path.change_node_timestamp(1, 1.5).unwrap_err();
        assert!(matches!(err.as_path_error(), Some(PathError::Ordering { index: 1, .. })));
        assert_relative_eq!(path.node(1).unwrap().time, 0.5);
        assert_eq!(path, before);
    }

    #[test]
    fn change_node_timestamps_is_atomic() {
        let mut path = three_node_path();
        path.create_node(0.75, Point3::new(2.0, 0.0, 0.0)).unwrap();
        let before = path.clone();
        assert!(path.change_node_timestamps(&[(1, 0.8), (2, 0.6)]).is_err());
        assert_eq!(path, before);

        path.change_node_timestamps(&[(1, 0.8), (2, 0.9)]).unwrap();
        assert_eq!(path.node_timestamps(), vec![0.0, 0.8, 0.9, 1.0]);
    }

    #[test]
    fn set_nodes_linear_is_idempotent() {
        let mut path = VectorPath::from_waypoints(&[
            (0.0, Point3::new(0.0, 0.0, 0.0)),
            (0.4, Point3::new(1.0, 3.0, 0.0)),
            (1.0, Point3::new(2.0, 0.0, 1.0)),
        ])
        .unwrap();
        path.set_nodes_linear();
        let once = path.clone();
        path.set_nodes_linear();
        assert_eq!(once, path);
    }

    #[test]
    fn smooth_node_tangents_out_of_range() {
        let mut path = three_node_path();
        assert!(path.smooth_node_tangents(5).is_err());
        path.smooth_node_tangents(1).unwrap();
        let node = path.node(1).unwrap();
        assert_relative_eq!(node.in_tangent, Vector3::new(3.0, 0.0, 0.0));
    }

    #[test]
    fn offset_moves_every_node() {
        let mut path = three_node_path();
        path.offset_nodes(Vector3::new(0.0, 1.0, 0.0)).unwrap();
        for position in path.node_positions() {
            assert_relative_eq!(position.y, 1.0);
        }
    }

    #[test]
    fn reset_restores_default_and_keeps_wrap_mode() {
        let mut path = three_node_path();
        path.set_wrap_mode(WrapMode::Loop);
        path.reset();
        assert_eq!(path.node_positions(), vec![DEFAULT_START, DEFAULT_END]);
        assert_eq!(path.wrap_mode(), WrapMode::Loop);
    }

    #[test]
    fn wrap_mode_applies_outside_domain() {
        let mut path = VectorPath::with_default_segment();
        assert_relative_eq!(path.vector_at_time(1.25).unwrap(), DEFAULT_END);
        path.set_wrap_mode(WrapMode::Loop);
        assert_relative_eq!(
            path.vector_at_time(1.25).unwrap(),
            Point3::new(0.25, 0.0, 0.0),
            epsilon = 1e-12
        );
        path.set_wrap_mode(WrapMode::PingPong);
        assert_relative_eq!(
            path.vector_at_time(1.25).unwrap(),
            Point3::new(0.75, 0.0, 0.0),
            epsilon = 1e-12
        );
    }

    #[test]
    fn curve_trait_reports_tangent_and_domain() {
        let path = three_node_path();
        assert_relative_eq!(path.tangent(0.3).unwrap(), Vector3::new(1.0, 0.0, 0.0), epsilon = 1e-12);
        assert_eq!(path.domain(), CurveDomain::new(0.0, 1.0));
        assert!(!path.is_closed());
    }

    #[test]
    fn tangent_of_stationary_path_is_zero_vector_error() {
        let path = VectorPath::from_waypoints(&[(0.0, Point3::origin()), (1.0, Point3::origin())])
            .unwrap();
        assert!(path.tangent(0.5).is_err());
        assert!(path.is_closed());
    }
}
