use tracing::debug;

use crate::asset::PathAsset;
use crate::error::{PathError, Result};
use crate::geometry::{VectorPath, WrapMode};
use crate::math::{Point3, Vector3};
use crate::operations::modification::{DistributeTimestamps, Distribution};
use crate::tessellation::SamplingParams;

use super::events::{ListenerId, Listeners, PathEvent};
use super::node_events::{NodeEventContext, NodeEventId, NodeEventTable};

/// Lifecycle stage of an [`AnimationPath`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    /// Created, not yet initialized.
    Created,
    /// Initialized and accepting edits.
    Active,
    /// Disposed; all edits are rejected.
    Disposed,
}

/// An editable motion path with change notification and node callbacks.
///
/// This is the surface editor tools and preview code talk to. Each mutation
/// is forwarded to the underlying [`VectorPath`]; on success the matching
/// [`PathEvent`] is delivered to every listener, on failure nothing changes
/// and no event is sent.
#[derive(Debug)]
pub struct AnimationPath {
    path: VectorPath,
    listeners: Listeners,
    node_events: NodeEventTable,
    lifecycle: Lifecycle,
}

impl Default for AnimationPath {
    fn default() -> Self {
        Self::new(VectorPath::new())
    }
}

impl AnimationPath {
    /// Wraps `path`. Call [`Self::initialize`] before editing.
    #[must_use]
    pub fn new(path: VectorPath) -> Self {
        Self {
            path,
            listeners: Listeners::new(),
            node_events: NodeEventTable::new(),
            lifecycle: Lifecycle::Created,
        }
    }

    /// Builds an initialized path from host-supplied keyframe arrays.
    ///
    /// # Errors
    ///
    /// Returns an error if the asset's axes are not synchronized.
    pub fn from_asset(asset: PathAsset) -> Result<Self> {
        let mut path = Self::new(asset.into_path()?);
        path.initialize();
        Ok(path)
    }

    /// Activates the path, replacing an empty path with the default segment.
    ///
    /// Calling this on an active path does nothing.
    pub fn initialize(&mut self) {
        if self.lifecycle != Lifecycle::Created {
            return;
        }
        self.lifecycle = Lifecycle::Active;
        if self.path.nodes_no() < crate::geometry::path::MIN_NODES {
            self.path.reset();
            self.listeners.notify(PathEvent::PathReset);
        }
        debug!(nodes = self.path.nodes_no(), "initialized animation path");
    }

    /// Drops every listener and node callback and rejects further edits.
    pub fn dispose(&mut self) {
        self.listeners.clear();
        self.node_events.clear();
        self.lifecycle = Lifecycle::Disposed;
        debug!("disposed animation path");
    }

    /// Current lifecycle stage.
    #[must_use]
    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    /// The underlying path.
    #[must_use]
    pub fn path(&self) -> &VectorPath {
        &self.path
    }

    /// Snapshot of the path as host-persistable keyframe arrays.
    #[must_use]
    pub fn to_asset(&self) -> PathAsset {
        PathAsset::from_path(&self.path)
    }

    // --- Listeners ---

    /// Registers a change listener.
    pub fn subscribe(&mut self, listener: impl FnMut(PathEvent) + 'static) -> ListenerId {
        self.listeners.subscribe(listener)
    }

    /// Removes a change listener.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.listeners.unsubscribe(id)
    }

    // --- Node callbacks ---

    /// Attaches a callback to node `node`.
    ///
    /// # Errors
    ///
    /// Returns [`PathError::Index`] if `node` is out of range.
    pub fn register_node_event(
        &mut self,
        node: usize,
        callback: impl FnMut(&NodeEventContext) + 'static,
    ) -> Result<NodeEventId> {
        self.path.node(node)?;
        Ok(self.node_events.register(node, callback))
    }

    /// Detaches a node callback.
    pub fn unregister_node_event(&mut self, id: NodeEventId) -> bool {
        self.node_events.unregister(id)
    }

    /// The node callback table.
    #[must_use]
    pub fn node_events(&self) -> &NodeEventTable {
        &self.node_events
    }

    /// Fires node callbacks passed between two path times.
    ///
    /// # Errors
    ///
    /// See [`NodeEventTable::fire_range`].
    pub fn fire_node_events(&mut self, from: f64, to: f64, include_from: bool) -> Result<usize> {
        self.node_events.fire_range(&self.path, from, to, include_from)
    }

    // --- Queries ---

    /// Number of nodes.
    #[must_use]
    pub fn nodes_no(&self) -> usize {
        self.path.nodes_no()
    }

    /// Every node position in order.
    #[must_use]
    pub fn node_positions(&self) -> Vec<Point3> {
        self.path.node_positions()
    }

    /// Every node timestamp in order.
    #[must_use]
    pub fn node_timestamps(&self) -> Vec<f64> {
        self.path.node_timestamps()
    }

    /// Evaluates the path at `t`.
    ///
    /// # Errors
    ///
    /// Returns [`PathError::Domain`] if the path has no nodes.
    pub fn vector_at_time(&self, t: f64) -> Result<Point3> {
        self.path.vector_at_time(t)
    }

    // --- Mutations ---

    /// Adds a node at `position` and time `t`; see [`VectorPath::create_node`].
    ///
    /// # Errors
    ///
    /// Fails on a non-active path or invalid input.
    pub fn create_node(&mut self, t: f64, position: Point3) -> Result<usize> {
        self.ensure_active()?;
        let before = self.path.nodes_no();
        let index = self.path.create_node(t, position)?;
        if self.path.nodes_no() > before {
            self.node_events.node_inserted(index);
            self.listeners.notify(PathEvent::NodeAdded);
        } else {
            self.listeners.notify(PathEvent::NodePositionChanged);
        }
        Ok(index)
    }

    /// Adds a node at `t` on the current path shape; see
    /// [`VectorPath::add_node_at_time`].
    ///
    /// # Errors
    ///
    /// Fails on a non-active or empty path.
    pub fn create_node_at_time(&mut self, t: f64) -> Result<usize> {
        self.ensure_active()?;
        let before = self.path.nodes_no();
        let index = self.path.add_node_at_time(t)?;
        if self.path.nodes_no() > before {
            self.node_events.node_inserted(index);
            self.listeners.notify(PathEvent::NodeAdded);
        }
        Ok(index)
    }

    /// Removes node `index`.
    ///
    /// # Errors
    ///
    /// See [`VectorPath::remove_node`].
    pub fn remove_node(&mut self, index: usize) -> Result<()> {
        self.ensure_active()?;
        self.path.remove_node(index)?;
        self.node_events.node_removed(index);
        self.listeners.notify(PathEvent::NodeRemoved);
        Ok(())
    }

    /// Moves node `index` to `position`.
    ///
    /// # Errors
    ///
    /// See [`VectorPath::move_node_to_position`].
    pub fn move_node_to_position(&mut self, index: usize, position: Point3) -> Result<()> {
        self.ensure_active()?;
        self.path.move_node_to_position(index, position)?;
        self.listeners.notify(PathEvent::NodePositionChanged);
        Ok(())
    }

    /// Translates every node by `delta`.
    ///
    /// # Errors
    ///
    /// See [`VectorPath::offset_nodes`].
    pub fn offset_nodes(&mut self, delta: Vector3) -> Result<()> {
        self.ensure_active()?;
        self.path.offset_nodes(delta)?;
        self.listeners.notify(PathEvent::NodePositionChanged);
        Ok(())
    }

    /// Changes the time of node `index`.
    ///
    /// # Errors
    ///
    /// See [`VectorPath::change_node_timestamp`].
    pub fn change_node_timestamp(&mut self, index: usize, new_time: f64) -> Result<()> {
        self.ensure_active()?;
        self.path.change_node_timestamp(index, new_time)?;
        self.listeners.notify(PathEvent::NodeTimeChanged);
        Ok(())
    }

    /// Makes every segment straight.
    ///
    /// # Errors
    ///
    /// Fails on a non-active path.
    pub fn set_nodes_linear(&mut self) -> Result<()> {
        self.ensure_active()?;
        self.path.set_nodes_linear();
        self.listeners.notify(PathEvent::NodePositionChanged);
        Ok(())
    }

    /// Smooths the tangents of node `index`.
    ///
    /// # Errors
    ///
    /// See [`VectorPath::smooth_node_tangents`].
    pub fn smooth_node_tangents(&mut self, index: usize) -> Result<()> {
        self.ensure_active()?;
        self.path.smooth_node_tangents(index)?;
        self.listeners.notify(PathEvent::NodePositionChanged);
        Ok(())
    }

    /// Smooths the tangents of every node.
    ///
    /// # Errors
    ///
    /// Fails on a non-active path.
    pub fn smooth_all_node_tangents(&mut self) -> Result<()> {
        self.ensure_active()?;
        self.path.smooth_all_node_tangents()?;
        self.listeners.notify(PathEvent::NodePositionChanged);
        Ok(())
    }

    /// Re-times interior nodes by arc length; see [`DistributeTimestamps`].
    ///
    /// # Errors
    ///
    /// See [`DistributeTimestamps::execute`].
    pub fn distribute_timestamps(&mut self, params: SamplingParams) -> Result<Distribution> {
        self.ensure_active()?;
        let distribution = DistributeTimestamps::new(params).execute(&mut self.path)?;
        if distribution.updated > 0 {
            self.listeners.notify(PathEvent::NodeTimeChanged);
        }
        Ok(distribution)
    }

    /// Sets the policy for queries outside the node time range.
    pub fn set_wrap_mode(&mut self, mode: WrapMode) {
        self.path.set_wrap_mode(mode);
    }

    /// Replaces all nodes with the default straight segment and drops every
    /// node callback.
    ///
    /// # Errors
    ///
    /// Fails on a non-active path.
    pub fn reset(&mut self) -> Result<()> {
        self.ensure_active()?;
        self.path.reset();
        self.node_events.clear();
        self.listeners.notify(PathEvent::PathReset);
        Ok(())
    }

    fn ensure_active(&self) -> Result<()> {
        match self.lifecycle {
            Lifecycle::Active => Ok(()),
            Lifecycle::Created => {
                Err(PathError::Invariant("animation path is not initialized".into()).into())
            }
            Lifecycle::Disposed => {
                Err(PathError::Invariant("animation path has been disposed".into()).into())
            }
        }
    }
}
