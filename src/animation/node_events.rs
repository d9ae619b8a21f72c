use slotmap::SlotMap;

use crate::error::Result;
use crate::geometry::VectorPath;
use crate::math::Point3;

slotmap::new_key_type! {
    /// Handle returned when registering a node callback.
    pub struct NodeEventId;
}

/// What a node callback is told when its node is reached.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeEventContext {
    pub node: usize,
    pub time: f64,
    pub position: Point3,
}

type NodeCallback = Box<dyn FnMut(&NodeEventContext)>;

struct NodeEvent {
    node: usize,
    callback: NodeCallback,
}

/// Callbacks keyed by node index.
///
/// Indices follow node insertions and removals made through
/// [`crate::animation::AnimationPath`], so a callback stays attached to the
/// same waypoint while the path is edited.
#[derive(Default)]
pub struct NodeEventTable {
    events: SlotMap<NodeEventId, NodeEvent>,
}

impl NodeEventTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches `callback` to node `node`.
    pub fn register(
        &mut self,
        node: usize,
        callback: impl FnMut(&NodeEventContext) + 'static,
    ) -> NodeEventId {
        self.events.insert(NodeEvent {
            node,
            callback: Box::new(callback),
        })
    }

    /// Detaches a callback. Returns `false` if the handle was unknown.
    pub fn unregister(&mut self, id: NodeEventId) -> bool {
        self.events.remove(id).is_some()
    }

    /// Node index a callback is attached to.
    #[must_use]
    pub fn node_of(&self, id: NodeEventId) -> Option<usize> {
        self.events.get(id).map(|event| event.node)
    }

    /// Number of registered callbacks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Returns whether no callback is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Drops every callback.
    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// Shifts callbacks after a node was inserted at `index`.
    pub(crate) fn node_inserted(&mut self, index: usize) {
        for event in self.events.values_mut() {
            if event.node >= index {
                event.node += 1;
            }
        }
    }

    /// Drops callbacks of a removed node and shifts the ones after it.
    pub(crate) fn node_removed(&mut self, index: usize) {
        self.events.retain(|_, event| event.node != index);
        for event in self.events.values_mut() {
            if event.node > index {
                event.node -= 1;
            }
        }
    }

    /// Fires callbacks for nodes passed while moving from time `from` to time
    /// `to`, in travel order.
    ///
    /// A node at `to` counts as passed; a node at `from` only when
    /// `include_from` is set. Travel may go backwards (`to < from`). Returns
    /// the number of callbacks invoked.
    ///
    /// # Errors
    ///
    /// Returns an error if a node position cannot be read.
    pub fn fire_range(
        &mut self,
        path: &VectorPath,
        from: f64,
        to: f64,
        include_from: bool,
    ) -> Result<usize> {
        if self.events.is_empty() {
            return Ok(0);
        }
        let forward = to >= from;
        let passed = |time: f64| {
            let after_start = if forward { time > from } else { time < from };
            let before_end = if forward { time <= to } else { time >= to };
            #[allow(clippy::float_cmp)]
            let at_start = include_from && time == from;
            (after_start && before_end) || at_start
        };

        let mut nodes: Vec<usize> = path
            .node_timestamps()
            .iter()
            .enumerate()
            .filter(|&(_, &time)| passed(time))
            .map(|(index, _)| index)
            .collect();
        if !forward {
            nodes.reverse();
        }

        let mut fired = 0;
        for node in nodes {
            let view = path.node(node)?;
            let context = NodeEventContext {
                node,
                time: view.time,
                position: view.position,
            };
            for event in self.events.values_mut().filter(|event| event.node == node) {
                (event.callback)(&context);
                fired += 1;
            }
        }
        Ok(fired)
    }
}

impl std::fmt::Debug for NodeEventTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeEventTable")
            .field("count", &self.events.len())
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn four_node_path() -> VectorPath {
        VectorPath::from_waypoints(&[
            (0.0, Point3::new(0.0, 0.0, 0.0)),
            (0.25, Point3::new(1.0, 0.0, 0.0)),
            (0.5, Point3::new(2.0, 0.0, 0.0)),
            (1.0, Point3::new(3.0, 0.0, 0.0)),
        ])
        .unwrap()
    }

    fn recording_table(nodes: &[usize]) -> (NodeEventTable, Rc<RefCell<Vec<usize>>>) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut table = NodeEventTable::new();
        for &node in nodes {
            let log = Rc::clone(&log);
            table.register(node, move |ctx| log.borrow_mut().push(ctx.node));
        }
        (table, log)
    }

    #[test]
    fn forward_range_is_half_open() {
        let path = four_node_path();
        let (mut table, log) = recording_table(&[0, 1, 2, 3]);
        assert_eq!(table.fire_range(&path, 0.0, 0.5, false).unwrap(), 2);
        assert_eq!(*log.borrow(), vec![1, 2]);
    }

    #[test]
    fn include_from_fires_start_node() {
        let path = four_node_path();
        let (mut table, log) = recording_table(&[0, 1]);
        table.fire_range(&path, 0.0, 0.1, true).unwrap();
        assert_eq!(*log.borrow(), vec![0]);
    }

    #[test]
    fn backward_range_fires_in_travel_order() {
        let path = four_node_path();
        let (mut table, log) = recording_table(&[0, 1, 2, 3]);
        table.fire_range(&path, 1.0, 0.2, false).unwrap();
        assert_eq!(*log.borrow(), vec![2, 1]);
    }

    #[test]
    fn context_reports_node_position() {
        let path = four_node_path();
        let seen = Rc::new(RefCell::new(None));
        let mut table = NodeEventTable::new();
        {
            let seen = Rc::clone(&seen);
            table.register(2, move |ctx| *seen.borrow_mut() = Some(*ctx));
        }
        table.fire_range(&path, 0.3, 0.6, false).unwrap();
        let ctx = seen.borrow().unwrap();
        assert_eq!(ctx.node, 2);
        assert!((ctx.time - 0.5).abs() < f64::EPSILON);
        assert_eq!(ctx.position, Point3::new(2.0, 0.0, 0.0));
    }

    #[test]
    fn indices_follow_insertions_and_removals() {
        let (mut table, _) = recording_table(&[]);
        let first = table.register(1, |_| {});
        let second = table.register(2, |_| {});
        table.node_inserted(2);
        assert_eq!(table.node_of(first), Some(1));
        assert_eq!(table.node_of(second), Some(3));
        table.node_removed(1);
        assert_eq!(table.node_of(first), None);
        assert_eq!(table.node_of(second), Some(2));
        assert_eq!(table.len(), 1);
    }
}
