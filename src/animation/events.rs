use slotmap::SlotMap;

slotmap::new_key_type! {
    /// Handle returned when registering a change listener.
    pub struct ListenerId;
}

/// A change made to a path.
///
/// Events carry no payload; listeners re-read whatever they need from the
/// path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PathEvent {
    NodeAdded,
    NodeRemoved,
    NodePositionChanged,
    NodeTimeChanged,
    PathReset,
}

type Listener = Box<dyn FnMut(PathEvent)>;

/// Registered change listeners, called synchronously in registration order.
#[derive(Default)]
pub struct Listeners {
    entries: SlotMap<ListenerId, Listener>,
    order: Vec<ListenerId>,
}

impl Listeners {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `listener` and returns its handle.
    pub fn subscribe(&mut self, listener: impl FnMut(PathEvent) + 'static) -> ListenerId {
        let id = self.entries.insert(Box::new(listener));
        self.order.push(id);
        id
    }

    /// Removes a listener. Returns `false` if the handle was unknown.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        if self.entries.remove(id).is_none() {
            return false;
        }
        self.order.retain(|&other| other != id);
        true
    }

    /// Number of registered listeners.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns whether no listener is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Delivers `event` to every listener.
    pub fn notify(&mut self, event: PathEvent) {
        for id in &self.order {
            if let Some(listener) = self.entries.get_mut(*id) {
                listener(event);
            }
        }
    }

    /// Drops every listener.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }
}

impl std::fmt::Debug for Listeners {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Listeners")
            .field("count", &self.entries.len())
            .finish()
    }
}
