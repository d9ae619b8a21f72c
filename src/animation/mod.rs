//! Editing and preview surface built on top of [`crate::geometry::VectorPath`].

mod animation_path;
mod animator;
mod events;
mod node_events;

pub use animation_path::{AnimationPath, Lifecycle};
pub use animator::{AnimatorSettings, PathAnimator};
pub use events::{ListenerId, Listeners, PathEvent};
pub use node_events::{NodeEventContext, NodeEventId, NodeEventTable};
