//! Motion path data model and arc-length sampling engine.
//!
//! A [`geometry::VectorPath`] is built from three synchronized
//! [`geometry::KeyframeCurve`]s, one per axis. Sampling, length queries and
//! timestamp redistribution live under [`tessellation`] and [`operations`];
//! [`animation`] adds change notification, node callbacks and preview
//! playback for editor hosts.

pub mod animation;
pub mod asset;
pub mod error;
pub mod geometry;
pub mod math;
pub mod operations;
pub mod tessellation;

pub use error::{MotionPathError, PathError, Result};
