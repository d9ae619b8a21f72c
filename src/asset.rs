use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::geometry::{Axis, KeyframeCurve, VectorPath, WrapMode};

/// Raw per-axis keyframe arrays as supplied by a host when loading a path.
///
/// The crate does not define a file format; hosts pick one through serde.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PathAsset {
    pub x: KeyframeCurve,
    pub y: KeyframeCurve,
    pub z: KeyframeCurve,
    #[serde(default)]
    pub wrap_mode: WrapMode,
}

impl PathAsset {
    /// Captures a path's curves and wrap mode.
    #[must_use]
    pub fn from_path(path: &VectorPath) -> Self {
        Self {
            x: path.axis(Axis::X).clone(),
            y: path.axis(Axis::Y).clone(),
            z: path.axis(Axis::Z).clone(),
            wrap_mode: path.wrap_mode(),
        }
    }

    /// Validates the arrays and builds a path.
    ///
    /// # Errors
    ///
    /// Returns [`crate::PathError::Invariant`] if the three axes do not share
    /// key counts and key times.
    pub fn into_path(self) -> Result<VectorPath> {
        let mut path = VectorPath::from_axes([self.x, self.y, self.z])?;
        path.set_wrap_mode(self.wrap_mode);
        Ok(path)
    }
}
