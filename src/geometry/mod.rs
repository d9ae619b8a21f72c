pub mod curve;
pub mod path;

pub use curve::{Curve, CurveDomain, Keyframe, KeyframeCurve, WrapMode};
pub use path::{Axis, Node, VectorPath};
