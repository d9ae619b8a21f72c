use thiserror::Error;

/// Top-level error type for the motion path engine.
#[derive(Debug, Error)]
pub enum MotionPathError {
    #[error(transparent)]
    Path(#[from] PathError),

    #[error(transparent)]
    Geometry(#[from] GeometryError),
}

/// Contract violations raised by curve and path operations.
///
/// All of these are deterministic: retrying the same call on the same data
/// fails the same way.
#[derive(Debug, Error, PartialEq)]
pub enum PathError {
    #[error("cannot evaluate a curve with no keys")]
    Domain,

    #[error("{entity} index {index} is out of range (count {count})")]
    Index {
        entity: &'static str,
        index: usize,
        count: usize,
    },

    #[error("invariant violated: {0}")]
    Invariant(String),

    #[error("time {time} for key {index} breaks key ordering")]
    Ordering { index: usize, time: f64 },

    #[error("degenerate input: {0}")]
    DegenerateInput(String),
}

/// Errors related to geometric computations.
#[derive(Debug, Error, PartialEq)]
pub enum GeometryError {
    #[error("zero-length vector")]
    ZeroVector,

    #[error("non-finite value for {0}")]
    NonFinite(&'static str),
}

/// Convenience type alias for results using [`MotionPathError`].
pub type Result<T> = std::result::Result<T, MotionPathError>;

impl MotionPathError {
    /// Returns the path contract error, if this is one.
    #[must_use]
    pub fn as_path_error(&self) -> Option<&PathError> {
        match self {
            Self::Path(err) => Some(err),
            Self::Geometry(_) => None,
        }
    }
}

impl PathError {
    pub(crate) fn node_index(index: usize, count: usize) -> Self {
        Self::Index {
            entity: "node",
            index,
            count,
        }
    }

    pub(crate) fn key_index(index: usize, count: usize) -> Self {
        Self::Index {
            entity: "key",
            index,
            count,
        }
    }
}
