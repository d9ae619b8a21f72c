mod length;

pub use length::{CurvedLength, LinearLength, SectionCurvedLength};
