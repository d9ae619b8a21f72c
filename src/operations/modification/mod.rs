mod distribute_timestamps;

pub use distribute_timestamps::{DistributeTimestamps, Distribution};
