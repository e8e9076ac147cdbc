//! Analysis modules.
//!
//! Grouping, slicing, smoothing, summary statistics and significance
//! testing over a loaded [`crate::models::WalkingTable`].

pub mod aggregator;
pub mod significance;
pub mod slicer;
pub mod summary;
pub mod trend;

