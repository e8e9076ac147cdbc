//! Report rendering: stdout text / JSON and the PNG figures.

pub mod charts;
pub mod generator;

pub use charts::write_charts;
pub use generator::{render_json, render_text};
