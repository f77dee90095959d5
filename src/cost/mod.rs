//! Per-package import costs
//!
//! The cost table is measured outside the simulator and loaded once before
//! any run; it is never mutated afterwards.

pub mod table;

pub use table::{CostSource, CostTable, PackageCost};
