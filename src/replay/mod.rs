//! Workload replay
//!
//! Feeds a call trace through the evaluator, one fresh warm state per tree.

pub mod runner;
pub mod workload;

pub use runner::{NodeReport, ReplayOutcome, ReplayReport, Replayer};
pub use workload::{Call, FunctionSource, FunctionSpec, ResolvedWorkload, Workload};
