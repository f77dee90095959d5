//! Zygote - cache-tree cost simulator
//!
//! Parses pinned dependency manifests into dependency graphs and prices
//! serverless invocations against trees of pre-warmed "zygote" processes.

pub mod cli;
pub mod config;
pub mod cost;
pub mod deps;
pub mod error;
pub mod eval;
pub mod manifest;
pub mod package;
pub mod replay;
pub mod tree;
pub mod ui;

pub use error::{ZygoteError, ZygoteResult};
