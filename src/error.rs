//! Error types for the zygote simulator
//!
//! All modules use `ZygoteResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for simulator operations
pub type ZygoteResult<T> = Result<T, ZygoteError>;

/// All errors that can occur while building or evaluating a cost model
#[derive(Error, Debug)]
pub enum ZygoteError {
    // Manifest errors
    #[error("Invalid manifest: {0}")]
    InvalidManifest(String),

    #[error("Invalid package reference '{0}': expected name==version")]
    InvalidPackage(String),

    // Cost model errors
    #[error("No cost table entry for {0}")]
    CostTableMiss(String),

    #[error("No cache node can serve requirement set [{requirements}]")]
    NoMatchingNode { requirements: String },

    #[error("Cost mismatch at node {node}: lookup computed {lookup_ms}ms, serve computed {serve_ms}ms")]
    CostMismatch {
        node: usize,
        lookup_ms: f64,
        serve_ms: f64,
    },

    #[error("Invalid tree description at {path}: {reason}")]
    InvalidTree { path: PathBuf, reason: String },

    // Workload errors
    #[error("Workload call {index} names unknown function '{name}'")]
    UnknownFunction { index: usize, name: String },

    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    // General errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    User(String),
}

impl ZygoteError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::CostTableMiss(_) => {
                Some("Measure the package and add it to the cost table before simulating")
            }
            Self::NoMatchingNode { .. } => {
                Some("Give the tree a root with no packages so every request has a fallback")
            }
            Self::CostMismatch { .. } => Some("This is a bug in the evaluator, please report it"),
            Self::InvalidPackage(_) => Some("Packages are written as name==version"),
            _ => None,
        }
    }
}
