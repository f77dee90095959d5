//! Terminal output helpers
//!
//! Styled output with `console`, spinners and bars with `indicatif`, and a
//! plain fallback when stdout is not a terminal or when running in CI.
//!
//! # Example
//!
//! ```rust,ignore
//! use zygote_sim::ui::{self, UiContext, TaskSpinner};
//!
//! let ctx = UiContext::detect();
//!
//! let mut spinner = TaskSpinner::new(&ctx);
//! spinner.start("Replaying workload...");
//! // ... do work ...
//! spinner.stop("Replayed 3 trees");
//!
//! ui::step_warn_hint(&ctx, "2 manifests skipped", "Run with -v for details");
//! ```

mod context;
mod output;
mod progress;

pub use context::UiContext;
pub use output::{intro, key_value, remark, section, step_ok, step_ok_detail, step_warn_hint};
pub use progress::{BatchProgress, TaskSpinner};
