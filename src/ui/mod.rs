//! Terminal output for the CLI
//!
//! Decorated output and spinners in an interactive terminal; plain,
//! prefix-tagged lines in CI and when output is piped.

mod context;
mod output;
mod progress;

pub use context::UiContext;
pub use output::{key_value, remark, section, step_info, step_ok, step_ok_detail, step_warn_hint};
pub use progress::TaskSpinner;
