//! Command-line interface

pub mod args;
pub mod commands;

pub use args::{Cli, Commands};

use crate::error::{JsDepsError, JsDepsResult};
use std::path::PathBuf;

/// Project root from `--project`, or the current directory
pub fn project_dir(project: Option<PathBuf>) -> JsDepsResult<PathBuf> {
    match project {
        Some(path) => Ok(path.canonicalize().unwrap_or(path)),
        None => std::env::current_dir().map_err(|e| JsDepsError::io("getting current directory", e)),
    }
}
