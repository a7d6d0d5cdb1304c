//! jsdeps - cached JavaScript dependency resolution
//!
//! Installs the packages declared in a project's `package.json` before
//! downstream build steps run, and skips the install while the manifest is
//! unchanged since the last successful one. Installs run either through the
//! natively installed package manager or by running the package manager's
//! own JS entry point on a selectable JavaScript engine.

pub mod cache;
pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod platform;
pub mod process;
pub mod report;
pub mod resolve;
pub mod ui;

pub use error::{JsDepsError, JsDepsResult};
pub use resolve::{DependencyResolver, Resolution, ResolutionKind, ResolveSettings};
