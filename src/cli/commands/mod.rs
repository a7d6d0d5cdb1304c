//! CLI command implementations

pub mod cache;
pub mod completions;
pub mod config;
pub mod engine;
pub mod resolve;

pub use cache::execute as cache;
pub use completions::execute as completions;
pub use config::execute as config;
pub use engine::execute as engine;
pub use resolve::execute as resolve;

use crate::engine::{EngineContext, EngineSelector};
use crate::process::{CommandRunner, SystemRunner};
use std::sync::Arc;

/// Runner and selector sharing one process-wide engine context
fn engine_stack() -> (Arc<dyn CommandRunner>, EngineSelector) {
    let runner: Arc<dyn CommandRunner> = Arc::new(SystemRunner::new());
    let context = Arc::new(EngineContext::with_runner(Arc::clone(&runner)));
    (runner, EngineSelector::new(context))
}
