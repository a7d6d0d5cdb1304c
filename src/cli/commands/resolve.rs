//! Resolve command - install dependencies when the manifest changed

use crate::cli::args::ResolveArgs;
use crate::config::Config;
use crate::engine::EngineHost;
use crate::error::JsDepsResult;
use crate::resolve::{DependencyResolver, ResolutionKind, ResolveSettings};
use crate::ui::{TaskSpinner, UiContext};
use std::path::Path;

/// Execute the resolve command
pub async fn execute(args: ResolveArgs, config: &Config, project: &Path) -> JsDepsResult<()> {
    let mut config = config.clone();
    if args.embedded {
        config.install.integrated = false;
    } else if args.integrated {
        config.install.integrated = true;
    }
    if let Some(secs) = args.timeout {
        config.install.timeout_secs = secs;
    }

    let settings = ResolveSettings::from_config(&config, project).with_engine_override(args.engine);
    let (runner, selector) = super::engine_stack();
    let host = EngineHost::with_processes(config.engine.workers);
    let resolver = DependencyResolver::new(settings, selector, host).with_runner(runner);

    let ctx = UiContext::detect();
    let mut spinner = TaskSpinner::new(&ctx);
    spinner.start(&format!("Resolving dependencies in {}", project.display()));

    match resolver.resolve().await {
        Ok(resolution) => {
            let message = match resolution.kind {
                ResolutionKind::NoManifest => {
                    "No manifest found, module directory removed".to_string()
                }
                ResolutionKind::CacheHit => format!(
                    "Dependencies up to date ({} files)",
                    resolution.outcome.len()
                ),
                ResolutionKind::Installed => format!(
                    "Dependencies installed ({} files)",
                    resolution.outcome.len()
                ),
            };
            spinner.stop(&message);
            Ok(())
        }
        Err(e) => {
            spinner.stop_error("Dependency resolution failed");
            Err(e)
        }
    }
}
