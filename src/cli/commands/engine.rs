//! Engine command - show the engine an embedded install would use

use crate::cli::args::EngineArgs;
use crate::config::Config;
use crate::engine::{EngineSelector, ProbeOutcome};
use crate::error::JsDepsResult;
use crate::ui::{self, UiContext};

/// Execute the engine command
pub async fn execute(args: EngineArgs, config: &Config) -> JsDepsResult<()> {
    let ctx = UiContext::detect();
    let (_, selector) = super::engine_stack();

    let requested = EngineSelector::configured_kind(&config.engine, args.engine.as_deref());
    let engine = selector
        .resolve_configured(&config.engine, args.engine.as_deref())
        .await?;

    ui::section(&ctx, "Engine");
    ui::key_value(&ctx, "requested", requested.as_str());
    ui::key_value(&ctx, "resolved", engine.kind().as_str());
    if let Some(command) = engine.command() {
        ui::key_value(&ctx, "command", &command.display().to_string());
    }
    for (key, value) in engine.env() {
        ui::key_value(&ctx, "env", &format!("{}={}", key, value));
    }

    match selector.context().probed() {
        Some(ProbeOutcome::Available { version: Some(v) }) => {
            ui::key_value(&ctx, "node", &format!("v{}", v))
        }
        Some(ProbeOutcome::Available { version: None }) => ui::key_value(&ctx, "node", "found"),
        Some(ProbeOutcome::Unavailable { reason }) => {
            ui::key_value(&ctx, "node", &format!("not found ({})", reason))
        }
        None => {}
    }

    Ok(())
}
