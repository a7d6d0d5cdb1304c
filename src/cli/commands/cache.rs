//! Cache command - inspect or clear the resolution cache

use crate::cache::{CacheRecord, CacheState};
use crate::cli::args::{CacheAction, CacheArgs};
use crate::config::Config;
use crate::error::JsDepsResult;
use crate::resolve::{ResolutionOutcome, ResolveSettings};
use crate::ui::{self, UiContext};
use console::style;
use std::path::Path;

/// Execute the cache command
pub async fn execute(args: CacheArgs, config: &Config, project: &Path) -> JsDepsResult<()> {
    let settings = ResolveSettings::from_config(config, project);

    match args.action {
        CacheAction::Status => show_status(&settings).await,
        CacheAction::Clear => clear(&settings).await,
    }
}

async fn show_status(settings: &ResolveSettings) -> JsDepsResult<()> {
    let ctx = UiContext::detect();
    let gate = settings.gate();

    ui::section(&ctx, "Resolution cache");
    ui::key_value(&ctx, "project", &settings.project_root.display().to_string());
    ui::key_value(&ctx, "record", &gate.location().display().to_string());

    if !settings.manifest.is_file() {
        ui::step_warn_hint(
            &ctx,
            "No manifest",
            &format!("{} does not exist", settings.manifest.display()),
        );
        return Ok(());
    }

    let state = gate
        .state::<_, ResolutionOutcome>(settings.manifest.as_path())
        .await?;
    let styled = match state {
        CacheState::Fresh => style(state.to_string()).green(),
        CacheState::Absent => style(state.to_string()).dim(),
        _ => style(state.to_string()).yellow(),
    };
    ui::key_value(&ctx, "state", &styled.to_string());

    if let Some(record) = gate.load::<ResolutionOutcome>().await? {
        print_record(&ctx, &record);
    }

    if state.is_fresh() {
        ui::remark(&ctx, "Next resolve will be skipped");
    } else {
        ui::remark(&ctx, "Next resolve will run the install");
    }

    Ok(())
}

fn print_record(ctx: &UiContext, record: &CacheRecord<ResolutionOutcome>) {
    ui::key_value(ctx, "fingerprint", record.fingerprint.short());
    ui::key_value(
        ctx,
        "recorded",
        &record.recorded_at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
    );
    ui::key_value(ctx, "files", &record.output.len().to_string());
    ui::key_value(ctx, "version", &record.tool_version);
}

async fn clear(settings: &ResolveSettings) -> JsDepsResult<()> {
    let ctx = UiContext::detect();
    if settings.gate().clear().await? {
        ui::step_ok(&ctx, "Cache record removed");
    } else {
        ui::step_info(&ctx, "No cache record to remove");
    }
    Ok(())
}
