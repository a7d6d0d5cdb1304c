//! jsdeps - cached JavaScript dependency resolution
//!
//! CLI entry point that dispatches to subcommands.

use clap::Parser;
use console::style;
use jsdeps::cli::{self, Cli, Commands};
use jsdeps::config::{Config, ConfigManager};
use jsdeps::error::JsDepsResult;
use jsdeps::report::INSTALL_TARGET;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> JsDepsResult<()> {
    let cli = Cli::parse();

    if let Commands::Completions { shell } = cli.command {
        return cli::commands::completions(shell);
    }

    let project = cli::project_dir(cli.project.clone())?;

    let config_manager = match cli.config {
        Some(ref path) => ConfigManager::with_path(path.clone()),
        None => ConfigManager::new(),
    };
    let local_config = if cli.no_local {
        None
    } else {
        ConfigManager::find_local_config(&project)
    };
    let config = config_manager.load_merged(local_config.as_deref()).await?;

    init_logging(cli.verbose, &config);
    if let Some(path) = &local_config {
        debug!("Using local config: {}", path.display());
    }

    match cli.command {
        Commands::Completions { .. } => unreachable!("Completions handled above"),
        Commands::Resolve(args) => cli::commands::resolve(args, &config, &project).await,
        Commands::Engine(args) => cli::commands::engine(args, &config).await,
        Commands::Cache(args) => cli::commands::cache(args, &config, &project).await,
        Commands::Config(args) => {
            cli::commands::config(args, &config, &config_manager, &project).await
        }
    }
}

/// 0 = warn, 1 = info, 2+ = debug. Package manager output is always shown.
fn init_logging(verbose: u8, config: &Config) {
    let level = match (verbose, config.general.verbose) {
        (0, false) => "warn",
        (0, true) | (1, _) => "info",
        _ => "debug",
    };
    let filter = EnvFilter::new(format!("jsdeps={},{}=info", level, INSTALL_TARGET));

    if config.general.log_format == "json" {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .without_time()
            .init();
    }
}
