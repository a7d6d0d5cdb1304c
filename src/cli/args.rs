//! CLI argument definitions using clap derive

use crate::config::ENGINE_ENV_VAR;
use clap::{ArgAction, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

/// jsdeps - cached JavaScript dependency resolution
///
/// Installs the packages declared in a project's manifest, skipping the
/// install when the manifest has not changed since the last success.
#[derive(Parser, Debug)]
#[command(name = "jsdeps")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "JSDEPS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Project directory (defaults to current directory)
    #[arg(short, long, global = true)]
    pub project: Option<PathBuf>,

    /// Skip project-local jsdeps.toml
    #[arg(long, global = true)]
    pub no_local: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Install the project's dependencies if the manifest changed
    Resolve(ResolveArgs),

    /// Show which JavaScript engine would be used
    Engine(EngineArgs),

    /// Inspect or clear the resolution cache
    Cache(CacheArgs),

    /// Show or edit configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions {
        /// Target shell
        shell: Shell,
    },
}

/// Arguments for the resolve command
#[derive(Parser, Debug, Default)]
pub struct ResolveArgs {
    /// Engine kind for embedded installs (overrides engine.kind)
    #[arg(long, env = ENGINE_ENV_VAR)]
    pub engine: Option<String>,

    /// Run the package manager's entry point on an engine
    #[arg(long, conflicts_with = "integrated")]
    pub embedded: bool,

    /// Run the natively installed package manager
    #[arg(long)]
    pub integrated: bool,

    /// Embedded install timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,
}

/// Arguments for the engine command
#[derive(Parser, Debug, Default)]
pub struct EngineArgs {
    /// Engine kind to resolve (overrides engine.kind)
    #[arg(long, env = ENGINE_ENV_VAR)]
    pub engine: Option<String>,
}

/// Arguments for the cache command
#[derive(Parser, Debug)]
pub struct CacheArgs {
    /// Subcommand for cache
    #[command(subcommand)]
    pub action: CacheAction,
}

/// Cache subcommands
#[derive(Subcommand, Debug)]
pub enum CacheAction {
    /// Show whether the next resolve would be skipped
    Status,

    /// Remove the cache record, forcing the next resolve to install
    Clear,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Subcommand for config
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Initialize default configuration
    Init {
        /// Overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Set a configuration value
    Set {
        /// Configuration key (e.g., install.timeout_secs)
        key: String,
        /// Value to set
        value: String,
        /// Write to the project's jsdeps.toml instead of the global config
        #[arg(long)]
        local: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn cli_parses_resolve_flags() {
        std::env::remove_var(ENGINE_ENV_VAR);
        let cli = Cli::parse_from([
            "jsdeps",
            "resolve",
            "--embedded",
            "--engine",
            "rhino",
            "--timeout",
            "30",
        ]);
        match cli.command {
            Commands::Resolve(args) => {
                assert!(args.embedded);
                assert!(!args.integrated);
                assert_eq!(args.engine.as_deref(), Some("rhino"));
                assert_eq!(args.timeout, Some(30));
            }
            _ => panic!("expected Resolve command"),
        }
    }

    #[test]
    fn embedded_conflicts_with_integrated() {
        let result = Cli::try_parse_from(["jsdeps", "resolve", "--embedded", "--integrated"]);
        assert!(result.is_err());
    }

    #[test]
    #[serial]
    fn engine_override_from_environment() {
        std::env::set_var(ENGINE_ENV_VAR, "trireme");
        let cli = Cli::parse_from(["jsdeps", "engine"]);
        std::env::remove_var(ENGINE_ENV_VAR);

        match cli.command {
            Commands::Engine(args) => assert_eq!(args.engine.as_deref(), Some("trireme")),
            _ => panic!("expected Engine command"),
        }
    }

    #[test]
    fn global_project_after_subcommand() {
        let cli = Cli::parse_from(["jsdeps", "cache", "status", "--project", "/work/app"]);
        assert_eq!(cli.project, Some(PathBuf::from("/work/app")));
        assert!(matches!(
            cli.command,
            Commands::Cache(CacheArgs {
                action: CacheAction::Status
            })
        ));
    }

    #[test]
    fn cli_parses_config_set() {
        let cli = Cli::parse_from(["jsdeps", "config", "set", "install.integrated", "false"]);
        match cli.command {
            Commands::Config(ConfigArgs {
                action: Some(ConfigAction::Set { key, value, local }),
            }) => {
                assert_eq!(key, "install.integrated");
                assert_eq!(value, "false");
                assert!(!local);
            }
            _ => panic!("expected Config Set command"),
        }
    }

    #[test]
    fn cli_parses_completions() {
        let cli = Cli::parse_from(["jsdeps", "completions", "bash"]);
        assert!(matches!(
            cli.command,
            Commands::Completions { shell: Shell::Bash }
        ));
    }
}
