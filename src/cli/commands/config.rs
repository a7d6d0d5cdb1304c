//! Config command - show or edit configuration

use crate::cli::args::{ConfigAction, ConfigArgs};
use crate::config::{Config, ConfigManager, LOCAL_CONFIG_FILE};
use crate::error::{JsDepsError, JsDepsResult};
use crate::ui::{self, UiContext};
use std::path::Path;
use tokio::fs;
use toml_edit::{Array, DocumentMut, Item, Table};

/// Shape of a settable value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ValueKind {
    Bool,
    Integer,
    Text,
    List,
}

/// Execute the config command
pub async fn execute(
    args: ConfigArgs,
    config: &Config,
    manager: &ConfigManager,
    project: &Path,
) -> JsDepsResult<()> {
    match args.action {
        None | Some(ConfigAction::Show) => show_config(config)?,
        Some(ConfigAction::Path) => println!("{}", manager.path().display()),
        Some(ConfigAction::Init { force }) => init_config(manager, force).await?,
        Some(ConfigAction::Set { key, value, local }) => {
            let target = if local {
                project.join(LOCAL_CONFIG_FILE)
            } else {
                manager.ensure_config_dir().await?;
                manager.path().to_path_buf()
            };
            set_value(&target, &key, &value).await?;
            ui::step_ok(
                &UiContext::detect(),
                &format!("Set {} = {} in {}", key, value, target.display()),
            );
        }
    }

    Ok(())
}

fn show_config(config: &Config) -> JsDepsResult<()> {
    println!("{}", toml::to_string_pretty(config)?);
    Ok(())
}

async fn init_config(manager: &ConfigManager, force: bool) -> JsDepsResult<()> {
    let ctx = UiContext::detect();
    let path = manager.path();

    if path.exists() && !force {
        ui::step_warn_hint(
            &ctx,
            &format!("Config already exists at {}", path.display()),
            "Use --force to overwrite",
        );
        return Ok(());
    }

    manager.save(&Config::default()).await?;
    ui::step_ok_detail(&ctx, "Configuration initialized", &path.display().to_string());
    Ok(())
}

/// Set `key` in the TOML file at `path`, keeping its comments and layout
async fn set_value(path: &Path, key: &str, value: &str) -> JsDepsResult<()> {
    let kind = value_kind(key).ok_or_else(|| {
        JsDepsError::User(format!(
            "Unknown config key: {}. Valid keys: {}",
            key,
            VALID_KEYS.join(", ")
        ))
    })?;

    let content = if path.exists() {
        fs::read_to_string(path)
            .await
            .map_err(|e| JsDepsError::io(format!("reading {}", path.display()), e))?
    } else {
        String::new()
    };
    let mut doc: DocumentMut = content.parse()?;

    set_document_value(&mut doc, key, parse_value(kind, value)?)?;

    // Reject edits that would leave an unloadable file behind
    let updated = doc.to_string();
    toml::from_str::<Config>(&updated).map_err(|e| JsDepsError::ConfigInvalid {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    fs::write(path, updated)
        .await
        .map_err(|e| JsDepsError::io(format!("writing {}", path.display()), e))
}

const VALID_KEYS: &[&str] = &[
    "general.verbose",
    "general.log_format",
    "engine.kind",
    "engine.command",
    "engine.module_paths",
    "engine.workers",
    "engine.env.<NAME>",
    "install.integrated",
    "install.package_manager",
    "install.subcommand",
    "install.extra_args",
    "install.timeout_secs",
    "install.entry_point",
    "install.manifest",
    "install.install_dir",
    "cache.dir",
];

fn value_kind(key: &str) -> Option<ValueKind> {
    let parts: Vec<&str> = key.split('.').collect();
    let kind = match parts.as_slice() {
        ["general", "verbose"] | ["install", "integrated"] => ValueKind::Bool,
        ["engine", "workers"] | ["install", "timeout_secs"] => ValueKind::Integer,
        ["engine", "module_paths"] | ["install", "extra_args"] => ValueKind::List,
        ["general", "log_format"]
        | ["engine", "kind" | "command"]
        | ["install", "package_manager" | "subcommand" | "entry_point" | "manifest" | "install_dir"]
        | ["cache", "dir"] => ValueKind::Text,
        ["engine", "env", name] if !name.is_empty() => ValueKind::Text,
        _ => return None,
    };
    Some(kind)
}

fn parse_value(kind: ValueKind, value: &str) -> JsDepsResult<Item> {
    let item = match kind {
        ValueKind::Bool => match value.to_lowercase().as_str() {
            "true" | "1" | "yes" => toml_edit::value(true),
            "false" | "0" | "no" => toml_edit::value(false),
            _ => {
                return Err(JsDepsError::User(format!(
                    "Invalid boolean value: {}. Use true/false",
                    value
                )))
            }
        },
        ValueKind::Integer => {
            let n: i64 = value
                .parse()
                .map_err(|_| JsDepsError::User(format!("Invalid number: {}", value)))?;
            toml_edit::value(n)
        }
        ValueKind::Text => toml_edit::value(value),
        ValueKind::List => {
            let items: Array = value
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .collect();
            toml_edit::value(items)
        }
    };
    Ok(item)
}

/// Set a dot-separated key, creating intermediate tables as needed
fn set_document_value(doc: &mut DocumentMut, key: &str, item: Item) -> JsDepsResult<()> {
    let parts: Vec<&str> = key.split('.').collect();
    let (leaf, sections) = parts
        .split_last()
        .ok_or_else(|| JsDepsError::User("Empty config key".to_string()))?;

    let mut table = doc.as_table_mut();
    for section in sections {
        table = table
            .entry(section)
            .or_insert(Item::Table(Table::new()))
            .as_table_mut()
            .ok_or_else(|| JsDepsError::User(format!("Expected table at key: {}", section)))?;
    }

    table.insert(leaf, item);
    Ok(())
}
