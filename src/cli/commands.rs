//! Command dispatch

use std::io;
use std::path::{Path, PathBuf};

use clap::CommandFactory;
use itertools::Itertools;
use tracing::{debug, instrument};

use crate::application::ApplicationError;
use crate::cli::args::{Cli, Commands, ConfigCommands};
use crate::cli::error::{CliError, CliResult};
use crate::cli::output;
use crate::config::{global_config_path, local_config_path, Settings};
use crate::infrastructure::di::ServiceContainer;

pub fn execute_command(cli: &Cli) -> CliResult<()> {
    let command = cli
        .command
        .as_ref()
        .ok_or_else(|| CliError::Usage("no command given, see --help".to_string()))?;

    if let Commands::Completion { shell } = command {
        let mut cmd = Cli::command();
        clap_complete::generate(*shell, &mut cmd, "replytree", &mut io::stdout());
        return Ok(());
    }

    let cwd = std::env::current_dir().ok();
    let settings = Settings::load(cwd.as_deref())?;
    debug!("settings: {:?}", settings);
    let container = ServiceContainer::new(settings);

    match command {
        Commands::Tree { file } => cmd_tree(&container, file),
        Commands::Flat { file } => cmd_flat(&container, file),
        Commands::Leaves { file } => cmd_leaves(&container, file),
        Commands::Json { file } => cmd_json(&container, file),
        Commands::Stats { files } => cmd_stats(&container, files),
        Commands::Config { command } => cmd_config(&container, command, cwd.as_deref()),
        Commands::Completion { .. } => Ok(()),
    }
}

#[instrument(skip(container))]
fn cmd_tree(container: &ServiceContainer, file: &Path) -> CliResult<()> {
    let forest = container.threads.build(file)?;
    let promoted = forest
        .roots()
        .iter()
        .filter(|root| root.item.parent.is_some())
        .count();
    if promoted > 0 {
        output::warning(&format!(
            "{} post(s) reply to posts missing from {}",
            promoted,
            file.display()
        ));
    }
    for tree in container.threads.render(&forest) {
        print!("{}", tree);
    }
    Ok(())
}

#[instrument(skip(container))]
fn cmd_flat(container: &ServiceContainer, file: &Path) -> CliResult<()> {
    let forest = container.threads.build(file)?;
    let lines = container.threads.flat_lines(&forest);
    if !lines.is_empty() {
        output::info(&lines.iter().join("\n"));
    }
    Ok(())
}

#[instrument(skip(container))]
fn cmd_leaves(container: &ServiceContainer, file: &Path) -> CliResult<()> {
    let forest = container.threads.build(file)?;
    for leaf in container.threads.leaves(&forest) {
        output::info(&leaf);
    }
    Ok(())
}

#[instrument(skip(container))]
fn cmd_json(container: &ServiceContainer, file: &Path) -> CliResult<()> {
    let forest = container.threads.build(file)?;
    let json =
        serde_json::to_string_pretty(&forest).map_err(|e| ApplicationError::OperationFailed {
            context: format!("serialize threads of {}", file.display()),
            source: Box::new(e),
        })?;
    output::info(&json);
    Ok(())
}

#[instrument(skip(container))]
fn cmd_stats(container: &ServiceContainer, files: &[PathBuf]) -> CliResult<()> {
    let mut first_error = None;
    for (path, result) in container.threads.stats_many(files) {
        let label = path.display().to_string();
        match result {
            Ok(stats) => output::action(&label, &stats),
            Err(e) => {
                output::action(&label, "failed");
                output::failure(&e);
                if first_error.is_none() {
                    first_error = Some(e);
                }
            }
        }
    }
    match first_error {
        Some(e) => Err(e.into()),
        None => Ok(()),
    }
}

fn cmd_config(
    container: &ServiceContainer,
    command: &ConfigCommands,
    cwd: Option<&Path>,
) -> CliResult<()> {
    match command {
        ConfigCommands::Show => output::info(container.settings.to_toml()?.trim_end()),
        ConfigCommands::Path => {
            let global = global_config_path()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "<unavailable>".to_string());
            output::action("global", &global);
            if let Some(dir) = cwd {
                output::action("local", &local_config_path(dir).display());
            }
        }
    }
    Ok(())
}
