//! Command dispatch

use std::io;
use std::path::{Path, PathBuf};

use clap::CommandFactory;
use clap_complete::generate;
use tracing::{debug, instrument};

use crate::application::ApplicationError;
use crate::cli::args::{Cli, Commands, ConfigCommands};
use crate::cli::error::{CliError, CliResult};
use crate::cli::output;
use crate::config::{global_config_path, local_config_path, OutputFormat, Settings};
use crate::domain::{render_ascii, DanglingParents, TopologyReport};
use crate::infrastructure::di::ServiceContainer;
use crate::infrastructure::{InfraError, InfraResult};

pub fn execute_command(cli: &Cli) -> CliResult<()> {
    let Some(command) = &cli.command else {
        return Err(CliError::Usage(
            "no command given, see `tagtree --help`".to_string(),
        ));
    };

    match command {
        Commands::Completion { shell } => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(*shell, &mut cmd, name, &mut io::stdout());
            Ok(())
        }
        Commands::Config { command } => cmd_config(cli, command),
        Commands::Tree {
            file,
            format,
            compact,
            dangling,
        } => {
            let mut settings = Settings::load(cli.config.as_deref())?;
            apply_dangling(&mut settings, *dangling);
            if let Some(format) = format {
                settings.format = *format;
            }
            if *compact {
                settings.pretty = false;
            }
            cmd_tree(&ServiceContainer::new(settings), file.as_deref())
        }
        Commands::Roots { file, dangling } => {
            let mut settings = Settings::load(cli.config.as_deref())?;
            apply_dangling(&mut settings, *dangling);
            cmd_roots(&ServiceContainer::new(settings), file.as_deref())
        }
        Commands::Check { file, json } => {
            let settings = Settings::load(cli.config.as_deref())?;
            cmd_check(&ServiceContainer::new(settings), file.as_deref(), *json)
        }
    }
}

fn apply_dangling(settings: &mut Settings, dangling: Option<DanglingParents>) {
    if let Some(policy) = dangling {
        settings.dangling_parents = policy;
    }
}

/// Input file from the command line, else from config.
fn resolve_input(file: Option<&Path>, settings: &Settings) -> CliResult<PathBuf> {
    file.map(Path::to_path_buf)
        .or_else(|| settings.input.clone())
        .ok_or_else(|| {
            CliError::InvalidArgs("no tag file given and no `input` configured".to_string())
        })
}

#[instrument(level = "debug", skip(container))]
pub fn cmd_tree(container: &ServiceContainer, file: Option<&Path>) -> CliResult<()> {
    let input = resolve_input(file, &container.settings)?;
    let response = container.tag_tree_service(&input).tree()?;
    debug!("cmd_tree: {} root(s)", response.data.len());

    match container.settings.format {
        OutputFormat::Json => output::data(&response.to_json(container.settings.pretty)?),
        OutputFormat::Ascii => {
            if response.data.is_empty() {
                output::warning("no root tags");
            } else {
                output::data(render_ascii(&response.data).trim_end());
            }
        }
    }
    Ok(())
}

#[instrument(level = "debug", skip(container))]
pub fn cmd_roots(container: &ServiceContainer, file: Option<&Path>) -> CliResult<()> {
    let input = resolve_input(file, &container.settings)?;
    let roots = container.tag_tree_service(&input).roots()?;
    for tag in &roots {
        output::tag(&tag.name, &tag.id);
    }
    Ok(())
}

#[instrument(level = "debug", skip(container))]
pub fn cmd_check(container: &ServiceContainer, file: Option<&Path>, json: bool) -> CliResult<()> {
    let input = resolve_input(file, &container.settings)?;
    let report = container.tag_tree_service(&input).check()?;

    if json {
        let rendered = serde_json::to_string_pretty(&report).map_err(|e| {
            ApplicationError::OperationFailed {
                context: "serialize topology report".to_string(),
                source: Box::new(e),
            }
        })?;
        output::data(&rendered);
    } else {
        print_report(&report);
    }

    let issues = report.summary().len();
    if issues == 0 {
        Ok(())
    } else {
        Err(CliError::TopologyIssues(issues))
    }
}

fn print_report(report: &TopologyReport) {
    if report.is_clean() {
        output::success("tag relations are consistent");
        return;
    }

    for (category, entries) in report.sections() {
        output::section(category, entries.len());
        for entry in entries {
            output::issue(&entry);
        }
    }
}

fn cmd_config(cli: &Cli, command: &ConfigCommands) -> CliResult<()> {
    match command {
        ConfigCommands::Show => {
            let settings = Settings::load(cli.config.as_deref())?;
            output::data(&settings.to_toml()?);
            Ok(())
        }
        ConfigCommands::Path => {
            match global_config_path() {
                Some(path) => output::detail(&format!(
                    "global: {} {}",
                    path.display(),
                    exists_marker(&path)
                )),
                None => output::detail("global: <no config dir>"),
            }
            let local = cli.config.clone().unwrap_or_else(local_config_path);
            output::detail(&format!(
                "local:  {} {}",
                local.display(),
                exists_marker(&local)
            ));
            Ok(())
        }
        ConfigCommands::Init { global, force } => {
            let target = if *global {
                global_config_path().ok_or_else(|| {
                    CliError::Usage("cannot determine global config directory".to_string())
                })?
            } else {
                cli.config.clone().unwrap_or_else(local_config_path)
            };
            let container = ServiceContainer::new(Settings::default());
            init_config(&container, &target, *force)
        }
    }
}

/// Write the config template to `target`.
pub fn init_config(container: &ServiceContainer, target: &Path, force: bool) -> CliResult<()> {
    if container.fs.exists(target) && !force {
        return Err(CliError::Usage(format!(
            "{} already exists, use --force to overwrite",
            target.display()
        )));
    }
    write_template(container, target)?;
    output::success(&format!("created {}", target.display()));
    Ok(())
}

fn write_template(container: &ServiceContainer, target: &Path) -> InfraResult<()> {
    container
        .fs
        .ensure_parent(target)
        .map_err(|e| InfraError::io("create parent directory of", target, e))?;
    container
        .fs
        .write(target, &Settings::template())
        .map_err(|e| InfraError::io("write", target, e))
}

fn exists_marker(path: &Path) -> &'static str {
    if path.exists() {
        "(exists)"
    } else {
        "(missing)"
    }
}
