//! Command dispatch and implementations

use std::io;
use std::path::Path;

use clap::CommandFactory;
use clap_complete::generate;
use itertools::Itertools;
use tracing::{debug, instrument};

use crate::application::{ApplicationError, EditorSession, SessionPhase};
use crate::cli::args::{Cli, Commands, ConfigCommands, GroupTarget};
use crate::cli::output;
use crate::cli::{CliError, CliResult};
use crate::config::{global_config_path, local_config_path, Settings};
use crate::domain::{serialize, NodeId};
use crate::infrastructure::di::ServiceContainer;
use crate::tree_traits::TreeNodeConvert;

/// Execute the parsed command line.
pub fn execute(cli: Cli) -> CliResult<()> {
    let config_dir = match &cli.config_dir {
        Some(dir) => dir.clone(),
        None => std::env::current_dir()
            .map_err(|e| crate::infrastructure::InfraError::io("get current directory", e))?,
    };

    let Some(command) = cli.command else {
        return Err(CliError::Usage("no command given, see --help".to_string()));
    };

    if let Commands::Completion { shell } = command {
        let mut cmd = Cli::command();
        let name = cmd.get_name().to_string();
        generate(shell, &mut cmd, name, &mut io::stdout());
        return Ok(());
    }

    let settings = Settings::load(Some(&config_dir))?;
    if let Commands::Config { command } = &command {
        return cmd_config(command, &settings, &config_dir);
    }

    let container = ServiceContainer::new(settings)?;
    match command {
        Commands::Check { file } => cmd_check(&container, &file),
        Commands::Tree { file } => cmd_tree(&container, &file),
        Commands::Show { file, state } => cmd_show(&container, &file, state),
        Commands::Enable { file } => cmd_enable(&container, &file),
        Commands::AddGroup { file, exclude } => cmd_add_group(&container, &file, exclude),
        Commands::Add {
            file,
            category,
            target,
        } => cmd_add(&container, &file, &category, target),
        Commands::Remove {
            file,
            category,
            target,
        } => cmd_remove(&container, &file, &category, target),
        Commands::Config { .. } | Commands::Completion { .. } => Ok(()),
    }
}

#[instrument(skip(container))]
fn cmd_check(container: &ServiceContainer, file: &Path) -> CliResult<()> {
    let session = container.targeting.open_session(file)?;
    let state = session.get_state();

    output::header(&format!("entity {}", session.settings().display_id()));
    match session.phase() {
        SessionPhase::Empty => {
            output::detail("no targeting expression");
            return Ok(());
        }
        SessionPhase::ReadOnly => {
            output::warning("expression does not fit the editable grammar, read-only");
        }
        _ => output::success("editable"),
    }

    if let Some(info) = &state.info {
        for (i, group) in info.inclusion.iter().enumerate() {
            output::detail(&format!(
                "inclusion group {}: {} categories",
                i + 1,
                group.count()
            ));
        }
        if let Some(group) = &info.exclusion {
            output::detail(&format!("exclusion group: {} categories", group.count()));
        }
        output::detail(&format!(
            "{} distinct categories, {} unresolved",
            info.category_count(),
            info.unresolved
        ));
    }
    if !session.is_enabled() {
        output::warning("no group holds a category yet");
    }
    Ok(())
}

#[instrument(skip(container))]
fn cmd_tree(container: &ServiceContainer, file: &Path) -> CliResult<()> {
    let session = container.targeting.open_session(file)?;
    match session.tree() {
        Some(tree) => output::info(&tree.to_tree_string()),
        None => output::detail("no targeting expression"),
    }
    Ok(())
}

#[instrument(skip(container))]
fn cmd_show(container: &ServiceContainer, file: &Path, state: bool) -> CliResult<()> {
    let session = container.targeting.open_session(file)?;
    let rendered = if state {
        serde_json::to_string_pretty(&session.get_state())
    } else {
        let expression = session.tree().map(serialize).unwrap_or_default();
        serde_json::to_string_pretty(&expression)
    };
    let rendered = rendered.map_err(|e| CliError::Usage(format!("cannot render output: {e}")))?;
    output::info(&rendered);
    Ok(())
}

#[instrument(skip(container))]
fn cmd_enable(container: &ServiceContainer, file: &Path) -> CliResult<()> {
    let mut session = container.targeting.open_session(file)?;
    if session.root().is_some() {
        output::detail("targeting already enabled");
        return Ok(());
    }
    session.enable_targeting()?;
    container.targeting.save_session(file, &session)?;
    output::action("Enabled", &file.display());
    Ok(())
}

#[instrument(skip(container))]
fn cmd_add_group(container: &ServiceContainer, file: &Path, exclude: bool) -> CliResult<()> {
    let mut session = container.targeting.open_session(file)?;
    let was_empty = session.phase() == SessionPhase::Empty;
    session.enable_targeting()?;
    if was_empty && !exclude {
        // enabling already created the first inclusion group
        output::action("Added", &"inclusion group 1");
    } else if exclude {
        if !session.can_add_exclusion() {
            return Err(CliError::Usage("exclusion group already exists".to_string()));
        }
        session.add_exclusion_group()?;
        output::action("Added", &"exclusion group");
    } else {
        if !session.can_add_inclusion() {
            return Err(CliError::Usage(format!(
                "at most {} inclusion groups allowed",
                session.grammar().max_inclusion_groups
            )));
        }
        session.add_inclusion_group()?;
        let number = session.inclusion_groups().len();
        output::action("Added", &format!("inclusion group {}", number));
    }
    container.targeting.save_session(file, &session)?;
    Ok(())
}

#[instrument(skip(container))]
fn cmd_add(
    container: &ServiceContainer,
    file: &Path,
    category: &str,
    target: GroupTarget,
) -> CliResult<()> {
    let mut session = container.targeting.open_session(file)?;
    ensure_writable(&session)?;
    if session.phase() == SessionPhase::Empty {
        debug!("add: enabling targeting first");
        session.enable_targeting()?;
    }
    let group = select_group(&session, target)?;
    let key = container.settings.category_key(category);
    session.add_category(group, &key)?;
    container.targeting.save_session(file, &session)?;

    let name = session
        .get_state()
        .info
        .and_then(|info| info.name_of(&key).map(str::to_string));
    match name {
        Some(name) => output::action("Added", &format!("{} ({})", key, name)),
        None => output::action("Added", &key),
    }
    Ok(())
}

#[instrument(skip(container))]
fn cmd_remove(
    container: &ServiceContainer,
    file: &Path,
    category: &str,
    target: GroupTarget,
) -> CliResult<()> {
    let mut session = container.targeting.open_session(file)?;
    ensure_writable(&session)?;
    let group = select_group(&session, target)?;
    let key = container.settings.category_key(category);
    if session.remove_category(group, &key)? {
        container.targeting.save_session(file, &session)?;
        output::action("Removed", &key);
    } else {
        output::warning(&format!("{} not in group, nothing to do", key));
    }
    Ok(())
}

fn ensure_writable(session: &EditorSession) -> CliResult<()> {
    match session.phase() {
        SessionPhase::ReadOnly => Err(ApplicationError::ReadOnly.into()),
        _ => Ok(()),
    }
}

fn select_group(session: &EditorSession, target: GroupTarget) -> CliResult<NodeId> {
    if target.exclude {
        return session.exclusion_group().ok_or_else(|| {
            CliError::Usage("no exclusion group, run `add-group --exclude` first".to_string())
        });
    }
    let groups = session.inclusion_groups();
    target
        .group
        .checked_sub(1)
        .and_then(|i| groups.get(i).copied())
        .ok_or_else(|| {
            CliError::InvalidArgs(format!(
                "inclusion group {} does not exist ({} available)",
                target.group,
                groups.len()
            ))
        })
}

fn cmd_config(command: &ConfigCommands, settings: &Settings, config_dir: &Path) -> CliResult<()> {
    match command {
        ConfigCommands::Show => output::info(&settings.to_toml()?),
        ConfigCommands::Template => output::info(&Settings::template()),
        ConfigCommands::Path => {
            let paths = global_config_path()
                .into_iter()
                .chain(Some(local_config_path(config_dir)))
                .map(|p| {
                    let marker = if p.exists() { "exists" } else { "missing" };
                    format!("{} ({})", p.display(), marker)
                })
                .join("\n");
            output::info(&paths);
        }
    }
    Ok(())
}
