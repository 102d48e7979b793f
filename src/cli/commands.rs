//! Command dispatch

use std::io;
use std::path::Path;

use clap::CommandFactory;
use itertools::Itertools;
use tracing::{debug, instrument};

use crate::application::services::{KnowledgeBase, RoundOutcome};
use crate::cli::args::{Cli, Commands, ConfigCommands, OrderArg};
use crate::cli::output;
use crate::cli::{CliError, CliResult};
use crate::config::{global_config_path, Settings};
use crate::domain::{Branch, ToTermTree};
use crate::infrastructure::di::ServiceContainer;

pub fn execute_command(cli: &Cli) -> CliResult<()> {
    match &cli.command {
        Some(Commands::Show {
            file,
            indent,
            pretty,
        }) => cmd_show(file, *indent, *pretty),
        Some(Commands::Check { file }) => cmd_check(file),
        Some(Commands::Traverse { file, order }) => cmd_traverse(file, *order),
        Some(Commands::Leaves { file }) => cmd_leaves(file),
        Some(Commands::Learn {
            file,
            path,
            answer,
            question,
            output,
        }) => cmd_learn(file, path, answer, question, output.as_deref()),
        Some(Commands::Play { file, no_save }) => cmd_play(file, *no_save),
        Some(Commands::Graph { file, image, html }) => cmd_graph(file, image.as_deref(), *html),
        Some(Commands::Config { command }) => cmd_config(command),
        Some(Commands::Completion { shell }) => {
            clap_complete::generate(*shell, &mut Cli::command(), "guesstree", &mut io::stdout());
            Ok(())
        }
        None => Err(CliError::Usage(
            "no command given, run with --help for usage".into(),
        )),
    }
}

/// Settings for the directory holding `file`.
fn load_settings(file: &Path) -> CliResult<Settings> {
    let dir = file.parent().filter(|p| !p.as_os_str().is_empty());
    let settings = Settings::load(dir)?;
    debug!("settings: {:?}", settings);
    Ok(settings)
}

fn container_for(file: &Path) -> CliResult<ServiceContainer> {
    Ok(ServiceContainer::new(load_settings(file)?))
}

fn load(container: &ServiceContainer, file: &Path) -> CliResult<KnowledgeBase> {
    let kb = container.knowledge_base.load(file)?;
    for diagnostic in &kb.diagnostics {
        output::warning(diagnostic);
    }
    Ok(kb)
}

#[instrument]
fn cmd_show(file: &Path, indent: Option<usize>, pretty: bool) -> CliResult<()> {
    let container = container_for(file)?;
    let kb = load(&container, file)?;
    if pretty {
        output::info(&kb.tree.to_term_tree());
        return Ok(());
    }
    let writer = container
        .settings
        .writer()
        .indent(indent.unwrap_or(container.settings.indent_width));
    output::info(writer.write(&kb.tree).trim_end());
    Ok(())
}

#[instrument]
fn cmd_check(file: &Path) -> CliResult<()> {
    let container = container_for(file)?;
    let kb = load(&container, file)?;
    let leaves = kb.tree.leaf_values().len();

    output::header(&file.display());
    output::detail(&format!("nodes:     {}", kb.tree.len()));
    output::detail(&format!("depth:     {}", kb.tree.depth()));
    output::detail(&format!("answers:   {}", leaves));
    output::detail(&format!("questions: {}", kb.tree.len() - leaves));
    if kb.diagnostics.is_empty() {
        output::success("well-formed");
    } else {
        output::failure(&format!("{} problem(s) tolerated", kb.diagnostics.len()));
    }
    Ok(())
}

#[instrument]
fn cmd_traverse(file: &Path, order: OrderArg) -> CliResult<()> {
    let container = container_for(file)?;
    let kb = load(&container, file)?;
    for value in kb.tree.values(order.into()) {
        output::info(value);
    }
    Ok(())
}

#[instrument]
fn cmd_leaves(file: &Path) -> CliResult<()> {
    let container = container_for(file)?;
    let kb = load(&container, file)?;
    for value in kb.tree.leaf_values() {
        output::info(value);
    }
    Ok(())
}

#[instrument]
fn cmd_learn(
    file: &Path,
    path: &[Branch],
    answer: &str,
    question: &str,
    target: Option<&Path>,
) -> CliResult<()> {
    let container = container_for(file)?;
    let mut kb = load(&container, file)?;
    let old = kb.tree.value(kb.tree.walk(path)?)?.to_string();

    container
        .knowledge_base
        .learn(&mut kb, path, answer, question)?;

    let target = target.unwrap_or(file);
    container.knowledge_base.save(target, &kb.tree)?;
    output::action(
        "Learned",
        &format!(
            "{question} yes: {answer}, no: {old} (path {})",
            path.iter().join(",")
        ),
    );
    output::success_detail(&format!("saved {}", target.display()));
    Ok(())
}

#[instrument]
fn cmd_play(file: &Path, no_save: bool) -> CliResult<()> {
    let container = container_for(file)?;
    let mut kb = load(&container, file)?;

    let outcomes = container.session.play(&mut kb.tree)?;
    let learned = outcomes
        .iter()
        .filter(|o| matches!(o, RoundOutcome::Learned { .. }))
        .count();
    let guessed = outcomes
        .iter()
        .filter(|o| matches!(o, RoundOutcome::Guessed { .. }))
        .count();
    output::header(&format!(
        "{} round(s): {guessed} guessed, {learned} learned",
        outcomes.len()
    ));

    if learned > 0 && !no_save {
        container.knowledge_base.save(file, &kb.tree)?;
        output::success_detail(&format!("saved {}", file.display()));
    }
    Ok(())
}

#[instrument]
fn cmd_graph(file: &Path, image: Option<&Path>, html: bool) -> CliResult<()> {
    let mut settings = load_settings(file)?;
    if let Some(image) = image {
        settings.graph.image_file = image.to_path_buf();
    }
    let container = ServiceContainer::new(settings);
    let kb = load(&container, file)?;
    let renderer = &container.renderer;

    if html {
        renderer.dump(&kb.tree)?;
        output::action("Written", &renderer.config().html_file.display());
    } else {
        renderer.render(&kb.tree)?;
    }
    output::action("Rendered", &renderer.config().image_file.display());
    Ok(())
}

#[instrument]
fn cmd_config(command: &ConfigCommands) -> CliResult<()> {
    match command {
        ConfigCommands::Show { dir } => {
            let settings = Settings::load(dir.as_deref())?;
            output::info(settings.to_toml()?.trim_end());
        }
        ConfigCommands::Template => output::info(&Settings::template()),
        ConfigCommands::Path => match global_config_path() {
            Some(path) => output::info(&path.display()),
            None => return Err(CliError::Usage("cannot determine config directory".into())),
        },
    }
    Ok(())
}
