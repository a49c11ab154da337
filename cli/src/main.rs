//! Synapse command line
//!
//! - `plan`: break a requirement into a tech stack and goals
//! - `generate`: generate a project from tasks
//! - `materialize`: run the pipeline on a saved backend response
//! - `publish`: materialize a saved response and push it to GitHub

use anyhow::{Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use std::path::PathBuf;
use std::sync::Arc;
use synapse_core::{
    publish_project, GeminiBackend, GitHubPublisher, Pipeline, PipelineResult, ProjectGenerator,
    SynapseConfig, TaskPlanner, DEFAULT_PROJECT_TYPE,
};
use tokio::io::AsyncReadExt;
use tracing_subscriber::EnvFilter;

fn build_cli() -> Command {
    Command::new("synapse")
        .version(synapse_core::VERSION)
        .about("Generate project scaffolds from requirements")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("TOML configuration file"),
        )
        .arg(
            Arg::new("output-dir")
                .long("output-dir")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("Directory generated files are written into (wiped each run)"),
        )
        .arg(
            Arg::new("archive")
                .long("archive")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("Archive destination"),
        )
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON"),
        )
        .subcommand(
            Command::new("plan")
                .about("Break a requirement into a tech stack and goals")
                .arg(
                    Arg::new("requirement")
                        .long("requirement")
                        .short('r')
                        .required(true)
                        .help("Free-text project requirement"),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Output as JSON"),
                ),
        )
        .subcommand(
            Command::new("generate")
                .about("Generate a project from tasks")
                .arg(
                    Arg::new("task")
                        .long("task")
                        .short('t')
                        .required(true)
                        .action(ArgAction::Append)
                        .help("Development task (repeatable)"),
                )
                .arg(
                    Arg::new("project-type")
                        .long("project-type")
                        .default_value(DEFAULT_PROJECT_TYPE)
                        .help("Kind of project to generate"),
                )
                .arg(
                    Arg::new("keep-archive")
                        .long("keep-archive")
                        .action(ArgAction::SetTrue)
                        .help("Keep the archive after reporting"),
                ),
        )
        .subcommand(
            Command::new("materialize")
                .about("Run the pipeline on a saved backend response")
                .arg(
                    Arg::new("response")
                        .long("response")
                        .required(true)
                        .help("Response file, or - for stdin"),
                )
                .arg(
                    Arg::new("keep-archive")
                        .long("keep-archive")
                        .action(ArgAction::SetTrue)
                        .help("Keep the archive after reporting"),
                ),
        )
        .subcommand(
            Command::new("publish")
                .about("Materialize a saved response and push it to GitHub")
                .arg(
                    Arg::new("repo")
                        .long("repo")
                        .required(true)
                        .help("Repository name"),
                )
                .arg(
                    Arg::new("response")
                        .long("response")
                        .required(true)
                        .help("Response file, or - for stdin"),
                )
                .arg(
                    Arg::new("task")
                        .long("task")
                        .short('t')
                        .action(ArgAction::Append)
                        .help("Task to open as an issue (repeatable)"),
                )
                .arg(
                    Arg::new("description")
                        .long("description")
                        .default_value("")
                        .help("Repository description"),
                ),
        )
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn load_config(matches: &ArgMatches) -> Result<SynapseConfig> {
    let path = matches.get_one::<PathBuf>("config");
    let mut config = SynapseConfig::load(path.map(PathBuf::as_path))
        .with_context(|| match path {
            Some(path) => format!("loading config from {}", path.display()),
            None => "loading config".to_string(),
        })?;

    if let Some(dir) = matches.get_one::<PathBuf>("output-dir") {
        config.output.output_root.clone_from(dir);
    }
    if let Some(archive) = matches.get_one::<PathBuf>("archive") {
        config.output.archive_path.clone_from(archive);
    }
    config.validate().context("invalid configuration")?;
    Ok(config)
}

async fn read_response(source: &str) -> Result<String> {
    if source == "-" {
        let mut text = String::new();
        tokio::io::stdin()
            .read_to_string(&mut text)
            .await
            .context("reading response from stdin")?;
        Ok(text)
    } else {
        tokio::fs::read_to_string(source)
            .await
            .with_context(|| format!("reading response from {source}"))
    }
}

fn strings(args: &ArgMatches, id: &str) -> Vec<String> {
    args.get_many::<String>(id)
        .map(|values| values.cloned().collect())
        .unwrap_or_default()
}

/// Print the run summary and turn a failed run into an error
fn report(result: PipelineResult, keep_archive: bool) -> Result<()> {
    println!("Run: {}", result.run_id);
    for path in result.materialized.paths() {
        println!("  + {path}");
    }
    for warning in &result.warnings {
        println!("  ! {warning}");
    }

    if let Some(failure) = result.failure {
        return Err(failure.into());
    }

    println!("Files: {}", result.materialized.len());
    if let Some(archive) = result.archive {
        println!("Archive: {} ({})", archive.path().display(), archive.digest().short());
        if keep_archive {
            let kept = archive.keep();
            println!("Kept archive at {}", kept.display());
        }
    }
    Ok(())
}

async fn run_plan(config: &SynapseConfig, args: &ArgMatches) -> Result<()> {
    let requirement = args
        .get_one::<String>("requirement")
        .context("--requirement is required")?;
    let backend = Arc::new(GeminiBackend::new(&config.backend)?);
    let planner = TaskPlanner::new(backend).with_params(config.backend.planning);

    let breakdown = planner.break_down(requirement).await?;

    if args.get_flag("json") {
        println!("{}", serde_json::to_string_pretty(&breakdown)?);
    } else {
        println!("Language: {}", breakdown.tech_stack.language);
        println!("Frameworks: {}", breakdown.tech_stack.frameworks.join(", "));
        println!("App type: {}", breakdown.tech_stack.app_type);
        println!();
        for goal in &breakdown.goals {
            println!("{goal}");
        }
    }
    Ok(())
}

async fn run_generate(config: &SynapseConfig, args: &ArgMatches) -> Result<()> {
    let tasks = strings(args, "task");
    let project_type = args.get_one::<String>("project-type").map(String::as_str);

    let backend = Arc::new(GeminiBackend::new(&config.backend)?);
    let generator = ProjectGenerator::new(backend, Pipeline::from_config(&config.output)?)
        .with_params(config.backend.generation)
        .with_redactor(config.redactor());

    let result = generator.generate(&tasks, project_type).await;
    report(result, args.get_flag("keep-archive"))
}

async fn run_materialize(config: &SynapseConfig, args: &ArgMatches) -> Result<()> {
    let source = args
        .get_one::<String>("response")
        .context("--response is required")?;
    let raw = read_response(source).await?;

    let result = Pipeline::from_config(&config.output)?.run(&raw).await;
    report(result, args.get_flag("keep-archive"))
}

async fn run_publish(config: &SynapseConfig, args: &ArgMatches) -> Result<()> {
    let repo = args.get_one::<String>("repo").context("--repo is required")?;
    let source = args
        .get_one::<String>("response")
        .context("--response is required")?;
    let description = args
        .get_one::<String>("description")
        .map_or("", String::as_str);
    let tasks = strings(args, "task");

    let publisher = GitHubPublisher::new(&config.publisher.clone().unwrap_or_default())?;
    let raw = read_response(source).await?;
    let project = Pipeline::from_config(&config.output)?
        .run(&raw)
        .await
        .into_result()?;

    let url = publish_project(&publisher, repo, description, &project.materialized, &tasks).await?;
    println!("Published {} files to {url}", project.materialized.len());
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let matches = build_cli().get_matches();
    init_tracing(matches.get_flag("log-json"));

    let config = load_config(&matches)?;
    tracing::debug!(?config, "Loaded configuration");

    match matches.subcommand() {
        Some(("plan", args)) => run_plan(&config, args).await,
        Some(("generate", args)) => run_generate(&config, args).await,
        Some(("materialize", args)) => run_materialize(&config, args).await,
        Some(("publish", args)) => run_publish(&config, args).await,
        _ => unreachable!("subcommand_required"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_is_well_formed() {
        build_cli().debug_assert();
    }

    #[test]
    fn generate_collects_repeated_tasks() {
        let matches = build_cli()
            .try_get_matches_from([
                "synapse",
                "generate",
                "--task",
                "1. Setup",
                "-t",
                "2. Build",
                "--output-dir",
                "/tmp/out",
            ])
            .unwrap();

        assert_eq!(
            matches.get_one::<PathBuf>("output-dir"),
            Some(&PathBuf::from("/tmp/out"))
        );
        let (name, args) = matches.subcommand().unwrap();
        assert_eq!(name, "generate");
        assert_eq!(strings(args, "task"), vec!["1. Setup", "2. Build"]);
        assert_eq!(
            args.get_one::<String>("project-type").map(String::as_str),
            Some("generic")
        );
    }

    #[test]
    fn subcommand_is_required() {
        assert!(build_cli().try_get_matches_from(["synapse"]).is_err());
    }

    #[test]
    fn publish_requires_repo() {
        let result =
            build_cli().try_get_matches_from(["synapse", "publish", "--response", "r.json"]);
        assert!(result.is_err());
    }
}
