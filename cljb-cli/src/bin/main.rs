use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use cljb_cfg::ConfigSet;
use cljb_cli::OutputFormat;
use cljb_core::Engine;
use cljb_graph::Project;
use tracing_subscriber::EnvFilter;

/// Inspect how a Clojure project is wired together.
#[derive(Debug, Parser)]
#[command(name = "cljb", version)]
struct Args {
    /// Directory containing the project file.
    #[arg(long, short = 'p', default_value = ".")]
    project_dir: PathBuf,
    /// Override a config, e.g. `--config build_dir=out`.
    #[arg(long = "config", short = 'c', value_name = "NAME=VALUE")]
    configs: Vec<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List every task.
    Tasks,
    /// Print the dependency tree of a task.
    Graph { task: String },
    /// Print the order tasks would run in.
    Order {
        #[arg(required = true)]
        tasks: Vec<String>,
    },
    /// Print the classpath and destination of a task.
    Classpath { task: String },
    /// List the source and resource files of a source set.
    Sources { source_set: String },
    /// Print the resolved dependencies of a configuration.
    Deps { configuration: String },
    /// Print every config and its current value.
    Configs,
}

fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let configs = {
        let mut builder = ConfigSet::builder();
        cljb_core::cfgs::all_cfgs(&mut builder);
        builder.build()
    };
    for raw in &args.configs {
        configs.apply_override(raw)?;
    }
    tracing::debug!(?args, "starting");

    let format = OutputFormat::from_env();
    let dir = args.project_dir.as_path();
    let out = match &args.command {
        Command::Tasks => cljb_cli::tasks(&configure(&configs, dir)?, format),
        Command::Graph { task } => cljb_cli::graph(&configure(&configs, dir)?, task)?,
        Command::Order { tasks } => cljb_cli::order(&configure(&configs, dir)?, tasks)?,
        Command::Classpath { task } => {
            cljb_cli::classpath(&configure(&configs, dir)?, task, format)?
        }
        Command::Sources { source_set } => {
            cljb_cli::sources(&configure(&configs, dir)?, source_set, format)?
        }
        Command::Deps { configuration } => {
            cljb_cli::dependencies(&configure(&configs, dir)?, configuration, format)?
        }
        Command::Configs => configs.to_string(),
    };
    print!("{out}");

    Ok(())
}

fn configure(configs: &ConfigSet, project_dir: &Path) -> Result<Project, anyhow::Error> {
    Engine::new(configs.clone(), project_dir)?.configure()
}
