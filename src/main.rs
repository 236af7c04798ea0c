use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use foolscap::build::build_site;
use foolscap::config::Config;
use foolscap::serve::serve_site;
use std::path::PathBuf;

/// Foolscap builds a static blog from Markdown posts, HTML layouts and static
/// assets.
#[derive(Parser, Debug)]
#[command(version)]
struct Cli {
    /// The project directory. `foolscap.yaml` is looked up here and in every
    /// parent directory.
    #[arg(long, global = true, default_value = ".")]
    project: PathBuf,

    /// Writes the site here instead of the project's output directory.
    #[arg(long, global = true)]
    output: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build the site. This is the default.
    Build,

    /// Build the site, then serve it on 127.0.0.1 (port from `PORT`, or 3000).
    Serve,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let project = cli
        .project
        .canonicalize()
        .with_context(|| format!("Resolving project directory `{}`", cli.project.display()))?;
    let config = Config::from_directory(&project, cli.output.as_deref())?;

    match cli.command.unwrap_or(Command::Build) {
        Command::Build => {
            build_site(&config)?;
        }
        Command::Serve => serve_site(&config)?,
    }
    Ok(())
}
