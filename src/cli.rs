use std::path::PathBuf;

use clap::{ArgAction, Parser};

use crate::cmd::Commands;

/// Research-driven task manager.
/// Storage defaults to ~/.rtm/<project>_tasks.json or a path passed via --db.
#[derive(Parser)]
#[command(name = "rtm", version, about = "Turn research notes into tasks, sprints and roadmaps")]
pub struct Cli {
    /// Path to the JSON database file. Overrides --project.
    #[arg(long, global = true, env = "RTM_DB")]
    pub db: Option<PathBuf>,

    /// Project whose database to use.
    #[arg(long, global = true, env = "RTM_PROJECT", default_value = "default")]
    pub project: String,

    /// Directory holding project files and config.toml.
    #[arg(long, global = true, env = "RTM_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Increase log verbosity on stderr (-v info, -vv debug). RUST_LOG takes precedence.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}
