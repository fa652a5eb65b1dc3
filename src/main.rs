//! # RTM - Research Task Manager
//!
//! Turns free-text research notes about the music-streaming app into
//! keyword-tagged tasks, groups them into sprints, and reports roadmap
//! statistics.
//!
//! ## Quick Start
//!
//! ```bash
//! # Suggest tasks from a research note
//! rtm classify "Implement React 19 music player with Material-UI using MCP servers"
//!
//! # Or feed a whole file / stdin
//! rtm classify --file research/perplexity-notes.md
//! cat notes.txt | rtm classify -
//!
//! # Plan a sprint
//! rtm sprint create "Sprint 1" --start "next monday" --end "in 3w" --goal "Playable MVP"
//! rtm sprint add task-3f2a "Sprint 1"
//!
//! # Track work and report
//! rtm log-time task-3f2a 2.5 --note "player skeleton"
//! rtm roadmap --output roadmap.json
//! ```
//!
//! Data is stored locally in `~/.rtm/` with each project as a separate JSON
//! file. Nothing is written until a command that changes state completes.

use anyhow::{Context, Result};
use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

pub mod classifier;
pub mod cli;
pub mod cmd;
pub mod config;
pub mod db;
pub mod error;
pub mod fields;
pub mod ids;
pub mod project;
pub mod roadmap;
pub mod sprint;
pub mod task;

use cli::Cli;
use cmd::*;
use config::{resolve_data_dir, Config};
use db::Database;
use project::Project;

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    // Commands that need neither a database nor configuration.
    if let Commands::Completions { shell } = cli.command {
        cmd_completions(shell);
        return Ok(());
    }

    let data_dir = resolve_data_dir(cli.data_dir.as_deref());
    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("failed to create data directory {}", data_dir.display()))?;

    if let Commands::Projects = cli.command {
        return cmd_projects(&data_dir);
    }

    let config = Config::load(&data_dir)?;
    let db_path = match cli.db {
        Some(path) => path,
        None => Project::new(&cli.project, &data_dir)?.file_path,
    };
    debug!(db = %db_path.display(), data_dir = %data_dir.display(), "resolved storage");

    let mut db = Database::load(&db_path)
        .with_context(|| format!("failed to load {}", db_path.display()))?;

    match cli.command {
        Commands::Completions { .. } | Commands::Projects => unreachable!("handled above"),

        Commands::Classify { text, file, source, dry_run } =>
            cmd_classify(&mut db, &db_path, &config, text, file, source, dry_run),

        Commands::Add(args) => cmd_add(&mut db, &db_path, &config, args),

        Commands::List(args) => {
            cmd_list(&db, args);
            Ok(())
        },

        Commands::View { id } => cmd_view(&db, id),

        Commands::Update(args) => cmd_update(&mut db, &db_path, args),

        Commands::Done { id } => cmd_done(&mut db, &db_path, id),

        Commands::LogTime { id, hours, note } => cmd_log_time(&mut db, &db_path, id, hours, note),

        Commands::Sprint { action } => cmd_sprint(&mut db, &db_path, action),

        Commands::Roadmap { json, output } => cmd_roadmap(&db, json, output),

        Commands::Backup => cmd_backup(&db_path),
    }
}
