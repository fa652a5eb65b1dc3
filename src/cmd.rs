//! Command implementations for the CLI interface.
//!
//! Each handler loads nothing itself: `main` resolves the database and
//! configuration, then hands them to the matching `cmd_*` function, which
//! performs the store operation and saves explicitly when something changed.

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::{Local, TimeZone, Utc};
use clap::{Args, Subcommand};
use clap_complete::{generate, Shell};
use tracing::warn;

use crate::config::Config;
use crate::db::*;
use crate::fields::*;
use crate::project::discover_projects;
use crate::roadmap::{compute_roadmap, print_roadmap, save_roadmap};
use crate::sprint::resolve_sprint_identifier;
use crate::task::{NewTask, Task, TaskPatch};

#[derive(Subcommand)]
pub enum Commands {
    /// Classify research text into tasks and add them to the project.
    Classify {
        /// Research text. Use "-" to read from stdin.
        text: Option<String>,
        /// Read research text from a file instead.
        #[arg(long, conflicts_with = "text")]
        file: Option<PathBuf>,
        /// Provenance recorded on each task (defaults to the file path or "cli").
        #[arg(long)]
        source: Option<String>,
        /// Print the suggested tasks without saving them.
        #[arg(long)]
        dry_run: bool,
    },

    /// Add a task by hand.
    Add(AddArgs),

    /// List tasks with optional filters.
    List(ListArgs),

    /// View a single task by ID, ID prefix or title.
    View {
        id: String,
    },

    /// Update fields on a task.
    Update(UpdateArgs),

    /// Mark a task done.
    Done {
        id: String,
    },

    /// Log hours worked on a task.
    LogTime {
        id: String,
        #[arg(allow_hyphen_values = true)]
        hours: f64,
        #[arg(long, default_value = "")]
        note: String,
    },

    /// Manage sprints.
    Sprint {
        #[command(subcommand)]
        action: SprintAction,
    },

    /// Show roadmap statistics.
    Roadmap {
        /// Print the snapshot as JSON.
        #[arg(long)]
        json: bool,
        /// Also write the snapshot to this file.
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// List project files in the data directory.
    Projects,

    /// Create a timestamped backup of the current project file.
    Backup,

    /// Generate shell completion scripts.
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args)]
pub struct AddArgs {
    /// Short title for the task.
    pub title: String,
    #[arg(long)]
    pub desc: Option<String>,
    #[arg(long = "type", value_enum, default_value_t = TaskType::Feature)]
    pub task_type: TaskType,
    #[arg(long, value_enum, default_value_t = Area::Backend)]
    pub area: Area,
    #[arg(long, value_enum, default_value_t = Priority::Medium)]
    pub priority: Priority,
    #[arg(long, value_enum, default_value_t = Status::Backlog)]
    pub status: Status,
    /// Comma-separated tags. May be repeated.
    #[arg(long = "tag")]
    pub tags: Vec<String>,
    /// Estimated hours (defaults to the configured estimate).
    #[arg(long)]
    pub estimate: Option<f64>,
    /// Task this one depends on. May be repeated.
    #[arg(long = "depends-on")]
    pub depends_on: Vec<String>,
}

#[derive(Args)]
pub struct ListArgs {
    #[arg(long, value_enum)]
    pub status: Option<Status>,
    #[arg(long, value_enum)]
    pub priority: Option<Priority>,
    #[arg(long, value_enum)]
    pub area: Option<Area>,
    #[arg(long = "type", value_enum)]
    pub task_type: Option<TaskType>,
    /// Filter by tag. May be repeated. Accepts comma-separated.
    #[arg(long = "tag")]
    pub tags: Vec<String>,
    #[arg(long, value_enum, default_value_t = SortKey::Created)]
    pub sort: SortKey,
    /// Limit number of rows printed.
    #[arg(long)]
    pub limit: Option<usize>,
}

#[derive(Args)]
pub struct UpdateArgs {
    /// Task ID, ID prefix or title to update.
    pub id: String,
    #[arg(long)]
    pub title: Option<String>,
    #[arg(long)]
    pub desc: Option<String>,
    #[arg(long = "type", value_enum)]
    pub task_type: Option<TaskType>,
    #[arg(long, value_enum)]
    pub area: Option<Area>,
    #[arg(long, value_enum)]
    pub priority: Option<Priority>,
    #[arg(long, value_enum)]
    pub status: Option<Status>,
    /// Progress percentage, 0-100.
    #[arg(long)]
    pub progress: Option<u8>,
    #[arg(long)]
    pub estimate: Option<f64>,
    #[arg(long)]
    pub remaining: Option<f64>,
    /// Add tags. May be repeated and comma-separated.
    #[arg(long = "add-tag")]
    pub add_tags: Vec<String>,
    /// Remove tags. May be repeated and comma-separated.
    #[arg(long = "rm-tag")]
    pub rm_tags: Vec<String>,
    #[arg(long = "add-dep")]
    pub add_deps: Vec<String>,
    #[arg(long = "rm-dep")]
    pub rm_deps: Vec<String>,
}

#[derive(Subcommand)]
pub enum SprintAction {
    /// Create a sprint.
    Create {
        name: String,
        /// Start date: YYYY-MM-DD, "today", "next monday", "in 3d", ...
        #[arg(long)]
        start: String,
        /// End date, same formats as --start.
        #[arg(long)]
        end: String,
        /// Sprint goal. May be repeated.
        #[arg(long = "goal")]
        goals: Vec<String>,
    },
    /// Put a task into a sprint.
    Add {
        task: String,
        sprint: String,
    },
    /// List sprints.
    List,
}

fn parse_date_arg(label: &str, s: &str) -> Result<chrono::NaiveDate> {
    parse_date_input(s).with_context(|| format!("could not parse {label} date '{s}'"))
}

fn format_utc(ts: i64) -> String {
    Utc.timestamp_opt(ts, 0)
        .single()
        .map(|t| t.to_rfc3339())
        .unwrap_or_else(|| "-".into())
}

fn save(db: &Database, db_path: &Path) -> Result<()> {
    db.save(db_path)
        .with_context(|| format!("failed to save {}", db_path.display()))
}

/// Classify research text and store the resulting tasks.
pub fn cmd_classify(
    db: &mut Database,
    db_path: &Path,
    config: &Config,
    text: Option<String>,
    file: Option<PathBuf>,
    source: Option<String>,
    dry_run: bool,
) -> Result<()> {
    let (text, default_source) = match (text, file) {
        (_, Some(path)) => {
            let text = fs::read_to_string(&path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            (text, path.display().to_string())
        },
        (Some(t), None) if t == "-" => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf).context("failed to read stdin")?;
            (buf, "stdin".to_string())
        },
        (Some(t), None) => (t, "cli".to_string()),
        (None, None) => bail!("provide research TEXT, --file PATH, or '-' to read stdin"),
    };
    let source = source.unwrap_or(default_source);
    let options = config.classifier_options();

    if dry_run {
        let drafts = crate::classifier::classify(&text, &source, &options);
        if drafts.is_empty() {
            println!("No tasks suggested.");
        }
        for d in drafts {
            println!("- [{}/{}/{}] {} [{}]", d.task_type, d.area, d.priority, d.title, d.tags.join(","));
        }
        return Ok(());
    }

    let ids = db.ingest(&text, &source, &options)?;
    if ids.is_empty() {
        println!("No tasks suggested.");
        return Ok(());
    }
    save(db, db_path)?;
    let created: Vec<&Task> = ids.iter().filter_map(|id| db.get(id).ok()).collect();
    println!("Added {} task(s):", created.len());
    print_table(&created);
    Ok(())
}

/// Add a new task to the database.
pub fn cmd_add(db: &mut Database, db_path: &Path, config: &Config, args: AddArgs) -> Result<()> {
    let mut dependencies = Vec::new();
    for dep in &args.depends_on {
        dependencies.push(resolve_task_identifier(dep, db).context("error resolving dependency")?);
    }

    let mut new = NewTask::new(args.title);
    new.description = args.desc.unwrap_or_default();
    new.task_type = args.task_type;
    new.area = args.area;
    new.priority = args.priority;
    new.status = args.status;
    new.source = "manual".to_string();
    new.estimated_hours = args.estimate.unwrap_or(config.default_estimate_hours);
    new.tags = args.tags;
    new.dependencies = dependencies;

    let id = db.create(new)?;
    save(db, db_path)?;
    println!("Added task {id}");
    Ok(())
}

/// List tasks with optional filtering and sorting.
pub fn cmd_list(db: &Database, args: ListArgs) {
    let filter = TaskFilter {
        status: args.status,
        priority: args.priority,
        area: args.area,
        task_type: args.task_type,
        tags: split_and_normalise_tags(&args.tags),
    };
    let mut tasks: Vec<&Task> = db.list(&filter).collect();
    match args.sort {
        // Store order is creation order.
        SortKey::Created => {},
        SortKey::Priority => tasks.sort_by_key(|t| t.priority),
        SortKey::Estimate => tasks.sort_by(|a, b| b.estimated_hours.total_cmp(&a.estimated_hours)),
    }
    if let Some(n) = args.limit {
        tasks.truncate(n);
    }
    print_table(&tasks);
}

/// View detailed information about a specific task.
pub fn cmd_view(db: &Database, id: String) -> Result<()> {
    let task_id = resolve_task_identifier(&id, db).context("error resolving task")?;
    let task = db.get(&task_id)?;
    let sprint = task
        .sprint_id
        .as_deref()
        .map(|sid| db.get_sprint(sid).map(|s| s.name.clone()).unwrap_or_else(|_| sid.to_string()))
        .unwrap_or_else(|| "-".into());

    println!("ID:           {}", task.id);
    println!("Title:        {}", task.title);
    println!("Type:         {}", task.task_type);
    println!("Area:         {}", task.area);
    println!("Priority:     {}", task.priority);
    println!("Status:       {}", task.status);
    println!("Progress:     {}%", task.progress);
    println!("Estimate:     {:.1}h", task.estimated_hours);
    println!("Spent:        {:.1}h", task.time_spent);
    println!("Remaining:    {:.1}h", task.time_remaining);
    println!("Sprint:       {sprint}");
    println!("Source:       {}", if task.source.is_empty() { "-" } else { task.source.as_str() });
    println!("Tags:         {}", if task.tags.is_empty() { "-".into() } else { task.tags.join(",") });
    println!("Depends on:   {}", if task.dependencies.is_empty() { "-".into() } else { task.dependencies.join(", ") });
    println!("Created UTC:  {}", format_utc(task.created_at_utc));
    println!("Updated UTC:  {}", format_utc(task.updated_at_utc));
    println!("Description:\n{}\n", if task.description.is_empty() { "-" } else { task.description.as_str() });

    let entries: Vec<_> = db.time_log(&task_id).collect();
    if !entries.is_empty() {
        println!("Time log:");
        for e in entries {
            println!("  {}  {:>5.1}h  {}", format_utc(e.logged_at_utc), e.hours, e.note);
        }
    }
    Ok(())
}

/// Update an existing task's fields.
pub fn cmd_update(db: &mut Database, db_path: &Path, args: UpdateArgs) -> Result<()> {
    let task_id = resolve_task_identifier(&args.id, db).context("error resolving task")?;
    let resolve_all = |ids: &[String]| -> Result<Vec<String>> {
        ids.iter()
            .map(|d| resolve_task_identifier(d, db).context("error resolving dependency"))
            .collect()
    };
    let add_dependencies = resolve_all(&args.add_deps)?;
    let remove_dependencies = resolve_all(&args.rm_deps)?;
    if add_dependencies.contains(&task_id) {
        warn!(task = %task_id, "task now depends on itself");
    }

    let patch = TaskPatch {
        title: args.title,
        description: args.desc,
        task_type: args.task_type,
        area: args.area,
        priority: args.priority,
        status: args.status,
        estimated_hours: args.estimate,
        progress: args.progress,
        time_remaining: args.remaining,
        add_tags: args.add_tags,
        remove_tags: args.rm_tags,
        add_dependencies,
        remove_dependencies,
    };
    if patch.is_empty() {
        bail!("nothing to update; pass at least one field flag");
    }
    db.update(&task_id, patch)?;
    save(db, db_path)?;
    println!("Updated task {task_id}");
    Ok(())
}

/// Mark a task done with full progress.
pub fn cmd_done(db: &mut Database, db_path: &Path, id: String) -> Result<()> {
    let task_id = resolve_task_identifier(&id, db).context("error resolving task")?;
    let patch = TaskPatch {
        status: Some(Status::Done),
        progress: Some(100),
        ..TaskPatch::default()
    };
    db.update(&task_id, patch)?;
    save(db, db_path)?;
    println!("Completed task {task_id}");
    Ok(())
}

/// Log time against a task.
pub fn cmd_log_time(db: &mut Database, db_path: &Path, id: String, hours: f64, note: String) -> Result<()> {
    let task_id = resolve_task_identifier(&id, db).context("error resolving task")?;
    let task = db.add_time(&task_id, hours, &note)?;
    let (spent, remaining) = (task.time_spent, task.time_remaining);
    save(db, db_path)?;
    println!("Logged {hours:.1}h on {task_id} ({spent:.1}h spent, {remaining:.1}h remaining)");
    Ok(())
}

/// Handle sprint management commands.
pub fn cmd_sprint(db: &mut Database, db_path: &Path, action: SprintAction) -> Result<()> {
    match action {
        SprintAction::Create { name, start, end, goals } => {
            let start = parse_date_arg("start", &start)?;
            let end = parse_date_arg("end", &end)?;
            let id = db.create_sprint(&name, start, end, goals)?.id.clone();
            save(db, db_path)?;
            println!("Created sprint {id}");
        },
        SprintAction::Add { task, sprint } => {
            let task_id = resolve_task_identifier(&task, db).context("error resolving task")?;
            let sprint_id = resolve_sprint_identifier(&sprint, db).context("error resolving sprint")?;
            db.add_task_to_sprint(&task_id, &sprint_id)?;
            save(db, db_path)?;
            println!("Added {task_id} to {sprint_id}");
        },
        SprintAction::List => {
            let today = Local::now().date_naive();
            println!("{:<16} {:<24} {:<10} {:<10} {:>4} {:>5}", "ID", "Name", "Start", "End", "Days", "Tasks");
            for s in db.sprints() {
                let marker = if s.contains_date(today) { " *" } else { "" };
                println!(
                    "{:<16} {:<24} {:<10} {:<10} {:>4} {:>5}{}",
                    short_id(&s.id),
                    truncate(&s.name, 24),
                    s.start,
                    s.end,
                    s.days(),
                    s.task_ids.len(),
                    marker
                );
                for goal in &s.goals {
                    println!("    - {goal}");
                }
            }
        },
    }
    Ok(())
}

/// Compute the roadmap, print it, and optionally write it to disk.
pub fn cmd_roadmap(db: &Database, json: bool, output: Option<PathBuf>) -> Result<()> {
    let snapshot = compute_roadmap(db);
    if json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    } else {
        print_roadmap(&snapshot);
    }
    if let Some(path) = output {
        save_roadmap(&snapshot, &path)
            .with_context(|| format!("failed to write roadmap to {}", path.display()))?;
        println!("Roadmap written to {}", path.display());
    }
    Ok(())
}

/// List project files with their task counts.
pub fn cmd_projects(data_dir: &Path) -> Result<()> {
    let projects = discover_projects(data_dir)
        .with_context(|| format!("failed to scan {}", data_dir.display()))?;
    if projects.is_empty() {
        println!("No projects in {}", data_dir.display());
        return Ok(());
    }
    println!("{:<24} {:>6}", "Project", "Tasks");
    for p in projects {
        let count = match Database::load(&p.file_path) {
            Ok(db) => db.len().to_string(),
            Err(e) => {
                warn!(path = %p.file_path.display(), error = %e, "unreadable project file");
                "?".to_string()
            }
        };
        println!("{:<24} {:>6}", truncate(&p.display_name, 24), count);
    }
    Ok(())
}

/// Create a timestamped backup of the database file.
pub fn create_backup(db_path: &Path) -> Result<PathBuf> {
    if !db_path.exists() {
        bail!("database file {} does not exist", db_path.display());
    }
    let parent_dir = db_path.parent().unwrap_or_else(|| Path::new("."));
    let backup_dir = parent_dir.join("backup");
    fs::create_dir_all(&backup_dir)?;

    let timestamp = Local::now().format("%Y-%m-%d_%H-%M-%S");
    let db_filename = db_path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("tasks.json");
    let backup_path = backup_dir.join(format!("{timestamp}_{db_filename}"));
    fs::copy(db_path, &backup_path)?;
    Ok(backup_path)
}

pub fn cmd_backup(db_path: &Path) -> Result<()> {
    let backup_path = create_backup(db_path).context("failed to create backup")?;
    println!("Backup created: {}", backup_path.display());
    Ok(())
}

/// Generate shell completion scripts.
pub fn cmd_completions(shell: Shell) {
    use clap::CommandFactory;
    use crate::cli::Cli;

    let mut app = Cli::command();
    let app_name = app.get_name().to_string();
    generate(shell, &mut app, app_name, &mut std::io::stdout());
}
