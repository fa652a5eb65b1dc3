//! Task store, persistence and shared utility functions.
//!
//! `Database` is the single owner of every task, sprint and time entry. It is
//! an explicit value passed to each operation; nothing is written to disk
//! until the caller invokes `save`.

use std::fmt;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use chrono::{Datelike, Duration, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::classifier::{classify, ClassifierOptions};
use crate::error::{Error, Result};
use crate::fields::*;
use crate::ids::{IdGenerator, UuidIds, TASK_PREFIX};
use crate::sprint::Sprint;
use crate::task::{NewTask, Task, TaskPatch, TimeEntry};

/// Version written into every database file.
pub const SCHEMA_VERSION: u32 = 1;

fn default_ids() -> Box<dyn IdGenerator> {
    Box::new(UuidIds)
}

/// In-memory store for tasks, sprints and the activity log.
#[derive(Serialize, Deserialize)]
pub struct Database {
    #[serde(default)]
    pub(crate) schema_version: u32,
    #[serde(default)]
    pub(crate) tasks: Vec<Task>,
    #[serde(default)]
    pub(crate) sprints: Vec<Sprint>,
    #[serde(default)]
    pub(crate) activity: Vec<TimeEntry>,
    #[serde(skip, default = "default_ids")]
    pub(crate) ids: Box<dyn IdGenerator>,
}

impl Default for Database {
    fn default() -> Self {
        Database::with_ids(Box::new(UuidIds))
    }
}

impl fmt::Debug for Database {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Database")
            .field("schema_version", &self.schema_version)
            .field("tasks", &self.tasks)
            .field("sprints", &self.sprints)
            .field("activity", &self.activity)
            .finish_non_exhaustive()
    }
}

/// Equality and tag-membership filters for `Database::list`.
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    pub status: Option<Status>,
    pub priority: Option<Priority>,
    pub area: Option<Area>,
    pub task_type: Option<TaskType>,
    /// Every listed tag must be present on the task.
    pub tags: Vec<String>,
}

impl TaskFilter {
    pub fn matches(&self, t: &Task) -> bool {
        self.status.map_or(true, |s| t.status == s)
            && self.priority.map_or(true, |p| t.priority == p)
            && self.area.map_or(true, |a| t.area == a)
            && self.task_type.map_or(true, |k| t.task_type == k)
            && self.tags.iter().all(|tg| t.has_tag(tg))
    }
}

impl Database {
    /// Empty database drawing identifiers from `ids`.
    pub fn with_ids(ids: Box<dyn IdGenerator>) -> Self {
        Database {
            schema_version: SCHEMA_VERSION,
            tasks: Vec::new(),
            sprints: Vec::new(),
            activity: Vec::new(),
            ids,
        }
    }

    /// Load database from a JSON file. A missing file is an empty database.
    pub fn load(path: &Path) -> Result<Self> {
        Self::load_with_ids(path, Box::new(UuidIds))
    }

    pub fn load_with_ids(path: &Path, ids: Box<dyn IdGenerator>) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "no database file, starting empty");
            return Ok(Database::with_ids(ids));
        }
        let buf = fs::read_to_string(path)?;
        let value: serde_json::Value = serde_json::from_str(&buf)?;
        let found = value
            .get("schema_version")
            .and_then(|v| v.as_u64())
            .unwrap_or(0);
        if found > u64::from(SCHEMA_VERSION) {
            return Err(Error::UnsupportedSchema {
                found: u32::try_from(found).unwrap_or(u32::MAX),
                supported: SCHEMA_VERSION,
            });
        }
        let mut db: Database = serde_json::from_value(value)?;
        db.schema_version = SCHEMA_VERSION;
        db.ids = ids;
        debug!(path = %path.display(), tasks = db.tasks.len(), sprints = db.sprints.len(), "database loaded");
        Ok(db)
    }

    /// Save database to JSON file using atomic write (temp file + rename).
    pub fn save(&self, path: &Path) -> Result<()> {
        let tmp = path.with_extension("json.tmp");
        let data = serde_json::to_string_pretty(self)?;
        let mut f = File::create(&tmp)?;
        f.write_all(data.as_bytes())?;
        f.flush()?;
        fs::rename(tmp, path)?;
        info!(path = %path.display(), tasks = self.tasks.len(), "database saved");
        Ok(())
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn sprints(&self) -> &[Sprint] {
        &self.sprints
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Append a new task and return its identifier.
    pub fn create(&mut self, new: NewTask) -> Result<String> {
        let title = new.title.trim().to_string();
        if title.is_empty() {
            return Err(Error::InvalidArgument("task title must not be empty".into()));
        }
        validate_hours("estimated hours", new.estimated_hours)?;

        let now_utc = Utc::now().timestamp();
        let id = self.ids.next_id(TASK_PREFIX);
        let mut dependencies = Vec::new();
        for dep in new.dependencies {
            if !dependencies.contains(&dep) {
                dependencies.push(dep);
            }
        }
        let task = Task {
            id: id.clone(),
            title,
            description: new.description,
            task_type: new.task_type,
            area: new.area,
            priority: new.priority,
            status: new.status,
            source: new.source,
            created_at_utc: now_utc,
            updated_at_utc: now_utc,
            estimated_hours: new.estimated_hours,
            tags: split_and_normalise_tags(&new.tags),
            dependencies,
            progress: if new.status == Status::Done { 100 } else { 0 },
            time_spent: 0.0,
            time_remaining: new.estimated_hours,
            sprint_id: None,
        };
        debug!(id = %id, title = %task.title, "task created");
        self.tasks.push(task);
        Ok(id)
    }

    /// Get a task by ID.
    pub fn get(&self, id: &str) -> Result<&Task> {
        self.tasks
            .iter()
            .find(|t| t.id == id)
            .ok_or_else(|| Error::task_not_found(id))
    }

    pub(crate) fn get_mut(&mut self, id: &str) -> Result<&mut Task> {
        self.tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| Error::task_not_found(id))
    }

    /// Shallow-merge `patch` over the task. Nothing is applied on error.
    pub fn update(&mut self, id: &str, patch: TaskPatch) -> Result<&Task> {
        if let Some(title) = &patch.title {
            if title.trim().is_empty() {
                return Err(Error::InvalidArgument("task title must not be empty".into()));
            }
        }
        if let Some(p) = patch.progress {
            if p > 100 {
                return Err(Error::InvalidArgument(format!("progress must be 0-100, got {p}")));
            }
        }
        if let Some(h) = patch.estimated_hours {
            validate_hours("estimated hours", h)?;
        }
        if let Some(h) = patch.time_remaining {
            validate_hours("time remaining", h)?;
        }

        let task = self.get_mut(id)?;
        if let Some(title) = patch.title {
            task.title = title.trim().to_string();
        }
        if let Some(desc) = patch.description {
            task.description = desc;
        }
        if let Some(k) = patch.task_type {
            task.task_type = k;
        }
        if let Some(a) = patch.area {
            task.area = a;
        }
        if let Some(p) = patch.priority {
            task.priority = p;
        }
        if let Some(s) = patch.status {
            task.status = s;
        }
        if let Some(h) = patch.estimated_hours {
            task.estimated_hours = h;
        }
        if let Some(p) = patch.progress {
            task.progress = p;
        }
        if let Some(h) = patch.time_remaining {
            task.time_remaining = h;
        }
        if !patch.add_tags.is_empty() || !patch.remove_tags.is_empty() {
            let remove = split_and_normalise_tags(&patch.remove_tags);
            let mut tags = task.tags.clone();
            tags.extend(split_and_normalise_tags(&patch.add_tags));
            tags.retain(|t| !remove.contains(t));
            tags.sort();
            tags.dedup();
            task.tags = tags;
        }
        for dep in patch.add_dependencies {
            if !task.dependencies.contains(&dep) {
                task.dependencies.push(dep);
            }
        }
        task.dependencies.retain(|d| !patch.remove_dependencies.contains(d));
        task.updated_at_utc = Utc::now().timestamp();
        debug!(id = %task.id, status = %task.status, "task updated");
        Ok(task)
    }

    /// Tasks matching `filter`, in insertion order. The iterator borrows only the store.
    pub fn list(&self, filter: &TaskFilter) -> impl Iterator<Item = &Task> {
        let filter = filter.clone();
        self.tasks.iter().filter(move |t| filter.matches(t))
    }

    /// Record `hours` of work against a task with a note in the activity log.
    pub fn add_time(&mut self, id: &str, hours: f64, note: &str) -> Result<&Task> {
        validate_hours("logged hours", hours)?;
        let now_utc = Utc::now().timestamp();
        let task = self.get_mut(id)?;
        task.time_spent += hours;
        task.time_remaining = (task.time_remaining - hours).max(0.0);
        task.updated_at_utc = now_utc;
        let task_id = task.id.clone();
        debug!(id = %task_id, hours, "time logged");
        self.activity.push(TimeEntry {
            task_id: task_id.clone(),
            hours,
            note: note.to_string(),
            logged_at_utc: now_utc,
        });
        self.get(&task_id)
    }

    /// Time entries logged against one task, oldest first.
    pub fn time_log(&self, id: &str) -> impl Iterator<Item = &TimeEntry> {
        let id = id.to_string();
        self.activity.iter().filter(move |e| e.task_id == id)
    }

    /// Classify research text and create a task for every draft.
    pub fn ingest(&mut self, text: &str, source: &str, options: &ClassifierOptions) -> Result<Vec<String>> {
        let drafts = classify(text, source, options);
        let mut ids = Vec::with_capacity(drafts.len());
        for draft in drafts {
            ids.push(self.create(draft)?);
        }
        info!(source, created = ids.len(), "research ingested");
        Ok(ids)
    }
}

fn validate_hours(what: &str, hours: f64) -> Result<()> {
    if !hours.is_finite() || hours < 0.0 {
        return Err(Error::InvalidArgument(format!("{what} must be a non-negative number, got {hours}")));
    }
    Ok(())
}

/// Canonical tag form, also used as the roadmap `by_tag` key: lowercase words
/// joined by single hyphens, so "Tech  Debt" and "tech-debt" count as one tag.
pub fn normalise_tag(s: &str) -> String {
    s.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}

/// Flatten `--tag` style inputs, each possibly comma-separated, into a sorted
/// tag set. Blank entries are dropped.
pub fn split_and_normalise_tags(inputs: &[String]) -> Vec<String> {
    let mut tags: Vec<String> = inputs
        .iter()
        .flat_map(|raw| raw.split(','))
        .map(normalise_tag)
        .filter(|tag| !tag.is_empty())
        .collect();
    tags.sort();
    tags.dedup();
    tags
}

/// Parse a human-readable date relative to the local calendar day.
pub fn parse_date_input(s: &str) -> Option<NaiveDate> {
    parse_date_relative(s, Local::now().date_naive())
}

/// Parse a human-readable date relative to `today`.
///
/// Supports:
/// - "today", "tomorrow", "yesterday"
/// - "monday" / "this monday" / "next monday" (and "mon" etc.)
/// - "end of week", "end of month"
/// - "in 3d", "in 2w", "in 1m"
/// - "YYYY-MM-DD" format
pub fn parse_date_relative(s: &str, today: NaiveDate) -> Option<NaiveDate> {
    let s = s.trim().to_lowercase();

    match s.as_str() {
        "today" => return Some(today),
        "tomorrow" => return Some(today + Duration::days(1)),
        "yesterday" => return Some(today - Duration::days(1)),
        "end of week" | "eow" => {
            let (_, end) = start_end_of_week(today);
            return Some(end);
        },
        "end of month" | "eom" => {
            let (year, month) = if today.month() == 12 {
                (today.year() + 1, 1)
            } else {
                (today.year(), today.month() + 1)
            };
            let first_of_next = NaiveDate::from_ymd_opt(year, month, 1)?;
            return Some(first_of_next - Duration::days(1));
        },
        _ => {}
    }

    if let Some(rest) = s.strip_prefix("in ") {
        let rest = rest.trim();
        let (num, unit_days) = if let Some(n) = rest.strip_suffix('d') {
            (n, 1)
        } else if let Some(n) = rest.strip_suffix('w') {
            (n, 7)
        } else if let Some(n) = rest.strip_suffix('m') {
            // Approximate: 30 days per month
            (n, 30)
        } else {
            return None;
        };
        let n: i64 = num.trim().parse().ok()?;
        return Some(today + Duration::days(n * unit_days));
    }

    let weekdays = [
        ("monday", 0), ("tuesday", 1), ("wednesday", 2), ("thursday", 3),
        ("friday", 4), ("saturday", 5), ("sunday", 6),
        ("mon", 0), ("tue", 1), ("wed", 2), ("thu", 3),
        ("fri", 4), ("sat", 5), ("sun", 6),
    ];
    let current_day = today.weekday().num_days_from_monday() as i64;
    for (day_name, target_day) in weekdays {
        let days_ahead = (target_day + 7 - current_day) % 7;
        if s == day_name || s == format!("this {day_name}") {
            return Some(today + Duration::days(days_ahead));
        }
        if s == format!("next {day_name}") {
            let days_to_add = if days_ahead == 0 { 7 } else { days_ahead + 7 };
            return Some(today + Duration::days(days_to_add));
        }
    }

    NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok()
}

/// Calculate the start and end dates of the ISO week (Monday to Sunday) containing `day`.
pub fn start_end_of_week(day: NaiveDate) -> (NaiveDate, NaiveDate) {
    let weekday = day.weekday().num_days_from_monday() as i64;
    let start = day - Duration::days(weekday);
    (start, start + Duration::days(6))
}

/// Cut `s` to at most `max_chars` characters. When anything is cut the last
/// kept position holds `…`, so a classifier title is never longer than
/// `title_max_len` including the ellipsis.
pub fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    if max_chars == 0 {
        return String::new();
    }
    let mut out: String = s.chars().take(max_chars - 1).collect();
    out.push('…');
    out
}

/// Short display form of an identifier: prefix plus the first 8 characters.
pub fn short_id(id: &str) -> String {
    match id.split_once('-') {
        Some((prefix, rest)) => format!("{prefix}-{}", rest.chars().take(8).collect::<String>()),
        None => id.chars().take(13).collect(),
    }
}

/// Print tasks in a formatted table.
pub fn print_table(tasks: &[&Task]) {
    println!(
        "{:<14} {:<13} {:<11} {:<8} {:<11} {:>5} {}",
        "ID", "Type", "Status", "Pri", "Area", "Est", "Title [tags]"
    );
    for t in tasks {
        let tags = if t.tags.is_empty() {
            String::new()
        } else {
            format!(" [{}]", t.tags.join(","))
        };
        println!(
            "{:<14} {:<13} {:<11} {:<8} {:<11} {:>5.1} {}{}",
            short_id(&t.id),
            t.task_type.as_str(),
            t.status.as_str(),
            t.priority.as_str(),
            t.area.as_str(),
            t.estimated_hours,
            truncate(&t.title, 60),
            tags
        );
    }
}

/// Resolve a task identifier to a task ID. Tried in order: full ID, exact
/// title (case-insensitive), unique ID prefix. Ambiguous input lists the candidates.
pub fn resolve_task_identifier(identifier: &str, db: &Database) -> Result<String> {
    let identifier = identifier.trim();
    if identifier.is_empty() {
        return Err(Error::InvalidArgument("task identifier must not be empty".into()));
    }
    if db.get(identifier).is_ok() {
        return Ok(identifier.to_string());
    }

    let wanted = identifier.to_lowercase();
    let by_title: Vec<&Task> = db.tasks.iter().filter(|t| t.title.to_lowercase() == wanted).collect();
    let matches = if by_title.is_empty() {
        db.tasks.iter().filter(|t| t.id.starts_with(identifier)).collect()
    } else {
        by_title
    };

    match matches.len() {
        0 => Err(Error::task_not_found(identifier)),
        1 => Ok(matches[0].id.clone()),
        _ => {
            let mut msg = format!("'{identifier}' matches several tasks:\n");
            for task in matches {
                msg.push_str(&format!("  {}: {} ({})\n", task.id, task.title, task.status));
            }
            msg.push_str("Please use the full ID instead.");
            Err(Error::InvalidArgument(msg))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::SequentialIds;

    fn test_db() -> Database {
        Database::with_ids(Box::new(SequentialIds::new()))
    }

    fn draft(title: &str, tags: &[&str]) -> NewTask {
        let mut t = NewTask::new(title);
        t.tags = tags.iter().map(|s| s.to_string()).collect();
        t
    }

    #[test]
    fn create_then_get_round_trips() {
        let mut db = test_db();
        let mut new = draft("Build player", &["Frontend", "ui, react"]);
        new.description = "React player".into();
        new.priority = Priority::High;
        let id = db.create(new).unwrap();
        assert_eq!(id, "task-1");

        let t = db.get(&id).unwrap();
        assert_eq!(t.title, "Build player");
        assert_eq!(t.description, "React player");
        assert_eq!(t.priority, Priority::High);
        assert_eq!(t.status, Status::Backlog);
        assert_eq!(t.tags, vec!["frontend", "react", "ui"]);
        assert_eq!(t.estimated_hours, 4.0);
        assert_eq!(t.time_remaining, 4.0);
        assert_eq!(t.sprint_id, None);
    }

    #[test]
    fn create_rejects_blank_title_and_negative_estimate() {
        let mut db = test_db();
        assert!(matches!(db.create(NewTask::new("  ")), Err(Error::InvalidArgument(_))));
        let mut bad = NewTask::new("x");
        bad.estimated_hours = -1.0;
        assert!(matches!(db.create(bad), Err(Error::InvalidArgument(_))));
        assert!(db.is_empty());
    }

    #[test]
    fn update_status_is_visible() {
        let mut db = test_db();
        let id = db.create(NewTask::new("a")).unwrap();
        db.update(&id, TaskPatch::status(Status::Done)).unwrap();
        assert_eq!(db.get(&id).unwrap().status, Status::Done);

        // Any status may follow any other.
        db.update(&id, TaskPatch::status(Status::Backlog)).unwrap();
        assert_eq!(db.get(&id).unwrap().status, Status::Backlog);
    }

    #[test]
    fn update_missing_id_is_not_found() {
        let mut db = test_db();
        db.create(NewTask::new("a")).unwrap();
        let err = db.update("task-99", TaskPatch::status(Status::Done)).unwrap_err();
        assert!(matches!(err, Error::NotFound { kind: "task", .. }));
        assert_eq!(db.len(), 1);
    }

    #[test]
    fn update_validates_before_applying() {
        let mut db = test_db();
        let id = db.create(NewTask::new("a")).unwrap();
        let patch = TaskPatch {
            title: Some("renamed".into()),
            progress: Some(150),
            ..TaskPatch::default()
        };
        assert!(matches!(db.update(&id, patch), Err(Error::InvalidArgument(_))));
        assert_eq!(db.get(&id).unwrap().title, "a");
    }

    #[test]
    fn update_merges_tags_and_dependencies() {
        let mut db = test_db();
        let a = db.create(draft("a", &["backend", "api"])).unwrap();
        let b = db.create(NewTask::new("b")).unwrap();
        let patch = TaskPatch {
            add_tags: vec!["Security".into()],
            remove_tags: vec!["api".into()],
            add_dependencies: vec![b.clone(), b.clone()],
            ..TaskPatch::default()
        };
        let t = db.update(&a, patch).unwrap();
        assert_eq!(t.tags, vec!["backend", "security"]);
        assert_eq!(t.dependencies, vec![b.clone()]);

        let t = db
            .update(&a, TaskPatch { remove_dependencies: vec![b], ..TaskPatch::default() })
            .unwrap();
        assert!(t.dependencies.is_empty());
    }

    #[test]
    fn list_filters_by_fields_and_tags() {
        let mut db = test_db();
        let mut fe = draft("fe", &["frontend", "react"]);
        fe.area = Area::Frontend;
        fe.priority = Priority::High;
        db.create(fe).unwrap();
        db.create(draft("be", &["backend"])).unwrap();
        let mut done = draft("done", &["frontend"]);
        done.area = Area::Frontend;
        done.status = Status::Done;
        db.create(done).unwrap();

        let all: Vec<&str> = db.list(&TaskFilter::default()).map(|t| t.title.as_str()).collect();
        assert_eq!(all, vec!["fe", "be", "done"]);

        let filter = TaskFilter { area: Some(Area::Frontend), ..TaskFilter::default() };
        assert_eq!(db.list(&filter).count(), 2);

        let filter = TaskFilter { tags: vec!["frontend".into(), "react".into()], ..TaskFilter::default() };
        let titles: Vec<&str> = db.list(&filter).map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["fe"]);

        let filter = TaskFilter {
            status: Some(Status::Done),
            priority: Some(Priority::High),
            ..TaskFilter::default()
        };
        assert_eq!(db.list(&filter).count(), 0);
    }

    #[test]
    fn listed_tasks_outlive_the_filter() {
        let mut db = test_db();
        db.create(draft("open", &[])).unwrap();
        let open = {
            let filter = TaskFilter { status: Some(Status::Backlog), ..TaskFilter::default() };
            db.list(&filter)
        };
        assert_eq!(open.count(), 1);
    }

    #[test]
    fn add_time_accumulates_and_logs() {
        let mut db = test_db();
        let id = db.create(NewTask::new("a")).unwrap();
        db.add_time(&id, 1.5, "first pass").unwrap();
        let t = db.add_time(&id, 3.0, "second pass").unwrap();
        assert_eq!(t.time_spent, 4.5);
        assert_eq!(t.time_remaining, 0.0);

        let log: Vec<&str> = db.time_log(&id).map(|e| e.note.as_str()).collect();
        assert_eq!(log, vec!["first pass", "second pass"]);
    }

    #[test]
    fn add_time_rejects_negative_hours() {
        let mut db = test_db();
        let id = db.create(NewTask::new("a")).unwrap();
        db.add_time(&id, 2.0, "work").unwrap();
        assert!(matches!(db.add_time(&id, -1.0, "x"), Err(Error::InvalidArgument(_))));
        assert!(db.add_time(&id, f64::NAN, "x").is_err());
        assert_eq!(db.get(&id).unwrap().time_spent, 2.0);
        assert_eq!(db.time_log(&id).count(), 1);
        assert!(matches!(db.add_time("task-42", 1.0, "x"), Err(Error::NotFound { .. })));
    }

    #[test]
    fn ingest_creates_classified_tasks() {
        let mut db = test_db();
        let ids = db
            .ingest(
                "Implement React 19 music player with Material-UI and real-time features using MCP servers",
                "demo",
                &ClassifierOptions::default(),
            )
            .unwrap();
        assert_eq!(ids, vec!["task-1", "task-2"]);
        assert!(db.get("task-2").unwrap().has_tag("mcp"));
        assert!(db.ingest("hello world", "demo", &ClassifierOptions::default()).unwrap().is_empty());
        assert_eq!(db.len(), 2);
    }

    #[test]
    fn save_and_load_preserve_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("default_tasks.json");
        let mut db = test_db();
        let id = db.create(draft("persisted", &["qa"])).unwrap();
        db.add_time(&id, 1.0, "note").unwrap();
        db.save(&path).unwrap();
        assert!(!path.with_extension("json.tmp").exists());

        let loaded = Database::load(&path).unwrap();
        assert_eq!(loaded.tasks(), db.tasks());
        assert_eq!(loaded.time_log(&id).count(), 1);
        assert_eq!(loaded.schema_version, SCHEMA_VERSION);
    }

    #[test]
    fn load_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::load(&dir.path().join("nope.json")).unwrap();
        assert!(db.is_empty());
    }

    #[test]
    fn load_rejects_newer_schema_and_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("future.json");
        fs::write(&path, r#"{"schema_version": 99, "tasks": []}"#).unwrap();
        assert!(matches!(
            Database::load(&path),
            Err(Error::UnsupportedSchema { found: 99, supported: SCHEMA_VERSION })
        ));

        fs::write(&path, "not json").unwrap();
        assert!(matches!(Database::load(&path), Err(Error::Json(_))));
    }

    #[test]
    fn resolves_by_id_prefix_and_title() {
        let mut db = test_db();
        db.create(NewTask::new("Alpha")).unwrap();
        db.create(NewTask::new("Beta")).unwrap();
        db.create(NewTask::new("beta")).unwrap();
        assert_eq!(resolve_task_identifier("task-1", &db).unwrap(), "task-1");
        assert_eq!(resolve_task_identifier("alpha", &db).unwrap(), "task-1");
        assert!(matches!(resolve_task_identifier("BETA", &db), Err(Error::InvalidArgument(_))));
        assert!(matches!(resolve_task_identifier("gamma", &db), Err(Error::NotFound { .. })));
    }

    #[test]
    fn titles_win_over_id_prefixes() {
        let mut db = test_db();
        db.create(NewTask::new("Alpha")).unwrap();
        assert_eq!(resolve_task_identifier("task-", &db).unwrap(), "task-1");

        db.create(NewTask::new("task")).unwrap();
        db.create(NewTask::new("t")).unwrap();
        assert_eq!(resolve_task_identifier("Task", &db).unwrap(), "task-2");
        assert_eq!(resolve_task_identifier("t", &db).unwrap(), "task-3");
        assert!(matches!(resolve_task_identifier("task-", &db), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn blank_identifiers_are_rejected() {
        let mut db = test_db();
        db.create(NewTask::new("Alpha")).unwrap();
        assert!(matches!(resolve_task_identifier("", &db), Err(Error::InvalidArgument(_))));
        assert!(matches!(resolve_task_identifier(" \t ", &db), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn parses_relative_dates() {
        // 2024-05-15 is a Wednesday.
        let today = NaiveDate::from_ymd_opt(2024, 5, 15).unwrap();
        let d = |y, m, day| NaiveDate::from_ymd_opt(y, m, day).unwrap();
        assert_eq!(parse_date_relative("today", today), Some(today));
        assert_eq!(parse_date_relative("in 2w", today), Some(d(2024, 5, 29)));
        assert_eq!(parse_date_relative("friday", today), Some(d(2024, 5, 17)));
        assert_eq!(parse_date_relative("next wed", today), Some(d(2024, 5, 22)));
        assert_eq!(parse_date_relative("eow", today), Some(d(2024, 5, 19)));
        assert_eq!(parse_date_relative("end of month", today), Some(d(2024, 5, 31)));
        assert_eq!(parse_date_relative("2024-06-01", today), Some(d(2024, 6, 1)));
        assert_eq!(parse_date_relative("someday", today), None);
    }

    #[test]
    fn short_ids_keep_prefix() {
        assert_eq!(short_id("task-0123456789abcdef"), "task-01234567");
        assert_eq!(short_id("task-3"), "task-3");
    }

    #[test]
    fn normalises_tags() {
        let tags = split_and_normalise_tags(&["Tech Debt, api".into(), "API".into(), " ".into()]);
        assert_eq!(tags, vec!["api", "tech-debt"]);
        assert_eq!(normalise_tag("  Tech \t Debt "), "tech-debt");
    }

    #[test]
    fn truncation_counts_the_ellipsis() {
        assert_eq!(truncate("short", 5), "short");
        assert_eq!(truncate("shorter", 5), "shor…");
        assert_eq!(truncate("héllo wörld", 6).chars().count(), 6);
        assert_eq!(truncate("abc", 1), "…");
        assert_eq!(truncate("abc", 0), "");
    }
}
