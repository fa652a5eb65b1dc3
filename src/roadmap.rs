//! Roadmap aggregation: a point-in-time summary computed from the task store.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::db::{Database, SCHEMA_VERSION};
use crate::error::Result;
use crate::fields::Status;

/// Milestone text reported until real milestone planning exists.
pub const NEXT_MILESTONE: &str = "Complete current sprint";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SprintProgress {
    pub id: String,
    pub name: String,
    pub total_tasks: usize,
    pub completed_tasks: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoadmapSnapshot {
    pub total_tasks: usize,
    pub completed_tasks: usize,
    pub in_progress_tasks: usize,
    pub review_tasks: usize,
    pub backlog_tasks: usize,
    pub estimated_hours: f64,
    pub time_spent: f64,
    /// Completed over total; zero for an empty store.
    pub completion_rate: f64,
    pub by_status: BTreeMap<String, usize>,
    pub by_priority: BTreeMap<String, usize>,
    pub by_type: BTreeMap<String, usize>,
    pub by_area: BTreeMap<String, usize>,
    pub by_tag: BTreeMap<String, usize>,
    pub sprints: Vec<SprintProgress>,
    pub next_milestone: String,
}

impl RoadmapSnapshot {
    pub fn completion_percent(&self) -> f64 {
        self.completion_rate * 100.0
    }
}

/// On-disk envelope for a saved snapshot.
#[derive(Debug, Serialize, Deserialize)]
pub struct RoadmapFile {
    pub schema_version: u32,
    pub generated_at_utc: i64,
    pub roadmap: RoadmapSnapshot,
}

fn bump(map: &mut BTreeMap<String, usize>, key: &str) {
    *map.entry(key.to_string()).or_default() += 1;
}

/// Tally the current store in one pass.
pub fn compute_roadmap(db: &Database) -> RoadmapSnapshot {
    let mut snap = RoadmapSnapshot {
        total_tasks: 0,
        completed_tasks: 0,
        in_progress_tasks: 0,
        review_tasks: 0,
        backlog_tasks: 0,
        estimated_hours: 0.0,
        time_spent: 0.0,
        completion_rate: 0.0,
        by_status: BTreeMap::new(),
        by_priority: BTreeMap::new(),
        by_type: BTreeMap::new(),
        by_area: BTreeMap::new(),
        by_tag: BTreeMap::new(),
        sprints: Vec::new(),
        next_milestone: NEXT_MILESTONE.to_string(),
    };

    for t in db.tasks() {
        snap.total_tasks += 1;
        match t.status {
            Status::Done => snap.completed_tasks += 1,
            Status::InProgress => snap.in_progress_tasks += 1,
            Status::Review => snap.review_tasks += 1,
            Status::Backlog => snap.backlog_tasks += 1,
        }
        snap.estimated_hours += t.estimated_hours;
        snap.time_spent += t.time_spent;
        bump(&mut snap.by_status, t.status.as_str());
        bump(&mut snap.by_priority, t.priority.as_str());
        bump(&mut snap.by_type, t.task_type.as_str());
        bump(&mut snap.by_area, t.area.as_str());
        for tag in &t.tags {
            bump(&mut snap.by_tag, tag);
        }
    }

    if snap.total_tasks > 0 {
        snap.completion_rate = snap.completed_tasks as f64 / snap.total_tasks as f64;
    }

    snap.sprints = db
        .sprints()
        .iter()
        .map(|s| SprintProgress {
            id: s.id.clone(),
            name: s.name.clone(),
            total_tasks: s.task_ids.len(),
            completed_tasks: s
                .task_ids
                .iter()
                .filter(|id| db.get(id).map_or(false, |t| t.status == Status::Done))
                .count(),
        })
        .collect();

    snap
}

/// Write a snapshot with its generation time (temp file + rename).
pub fn save_roadmap(snapshot: &RoadmapSnapshot, path: &Path) -> Result<()> {
    let file = RoadmapFile {
        schema_version: SCHEMA_VERSION,
        generated_at_utc: Utc::now().timestamp(),
        roadmap: snapshot.clone(),
    };
    let tmp = path.with_extension("json.tmp");
    let data = serde_json::to_string_pretty(&file)?;
    let mut f = File::create(&tmp)?;
    f.write_all(data.as_bytes())?;
    f.flush()?;
    fs::rename(tmp, path)?;
    info!(path = %path.display(), total = snapshot.total_tasks, "roadmap saved");
    Ok(())
}

/// Human-readable summary.
pub fn print_roadmap(snap: &RoadmapSnapshot) {
    println!("Roadmap");
    println!("  Total tasks:     {}", snap.total_tasks);
    println!("  Completed:       {}", snap.completed_tasks);
    println!("  In progress:     {}", snap.in_progress_tasks);
    println!("  In review:       {}", snap.review_tasks);
    println!("  Backlog:         {}", snap.backlog_tasks);
    println!("  Estimated hours: {:.1}", snap.estimated_hours);
    println!("  Time spent:      {:.1}", snap.time_spent);
    println!("  Completion:      {:.1}%", snap.completion_percent());
    println!("  Next milestone:  {}", snap.next_milestone);

    let sections = [
        ("By priority", &snap.by_priority),
        ("By type", &snap.by_type),
        ("By area", &snap.by_area),
        ("By tag", &snap.by_tag),
    ];
    for (label, map) in sections {
        if map.is_empty() {
            continue;
        }
        println!("{label}:");
        for (key, count) in map {
            println!("  {key:<16} {count}");
        }
    }

    if !snap.sprints.is_empty() {
        println!("Sprints:");
        for s in &snap.sprints {
            println!("  {:<24} {}/{} done", s.name, s.completed_tasks, s.total_tasks);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::{Priority, TaskType};
    use crate::ids::SequentialIds;
    use crate::task::{NewTask, TaskPatch};
    use chrono::NaiveDate;

    fn test_db() -> Database {
        Database::with_ids(Box::new(SequentialIds::new()))
    }

    #[test]
    fn empty_store_has_zero_rate() {
        let snap = compute_roadmap(&test_db());
        assert_eq!(snap.total_tasks, 0);
        assert_eq!(snap.completion_rate, 0.0);
        assert!(snap.by_tag.is_empty());
        assert_eq!(snap.next_milestone, NEXT_MILESTONE);
    }

    #[test]
    fn two_open_tasks() {
        let mut db = test_db();
        db.create(NewTask::new("a")).unwrap();
        db.create(NewTask::new("b")).unwrap();
        let snap = compute_roadmap(&db);
        assert_eq!(snap.total_tasks, 2);
        assert_eq!(snap.completed_tasks, 0);
        assert_eq!(snap.completion_rate, 0.0);
        assert_eq!(snap.backlog_tasks, 2);
        assert_eq!(snap.estimated_hours, 8.0);
    }

    #[test]
    fn breakdowns_and_sprint_progress() {
        let mut db = test_db();
        let mut a = NewTask::new("a");
        a.priority = Priority::Critical;
        a.task_type = TaskType::Bugfix;
        a.tags = vec!["bugfix".into(), "backend".into()];
        let a = db.create(a).unwrap();
        let mut b = NewTask::new("b");
        b.tags = vec!["backend".into()];
        let b = db.create(b).unwrap();
        let c = db.create(NewTask::new("c")).unwrap();
        let d = db.create(NewTask::new("d")).unwrap();

        db.update(&a, TaskPatch::status(Status::Done)).unwrap();
        db.update(&b, TaskPatch::status(Status::InProgress)).unwrap();
        db.update(&c, TaskPatch::status(Status::Review)).unwrap();
        db.add_time(&a, 2.5, "fixed").unwrap();

        let day = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let sprint = db.create_sprint("S1", day, day, vec![]).unwrap().id.clone();
        db.add_task_to_sprint(&a, &sprint).unwrap();
        db.add_task_to_sprint(&d, &sprint).unwrap();

        let snap = compute_roadmap(&db);
        assert_eq!(snap.total_tasks, 4);
        assert_eq!(snap.completed_tasks, 1);
        assert_eq!(snap.in_progress_tasks, 1);
        assert_eq!(snap.review_tasks, 1);
        assert_eq!(snap.backlog_tasks, 1);
        assert_eq!(snap.completion_rate, 0.25);
        assert_eq!(snap.completion_percent(), 25.0);
        assert_eq!(snap.time_spent, 2.5);
        assert_eq!(snap.by_priority["critical"], 1);
        assert_eq!(snap.by_priority["medium"], 3);
        assert_eq!(snap.by_type["bugfix"], 1);
        assert_eq!(snap.by_area["backend"], 4);
        assert_eq!(snap.by_status["in-progress"], 1);
        assert_eq!(snap.by_tag["backend"], 2);
        assert_eq!(snap.by_tag["bugfix"], 1);
        assert_eq!(
            snap.sprints,
            vec![SprintProgress { id: sprint, name: "S1".into(), total_tasks: 2, completed_tasks: 1 }]
        );
    }

    #[test]
    fn saved_roadmap_has_envelope() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("roadmap.json");
        let snap = compute_roadmap(&test_db());
        save_roadmap(&snap, &path).unwrap();

        let file: RoadmapFile = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(file.schema_version, SCHEMA_VERSION);
        assert_eq!(file.roadmap, snap);
    }
}
