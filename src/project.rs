//! Project files for multi-project support.
//!
//! Each project keeps its tasks and sprints in its own JSON file inside the
//! data directory, named `<project_name>_tasks.json`.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Represents a project with its name and database file path.
#[derive(Debug, Clone, PartialEq)]
pub struct Project {
    pub name: String,
    pub display_name: String,
    pub file_path: PathBuf,
}

impl Project {
    /// Create a project handle for the given display name.
    pub fn new(display_name: &str, data_dir: &Path) -> Result<Self> {
        let name = sanitize_project_name(display_name);
        if name.is_empty() {
            return Err(Error::InvalidArgument(format!("project name '{display_name}' is empty after sanitising")));
        }
        let file_path = data_dir.join(format!("{name}_tasks.json"));
        Ok(Project {
            name,
            display_name: display_name.trim().to_string(),
            file_path,
        })
    }

    /// Recognise a project from its database file name.
    pub fn from_file(file_path: PathBuf) -> Option<Self> {
        let file_name = file_path.file_stem()?.to_str()?;
        let name = file_name.strip_suffix("_tasks")?;
        if name.is_empty() {
            return None;
        }
        Some(Project {
            name: name.to_string(),
            display_name: name.replace('_', " "),
            file_path,
        })
    }
}

/// Convert a display name to a safe project name for file naming.
/// Lowercases and collapses every run of non-alphanumerics to one underscore.
pub fn sanitize_project_name(display_name: &str) -> String {
    display_name
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect::<String>()
        .split('_')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("_")
}

/// Discover all existing projects in the data directory, sorted by display name.
pub fn discover_projects(data_dir: &Path) -> Result<Vec<Project>> {
    let mut projects = Vec::new();
    if !data_dir.exists() {
        return Ok(projects);
    }
    for entry in fs::read_dir(data_dir)? {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|e| e == "json") {
            if let Some(project) = Project::from_file(path) {
                projects.push(project);
            }
        }
    }
    projects.sort_by(|a, b| a.display_name.cmp(&b.display_name));
    Ok(projects)
}
