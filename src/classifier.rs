//! Keyword classifier turning free-text research notes into task drafts.
//!
//! This is a rule table, not a model: each rule owns a handful of trigger
//! substrings and the classification a hit implies. Matching is
//! case-insensitive and purely lexical, so "test" also fires inside
//! "testament". The output is a suggestion list for a human to review.

use tracing::debug;

use crate::db::truncate;
use crate::fields::*;
use crate::task::{NewTask, DEFAULT_ESTIMATE_HOURS};

/// Default maximum title length, in characters.
pub const DEFAULT_TITLE_MAX_LEN: usize = 80;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassifierOptions {
    pub title_max_len: usize,
    pub default_estimate_hours: f64,
}

impl Default for ClassifierOptions {
    fn default() -> Self {
        ClassifierOptions {
            title_max_len: DEFAULT_TITLE_MAX_LEN,
            default_estimate_hours: DEFAULT_ESTIMATE_HOURS,
        }
    }
}

/// One row of the rule table.
#[derive(Debug)]
pub struct Rule {
    pub triggers: &'static [&'static str],
    pub task_type: TaskType,
    pub area: Area,
    pub priority: Priority,
    pub tags: &'static [&'static str],
    /// Overrides `ClassifierOptions::default_estimate_hours` when set.
    pub estimate_hours: Option<f64>,
}

impl Rule {
    fn matches(&self, lowered: &str) -> bool {
        self.triggers.iter().any(|t| lowered.contains(t))
    }
}

/// Rules in output order. Triggers must be lowercase.
pub const RULES: &[Rule] = &[
    Rule {
        triggers: &["react", "frontend", "material-ui", "component"],
        task_type: TaskType::Feature,
        area: Area::Frontend,
        priority: Priority::High,
        tags: &["frontend", "react", "ui"],
        estimate_hours: None,
    },
    Rule {
        triggers: &["mcp", "model context protocol"],
        task_type: TaskType::Integration,
        area: Area::Integration,
        priority: Priority::High,
        tags: &["mcp", "integration"],
        estimate_hours: Some(6.0),
    },
    Rule {
        triggers: &["performance", "optimiz", "latency", "speed"],
        task_type: TaskType::Optimization,
        area: Area::Frontend,
        priority: Priority::Medium,
        tags: &["performance", "optimization"],
        estimate_hours: None,
    },
    Rule {
        triggers: &["test", "e2e", "playwright", "browser automation"],
        task_type: TaskType::Testing,
        area: Area::Testing,
        priority: Priority::Medium,
        tags: &["testing", "qa"],
        estimate_hours: None,
    },
    Rule {
        triggers: &["bug", "fix", "crash", "error"],
        task_type: TaskType::Bugfix,
        area: Area::Backend,
        priority: Priority::Critical,
        tags: &["bugfix"],
        estimate_hours: Some(2.0),
    },
    Rule {
        triggers: &["api", "backend", "database", "endpoint"],
        task_type: TaskType::Feature,
        area: Area::Backend,
        priority: Priority::High,
        tags: &["backend", "api"],
        estimate_hours: None,
    },
    Rule {
        triggers: &["security", "auth", "vulnerab"],
        task_type: TaskType::Feature,
        area: Area::Backend,
        priority: Priority::Critical,
        tags: &["security"],
        estimate_hours: None,
    },
    Rule {
        triggers: &["document", "readme", "docs"],
        task_type: TaskType::Documentation,
        area: Area::Backend,
        priority: Priority::Low,
        tags: &["documentation"],
        estimate_hours: Some(2.0),
    },
    Rule {
        triggers: &["refactor", "clean up", "cleanup", "restructure"],
        task_type: TaskType::Refactoring,
        area: Area::Backend,
        priority: Priority::Low,
        tags: &["refactoring", "tech-debt"],
        estimate_hours: None,
    },
    Rule {
        triggers: &["deploy", "docker", "ci/cd", "pipeline"],
        task_type: TaskType::Deployment,
        area: Area::Deployment,
        priority: Priority::Medium,
        tags: &["deployment", "devops"],
        estimate_hours: None,
    },
];

/// Split text into trimmed, non-empty sentence fragments.
///
/// `;` and line breaks always end a fragment. `.`, `!` and `?` only do when
/// followed by whitespace or the end of input, so "Next.js" and "19.2" stay whole.
fn fragments(text: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        let ends = match c {
            ';' | '\n' | '\r' => true,
            '.' | '!' | '?' => chars.peek().map_or(true, |&(_, next)| next.is_whitespace()),
            _ => false,
        };
        if ends {
            out.push(&text[start..i]);
            start = i + c.len_utf8();
        }
    }
    out.push(&text[start..]);
    out.into_iter()
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .collect()
}

/// Classify `text` into zero or more task drafts.
///
/// Each rule yields at most one draft, built from the first fragment that
/// contains one of its triggers. Never fails; input without any trigger (or
/// blank input) simply produces nothing.
pub fn classify(text: &str, source: &str, options: &ClassifierOptions) -> Vec<NewTask> {
    let frags: Vec<(&str, String)> = fragments(text)
        .into_iter()
        .map(|f| (f, f.to_lowercase()))
        .collect();
    if frags.is_empty() {
        return Vec::new();
    }

    let mut drafts = Vec::new();
    for rule in RULES {
        let Some((fragment, _)) = frags.iter().find(|(_, lowered)| rule.matches(lowered)) else {
            continue;
        };
        let span = fragment.split_whitespace().collect::<Vec<_>>().join(" ");
        debug!(tags = ?rule.tags, fragment = %span, "classifier rule matched");

        let mut draft = NewTask::new(truncate(&span, options.title_max_len));
        draft.description = span;
        draft.task_type = rule.task_type;
        draft.area = rule.area;
        draft.priority = rule.priority;
        draft.source = source.to_string();
        draft.estimated_hours = rule.estimate_hours.unwrap_or(options.default_estimate_hours);
        draft.tags = rule.tags.iter().map(|t| t.to_string()).collect();
        drafts.push(draft);
    }
    drafts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(text: &str) -> Vec<NewTask> {
        classify(text, "test-source", &ClassifierOptions::default())
    }

    #[test]
    fn demo_research_yields_two_tasks() {
        let drafts = run(
            "Implement React 19 music player with Material-UI and real-time features using MCP servers",
        );
        assert_eq!(drafts.len(), 2);

        let frontend = &drafts[0];
        assert!(frontend.tags.iter().any(|t| t == "frontend" || t == "performance"));
        assert_eq!(frontend.area, Area::Frontend);

        let mcp = &drafts[1];
        assert!(mcp.tags.iter().any(|t| t == "mcp" || t == "integration"));
        assert_eq!(mcp.task_type, TaskType::Integration);
        assert_eq!(mcp.source, "test-source");
    }

    #[test]
    fn no_trigger_means_no_tasks() {
        assert!(run("hello world").is_empty());
        assert!(run("").is_empty());
        assert!(run("   \n\t  ").is_empty());
    }

    #[test]
    fn every_rule_tags_its_own_trigger() {
        for rule in RULES {
            for trigger in rule.triggers {
                let text = format!("Please look at {} soon", trigger.to_uppercase());
                let drafts = run(&text);
                assert!(
                    drafts.iter().any(|d| d.tags.iter().any(|t| t == rule.tags[0])),
                    "trigger {trigger:?} did not produce tag {:?}",
                    rule.tags[0]
                );
            }
        }
    }

    #[test]
    fn rule_fires_once_per_input() {
        let drafts = run("Fix the crash. Fix the other bug. Fix everything!");
        let bugfixes = drafts.iter().filter(|d| d.task_type == TaskType::Bugfix).count();
        assert_eq!(bugfixes, 1);
        assert_eq!(drafts[0].description, "Fix the crash");
    }

    #[test]
    fn fragment_becomes_description_and_title() {
        let drafts = run("Some intro.  Add   Playwright   e2e coverage for search!  Outro");
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].title, "Add Playwright e2e coverage for search");
        assert_eq!(drafts[0].description, "Add Playwright e2e coverage for search");
        assert_eq!(drafts[0].priority, Priority::Medium);
    }

    #[test]
    fn dotted_names_do_not_split_sentences() {
        let drafts = run("Build the player page in Next.js with React 19.2 components");
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].description, "Build the player page in Next.js with React 19.2 components");
        assert_eq!(drafts[0].title, drafts[0].description);

        let drafts = run("Use Socket.io for the realtime API. Then ship it!");
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].title, "Use Socket.io for the realtime API");
    }

    #[test]
    fn sentence_breaks_need_following_whitespace() {
        assert_eq!(fragments("One. Two!Three? Four;five\nsix."), vec!["One", "Two!Three", "Four", "five", "six"]);
        assert!(fragments(" . ; ").is_empty());
    }

    #[test]
    fn long_titles_are_truncated() {
        let long = format!("Improve performance of {}", "the playlist shuffle ".repeat(10));
        let drafts = run(&long);
        assert_eq!(drafts[0].title.chars().count(), DEFAULT_TITLE_MAX_LEN);
        assert!(drafts[0].title.ends_with('…'));
        assert!(drafts[0].description.len() > drafts[0].title.len());
    }

    #[test]
    fn estimate_falls_back_to_options() {
        let options = ClassifierOptions { title_max_len: 20, default_estimate_hours: 7.5 };
        let drafts = classify("Refactor the queue. Update the README", "", &options);
        assert_eq!(drafts.len(), 2);
        let documentation = drafts.iter().find(|d| d.task_type == TaskType::Documentation).unwrap();
        let refactor = drafts.iter().find(|d| d.task_type == TaskType::Refactoring).unwrap();
        assert_eq!(documentation.estimated_hours, 2.0);
        assert_eq!(refactor.estimated_hours, 7.5);
    }

    #[test]
    fn coincidental_substrings_still_match() {
        let drafts = run("An old testament");
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].task_type, TaskType::Testing);
    }
}
