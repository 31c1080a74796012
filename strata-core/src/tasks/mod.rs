/// Task projection: a read-only task view over canvas elements.
///
/// `project_element` is a pure function of the element. Nothing here is
/// stored; edits go back to the source element through `writeback`.
pub mod filter;
pub mod parse;
pub mod views;
pub mod writeback;

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::config::CanvasConfig;
use crate::text::{extract_hash_tags, normalize_hash_tag};
use crate::types::{CanvasElement, Priority, Surface, TaskStatus};

pub use filter::{DateRange, SortDirection, SortField, TagMatch, TaskFilter, TaskSort};
pub use writeback::{apply_task_edit, edit_to_patch, TaskEdit};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subtask {
    pub id: String,
    pub text: String,
    pub is_completed: bool,
    pub line_index: usize,
}

/// Which qualification rules an element satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Qualification {
    pub checkboxes: bool,
    pub actionable: bool,
    pub tagged: bool,
}

impl Qualification {
    pub fn any(&self) -> bool {
        self.checkboxes || self.actionable || self.tagged
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskProjection {
    pub id: String,
    pub source_element_id: String,
    pub source_board_id: Option<String>,
    pub surface: Surface,
    pub title: String,
    pub description: String,
    pub subtasks: Vec<Subtask>,
    pub status: TaskStatus,
    pub completed_subtasks: usize,
    pub total_subtasks: usize,
    pub completion_percent: u8,
    pub priority: Option<Priority>,
    pub start_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub assignee: Option<String>,
    pub tags: Vec<String>,
    pub custom_properties: BTreeMap<String, serde_json::Value>,
    pub qualified_by: Qualification,
    /// Untruncated title line, matched by the free-text filter.
    #[serde(skip)]
    pub full_title: String,
}

/// Inputs to the projection that come from configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectionOptions {
    pub title_max_chars: usize,
    /// Normalized `#tag` vocabulary that qualifies an element.
    pub task_tags: Vec<String>,
}

impl Default for ProjectionOptions {
    fn default() -> Self {
        Self::from(&CanvasConfig::default())
    }
}

impl From<&CanvasConfig> for ProjectionOptions {
    fn from(config: &CanvasConfig) -> Self {
        Self {
            title_max_chars: config.title_max_chars,
            task_tags: config.task_tags.iter().map(|t| normalize_hash_tag(t)).collect(),
        }
    }
}

pub fn completion_percent(completed: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    (completed as f64 / total as f64 * 100.0).round() as u8
}

/// Status from subtask progress and an optional explicit override.
/// A fully checked list and a completed override both win over everything
/// else; blocked only ever comes from the override.
pub fn derive_status(status_override: Option<TaskStatus>, completed: usize, total: usize) -> TaskStatus {
    if status_override == Some(TaskStatus::Completed) || (total > 0 && completed == total) {
        return TaskStatus::Completed;
    }
    if status_override == Some(TaskStatus::Blocked) {
        return TaskStatus::Blocked;
    }
    if completed > 0 || status_override == Some(TaskStatus::InProgress) {
        return TaskStatus::InProgress;
    }
    TaskStatus::NotStarted
}

/// Tags from the task metadata followed by hash tags found in the text,
/// normalized and de-duplicated.
fn collect_tags(element: &CanvasElement) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    let from_meta = element.task.tags.iter().map(|t| normalize_hash_tag(t));
    let from_text = element.text_content().map(extract_hash_tags).unwrap_or_default();
    for tag in from_meta.chain(from_text) {
        if tag.len() > 1 && !tags.contains(&tag) {
            tags.push(tag);
        }
    }
    tags
}

/// Project one element, or None when it doesn't qualify as a task.
pub fn project_element(element: &CanvasElement, options: &ProjectionOptions) -> Option<TaskProjection> {
    let content = element.text_content().unwrap_or("");
    let tags = collect_tags(element);
    let qualified_by = Qualification {
        checkboxes: parse::has_checkbox(content),
        actionable: element.task.actionable,
        tagged: tags.iter().any(|t| options.task_tags.contains(t)),
    };
    if !qualified_by.any() {
        return None;
    }

    let subtasks = parse::parse_subtasks(&element.id, content);
    let total_subtasks = subtasks.len();
    let completed_subtasks = subtasks.iter().filter(|s| s.is_completed).count();
    let full_title = parse::full_title(content)
        .or_else(|| element.kind.label())
        .unwrap_or("Untitled");
    let title = parse::truncate_chars(full_title, options.title_max_chars);

    Some(TaskProjection {
        id: element.id.clone(),
        source_element_id: element.id.clone(),
        source_board_id: element.board_id.clone(),
        surface: element.surface(),
        title,
        description: parse::extract_description(content),
        status: derive_status(element.task.status, completed_subtasks, total_subtasks),
        completion_percent: completion_percent(completed_subtasks, total_subtasks),
        completed_subtasks,
        total_subtasks,
        subtasks,
        priority: element.task.priority,
        start_date: element.task.start_date,
        due_date: element.task.due_date,
        assignee: element.task.assignee.clone(),
        tags,
        custom_properties: element.task.custom_properties.clone(),
        qualified_by,
        full_title: full_title.to_string(),
    })
}

/// Project every qualifying element, in input order.
pub fn project_tasks<'a, I>(elements: I, options: &ProjectionOptions) -> Vec<TaskProjection>
where
    I: IntoIterator<Item = &'a CanvasElement>,
{
    let tasks: Vec<TaskProjection> = elements
        .into_iter()
        .filter_map(|element| project_element(element, options))
        .collect();
    log::trace!("[strata.tasks.project] {} tasks", tasks.len());
    tasks
}
