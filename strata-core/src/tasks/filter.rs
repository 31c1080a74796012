use std::cmp::Ordering;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::TaskProjection;
use crate::text::{contains_text, normalize_for_search, normalize_hash_tag};
use crate::types::{Priority, TaskStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TagMatch {
    /// At least one of the filter tags.
    #[default]
    Any,
    /// Every filter tag.
    All,
}

/// Inclusive date range; either bound may be open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DateRange {
    #[serde(default)]
    pub from: Option<NaiveDate>,
    #[serde(default)]
    pub to: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        Self { from, to }
    }

    /// An undated task never falls inside a range.
    pub fn contains(&self, date: Option<NaiveDate>) -> bool {
        let Some(date) = date else {
            return false;
        };
        self.from.map_or(true, |from| date >= from) && self.to.map_or(true, |to| date <= to)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind", content = "id")]
pub enum BoardRestriction {
    #[default]
    Any,
    Root,
    Board(String),
}

/// Selection over projected tasks. Empty sets and `None` ranges don't
/// restrict anything.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TaskFilter {
    pub statuses: Vec<TaskStatus>,
    pub tags: Vec<String>,
    pub tag_match: TagMatch,
    pub priorities: Vec<Priority>,
    pub due: Option<DateRange>,
    pub start: Option<DateRange>,
    pub text: Option<String>,
    pub board: BoardRestriction,
    pub include_checkbox_tasks: bool,
    pub include_actionable: bool,
    pub include_tagged: bool,
}

impl Default for TaskFilter {
    fn default() -> Self {
        Self {
            statuses: Vec::new(),
            tags: Vec::new(),
            tag_match: TagMatch::Any,
            priorities: Vec::new(),
            due: None,
            start: None,
            text: None,
            board: BoardRestriction::Any,
            include_checkbox_tasks: true,
            include_actionable: true,
            include_tagged: true,
        }
    }
}

impl TaskFilter {
    pub fn matches(&self, task: &TaskProjection) -> bool {
        let rules = task.qualified_by;
        let included = (rules.checkboxes && self.include_checkbox_tasks)
            || (rules.actionable && self.include_actionable)
            || (rules.tagged && self.include_tagged);
        if !included {
            return false;
        }

        if !self.statuses.is_empty() && !self.statuses.contains(&task.status) {
            return false;
        }

        if !self.priorities.is_empty()
            && !task.priority.is_some_and(|p| self.priorities.contains(&p))
        {
            return false;
        }

        if !self.tags.is_empty() {
            let mut wanted = self.tags.iter().map(|t| normalize_hash_tag(t));
            let matched = match self.tag_match {
                TagMatch::Any => wanted.any(|t| task.tags.contains(&t)),
                TagMatch::All => wanted.all(|t| task.tags.contains(&t)),
            };
            if !matched {
                return false;
            }
        }

        if let Some(range) = &self.due {
            if !range.contains(task.due_date) {
                return false;
            }
        }
        if let Some(range) = &self.start {
            if !range.contains(task.start_date) {
                return false;
            }
        }

        match &self.board {
            BoardRestriction::Any => {}
            BoardRestriction::Root => {
                if task.source_board_id.is_some() {
                    return false;
                }
            }
            BoardRestriction::Board(id) => {
                if task.source_board_id.as_deref() != Some(id.as_str()) {
                    return false;
                }
            }
        }

        match self.text.as_deref().map(str::trim) {
            Some(needle) if !needle.is_empty() => {
                contains_text(&task.full_title, needle)
                    || contains_text(&task.title, needle)
                    || contains_text(&task.description, needle)
            }
            _ => true,
        }
    }

    pub fn apply<'a>(&self, tasks: &'a [TaskProjection]) -> Vec<&'a TaskProjection> {
        tasks.iter().filter(|task| self.matches(task)).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortField {
    Title,
    Status,
    Priority,
    #[default]
    DueDate,
    StartDate,
    Completion,
    Assignee,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskSort {
    pub field: SortField,
    pub direction: SortDirection,
}

impl TaskSort {
    pub fn new(field: SortField, direction: SortDirection) -> Self {
        Self { field, direction }
    }

    /// Order two tasks. Tasks missing the sort value go last in both
    /// directions; equal keys fall back to ascending id.
    pub fn compare(&self, a: &TaskProjection, b: &TaskProjection) -> Ordering {
        let by_field = match self.field {
            SortField::Title => self.keyed(
                Some(normalize_for_search(&a.title)),
                Some(normalize_for_search(&b.title)),
            ),
            SortField::Status => self.keyed(Some(a.status), Some(b.status)),
            SortField::Priority => self.keyed(a.priority, b.priority),
            SortField::DueDate => self.keyed(a.due_date, b.due_date),
            SortField::StartDate => self.keyed(a.start_date, b.start_date),
            SortField::Completion => self.keyed(Some(a.completion_percent), Some(b.completion_percent)),
            SortField::Assignee => self.keyed(
                a.assignee.as_deref().map(normalize_for_search),
                b.assignee.as_deref().map(normalize_for_search),
            ),
        };
        by_field.then_with(|| a.id.cmp(&b.id))
    }

    fn keyed<T: Ord>(&self, a: Option<T>, b: Option<T>) -> Ordering {
        match (a, b) {
            (Some(a), Some(b)) => match self.direction {
                SortDirection::Asc => a.cmp(&b),
                SortDirection::Desc => b.cmp(&a),
            },
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    }

    pub fn sort(&self, tasks: &mut [TaskProjection]) {
        tasks.sort_by(|a, b| self.compare(a, b));
    }
}

/// Filter then sort, returning owned copies.
pub fn query(tasks: &[TaskProjection], filter: &TaskFilter, sort: &TaskSort) -> Vec<TaskProjection> {
    let mut selected: Vec<TaskProjection> = filter.apply(tasks).into_iter().cloned().collect();
    sort.sort(&mut selected);
    selected
}
