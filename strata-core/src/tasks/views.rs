/// View shaping over an already filtered and sorted task list.
///
/// Every function here is a pure read. Views carry task ids so an edit made
/// from any of them routes back through `writeback` to the source element.
use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use super::TaskProjection;
use crate::types::{Priority, TaskStatus};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardColumn {
    pub status: TaskStatus,
    pub tasks: Vec<TaskProjection>,
}

/// One column per status, always in `TaskStatus::ALL` order, empty columns
/// included. Tasks keep their incoming order inside a column.
pub fn board_view(tasks: &[TaskProjection]) -> Vec<BoardColumn> {
    TaskStatus::ALL
        .iter()
        .map(|status| BoardColumn {
            status: *status,
            tasks: tasks.iter().filter(|t| t.status == *status).cloned().collect(),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableRow {
    pub id: String,
    pub title: String,
    pub status: TaskStatus,
    pub priority: Option<Priority>,
    pub start_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub assignee: Option<String>,
    /// "completed/total", empty when the task has no subtasks.
    pub progress: String,
    pub tags: Vec<String>,
}

pub fn table_view(tasks: &[TaskProjection]) -> Vec<TableRow> {
    tasks
        .iter()
        .map(|t| TableRow {
            id: t.id.clone(),
            title: t.title.clone(),
            status: t.status,
            priority: t.priority,
            start_date: t.start_date,
            due_date: t.due_date,
            assignee: t.assignee.clone(),
            progress: if t.total_subtasks == 0 {
                String::new()
            } else {
                format!("{}/{}", t.completed_subtasks, t.total_subtasks)
            },
            tags: t.tags.clone(),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEntry {
    pub date: NaiveDate,
    pub task_id: String,
    pub title: String,
    pub status: TaskStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarMonth {
    pub year: i32,
    pub month: u32,
    pub entries: Vec<CalendarEntry>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarView {
    pub months: Vec<CalendarMonth>,
    pub undated: Vec<String>,
}

/// Bucket tasks by month of their due date, or start date when there is no
/// due date. Months are chronological; entries are ordered by date and then
/// by incoming order.
pub fn calendar_view(tasks: &[TaskProjection]) -> CalendarView {
    let mut buckets: BTreeMap<(i32, u32), Vec<CalendarEntry>> = BTreeMap::new();
    let mut undated = Vec::new();

    for task in tasks {
        match task.due_date.or(task.start_date) {
            Some(date) => buckets
                .entry((date.year(), date.month()))
                .or_default()
                .push(CalendarEntry {
                    date,
                    task_id: task.id.clone(),
                    title: task.title.clone(),
                    status: task.status,
                }),
            None => undated.push(task.id.clone()),
        }
    }

    let months = buckets
        .into_iter()
        .map(|((year, month), mut entries)| {
            entries.sort_by_key(|e| e.date);
            CalendarMonth {
                year,
                month,
                entries,
            }
        })
        .collect();

    CalendarView { months, undated }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineBar {
    pub task_id: String,
    pub title: String,
    pub status: TaskStatus,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub lane: usize,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineView {
    pub bars: Vec<TimelineBar>,
    pub lane_count: usize,
    pub unscheduled: Vec<String>,
}

/// Lay tasks out as date bars. A task with only one date becomes a
/// single-day bar. Bars are placed in the first lane whose last bar ends
/// before this one starts; both ends are inclusive days.
pub fn timeline_view(tasks: &[TaskProjection]) -> TimelineView {
    let mut bars = Vec::new();
    let mut unscheduled = Vec::new();

    for task in tasks {
        let (start, end) = match (task.start_date, task.due_date) {
            (Some(s), Some(d)) => (s.min(d), s.max(d)),
            (Some(s), None) => (s, s),
            (None, Some(d)) => (d, d),
            (None, None) => {
                unscheduled.push(task.id.clone());
                continue;
            }
        };
        bars.push(TimelineBar {
            task_id: task.id.clone(),
            title: task.title.clone(),
            status: task.status,
            start,
            end,
            lane: 0,
        });
    }

    bars.sort_by(|a, b| {
        a.start
            .cmp(&b.start)
            .then(a.end.cmp(&b.end))
            .then_with(|| a.task_id.cmp(&b.task_id))
    });

    let mut lane_ends: Vec<NaiveDate> = Vec::new();
    for bar in &mut bars {
        match lane_ends.iter().position(|end| *end < bar.start) {
            Some(lane) => {
                bar.lane = lane;
                lane_ends[lane] = bar.end;
            }
            None => {
                bar.lane = lane_ends.len();
                lane_ends.push(bar.end);
            }
        }
    }

    TimelineView {
        bars,
        lane_count: lane_ends.len(),
        unscheduled,
    }
}
