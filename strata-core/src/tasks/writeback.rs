/// Task edits expressed as element patches.
///
/// A task has no state of its own; every edit becomes an `ElementPatch` on
/// the source element and goes through `DocumentStore::update_element`.
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::parse::toggle_checkbox;
use crate::store::{DocumentStore, ElementPatch, ValidationError};
use crate::text::normalize_hash_tag;
use crate::types::{CanvasElement, Priority, TaskStatus};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum TaskEdit {
    SetStatus { status: Option<TaskStatus> },
    SetPriority { priority: Option<Priority> },
    SetStartDate { date: Option<NaiveDate> },
    SetDueDate { date: Option<NaiveDate> },
    SetAssignee { assignee: Option<String> },
    SetTags { tags: Vec<String> },
    #[serde(rename_all = "camelCase")]
    SetCustomProperty {
        key: String,
        value: Option<serde_json::Value>,
    },
    SetActionable { actionable: bool },
    #[serde(rename_all = "camelCase")]
    ToggleSubtask { line_index: usize, completed: bool },
}

/// Translate `edit` into a patch against `element`. Returns None when the
/// edit cannot apply, such as toggling a line that is not a checkbox.
pub fn edit_to_patch(element: &CanvasElement, edit: &TaskEdit) -> Option<ElementPatch> {
    if let TaskEdit::ToggleSubtask {
        line_index,
        completed,
    } = edit
    {
        let content = element.text_content()?;
        return toggle_checkbox(content, *line_index, *completed).map(|text| ElementPatch::content(&text));
    }

    let mut task = element.task.clone();
    match edit {
        TaskEdit::SetStatus { status } => task.status = *status,
        TaskEdit::SetPriority { priority } => task.priority = *priority,
        TaskEdit::SetStartDate { date } => task.start_date = *date,
        TaskEdit::SetDueDate { date } => task.due_date = *date,
        TaskEdit::SetAssignee { assignee } => {
            task.assignee = assignee.clone().filter(|a| !a.trim().is_empty());
        }
        TaskEdit::SetTags { tags } => {
            task.tags.clear();
            for tag in tags.iter().map(|t| normalize_hash_tag(t)) {
                if tag.len() > 1 && !task.tags.contains(&tag) {
                    task.tags.push(tag);
                }
            }
        }
        TaskEdit::SetCustomProperty { key, value } => match value {
            Some(value) => {
                task.custom_properties.insert(key.clone(), value.clone());
            }
            None => {
                task.custom_properties.remove(key);
            }
        },
        TaskEdit::SetActionable { actionable } => task.actionable = *actionable,
        TaskEdit::ToggleSubtask { .. } => return None,
    }
    Some(ElementPatch::task(task))
}

/// Apply `edit` to the task projected from element `task_id`. Unknown ids
/// and edits that don't apply return `Ok(false)`.
pub fn apply_task_edit(
    store: &mut DocumentStore,
    task_id: &str,
    edit: &TaskEdit,
) -> Result<bool, ValidationError> {
    let Some(element) = store.element(task_id) else {
        log::debug!("[strata.tasks.writeback] Unknown task {}", task_id);
        return Ok(false);
    };
    let Some(patch) = edit_to_patch(element, edit) else {
        log::debug!("[strata.tasks.writeback] {:?} does not apply to {}", edit, task_id);
        return Ok(false);
    };
    store.update_element(task_id, &patch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::{project_element, ProjectionOptions};

    fn store_with(content: &str) -> (DocumentStore, String) {
        let mut store = DocumentStore::default();
        let id = store.add_element(CanvasElement::card(content, 0.0, 0.0)).unwrap();
        (store, id)
    }

    fn projected(store: &DocumentStore, id: &str) -> crate::tasks::TaskProjection {
        project_element(store.element(id).unwrap(), &ProjectionOptions::default()).unwrap()
    }

    #[test]
    fn test_toggling_last_subtask_completes_task() {
        let (mut store, id) = store_with("- [ ] A\n- [x] B");
        assert_eq!(projected(&store, &id).status, TaskStatus::InProgress);

        let edit = TaskEdit::ToggleSubtask {
            line_index: 0,
            completed: true,
        };
        assert_eq!(apply_task_edit(&mut store, &id, &edit), Ok(true));

        let task = projected(&store, &id);
        assert_eq!(task.status, TaskStatus::Completed);
        assert_eq!(task.completion_percent, 100);
        assert_eq!(store.element(&id).unwrap().task.status, None);
        assert_eq!(store.element(&id).unwrap().text_content(), Some("- [x] A\n- [x] B"));
    }

    #[test]
    fn test_status_override_lands_on_source_element() {
        let (mut store, id) = store_with("- [ ] A");
        let edit = TaskEdit::SetStatus {
            status: Some(TaskStatus::Blocked),
        };
        apply_task_edit(&mut store, &id, &edit).unwrap();
        assert_eq!(store.element(&id).unwrap().task.status, Some(TaskStatus::Blocked));
        assert_eq!(projected(&store, &id).status, TaskStatus::Blocked);
    }

    #[test]
    fn test_custom_property_set_and_remove() {
        let (mut store, id) = store_with("- [ ] A");
        let set = TaskEdit::SetCustomProperty {
            key: "estimate".into(),
            value: Some(serde_json::json!(5)),
        };
        apply_task_edit(&mut store, &id, &set).unwrap();
        assert_eq!(
            projected(&store, &id).custom_properties.get("estimate"),
            Some(&serde_json::json!(5))
        );

        let remove = TaskEdit::SetCustomProperty {
            key: "estimate".into(),
            value: None,
        };
        apply_task_edit(&mut store, &id, &remove).unwrap();
        assert!(store.element(&id).unwrap().task.custom_properties.is_empty());
    }

    #[test]
    fn test_set_tags_normalizes() {
        let (mut store, id) = store_with("- [ ] A");
        let edit = TaskEdit::SetTags {
            tags: vec!["Urgent".into(), "#urgent".into(), "#".into()],
        };
        apply_task_edit(&mut store, &id, &edit).unwrap();
        assert_eq!(store.element(&id).unwrap().task.tags, vec!["#urgent".to_string()]);
    }

    #[test]
    fn test_unknown_task_and_non_checkbox_line_are_noops() {
        let (mut store, id) = store_with("Title\n- [ ] A");
        let toggle = TaskEdit::ToggleSubtask {
            line_index: 0,
            completed: true,
        };
        assert_eq!(apply_task_edit(&mut store, &id, &toggle), Ok(false));
        assert_eq!(apply_task_edit(&mut store, "missing", &toggle), Ok(false));
    }

    #[test]
    fn test_edit_deserializes_from_json() {
        let edit: TaskEdit =
            serde_json::from_str(r#"{"op":"toggleSubtask","lineIndex":2,"completed":true}"#).unwrap();
        assert_eq!(
            edit,
            TaskEdit::ToggleSubtask {
                line_index: 2,
                completed: true
            }
        );
    }
}
