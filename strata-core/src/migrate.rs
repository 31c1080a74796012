/// One-shot upgrade of stored documents to the current shape.
///
/// Runs on the raw JSON before deserialization, so the typed model and every
/// read path only ever see version `CURRENT_DOCUMENT_VERSION`.
///
/// - v0: no `version` field, elements and edges may lack `boardId` and
///   `surface`; legacy `card`/`group` type names; edges may use `from`/`to`.
/// - v1: board records under `boards`; task fields (`isActionable`,
///   `taskStatus`, `tags`, `priority`, `dueDate`, `startDate`, `assignee`)
///   stored flat on the element.
/// - v2: current.
use serde_json::{Map, Value};

use crate::document::DocumentError;
use crate::types::CURRENT_DOCUMENT_VERSION;

/// Upgrade `doc` in place. Returns the version it was read as.
pub fn upgrade(doc: &mut Value) -> Result<u32, DocumentError> {
    let root = doc.as_object_mut().ok_or(DocumentError::NotAnObject)?;
    let found = match root.get("version") {
        None | Some(Value::Null) => 0,
        Some(v) => v
            .as_u64()
            .ok_or_else(|| DocumentError::InvalidVersion(v.to_string()))?,
    };
    if found > u64::from(CURRENT_DOCUMENT_VERSION) {
        return Err(DocumentError::UnsupportedVersion {
            found,
            supported: CURRENT_DOCUMENT_VERSION,
        });
    }
    let found = found as u32;

    if found < 1 {
        upgrade_v0_to_v1(root);
    }
    if found < 2 {
        upgrade_v1_to_v2(root);
    }
    root.insert("version".into(), Value::from(CURRENT_DOCUMENT_VERSION));

    if found < CURRENT_DOCUMENT_VERSION {
        log::info!(
            "[strata.migrate] Upgraded document from v{} to v{}",
            found,
            CURRENT_DOCUMENT_VERSION
        );
    }
    Ok(found)
}

fn entries_mut<'a>(root: &'a mut Map<String, Value>, key: &str) -> impl Iterator<Item = &'a mut Map<String, Value>> {
    root.get_mut(key)
        .and_then(Value::as_array_mut)
        .into_iter()
        .flatten()
        .filter_map(Value::as_object_mut)
}

fn fill_scope(entity: &mut Map<String, Value>) {
    entity.entry("boardId").or_insert(Value::Null);
    let surface_missing = !entity.get("surface").is_some_and(Value::is_string);
    if surface_missing {
        entity.insert("surface".into(), Value::from("canvas"));
    }
}

fn upgrade_v0_to_v1(root: &mut Map<String, Value>) {
    for element in entries_mut(root, "elements") {
        fill_scope(element);
        let renamed = match element.get("type").and_then(Value::as_str) {
            Some("card") => Some("freeform-card"),
            Some("group") => Some("container"),
            _ => None,
        };
        if let Some(new_type) = renamed {
            element.insert("type".into(), Value::from(new_type));
        }
    }
    for edge in entries_mut(root, "edges") {
        fill_scope(edge);
        for (old, new) in [("from", "fromNodeId"), ("to", "toNodeId")] {
            if !edge.contains_key(new) {
                if let Some(value) = edge.remove(old) {
                    edge.insert(new.into(), value);
                }
            }
        }
    }
}

const FLAT_TASK_FIELDS: [(&str, &str); 7] = [
    ("isActionable", "actionable"),
    ("taskStatus", "status"),
    ("tags", "tags"),
    ("priority", "priority"),
    ("dueDate", "dueDate"),
    ("startDate", "startDate"),
    ("assignee", "assignee"),
];

fn legacy_status(value: Value) -> Value {
    let mapped = match value.as_str() {
        Some("todo") | Some("not-started") => "not_started",
        Some("doing") | Some("in-progress") => "in_progress",
        Some("done") => "completed",
        _ => return value,
    };
    Value::from(mapped)
}

fn upgrade_v1_to_v2(root: &mut Map<String, Value>) {
    if !root.contains_key("boardMeta") {
        if let Some(boards) = root.remove("boards") {
            root.insert("boardMeta".into(), boards);
        }
    }

    for element in entries_mut(root, "elements") {
        let mut task = match element.remove("task") {
            Some(Value::Object(task)) => task,
            _ => Map::new(),
        };
        for (flat, nested) in FLAT_TASK_FIELDS {
            let Some(value) = element.remove(flat) else {
                continue;
            };
            if value.is_null() || task.contains_key(nested) {
                continue;
            }
            let value = if nested == "status" {
                legacy_status(value)
            } else {
                value
            };
            task.insert(nested.into(), value);
        }
        if !task.is_empty() {
            element.insert("task".into(), Value::Object(task));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_v0_fills_scope_and_renames_types() {
        let mut doc = json!({
            "elements": [
                {"id": "a", "type": "card", "x": 0, "y": 0, "width": 10, "height": 10, "content": "hi"},
                {"id": "g", "type": "group", "x": 0, "y": 0, "width": 10, "height": 10, "surface": "experience"}
            ],
            "edges": [{"id": "e", "from": "a", "to": "g", "fromAnchor": "right", "toAnchor": "left"}]
        });
        assert_eq!(upgrade(&mut doc).unwrap(), 0);
        assert_eq!(doc["version"], 2);
        assert_eq!(doc["elements"][0]["type"], "freeform-card");
        assert_eq!(doc["elements"][0]["surface"], "canvas");
        assert!(doc["elements"][0]["boardId"].is_null());
        assert_eq!(doc["elements"][1]["type"], "container");
        assert_eq!(doc["elements"][1]["surface"], "experience");
        assert_eq!(doc["edges"][0]["fromNodeId"], "a");
        assert!(doc["edges"][0].get("from").is_none());
    }

    #[test]
    fn test_v1_moves_flat_task_fields() {
        let mut doc = json!({
            "version": 1,
            "boards": [{"id": "b1", "title": "One"}],
            "elements": [{
                "id": "a", "type": "text", "x": 0, "y": 0, "width": 1, "height": 1,
                "boardId": null, "surface": "canvas",
                "isActionable": true, "taskStatus": "done", "tags": ["#bug"], "dueDate": null
            }]
        });
        assert_eq!(upgrade(&mut doc).unwrap(), 1);
        assert_eq!(doc["boardMeta"][0]["id"], "b1");
        assert!(doc.get("boards").is_none());
        let element = &doc["elements"][0];
        assert_eq!(element["task"]["actionable"], true);
        assert_eq!(element["task"]["status"], "completed");
        assert_eq!(element["task"]["tags"], json!(["#bug"]));
        assert!(element.get("isActionable").is_none());
        assert!(element["task"].get("dueDate").is_none());
    }

    #[test]
    fn test_current_version_untouched() {
        let mut doc = json!({"version": 2, "elements": [], "edges": [], "boardMeta": []});
        let before = doc.clone();
        assert_eq!(upgrade(&mut doc).unwrap(), 2);
        assert_eq!(doc, before);
    }

    #[test]
    fn test_future_version_rejected() {
        let mut doc = json!({"version": 9});
        assert!(matches!(
            upgrade(&mut doc),
            Err(DocumentError::UnsupportedVersion { found: 9, .. })
        ));
    }

    #[test]
    fn test_non_object_rejected() {
        let mut doc = json!([1, 2, 3]);
        assert!(matches!(upgrade(&mut doc), Err(DocumentError::NotAnObject)));
    }
}
