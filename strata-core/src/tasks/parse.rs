/// Line-level parsing of element text for the task projection.
///
/// Nothing here can fail: lines that don't look like a checkbox are plain
/// text. Line indexes count `\n`-separated lines from zero, the same way
/// `toggle_checkbox` addresses them.
use regex::Regex;
use std::sync::OnceLock;

use super::Subtask;
use crate::identity::subtask_id;

fn checkbox_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\s*[-*+]\s+\[([ xX])\](?:\s+(.*))?$").expect("valid checkbox regex")
    })
}

fn markup_prefix_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\s*(?:#{1,6}\s+|>\s*|[-*+]\s+(?:\[[ xX]\]\s*)?|\d+[.)]\s+)")
            .expect("valid markup prefix regex")
    })
}

fn lines(content: &str) -> impl Iterator<Item = (usize, &str)> {
    content
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .enumerate()
}

pub fn is_checkbox_line(line: &str) -> bool {
    checkbox_regex().is_match(line)
}

pub fn has_checkbox(content: &str) -> bool {
    lines(content).any(|(_, line)| is_checkbox_line(line))
}

/// Every checkbox line of `content` as a subtask of `element_id`.
pub fn parse_subtasks(element_id: &str, content: &str) -> Vec<Subtask> {
    lines(content)
        .filter_map(|(line_index, line)| {
            let captures = checkbox_regex().captures(line)?;
            let mark = captures.get(1).map_or(" ", |m| m.as_str());
            let text = captures.get(2).map_or("", |m| m.as_str()).trim();
            Some(Subtask {
                id: subtask_id(element_id, line_index),
                text: text.to_string(),
                is_completed: mark.eq_ignore_ascii_case("x"),
                line_index,
            })
        })
        .collect()
}

/// Strip heading, quote, list and checkbox markers from the start of a line.
pub fn strip_markup(line: &str) -> &str {
    match markup_prefix_regex().find(line) {
        Some(m) => line[m.end()..].trim(),
        None => line.trim(),
    }
}

/// Cut `text` to at most `max_chars` characters, ending in an ellipsis
/// when anything was dropped.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let keep = max_chars.saturating_sub(1);
    let mut out: String = text.chars().take(keep).collect();
    out.truncate(out.trim_end().len());
    out.push('…');
    out
}

/// Index and cleaned text of the first line with visible text.
fn title_line(content: &str) -> Option<(usize, &str)> {
    lines(content)
        .map(|(index, line)| (index, strip_markup(line)))
        .find(|(_, text)| !text.is_empty())
}

/// The title line with markup removed, before any truncation.
pub fn full_title(content: &str) -> Option<&str> {
    title_line(content).map(|(_, text)| text)
}

/// Every non-checkbox line after the title line, trimmed of surrounding
/// blank lines.
pub fn extract_description(content: &str) -> String {
    let Some((title_index, _)) = title_line(content) else {
        return String::new();
    };
    let body: Vec<&str> = lines(content)
        .filter(|(index, line)| *index > title_index && !is_checkbox_line(line))
        .map(|(_, line)| line.trim_end())
        .collect();
    body.join("\n").trim().to_string()
}

/// Rewrite the checkbox on `line_index` to the given state. Returns None
/// when that line is not a checkbox. Every other byte of `content` is kept.
pub fn toggle_checkbox(content: &str, line_index: usize, completed: bool) -> Option<String> {
    let mut out = String::with_capacity(content.len());
    let mut found = false;
    for (index, raw) in content.split('\n').enumerate() {
        if index > 0 {
            out.push('\n');
        }
        let line = raw.strip_suffix('\r').unwrap_or(raw);
        let mark = if index == line_index {
            checkbox_regex().captures(line).and_then(|c| c.get(1))
        } else {
            None
        };
        match mark {
            Some(mark) => {
                found = true;
                out.push_str(&raw[..mark.start()]);
                out.push(if completed { 'x' } else { ' ' });
                out.push_str(&raw[mark.end()..]);
            }
            None => out.push_str(raw),
        }
    }
    found.then_some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_basic_checklist() {
        let subtasks = parse_subtasks("e1", "- [ ] A\n- [x] B");
        assert_eq!(subtasks.len(), 2);
        assert_eq!(subtasks[0].text, "A");
        assert!(!subtasks[0].is_completed);
        assert_eq!(subtasks[0].line_index, 0);
        assert_eq!(subtasks[1].text, "B");
        assert!(subtasks[1].is_completed);
        assert_eq!(subtasks[1].line_index, 1);
        assert_eq!(subtasks[1].id, "e1:L1");
    }

    #[test]
    fn test_parse_variants() {
        let content = "Plan\n  * [X] indented star\n+ [ ] plus\n-[ ] no space\n- [] empty\n- [x]";
        let subtasks = parse_subtasks("e", content);
        let texts: Vec<&str> = subtasks.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(texts, vec!["indented star", "plus", ""]);
        assert!(subtasks[0].is_completed);
        assert_eq!(subtasks[2].line_index, 5);
    }

    #[test]
    fn test_crlf_content() {
        let subtasks = parse_subtasks("e", "- [ ] A\r\n- [x] B\r\n");
        assert_eq!(subtasks.len(), 2);
        assert_eq!(subtasks[0].text, "A");
    }

    #[test]
    fn test_title_strips_markup() {
        assert_eq!(full_title("\n\n## Launch plan\nbody"), Some("Launch plan"));
        assert_eq!(full_title("- [ ] Buy milk"), Some("Buy milk"));
        assert_eq!(full_title("   \n  "), None);
    }

    #[test]
    fn test_title_truncation() {
        let title = truncate_chars("abcdefghij", 5);
        assert_eq!(title, "abcd…");
        assert_eq!(title.chars().count(), 5);
        assert_eq!(truncate_chars("abcde", 5), "abcde");
    }

    #[test]
    fn test_description_skips_title_and_checkboxes() {
        let content = "Title\nFirst note\n- [ ] task\n\nSecond note\n";
        assert_eq!(extract_description(content), "First note\n\nSecond note");
        assert_eq!(extract_description("Only a title"), "");
    }

    #[test]
    fn test_toggle_checkbox_preserves_other_lines() {
        let content = "Intro\r\n- [ ] A\r\n  - [x] B";
        let toggled = toggle_checkbox(content, 1, true).unwrap();
        assert_eq!(toggled, "Intro\r\n- [x] A\r\n  - [x] B");
        let back = toggle_checkbox(&toggled, 2, false).unwrap();
        assert_eq!(back, "Intro\r\n- [x] A\r\n  - [ ] B");
        assert_eq!(toggle_checkbox(content, 0, true), None);
        assert_eq!(toggle_checkbox(content, 9, true), None);
    }

    #[test]
    fn test_plain_text_never_fails() {
        assert!(parse_subtasks("e", "[x] not a list\n- [y] bad mark\n").is_empty());
        assert!(!has_checkbox(""));
    }
}
