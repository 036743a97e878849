use serde_json::{Map, Value};

/// Tool name used when an invocation does not carry one.
pub(crate) const UNKNOWN_TOOL: &str = "unknown";

const BASH_PREVIEW_CHARS: usize = 50;

// ---------------------------------------------------------------------------
// Summaries
// ---------------------------------------------------------------------------

/// Build a one-line human-readable summary of a tool invocation.
///
/// Well-known agent tools get a tailored phrase; any other tool is rendered
/// as `<tool> on <target>` when its input names a file or pattern, or as the
/// bare tool name otherwise.
pub fn generate_tool_summary(name: &str, input: Option<&Value>) -> String {
    match name {
        "Read" => format!("Read {}", file_name(input)),
        "Edit" => {
            let (added, removed) = line_delta(
                str_field(input, "old_string").unwrap_or(""),
                str_field(input, "new_string").unwrap_or(""),
            );
            format!("Edited {} +{added}/-{removed} lines", file_name(input))
        }
        "Write" => format!("Created {}", file_name(input)),
        "Bash" => format!("Ran {}", command_preview(str_field(input, "command"))),
        "Glob" | "Grep" => match str_field(input, "pattern") {
            Some(pattern) => format!("{name} {pattern}"),
            None => name.to_string(),
        },
        _ => {
            let target = str_field(input, "file_path")
                .or_else(|| str_field(input, "path"))
                .or_else(|| str_field(input, "pattern"))
                .map(last_segment)
                .filter(|segment| !segment.is_empty());
            match target {
                Some(target) => format!("{name} on {target}"),
                None => name.to_string(),
            }
        }
    }
}

/// Metadata attached to every tool summary: the tool name and its input,
/// verbatim. A missing input becomes an empty object.
pub fn tool_metadata(name: &str, input: Option<&Value>) -> Map<String, Value> {
    let mut metadata = Map::new();
    metadata.insert("toolName".to_string(), Value::String(name.to_string()));
    metadata.insert(
        "toolInput".to_string(),
        input
            .cloned()
            .unwrap_or_else(|| Value::Object(Map::new())),
    );
    metadata
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn str_field<'a>(input: Option<&'a Value>, key: &str) -> Option<&'a str> {
    input
        .and_then(|v| v.get(key))
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

fn last_segment(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

fn file_name(input: Option<&Value>) -> &str {
    str_field(input, "file_path")
        .or_else(|| str_field(input, "path"))
        .map(last_segment)
        .filter(|segment| !segment.is_empty())
        .unwrap_or("file")
}

/// Crude line-count delta between the old and new text of an edit. Not a
/// diff: reordered lines count as unchanged.
fn line_delta(old: &str, new: &str) -> (usize, usize) {
    let old_lines = old.split('\n').count();
    let new_lines = new.split('\n').count();
    (
        new_lines.saturating_sub(old_lines),
        old_lines.saturating_sub(new_lines),
    )
}

fn command_preview(command: Option<&str>) -> String {
    let Some(command) = command else {
        return "command".to_string();
    };

    if command.chars().count() > BASH_PREVIEW_CHARS {
        let head: String = command.chars().take(BASH_PREVIEW_CHARS).collect();
        format!("{head}...")
    } else {
        command.to_string()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn summary(name: &str, input: Value) -> String {
        generate_tool_summary(name, Some(&input))
    }

    #[test]
    fn read_uses_last_path_segment() {
        assert_eq!(summary("Read", json!({"file_path": "src/a.ts"})), "Read a.ts");
        assert_eq!(summary("Read", json!({"path": "/etc/hosts"})), "Read hosts");
        assert_eq!(summary("Read", json!({})), "Read file");
        assert_eq!(generate_tool_summary("Read", None), "Read file");
    }

    #[test]
    fn edit_reports_line_count_delta() {
        let input = json!({"file_path": "x.ts", "old_string": "a\nb", "new_string": "a\nb\nc"});
        assert_eq!(summary("Edit", input), "Edited x.ts +1/-0 lines");

        let input = json!({"file_path": "lib/y.rs", "old_string": "1\n2\n3\n4", "new_string": "1"});
        assert_eq!(summary("Edit", input), "Edited y.rs +0/-3 lines");
    }

    #[test]
    fn edit_heuristic_ignores_reordering() {
        let input = json!({"file_path": "z.rs", "old_string": "a\nb", "new_string": "b\na"});
        assert_eq!(summary("Edit", input), "Edited z.rs +0/-0 lines");
    }

    #[test]
    fn edit_with_missing_strings_counts_one_line_each() {
        let input = json!({"file_path": "z.rs", "new_string": "a\nb"});
        assert_eq!(summary("Edit", input), "Edited z.rs +1/-0 lines");
    }

    #[test]
    fn write_reports_created_file() {
        assert_eq!(
            summary("Write", json!({"file_path": "docs/notes.md", "content": "x"})),
            "Created notes.md"
        );
    }

    #[test]
    fn bash_short_command_shown_in_full() {
        assert_eq!(summary("Bash", json!({"command": "cargo test"})), "Ran cargo test");
    }

    #[test]
    fn bash_long_command_truncated_to_fifty_chars() {
        let command = "x".repeat(51);
        let rendered = summary("Bash", json!({ "command": command }));
        assert_eq!(rendered, format!("Ran {}...", "x".repeat(50)));

        let exactly = "y".repeat(50);
        assert_eq!(
            summary("Bash", json!({ "command": exactly.clone() })),
            format!("Ran {exactly}")
        );
    }

    #[test]
    fn bash_truncation_counts_characters_not_bytes() {
        let command = "é".repeat(60);
        let rendered = summary("Bash", json!({ "command": command }));
        let preview = rendered
            .strip_prefix("Ran ")
            .and_then(|s| s.strip_suffix("..."))
            .expect("preview shape");
        assert_eq!(preview.chars().count(), 50);
    }

    #[test]
    fn bash_without_command_uses_placeholder() {
        assert_eq!(summary("Bash", json!({"command": ""})), "Ran command");
        assert_eq!(summary("Bash", json!({})), "Ran command");
    }

    #[test]
    fn glob_and_grep_show_pattern() {
        assert_eq!(summary("Glob", json!({"pattern": "**/*.rs"})), "Glob **/*.rs");
        assert_eq!(summary("Grep", json!({"pattern": "fn main"})), "Grep fn main");
        assert_eq!(summary("Grep", json!({})), "Grep");
    }

    #[test]
    fn unknown_tool_with_target() {
        assert_eq!(
            summary("NotebookEdit", json!({"file_path": "nb/analysis.ipynb"})),
            "NotebookEdit on analysis.ipynb"
        );
        assert_eq!(summary("LS", json!({"path": "src/server"})), "LS on server");
    }

    #[test]
    fn unknown_tool_falls_back_to_name() {
        assert_eq!(summary("CustomTool", json!({"some_field": "value"})), "CustomTool");
        assert_eq!(generate_tool_summary("WebSearch", None), "WebSearch");
    }

    #[test]
    fn metadata_carries_input_verbatim() {
        let input = json!({"file_path": "src/a.ts", "limit": 10});
        let metadata = tool_metadata("Read", Some(&input));
        assert_eq!(metadata["toolName"], json!("Read"));
        assert_eq!(metadata["toolInput"], input);
    }

    #[test]
    fn metadata_defaults_input_to_empty_object() {
        let metadata = tool_metadata("Bash", None);
        assert_eq!(metadata["toolInput"], json!({}));
    }
}
