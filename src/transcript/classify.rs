use serde_json::{Map, Value};
use tracing::trace;

use super::entry::LogEntry;
use super::tool_summary::{generate_tool_summary, tool_metadata, UNKNOWN_TOOL};
use super::user_filter::{self, Screened};
use super::{MessageType, ParsedMessage};

pub(crate) const PERMISSION_FALLBACK: &str = "Permission requested";
pub(crate) const INPUT_FALLBACK: &str = "Input requested";

/// Semantic category of a log entry, in dispatch priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum EntryKind {
    PermissionRequest,
    InputRequest,
    ToolUse,
    Assistant,
    User,
}

/// A classification rule: the first rule whose predicate matches an entry
/// owns it. Handlers are total and decide on their own whether to emit.
pub(crate) struct Rule {
    pub kind: EntryKind,
    pub matches: fn(&LogEntry) -> bool,
    pub handle: fn(LogEntry) -> Vec<ParsedMessage>,
}

pub(crate) const RULES: &[Rule] = &[
    Rule {
        kind: EntryKind::PermissionRequest,
        matches: is_permission_request,
        handle: permission_request,
    },
    Rule {
        kind: EntryKind::InputRequest,
        matches: is_input_request,
        handle: input_request,
    },
    Rule {
        kind: EntryKind::ToolUse,
        matches: is_tool_use,
        handle: tool_use,
    },
    Rule {
        kind: EntryKind::Assistant,
        matches: is_assistant,
        handle: assistant,
    },
    Rule {
        kind: EntryKind::User,
        matches: is_user,
        handle: user,
    },
];

pub(crate) fn classify(entry: &LogEntry) -> Option<&'static Rule> {
    RULES.iter().find(|rule| (rule.matches)(entry))
}

/// Turn one entry into zero or more feed messages. Entries no rule claims
/// (system, progress, snapshots, ...) produce nothing.
pub(crate) fn messages_for(entry: LogEntry) -> Vec<ParsedMessage> {
    match classify(&entry) {
        Some(rule) => {
            trace!(kind = ?rule.kind, "classified entry");
            (rule.handle)(entry)
        }
        None => {
            trace!(entry_type = ?entry.entry_type(), "dropping unclassified entry");
            Vec::new()
        }
    }
}

// ---------------------------------------------------------------------------
// Predicates
// ---------------------------------------------------------------------------

fn is_permission_request(entry: &LogEntry) -> bool {
    entry.entry_type() == Some("permission_request")
        || entry.subtype() == Some("permission_request")
}

fn is_input_request(entry: &LogEntry) -> bool {
    entry.subtype() == Some("input_request")
}

fn is_tool_use(entry: &LogEntry) -> bool {
    entry.entry_type() == Some("tool_use")
}

fn is_assistant(entry: &LogEntry) -> bool {
    entry.entry_type() == Some("assistant") && entry.role() == Some("assistant")
}

fn is_user(entry: &LogEntry) -> bool {
    entry.entry_type() == Some("user") && entry.role() == Some("user")
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

fn permission_request(mut entry: LogEntry) -> Vec<ParsedMessage> {
    let timestamp = entry.timestamp_or_now();
    let extracted = entry.take_content();
    let content = entry
        .permission_prompt
        .take()
        .filter(|prompt| !prompt.is_empty())
        .or_else(|| non_empty(extracted.text))
        .unwrap_or_else(|| PERMISSION_FALLBACK.to_string());

    vec![ParsedMessage::new(
        MessageType::PermissionRequest,
        content,
        timestamp,
    )]
}

fn input_request(mut entry: LogEntry) -> Vec<ParsedMessage> {
    let timestamp = entry.timestamp_or_now();
    let content =
        non_empty(entry.take_content().text).unwrap_or_else(|| INPUT_FALLBACK.to_string());

    vec![ParsedMessage::new(MessageType::InputRequest, content, timestamp)]
}

fn tool_use(entry: LogEntry) -> Vec<ParsedMessage> {
    let timestamp = entry.timestamp_or_now();
    let name = entry
        .tool_name
        .as_deref()
        .filter(|name| !name.is_empty())
        .unwrap_or(UNKNOWN_TOOL);

    vec![tool_summary(name, entry.tool_input.as_ref(), timestamp)]
}

/// Tool summaries first, in block order, then one message for all the text.
fn assistant(mut entry: LogEntry) -> Vec<ParsedMessage> {
    let timestamp = entry.timestamp_or_now();
    let extracted = entry.take_content();

    let mut messages: Vec<ParsedMessage> = extracted
        .tool_uses
        .iter()
        .map(|tool| tool_summary(&tool.name, tool.input.as_ref(), timestamp.clone()))
        .collect();

    if !extracted.text.is_empty() {
        messages.push(ParsedMessage::new(
            MessageType::TextResponse,
            extracted.text,
            timestamp,
        ));
    }

    messages
}

fn user(mut entry: LogEntry) -> Vec<ParsedMessage> {
    let is_meta = entry.is_meta;
    let extracted = entry.take_content();

    match user_filter::screen(is_meta, &extracted) {
        Screened::Keep { text, has_images } => {
            let mut metadata = Map::new();
            if has_images {
                metadata.insert("hasImages".to_string(), Value::Bool(true));
            }
            vec![ParsedMessage::new(
                MessageType::UserMessage,
                text.to_string(),
                entry.timestamp_or_now(),
            )
            .with_metadata(metadata)]
        }
        Screened::Drop(reason) => {
            trace!(?reason, "suppressing user entry");
            Vec::new()
        }
    }
}

fn tool_summary(name: &str, input: Option<&Value>, timestamp: String) -> ParsedMessage {
    ParsedMessage::new(
        MessageType::ToolSummary,
        generate_tool_summary(name, input),
        timestamp,
    )
    .with_metadata(tool_metadata(name, input))
}

fn non_empty(text: String) -> Option<String> {
    (!text.is_empty()).then_some(text)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
