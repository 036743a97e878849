//! Agent transcript parser.
//!
//! Turns an append-only JSONL session log into a feed of normalized
//! messages, resuming from a byte offset so callers can poll a log that is
//! still being written.

mod classify;
mod content;
mod entry;
mod reader;
mod tool_summary;
mod user_filter;

use std::path::Path;

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

/// Kind of a normalized feed message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    TextResponse,
    ToolSummary,
    PermissionRequest,
    InputRequest,
    UserMessage,
}

/// One message of the feed. `content` is never empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedMessage {
    #[serde(rename = "type")]
    pub message_type: MessageType,
    pub content: String,
    pub metadata: Map<String, Value>,
    pub timestamp: String,
}

impl ParsedMessage {
    pub(crate) fn new(message_type: MessageType, content: String, timestamp: String) -> Self {
        debug_assert!(!content.is_empty(), "feed messages carry content");
        Self {
            message_type,
            content,
            metadata: Map::new(),
            timestamp,
        }
    }

    pub(crate) fn with_metadata(mut self, metadata: Map<String, Value>) -> Self {
        self.metadata = metadata;
        self
    }
}

/// Messages in source order plus the offset to resume from next time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseResult {
    pub messages: Vec<ParsedMessage>,
    pub bytes_read: u64,
}

/// Parse the transcript at `path` starting at `from_byte`.
///
/// Never fails: a missing or unreadable file yields no messages and keeps
/// `from_byte`, and unreadable lines are skipped one by one. Pass the
/// returned `bytes_read` as the next call's `from_byte`.
pub async fn parse(path: impl AsRef<Path>, from_byte: u64) -> ParseResult {
    let path = path.as_ref();
    let Some(chunk) = reader::read_from_offset(path, from_byte).await else {
        return ParseResult {
            messages: Vec::new(),
            bytes_read: from_byte,
        };
    };

    let messages = parse_content(&chunk.content, from_byte);
    debug!(
        path = %path.display(),
        from_byte,
        bytes_read = chunk.bytes_read,
        messages = messages.len(),
        "parsed transcript"
    );

    ParseResult {
        messages,
        bytes_read: chunk.bytes_read,
    }
}

/// The pure half of [`parse`]: segment, parse, and classify content that has
/// already been read from `from_byte`.
pub fn parse_content(content: &str, from_byte: u64) -> Vec<ParsedMessage> {
    reader::segment_lines(content, from_byte)
        .filter_map(entry::parse_entry)
        .flat_map(classify::messages_for)
        .collect()
}

/// Current wall-clock time in the log's own timestamp format.
pub(crate) fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
