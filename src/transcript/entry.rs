use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::debug;

use super::content::{self, Content, Extracted};
use super::now_timestamp;

// ---------------------------------------------------------------------------
// Raw JSONL shape
// ---------------------------------------------------------------------------

/// One log line, validated down to the fields the classifier reads.
///
/// Every field is optional. A field of the wrong JSON type is treated as
/// absent instead of rejecting the whole line.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct LogEntry {
    #[serde(rename = "type", default, deserialize_with = "lenient_string")]
    pub entry_type: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub subtype: Option<String>,
    #[serde(default, deserialize_with = "lenient_message")]
    pub message: Option<EntryMessage>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub timestamp: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub tool_name: Option<String>,
    #[serde(default)]
    pub tool_input: Option<Value>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub permission_prompt: Option<String>,
    #[serde(rename = "isMeta", default, deserialize_with = "truthy")]
    pub is_meta: bool,
}

#[derive(Debug, Default, PartialEq)]
pub(crate) struct EntryMessage {
    pub role: Option<String>,
    pub content: Option<Content>,
}

impl LogEntry {
    pub(crate) fn entry_type(&self) -> Option<&str> {
        self.entry_type.as_deref()
    }

    pub(crate) fn subtype(&self) -> Option<&str> {
        self.subtype.as_deref()
    }

    pub(crate) fn role(&self) -> Option<&str> {
        self.message.as_ref()?.role.as_deref()
    }

    /// Pull text and tool blocks out of `message.content`, consuming it.
    pub(crate) fn take_content(&mut self) -> Extracted {
        content::extract(self.message.take().and_then(|m| m.content))
    }

    /// The entry's own timestamp, or the current wall-clock time.
    pub(crate) fn timestamp_or_now(&self) -> String {
        self.timestamp.clone().unwrap_or_else(now_timestamp)
    }
}

// ---------------------------------------------------------------------------
// Line parsing
// ---------------------------------------------------------------------------

/// Parse one log line into an entry.
///
/// Returns `None` for malformed JSON and for valid JSON that is not an
/// object. Neither case is an error: the writer may still be mid-line.
pub(crate) fn parse_entry(line: &str) -> Option<LogEntry> {
    let value: Value = match serde_json::from_str(line.trim()) {
        Ok(v) => v,
        Err(e) => {
            debug!("skipping malformed transcript line: {e}");
            return None;
        }
    };

    if !value.is_object() {
        debug!("skipping non-object transcript line");
        return None;
    }

    match LogEntry::deserialize(value) {
        Ok(entry) => Some(entry),
        Err(e) => {
            debug!("skipping unreadable transcript entry: {e}");
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Lenient field deserializers
// ---------------------------------------------------------------------------

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        _ => None,
    })
}

fn lenient_message<'de, D>(deserializer: D) -> Result<Option<EntryMessage>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    if !value.is_object() {
        return Ok(None);
    }

    Ok(Some(EntryMessage {
        role: value.get("role").and_then(Value::as_str).map(str::to_string),
        content: value.get("content").and_then(Content::from_value),
    }))
}

/// Loose truthiness for flags written by tools that do not always emit
/// booleans.
fn truthy<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(is_truthy(&Value::deserialize(deserializer)?))
}

pub(crate) fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
