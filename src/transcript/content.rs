use serde_json::Value;

use super::tool_summary::UNKNOWN_TOOL;

// ---------------------------------------------------------------------------
// Message content shapes
// ---------------------------------------------------------------------------

/// Agent logs encode `message.content` as either a plain string or an array
/// of typed blocks. Both forms are kept here; anything else is treated as if
/// the content were absent.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Content {
    Text(String),
    Blocks(Vec<ContentBlock>),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ContentBlock {
    Text(String),
    ToolUse(ToolInvocation),
    /// Opaque; never rendered.
    ToolResult,
    /// Opaque; only its presence matters.
    Image,
    /// `thinking` and any other kind we do not render.
    Other,
}

/// A tool invocation recorded by the agent, either as a content block or as
/// a standalone `tool_use` entry.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ToolInvocation {
    pub name: String,
    pub input: Option<Value>,
}

impl Content {
    pub(crate) fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(text) => Some(Content::Text(text.clone())),
            Value::Array(items) => Some(Content::Blocks(
                items.iter().map(ContentBlock::from_value).collect(),
            )),
            _ => None,
        }
    }
}

impl ContentBlock {
    fn from_value(value: &Value) -> Self {
        match value.get("type").and_then(Value::as_str) {
            Some("text") => match value.get("text").and_then(Value::as_str) {
                Some(text) => ContentBlock::Text(text.to_string()),
                None => ContentBlock::Other,
            },
            Some("tool_use") => ContentBlock::ToolUse(ToolInvocation {
                name: value
                    .get("name")
                    .and_then(Value::as_str)
                    .filter(|name| !name.is_empty())
                    .unwrap_or(UNKNOWN_TOOL)
                    .to_string(),
                input: value.get("input").filter(|v| !v.is_null()).cloned(),
            }),
            Some("tool_result") => ContentBlock::ToolResult,
            Some("image") => ContentBlock::Image,
            _ => ContentBlock::Other,
        }
    }
}

// ---------------------------------------------------------------------------
// Extraction
// ---------------------------------------------------------------------------

/// Everything the classifier needs from a message body, pulled out in one
/// pass.
#[derive(Debug, Default, PartialEq)]
pub(crate) struct Extracted {
    /// Text blocks joined with `\n`, or the bare string content.
    pub text: String,
    /// Tool-use blocks in block order.
    pub tool_uses: Vec<ToolInvocation>,
    pub has_tool_result: bool,
    pub has_images: bool,
}

pub(crate) fn extract(content: Option<Content>) -> Extracted {
    let blocks = match content {
        None => return Extracted::default(),
        Some(Content::Text(text)) => {
            return Extracted {
                text,
                ..Extracted::default()
            }
        }
        Some(Content::Blocks(blocks)) => blocks,
    };

    let mut extracted = Extracted::default();
    let mut texts = Vec::new();

    for block in blocks {
        match block {
            ContentBlock::Text(text) => texts.push(text),
            ContentBlock::Other => {}
            ContentBlock::ToolUse(invocation) => extracted.tool_uses.push(invocation),
            ContentBlock::ToolResult => extracted.has_tool_result = true,
            ContentBlock::Image => extracted.has_images = true,
        }
    }

    extracted.text = texts.join("\n");
    extracted
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
