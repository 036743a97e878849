use super::content::Extracted;

/// Prefix of the notice the agent writes as a user turn when the operator
/// interrupts it.
pub(crate) const INTERRUPT_MARKER: &str = "[Request interrupted by user";

/// Why a user entry was not shown as human input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DropReason {
    Meta,
    ToolResult,
    Interrupt,
    Empty,
}

#[derive(Debug, PartialEq)]
pub(crate) enum Screened<'a> {
    Keep { text: &'a str, has_images: bool },
    Drop(DropReason),
}

/// Decide whether a user entry is genuine human input.
///
/// Checks run in order: meta flag, tool-result plumbing, interrupt notices,
/// then empty text.
pub(crate) fn screen(is_meta: bool, extracted: &Extracted) -> Screened<'_> {
    if is_meta {
        return Screened::Drop(DropReason::Meta);
    }
    if extracted.has_tool_result {
        return Screened::Drop(DropReason::ToolResult);
    }
    if extracted.text.starts_with(INTERRUPT_MARKER) {
        return Screened::Drop(DropReason::Interrupt);
    }
    if extracted.text.is_empty() {
        return Screened::Drop(DropReason::Empty);
    }

    Screened::Keep {
        text: &extracted.text,
        has_images: extracted.has_images,
    }
}
