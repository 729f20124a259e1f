//! Cosmetic clean-up of model output before it reaches a client

/// Heading the model uses for its disclaimer
const DISCLAIMER_HEADING: &str = "Important Disclaimer";

/// What the disclaimer heading is rendered as
pub const MARKED_DISCLAIMER_HEADING: &str = "\n\n⚠️ **Disclaimer**";

/// Expand escaped newlines, drop bold markers and mark the disclaimer heading.
///
/// Bold markers are stripped before the heading is inserted, so the marked
/// heading keeps its own emphasis.
pub fn format_answer(raw: &str) -> String {
    raw.replace("\\n", "\n")
        .replace("**", "")
        .replace(DISCLAIMER_HEADING, MARKED_DISCLAIMER_HEADING)
}
