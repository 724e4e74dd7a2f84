//! Line shapes that steer grouping and classification.

use std::sync::LazyLock;

use regex::Regex;

use crate::block::Block;

/// Marker opening a combat card.
pub const COMBAT_MARKER: &str = "_combat_";

/// A whole line wrapped in bold markers, e.g. `**end**`.
static TRIGGER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\*\*.*\*\*\s*$").expect("trigger pattern is valid"));

pub fn is_trigger(line: &str) -> bool {
    TRIGGER.is_match(line)
}

/// Text between the bold markers of a trigger line.
pub fn trigger_text(line: &str) -> Option<&str> {
    if !is_trigger(line) {
        return None;
    }
    let inner = line.trim().strip_prefix("**")?.strip_suffix("**")?;
    Some(inner.trim())
}

/// A `#` line heads the quest itself.
pub fn is_root_line(line: &str) -> bool {
    line.starts_with('#')
}

/// Title/quote markers (`_`, `#`) and triggers start a new group.
pub fn is_header_line(line: &str) -> bool {
    line.starts_with(['_', '#']) || is_trigger(line)
}

pub fn is_header<V>(block: &Block<V>) -> bool {
    block
        .first_line()
        .is_some_and(|line| !line.is_empty() && is_header_line(line))
}

/// Blocks that always sit alone in their group: triggers and the quest root.
pub fn is_isolated<V>(block: &Block<V>) -> bool {
    block
        .first_line()
        .is_some_and(|line| !line.is_empty() && (is_trigger(line) || is_root_line(line)))
}
