use crate::pattern;

/// Which renderer entry point a group goes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitKind {
    /// `#` quest header.
    Root,
    /// `_combat_` card.
    Combat,
    /// Whole-line bold trigger.
    Trigger,
    /// Everything else.
    Narrative,
}

/// Classify a group by the first line of its anchor block.
///
/// Checks run in the order `#`, `_combat_`, trigger, so a line matching more
/// than one shape takes the first.
pub fn classify(header_line: &str) -> UnitKind {
    if pattern::is_root_line(header_line) {
        UnitKind::Root
    } else if header_line.starts_with(pattern::COMBAT_MARKER) {
        UnitKind::Combat
    } else if pattern::is_trigger(header_line) {
        UnitKind::Trigger
    } else {
        UnitKind::Narrative
    }
}
