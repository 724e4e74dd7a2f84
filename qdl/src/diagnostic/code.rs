use std::fmt;

/// Stable diagnostic code.
///
/// 4xx codes describe the quest script, 5xx codes describe the compiler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Code(pub u16);

impl Code {
    /// A quest header group holds more than one block.
    pub const QUEST_MULTIPLE_BLOCKS: Code = Code(423);
    pub const MISSING_ATTRIBUTE: Code = Code(424);
    /// The first top-level unit is not a quest header.
    pub const MISSING_QUEST: Code = Code(425);
    pub const NOT_A_NUMBER: Code = Code(426);
    pub const UNKNOWN_ATTRIBUTE: Code = Code(427);
    /// Indented content with no choice or event to hang from.
    pub const STRAY_CHILD: Code = Code(428);
    /// Rendered content that no parent picked up.
    pub const UNATTACHED_BLOCK: Code = Code(429);
    pub const NO_ENEMIES: Code = Code(430);
    pub const UNKNOWN_EVENT: Code = Code(431);
    pub const INDENTED_QUEST: Code = Code(432);
    pub const TRIGGER_EXTRA_CONTENT: Code = Code(433);
    /// A line the card does not understand.
    pub const MALFORMED_LINE: Code = Code(434);

    pub const UNKNOWN_MESSAGE_TYPE: Code = Code(506);
    pub const UNSET_OUTSIDE_BASE: Code = Code(507);
    pub const EMPTY_BLOCK_LIST: Code = Code(508);
    pub const ANCHOR_RENDERED: Code = Code(509);

    pub fn is_internal(&self) -> bool {
        self.0 >= 500
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u16> for Code {
    fn from(code: u16) -> Self {
        Code(code)
    }
}
