mod lexer;

use std::ops::Index;

/// Position of a block inside its [`BlockList`].
pub type BlockId = usize;

/// Render progress of a single block.
///
/// A block starts `Unset`, is claimed as `Seen` right before its group is
/// handed to a renderer, and ends as `Value` once the renderer produced
/// something for it. Within one pass a block never goes back to `Unset`.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderState<V> {
    Unset,
    Seen,
    Value(V),
}

impl<V> RenderState<V> {
    pub fn is_unset(&self) -> bool {
        matches!(self, RenderState::Unset)
    }

    pub fn value(&self) -> Option<&V> {
        match self {
            RenderState::Value(v) => Some(v),
            _ => None,
        }
    }
}

/// A run of non-blank source lines sharing one indentation depth.
#[derive(Debug, Clone)]
pub struct Block<V> {
    indent: usize,
    lines: Vec<String>,
    start_line: usize,
    render: RenderState<V>,
}

impl<V> Block<V> {
    pub fn new<S: Into<String>>(
        indent: usize,
        lines: impl IntoIterator<Item = S>,
        start_line: usize,
    ) -> Self {
        Block {
            indent,
            lines: lines.into_iter().map(Into::into).collect(),
            start_line,
            render: RenderState::Unset,
        }
    }

    /// Nesting depth (leading whitespace width / 2).
    pub fn indent(&self) -> usize {
        self.indent
    }

    /// Lines with their indentation stripped.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// The line deciding the block's syntactic role.
    pub fn first_line(&self) -> Option<&str> {
        self.lines.first().map(String::as_str)
    }

    /// Zero-based source line of the first line.
    pub fn start_line(&self) -> usize {
        self.start_line
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// True when `line` falls in `[start_line, start_line + line_count)`.
    pub fn contains_line(&self, line: usize) -> bool {
        self.start_line <= line && line < self.start_line + self.lines.len()
    }

    pub fn render(&self) -> &RenderState<V> {
        &self.render
    }

    pub(crate) fn mark_seen(&mut self) {
        if self.render.is_unset() {
            self.render = RenderState::Seen;
        }
    }

    pub(crate) fn set_value(&mut self, value: V) {
        self.render = RenderState::Value(value);
    }
}

/// Index-addressed arena of blocks. Components refer to blocks by
/// [`BlockId`] and only the compiler mutates render states.
#[derive(Debug, Clone)]
pub struct BlockList<V> {
    blocks: Vec<Block<V>>,
}

impl<V> BlockList<V> {
    pub fn new(blocks: Vec<Block<V>>) -> Self {
        BlockList { blocks }
    }

    /// Split quest script source into blocks.
    ///
    /// Blank lines end a block. So does a change of indentation or a header
    /// line (`#`, `_` or a trigger), which always opens a block of its own.
    pub fn from_source(source: &str) -> Self {
        BlockList {
            blocks: lexer::tokenize(source),
        }
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn get(&self, id: BlockId) -> Option<&Block<V>> {
        self.blocks.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Block<V>> {
        self.blocks.iter()
    }

    /// First block whose line range contains `line`.
    pub fn block_at_line(&self, line: usize) -> Option<BlockId> {
        self.blocks.iter().position(|b| b.contains_line(line))
    }

    /// Forget every render state so the list can be rendered again.
    pub fn reset(&mut self) {
        for block in &mut self.blocks {
            block.render = RenderState::Unset;
        }
    }

    pub(crate) fn mark_seen(&mut self, id: BlockId) {
        self.blocks[id].mark_seen();
    }

    pub(crate) fn set_value(&mut self, id: BlockId, value: V) {
        self.blocks[id].set_value(value);
    }
}

impl<V> Default for BlockList<V> {
    fn default() -> Self {
        BlockList { blocks: Vec::new() }
    }
}

impl<V> Index<BlockId> for BlockList<V> {
    type Output = Block<V>;

    fn index(&self, id: BlockId) -> &Block<V> {
        &self.blocks[id]
    }
}

impl<V> FromIterator<Block<V>> for BlockList<V> {
    fn from_iter<I: IntoIterator<Item = Block<V>>>(iter: I) -> Self {
        BlockList {
            blocks: iter.into_iter().collect(),
        }
    }
}
