pub mod classify;
pub mod groups;
mod segment;
#[cfg(test)]
mod test_support;

pub use classify::{UnitKind, classify};
pub use groups::{Group, GroupTable};

use log::debug;

use crate::block::{BlockId, BlockList};
use crate::diagnostic::{Categorized, Log};
use crate::render::{Meta, Renderer};
use segment::Pass;

/// Compiles block lists into documents with a pluggable [`Renderer`].
///
/// Rendering is failure tolerant: problems become diagnostics and the
/// document is always produced. The compiler keeps the last rendered block
/// list so editors can map source lines back to rendered units.
pub struct Compiler<R: Renderer> {
    renderer: R,
    blocks: BlockList<R::Value>,
    groups: GroupTable,
    result: Option<R::Document>,
    log: Option<Log>,
    reverse_lookup: Vec<BlockId>,
}

impl<R: Renderer> Compiler<R> {
    pub fn new(renderer: R) -> Self {
        Compiler {
            renderer,
            blocks: BlockList::default(),
            groups: GroupTable::default(),
            result: None,
            log: None,
            reverse_lookup: Vec::new(),
        }
    }

    /// Tokenize `source` and render it.
    pub fn render_source(&mut self, source: &str) {
        self.render(BlockList::from_source(source));
    }

    /// Render `blocks`, replacing any previous result and diagnostics.
    pub fn render(&mut self, blocks: BlockList<R::Value>) {
        self.blocks = blocks;
        self.groups = GroupTable::default();
        self.reverse_lookup.clear();

        let mut log = Log::new();

        if self.blocks.is_empty() {
            let (document, finalize_log) = self.renderer.finalize(&[]);
            log.extend(finalize_log);
            self.result = Some(document);
            self.log = Some(log);
            return;
        }

        let groups = GroupTable::build(&self.blocks);
        debug!("block groups: {:?}", groups);
        let depths = groups.depths();

        // Deepest first, so children are rendered before their parents.
        let mut pass = Pass::new(&self.renderer, &mut self.blocks);
        for (i, &depth) in depths.iter().enumerate().rev() {
            let next_indent = depths.get(i + 1).copied();
            for group in groups.non_empty_at(depth) {
                let (Some(&start), Some(&end)) = (group.first(), group.last()) else {
                    continue;
                };
                log.extend(pass.render_segment(next_indent, start, end));
            }
        }
        log.extend(pass.report_unattached(&groups));

        let roots: Vec<&R::Value> = groups
            .min_depth()
            .into_iter()
            .flat_map(|depth| groups.non_empty_at(depth))
            .filter_map(|group| group.first())
            .filter_map(|&id| self.blocks[id].render().value())
            .collect();
        let (document, finalize_log) = self.renderer.finalize(&roots);
        log.extend(finalize_log);

        self.result = Some(document);
        self.reverse_lookup = groups.reverse_lookup(self.blocks.len());
        self.groups = groups;
        self.log = Some(log);
    }

    /// The document from the last render, if any.
    pub fn result(&self) -> Option<&R::Document> {
        self.result.as_ref()
    }

    /// The rendered value of the group owning source line `line`.
    pub fn result_at(&self, line: usize) -> Option<&R::Value> {
        let id = self.blocks.block_at_line(line)?;
        let root = *self.reverse_lookup.get(id)?;
        self.blocks.get(root)?.render().value()
    }

    /// Drain the diagnostics of the last render.
    ///
    /// Returns `None` when called again before the next render.
    pub fn take_diagnostics(&mut self) -> Option<Categorized> {
        self.log
            .take()
            .map(|log| Categorized::from_diagnostics(log.finalize()))
    }

    /// Quest metadata, read from the first block.
    pub fn meta(&self) -> Meta {
        self.renderer.to_meta(self.blocks.get(0))
    }

    pub fn blocks(&self) -> &BlockList<R::Value> {
        &self.blocks
    }

    pub fn groups(&self) -> &GroupTable {
        &self.groups
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }
}
