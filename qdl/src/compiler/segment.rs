use log::debug;

use crate::block::{BlockId, BlockList, RenderState};
use crate::compiler::classify::{UnitKind, classify};
use crate::compiler::groups::GroupTable;
use crate::diagnostic::{Code, Log};
use crate::render::{Renderer, Unit};

/// State of one render pass over a block list.
pub(crate) struct Pass<'a, R: Renderer> {
    renderer: &'a R,
    blocks: &'a mut BlockList<R::Value>,
    /// Blocks whose value went into some parent's render list.
    folded: Vec<bool>,
}

impl<'a, R: Renderer> Pass<'a, R> {
    pub(crate) fn new(renderer: &'a R, blocks: &'a mut BlockList<R::Value>) -> Self {
        let folded = vec![false; blocks.len()];
        Pass {
            renderer,
            blocks,
            folded,
        }
    }

    fn indent_of(&self, id: BlockId) -> Option<usize> {
        self.blocks.get(id).map(|b| b.indent())
    }

    /// Render the group spanning `start..=end`.
    ///
    /// Precondition: every block deeper than `start` already left `Unset`.
    /// `next_indent` is the depth rendered just before this one; its values
    /// are folded into this group as children.
    pub(crate) fn render_segment(
        &mut self,
        next_indent: Option<usize>,
        start: BlockId,
        mut end: BlockId,
    ) -> Log {
        let base_indent = self.blocks[start].indent();

        // Children split off by a trigger or header still belong to this
        // group: run on to the last block deeper than the base.
        if next_indent.is_some() && self.indent_of(end + 1) == next_indent {
            end += 1;
            while self.indent_of(end + 1).is_some_and(|i| i > base_indent) {
                end += 1;
            }
        }

        let mut log = Log::new();
        let mut render_list = Vec::new();
        for id in start..=end {
            let block = &self.blocks[id];
            match block.render() {
                RenderState::Unset => {
                    if block.indent() != base_indent {
                        let mut misplaced = Log::for_blocks([id]);
                        misplaced.internal(
                            "found unset block outside the base indent",
                            Code::UNSET_OUTSIDE_BASE,
                        );
                        log.extend(misplaced);
                    }
                    render_list.push(id);
                }
                RenderState::Value(_) if Some(block.indent()) == next_indent => {
                    render_list.push(id);
                }
                // Seen without a value: a group that produced nothing.
                _ => {}
            }
        }

        log.extend(self.render_block_list(&render_list));
        log
        // Postcondition: nothing in start..=end is Unset any more.
    }

    /// Classify `ids` by their anchor and hand them to the renderer.
    pub(crate) fn render_block_list(&mut self, ids: &[BlockId]) -> Log {
        let mut log = Log::for_blocks(ids.iter().copied());

        let Some(&anchor) = ids.first() else {
            log.internal("empty block list given to dispatch", Code::EMPTY_BLOCK_LIST);
            return log;
        };
        if self.blocks[anchor].render().value().is_some() {
            log.internal("group anchor is already rendered", Code::ANCHOR_RENDERED);
            return log;
        }

        let kind = classify(self.blocks[anchor].first_line().unwrap_or_default());

        for &id in ids {
            if self.blocks[id].render().is_unset() {
                self.blocks.mark_seen(id);
            } else {
                self.folded[id] = true;
            }
        }
        debug!(
            "rendering {:?} group at lines {:?}",
            kind,
            ids.iter()
                .map(|&id| self.blocks[id].start_line())
                .collect::<Vec<_>>()
        );

        let rendered = {
            let blocks: &BlockList<R::Value> = &*self.blocks;
            match kind {
                UnitKind::Root => {
                    if ids.len() != 1 {
                        log.err(
                            "quest block group cannot contain multiple blocks",
                            Code::QUEST_MULTIPLE_BLOCKS,
                        );
                    }
                    Unit::new(blocks, &ids[..1]).map(|unit| self.renderer.to_root_unit(unit))
                }
                UnitKind::Combat => {
                    Unit::new(blocks, ids).map(|unit| self.renderer.to_combat_unit(unit))
                }
                UnitKind::Trigger => {
                    Unit::new(blocks, ids).map(|unit| self.renderer.to_trigger_unit(unit))
                }
                UnitKind::Narrative => {
                    Unit::new(blocks, ids).map(|unit| self.renderer.to_narrative_unit(unit))
                }
            }
        };

        if let Some(rendered) = rendered {
            self.blocks.set_value(anchor, rendered.value);
            log.extend(rendered.log);
        }
        log
    }

    /// Warn about rendered group anchors below the root depth that no parent
    /// folded in. Only irregular indentation (a jump of more than one level
    /// followed by a shallower block) leaves these behind.
    pub(crate) fn report_unattached(&self, groups: &GroupTable) -> Log {
        let mut log = Log::new();
        let Some(root_depth) = groups.min_depth() else {
            return log;
        };

        let mut anchors: Vec<(BlockId, usize)> = groups
            .depths()
            .into_iter()
            .filter(|&depth| depth > root_depth)
            .flat_map(|depth| {
                groups
                    .non_empty_at(depth)
                    .filter_map(move |group| group.first().map(|&id| (id, depth)))
            })
            .collect();
        anchors.sort_unstable();

        for (id, depth) in anchors {
            if self.folded[id] || self.blocks[id].render().value().is_none() {
                continue;
            }
            let mut unattached = Log::for_blocks([id]);
            unattached.warn(
                format!(
                    "content at indent {} is not attached to any parent; check its indentation",
                    depth
                ),
                Code::UNATTACHED_BLOCK,
            );
            log.extend(unattached);
        }
        log
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::block::Block;
    use crate::compiler::test_support::Recorder;
    use crate::diagnostic::Severity;

    #[test]
    fn anchor_already_rendered_is_internal_and_inert() {
        let mut blocks: BlockList<String> = BlockList::new(vec![
            Block::new(0, ["Done already."], 0),
            Block::new(0, ["Fresh."], 1),
        ]);
        blocks.set_value(0, "old".to_string());

        let renderer = Recorder::default();
        let mut pass = Pass::new(&renderer, &mut blocks);
        let messages = pass.render_block_list(&[0, 1]).finalize();

        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].severity, Severity::Internal);
        assert_eq!(messages[0].code, Code::ANCHOR_RENDERED);
        assert_eq!(blocks[0].render().value().map(String::as_str), Some("old"));
        assert!(blocks[1].render().is_unset());
        assert!(renderer.calls().is_empty());
    }

    #[test]
    fn empty_list_is_internal() {
        let mut blocks: BlockList<String> = BlockList::default();
        let renderer = Recorder::default();
        let mut pass = Pass::new(&renderer, &mut blocks);
        let messages = pass.render_block_list(&[]).finalize();

        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].code, Code::EMPTY_BLOCK_LIST);
        assert_eq!(messages[0].severity, Severity::Internal);
    }

    #[test]
    fn unset_block_off_base_indent_is_reported_and_rendered() {
        let mut blocks: BlockList<String> = BlockList::new(vec![
            Block::new(0, ["Parent."], 0),
            Block::new(1, ["Never rendered."], 1),
        ]);
        let renderer = Recorder::default();
        let mut pass = Pass::new(&renderer, &mut blocks);
        let messages = pass.render_segment(Some(1), 0, 0).finalize();

        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].code, Code::UNSET_OUTSIDE_BASE);
        assert_eq!(messages[0].blocks, vec![1]);
        assert_eq!(
            blocks[0].render().value().map(String::as_str),
            Some("narrative(Parent., Never rendered.)")
        );
        assert_eq!(blocks[1].render(), &RenderState::Seen);
    }

    #[test]
    fn quest_group_with_children_is_a_user_error() {
        let mut blocks: BlockList<String> = BlockList::new(vec![
            Block::new(0, ["# Quest"], 0),
            Block::new(1, ["Indented."], 1),
        ]);
        blocks.set_value(1, "child".to_string());
        let renderer = Recorder::default();
        let mut pass = Pass::new(&renderer, &mut blocks);
        let messages = pass.render_segment(Some(1), 0, 0).finalize();

        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].severity, Severity::Error);
        assert_eq!(messages[0].code, Code::QUEST_MULTIPLE_BLOCKS);
        assert_eq!(
            blocks[0].render().value().map(String::as_str),
            Some("root(# Quest)")
        );
    }

    #[test]
    fn extension_runs_past_grandchildren() {
        // 0: parent, 1: child, 2: grandchild, 3: trigger child split off.
        let mut blocks: BlockList<String> = BlockList::new(vec![
            Block::new(0, ["_Parent_"], 0),
            Block::new(1, ["_Child_"], 1),
            Block::new(2, ["Grandchild."], 2),
            Block::new(1, ["**end**"], 3),
            Block::new(0, ["Sibling."], 4),
        ]);
        blocks.set_value(1, "child".to_string());
        blocks.mark_seen(2);
        blocks.set_value(3, "trigger".to_string());

        let renderer = Recorder::default();
        let mut pass = Pass::new(&renderer, &mut blocks);
        let messages = pass.render_segment(Some(1), 0, 0);

        assert!(messages.is_empty());
        assert_eq!(
            blocks[0].render().value().map(String::as_str),
            Some("narrative(_Parent_, child, trigger)")
        );
        assert!(blocks[4].render().is_unset());
    }

    #[test]
    fn seen_children_without_value_are_skipped() {
        let mut blocks: BlockList<String> = BlockList::new(vec![
            Block::new(0, ["Parent."], 0),
            Block::new(1, ["Produced nothing."], 1),
        ]);
        blocks.mark_seen(1);
        let renderer = Recorder::default();
        let mut pass = Pass::new(&renderer, &mut blocks);
        pass.render_segment(Some(1), 0, 0);

        assert_eq!(
            blocks[0].render().value().map(String::as_str),
            Some("narrative(Parent.)")
        );
    }
}
