use std::collections::BTreeMap;

use crate::block::{BlockId, BlockList};
use crate::pattern;

/// Contiguous run of same-depth block ids rendered as one unit.
pub type Group = Vec<BlockId>;

/// Groups per indent depth, depths in ascending numeric order.
///
/// Walking depths ascending and groups left to right visits every block id
/// exactly once. Trailing empty groups are placeholders left open for blocks
/// that never came; every consumer skips them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupTable {
    depths: BTreeMap<usize, Vec<Group>>,
}

impl GroupTable {
    /// Group `blocks` in one forward pass.
    pub fn build<V>(blocks: &BlockList<V>) -> Self {
        let mut depths: BTreeMap<usize, Vec<Group>> = BTreeMap::new();
        let last = blocks.len().saturating_sub(1);

        for (id, block) in blocks.iter().enumerate() {
            let depth = block.indent();
            let groups = depths.entry(depth).or_insert_with(|| vec![Vec::new()]);

            // A header never joins the group before it.
            if pattern::is_header(block) && groups.last().is_some_and(|g| !g.is_empty()) {
                groups.push(Vec::new());
            }

            match groups.last_mut() {
                Some(open) => open.push(id),
                None => groups.push(vec![id]),
            }

            // Triggers and quest roots stand alone. No placeholder after the
            // very last block.
            if pattern::is_isolated(block) && id != last {
                groups.push(Vec::new());
            }

            // A shallower block ends every deeper group still in progress.
            for deeper in depths.range_mut(depth + 1..).map(|(_, groups)| groups) {
                if deeper.last().is_some_and(|g| !g.is_empty()) {
                    deeper.push(Vec::new());
                }
            }
        }

        GroupTable { depths }
    }

    /// Distinct depths, ascending.
    pub fn depths(&self) -> Vec<usize> {
        self.depths.keys().copied().collect()
    }

    /// The shallowest depth present: where the document's roots live.
    pub fn min_depth(&self) -> Option<usize> {
        self.depths.keys().next().copied()
    }

    /// Every group at `depth`, placeholders included.
    pub fn groups_at(&self, depth: usize) -> &[Group] {
        self.depths.get(&depth).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Groups at `depth` that hold at least one block.
    pub fn non_empty_at(&self, depth: usize) -> impl Iterator<Item = &Group> {
        self.groups_at(depth).iter().filter(|g| !g.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.depths.is_empty()
    }

    /// Map every block id to the first id of its own group.
    pub fn reverse_lookup(&self, len: usize) -> Vec<BlockId> {
        let mut lookup: Vec<BlockId> = (0..len).collect();
        for groups in self.depths.values() {
            for group in groups {
                let Some(&root) = group.first() else {
                    continue;
                };
                for &id in group {
                    if let Some(slot) = lookup.get_mut(id) {
                        *slot = root;
                    }
                }
            }
        }
        lookup
    }
}
