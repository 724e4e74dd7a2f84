use std::collections::BTreeMap;
use std::fmt;

use crate::block::{Block, BlockId, BlockList};
use crate::diagnostic::Log;

/// Quest metadata, keyed by attribute name.
pub type Meta = BTreeMap<String, String>;

/// A pluggable backend turning classified block groups into values.
///
/// The compiler calls exactly one `to_*_unit` method per group, stores the
/// returned value on the group's anchor block, and later passes the values of
/// the top-level anchors to [`Renderer::finalize`].
///
/// Own content of a unit is in the [`RenderState::Seen`](crate::RenderState::Seen)
/// state; blocks already carrying a value are rendered children folded into
/// the unit.
pub trait Renderer {
    type Value: Clone + fmt::Debug;
    type Document: fmt::Debug;

    /// A `#` quest header. The unit holds exactly the anchor block.
    fn to_root_unit(&self, unit: Unit<'_, Self::Value>) -> Rendered<Self::Value>;

    /// A `_combat_` card with its folded children.
    fn to_combat_unit(&self, unit: Unit<'_, Self::Value>) -> Rendered<Self::Value>;

    /// A trigger line such as `**end**`.
    fn to_trigger_unit(&self, unit: Unit<'_, Self::Value>) -> Rendered<Self::Value>;

    /// Anything else: narrative text, choices, and their folded children.
    fn to_narrative_unit(&self, unit: Unit<'_, Self::Value>) -> Rendered<Self::Value>;

    /// Assemble the document from the top-level values, in source order.
    /// Must accept an empty slice.
    fn finalize(&self, roots: &[&Self::Value]) -> (Self::Document, Log);

    /// Metadata of the quest headed by `block`.
    fn to_meta(&self, block: Option<&Block<Self::Value>>) -> Meta;
}

/// Output of one unit: the anchor's value and what went wrong making it.
#[derive(Debug, Clone)]
pub struct Rendered<V> {
    pub value: V,
    pub log: Log,
}

impl<V> Rendered<V> {
    pub fn new(value: V, log: Log) -> Self {
        Rendered { value, log }
    }
}

/// Read-only view of the blocks handed to a renderer, in render-list order.
pub struct Unit<'a, V> {
    blocks: &'a BlockList<V>,
    ids: &'a [BlockId],
}

impl<'a, V> Unit<'a, V> {
    /// `None` when `ids` is empty: a unit always has an anchor.
    pub fn new(blocks: &'a BlockList<V>, ids: &'a [BlockId]) -> Option<Self> {
        if ids.is_empty() {
            None
        } else {
            Some(Unit { blocks, ids })
        }
    }

    pub fn anchor_id(&self) -> BlockId {
        self.ids[0]
    }

    /// The group's first, not yet rendered, block.
    pub fn anchor(&self) -> &'a Block<V> {
        &self.blocks[self.ids[0]]
    }

    pub fn ids(&self) -> &'a [BlockId] {
        self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (BlockId, &'a Block<V>)> + use<'a, V> {
        let blocks = self.blocks;
        self.ids.iter().map(move |&id| (id, &blocks[id]))
    }
}

impl<V> Clone for Unit<'_, V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<V> Copy for Unit<'_, V> {}

impl<V> fmt::Debug for Unit<'_, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Unit").field("ids", &self.ids).finish()
    }
}
