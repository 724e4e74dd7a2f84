use std::fmt;

use crate::card::{Combat, Roleplay, Trigger};
use crate::normalize::QuestAttrs;

/// Output format for cards. The block renderer reads quest syntax and
/// builds cards; a backend only decides what they look like.
pub trait Backend {
    type Node: Clone + fmt::Debug;

    fn quest(&self, attrs: &QuestAttrs) -> Self::Node;
    fn roleplay(&self, card: Roleplay<Self::Node>) -> Self::Node;
    fn combat(&self, card: Combat<Self::Node>) -> Self::Node;
    fn trigger(&self, card: Trigger) -> Self::Node;

    /// Stand-in for a unit that could not be rendered.
    fn placeholder(&self, message: &str) -> Self::Node;

    fn is_quest(&self, node: &Self::Node) -> bool;

    /// Append the remaining top-level nodes to the quest node.
    fn document(&self, quest: Self::Node, children: Vec<Self::Node>) -> Self::Node;
}
