//! One line per card, indented by nesting. Meant for a quick look at the
//! structure of a quest, not as an exchange format.

use std::fmt;

use crate::backend::Backend;
use crate::card::{Body, Combat, Roleplay, Trigger};
use crate::normalize::QuestAttrs;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutlineNode {
    pub kind: &'static str,
    pub label: String,
    pub children: Vec<OutlineNode>,
}

impl OutlineNode {
    pub fn new(kind: &'static str, label: impl Into<String>) -> Self {
        OutlineNode {
            kind,
            label: label.into(),
            children: Vec::new(),
        }
    }

    pub fn with_children(mut self, children: impl IntoIterator<Item = OutlineNode>) -> Self {
        self.children.extend(children);
        self
    }

    fn write(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        write!(f, "{}{}", "  ".repeat(depth), self.kind)?;
        if !self.label.is_empty() {
            write!(f, ": {}", self.label)?;
        }
        writeln!(f)?;
        for child in &self.children {
            child.write(f, depth + 1)?;
        }
        Ok(())
    }
}

impl fmt::Display for OutlineNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write(f, 0)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct OutlineBackend;

impl Backend for OutlineBackend {
    type Node = OutlineNode;

    fn quest(&self, attrs: &QuestAttrs) -> OutlineNode {
        OutlineNode::new("quest", attrs.title.as_str())
    }

    fn roleplay(&self, card: Roleplay<OutlineNode>) -> OutlineNode {
        let children = card.body.into_iter().filter_map(|part| match part {
            Body::Paragraph(_) => None,
            Body::Choice { text, children } => {
                Some(OutlineNode::new("choice", text).with_children(children))
            }
            Body::Child(child) => Some(child),
        });
        OutlineNode::new("roleplay", card.title.unwrap_or_default()).with_children(children)
    }

    fn combat(&self, card: Combat<OutlineNode>) -> OutlineNode {
        let events = card
            .events
            .into_iter()
            .map(|event| OutlineNode::new("event", event.on).with_children(event.children));
        OutlineNode::new("combat", card.enemies.join(", ")).with_children(events)
    }

    fn trigger(&self, card: Trigger) -> OutlineNode {
        OutlineNode::new("trigger", card.text)
    }

    fn placeholder(&self, message: &str) -> OutlineNode {
        OutlineNode::new("error", message)
    }

    fn is_quest(&self, node: &OutlineNode) -> bool {
        node.kind == "quest"
    }

    fn document(&self, quest: OutlineNode, children: Vec<OutlineNode>) -> OutlineNode {
        quest.with_children(children)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn prints_indented_tree() {
        let tree = OutlineNode::new("quest", "Q").with_children([
            OutlineNode::new("roleplay", "")
                .with_children([OutlineNode::new("choice", "Go").with_children([
                    OutlineNode::new("trigger", "end"),
                ])]),
        ]);
        assert_eq!(
            tree.to_string(),
            "quest: Q\n  roleplay\n    choice: Go\n      trigger: end\n"
        );
    }

    #[test]
    fn paragraphs_are_left_out() {
        let card = Roleplay {
            title: Some("Gate".to_string()),
            body: vec![
                Body::Paragraph("A guard.".to_string()),
                Body::Choice {
                    text: "Bribe".to_string(),
                    children: Vec::new(),
                },
            ],
        };
        assert_eq!(
            OutlineBackend.roleplay(card).to_string(),
            "roleplay: Gate\n  choice: Bribe\n"
        );
    }
}
