//! Quest XML: `<quest>` holding `<roleplay>`, `<combat>` and `<trigger>`
//! cards. Paragraph text goes through the inline markdown renderer.

use std::fmt;

use html_escape::{encode_double_quoted_attribute, encode_text};
use pulldown_cmark::{Event, Options, Parser, Tag, TagEnd};

use crate::backend::Backend;
use crate::card::{Body, Combat, Roleplay, Trigger};
use crate::normalize::QuestAttrs;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    /// Plain text, escaped on output.
    Text(String),
    /// Already escaped markup, written as is.
    Markup(String),
}

impl From<Element> for Node {
    fn from(element: Element) -> Self {
        Node::Element(element)
    }
}

impl Node {
    fn is_inline(&self) -> bool {
        !matches!(self, Node::Element(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub name: &'static str,
    pub attrs: Vec<(&'static str, String)>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(name: &'static str) -> Self {
        Element {
            name,
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn with_attr(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.attrs.push((key, value.into()));
        self
    }

    pub fn with_child(mut self, node: impl Into<Node>) -> Self {
        self.push(node);
        self
    }

    pub fn with_text(self, text: impl Into<String>) -> Self {
        self.with_child(Node::Text(text.into()))
    }

    pub fn push(&mut self, node: impl Into<Node>) {
        self.children.push(node.into());
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Child elements, skipping text.
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(element) => Some(element),
            _ => None,
        })
    }

    fn write(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        let pad = "  ".repeat(depth);
        write!(f, "{}<{}", pad, self.name)?;
        for (key, value) in &self.attrs {
            write!(f, " {}=\"{}\"", key, encode_double_quoted_attribute(value))?;
        }
        if self.children.is_empty() {
            return writeln!(f, "/>");
        }

        if self.children.iter().all(Node::is_inline) {
            write!(f, ">")?;
            for child in &self.children {
                write_inline(f, child)?;
            }
            return writeln!(f, "</{}>", self.name);
        }

        writeln!(f, ">")?;
        for child in &self.children {
            match child {
                Node::Element(element) => element.write(f, depth + 1)?,
                inline => {
                    write!(f, "{}  ", pad)?;
                    write_inline(f, inline)?;
                    writeln!(f)?;
                }
            }
        }
        writeln!(f, "{}</{}>", pad, self.name)
    }
}

fn write_inline(f: &mut fmt::Formatter<'_>, node: &Node) -> fmt::Result {
    match node {
        Node::Text(text) => f.write_str(&encode_text(text)),
        Node::Markup(markup) => f.write_str(markup),
        Node::Element(element) => element.write(f, 0),
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write(f, 0)
    }
}

/// Render one paragraph of inline markdown: `**strong**` becomes `<b>`,
/// `*emphasis*` becomes `<i>`, `~~struck~~` becomes `<del>`. Block
/// structure is flattened to its text.
pub fn inline_markup(text: &str) -> String {
    let mut out = String::new();
    for event in Parser::new_ext(text, Options::ENABLE_STRIKETHROUGH) {
        match event {
            Event::Text(s) | Event::Code(s) | Event::Html(s) | Event::InlineHtml(s) => {
                out.push_str(&encode_text(&*s));
            }
            Event::Start(Tag::Strong) => out.push_str("<b>"),
            Event::End(TagEnd::Strong) => out.push_str("</b>"),
            Event::Start(Tag::Emphasis) => out.push_str("<i>"),
            Event::End(TagEnd::Emphasis) => out.push_str("</i>"),
            Event::Start(Tag::Strikethrough) => out.push_str("<del>"),
            Event::End(TagEnd::Strikethrough) => out.push_str("</del>"),
            Event::SoftBreak | Event::HardBreak => out.push(' '),
            _ => {}
        }
    }
    out
}

#[derive(Debug, Clone, Copy, Default)]
pub struct XmlBackend;

impl Backend for XmlBackend {
    type Node = Element;

    fn quest(&self, attrs: &QuestAttrs) -> Element {
        attrs
            .to_pairs()
            .into_iter()
            .fold(Element::new("quest"), |quest, (key, value)| {
                quest.with_attr(key, value)
            })
    }

    fn roleplay(&self, card: Roleplay<Element>) -> Element {
        let mut roleplay = Element::new("roleplay");
        if let Some(title) = card.title {
            roleplay = roleplay.with_attr("title", title);
        }
        for part in card.body {
            let node = match part {
                Body::Paragraph(text) => {
                    Element::new("p").with_child(Node::Markup(inline_markup(&text)))
                }
                Body::Choice { text, children } => children
                    .into_iter()
                    .fold(Element::new("choice").with_attr("text", text), |choice, child| {
                        choice.with_child(child)
                    }),
                Body::Child(child) => child,
            };
            roleplay.push(node);
        }
        roleplay
    }

    fn combat(&self, card: Combat<Element>) -> Element {
        let mut combat = Element::new("combat");
        for enemy in card.enemies {
            combat.push(Element::new("e").with_text(enemy));
        }
        for event in card.events {
            let mut on = Element::new("event").with_attr("on", event.on);
            for child in event.children {
                on.push(child);
            }
            combat.push(on);
        }
        combat
    }

    fn trigger(&self, card: Trigger) -> Element {
        Element::new("trigger").with_text(card.text)
    }

    fn placeholder(&self, message: &str) -> Element {
        Element::new("error").with_text(message)
    }

    fn is_quest(&self, node: &Element) -> bool {
        node.name == "quest"
    }

    fn document(&self, mut quest: Element, children: Vec<Element>) -> Element {
        for child in children {
            quest.push(child);
        }
        quest
    }
}
