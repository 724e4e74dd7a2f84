use std::cell::RefCell;

use crate::block::{Block, RenderState};
use crate::diagnostic::{Code, Log};
use crate::render::{Meta, Rendered, Renderer, Unit};

/// Renderer that spells out what it was given, e.g.
/// `narrative(Text., combat(_combat_ Goblin))`: own blocks by first line,
/// folded children by value.
#[derive(Debug, Default)]
pub(crate) struct Recorder {
    calls: RefCell<Vec<String>>,
}

impl Recorder {
    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    fn describe(&self, tag: &str, unit: Unit<'_, String>) -> Rendered<String> {
        let parts: Vec<String> = unit
            .iter()
            .map(|(_, block)| match block.render() {
                RenderState::Value(value) => value.clone(),
                _ => block.first_line().unwrap_or_default().to_string(),
            })
            .collect();
        let value = format!("{}({})", tag, parts.join(", "));
        self.calls.borrow_mut().push(value.clone());

        let mut log = Log::for_blocks([unit.anchor_id()]);
        if parts.iter().any(|p| p.contains("oops")) {
            log.err("oops found", Code::MALFORMED_LINE);
        }
        Rendered::new(value, log)
    }
}

impl Renderer for Recorder {
    type Value = String;
    type Document = Vec<String>;

    fn to_root_unit(&self, unit: Unit<'_, String>) -> Rendered<String> {
        self.describe("root", unit)
    }

    fn to_combat_unit(&self, unit: Unit<'_, String>) -> Rendered<String> {
        self.describe("combat", unit)
    }

    fn to_trigger_unit(&self, unit: Unit<'_, String>) -> Rendered<String> {
        self.describe("trigger", unit)
    }

    fn to_narrative_unit(&self, unit: Unit<'_, String>) -> Rendered<String> {
        self.describe("narrative", unit)
    }

    fn finalize(&self, roots: &[&String]) -> (Vec<String>, Log) {
        (roots.iter().map(|r| (*r).clone()).collect(), Log::new())
    }

    fn to_meta(&self, block: Option<&Block<String>>) -> Meta {
        let mut meta = Meta::new();
        if let Some(line) = block.and_then(|b| b.first_line()) {
            meta.insert("header".to_string(), line.to_string());
        }
        meta
    }
}
