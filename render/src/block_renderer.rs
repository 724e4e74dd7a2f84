use log::trace;
use qdl::pattern;
use qdl::{Block, BlockId, Code, Log, Meta, RenderState, Rendered, Renderer, Unit};

use crate::backend::Backend;
use crate::card::{Body, Combat, Event, Roleplay, Trigger};
use crate::normalize::{QuestAttrs, parse_attributes};

/// Reads quest script syntax out of block groups and builds cards for a
/// [`Backend`].
#[derive(Debug, Clone, Default)]
pub struct BlockRenderer<B> {
    backend: B,
}

impl<B: Backend> BlockRenderer<B> {
    pub fn new(backend: B) -> Self {
        BlockRenderer { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    fn quest_attrs(&self, block: &Block<B::Node>, log: &mut Log) -> QuestAttrs {
        let mut lines = block.lines().iter().map(String::as_str);
        let header = lines.next().unwrap_or_default();
        let attrs = parse_attributes(lines, log);
        QuestAttrs::normalize(header.trim_start_matches('#'), &attrs, log)
    }

    fn empty_quest(&self) -> B::Node {
        self.backend.quest(&QuestAttrs::default())
    }
}

/// `_Title_` → `Title`.
fn card_title(line: &str) -> Option<&str> {
    let title = line.strip_prefix('_')?.strip_suffix('_')?.trim();
    (!title.is_empty()).then_some(title)
}

/// `* text` → `text`.
fn choice_text(line: &str) -> Option<&str> {
    line.strip_prefix("* ").map(str::trim)
}

fn stray_child(id: BlockId, message: &str) -> Log {
    let mut log = Log::for_blocks([id]);
    log.warn(message, Code::STRAY_CHILD);
    log
}

impl<B: Backend> Renderer for BlockRenderer<B> {
    type Value = B::Node;
    type Document = B::Node;

    fn to_root_unit(&self, unit: Unit<'_, B::Node>) -> Rendered<B::Node> {
        let anchor = unit.anchor();
        let mut log = Log::for_blocks([unit.anchor_id()]);
        if anchor.indent() > 0 {
            log.err("quest header must not be indented", Code::INDENTED_QUEST);
            return Rendered::new(self.backend.placeholder("indented quest header"), log);
        }
        let attrs = self.quest_attrs(anchor, &mut log);
        trace!("quest {:?}", attrs.title);
        Rendered::new(self.backend.quest(&attrs), log)
    }

    fn to_combat_unit(&self, unit: Unit<'_, B::Node>) -> Rendered<B::Node> {
        let mut log = Log::for_blocks([unit.anchor_id()]);
        let mut card = Combat {
            enemies: Vec::new(),
            events: Vec::new(),
        };
        // Index of the event folded children go to.
        let mut current: Option<usize> = None;

        for (id, block) in unit.iter() {
            if let RenderState::Value(child) = block.render() {
                match current.and_then(|i| card.events.get_mut(i)) {
                    Some(event) => event.children.push(child.clone()),
                    None => log.extend(stray_child(
                        id,
                        "combat content must follow \"* on win\" or \"* on lose\"",
                    )),
                }
                continue;
            }

            let mut block_log = Log::for_blocks([id]);
            let mut lines = block.lines().iter().map(String::as_str);
            if id == unit.anchor_id() {
                let header = lines.next().unwrap_or_default();
                let names = header
                    .strip_prefix(pattern::COMBAT_MARKER)
                    .unwrap_or(header);
                card.enemies.extend(
                    names
                        .split(',')
                        .map(str::trim)
                        .filter(|name| !name.is_empty())
                        .map(str::to_string),
                );
            }

            for line in lines {
                if let Some(name) = line.strip_prefix("- ") {
                    let name = name.trim();
                    if !name.is_empty() {
                        card.enemies.push(name.to_string());
                    }
                } else if let Some(choice) = choice_text(line) {
                    match choice.strip_prefix("on ").map(str::trim) {
                        Some(on @ ("win" | "lose")) => {
                            card.events.push(Event {
                                on: on.to_string(),
                                children: Vec::new(),
                            });
                            current = Some(card.events.len() - 1);
                        }
                        _ => {
                            block_log.err(
                                format!(
                                    "unknown combat event {:?}, expected \"on win\" or \"on lose\"",
                                    choice
                                ),
                                Code::UNKNOWN_EVENT,
                            );
                            current = None;
                        }
                    }
                } else {
                    block_log.err(
                        format!("combat card does not understand {:?}", line),
                        Code::MALFORMED_LINE,
                    );
                }
            }
            log.extend(block_log);
        }

        if card.enemies.is_empty() {
            let mut no_enemies = Log::for_blocks([unit.anchor_id()]);
            no_enemies.err("combat has no enemies", Code::NO_ENEMIES);
            log.extend(no_enemies);
        }
        trace!("combat against {:?}", card.enemies);
        Rendered::new(self.backend.combat(card), log)
    }

    fn to_trigger_unit(&self, unit: Unit<'_, B::Node>) -> Rendered<B::Node> {
        let anchor = unit.anchor();
        let mut log = Log::for_blocks(unit.ids().iter().copied());
        if unit.len() > 1 || anchor.line_count() > 1 {
            log.warn(
                "a trigger must stand alone, extra content is ignored",
                Code::TRIGGER_EXTRA_CONTENT,
            );
        }
        let text = anchor
            .first_line()
            .and_then(pattern::trigger_text)
            .unwrap_or_default()
            .to_string();
        Rendered::new(self.backend.trigger(Trigger { text }), log)
    }

    fn to_narrative_unit(&self, unit: Unit<'_, B::Node>) -> Rendered<B::Node> {
        let mut log = Log::new();
        let mut card = Roleplay {
            title: None,
            body: Vec::new(),
        };

        for (id, block) in unit.iter() {
            if let RenderState::Value(child) = block.render() {
                match card.body.last_mut() {
                    Some(Body::Choice { children, .. }) => children.push(child.clone()),
                    _ => {
                        log.extend(stray_child(id, "indented content does not follow a choice"));
                        card.body.push(Body::Child(child.clone()));
                    }
                }
                continue;
            }

            let mut lines = block.lines().iter().map(String::as_str);
            if id == unit.anchor_id() {
                if let Some(title) = block.first_line().and_then(card_title) {
                    card.title = Some(title.to_string());
                    lines.next();
                }
            }

            let mut paragraph: Option<String> = None;
            for line in lines {
                if let Some(text) = choice_text(line) {
                    card.body.extend(paragraph.take().map(Body::Paragraph));
                    card.body.push(Body::Choice {
                        text: text.to_string(),
                        children: Vec::new(),
                    });
                } else {
                    match paragraph.as_mut() {
                        Some(text) => {
                            text.push(' ');
                            text.push_str(line);
                        }
                        None => paragraph = Some(line.to_string()),
                    }
                }
            }
            card.body.extend(paragraph.take().map(Body::Paragraph));
        }

        Rendered::new(self.backend.roleplay(card), log)
    }

    fn finalize(&self, roots: &[&B::Node]) -> (B::Node, Log) {
        let mut log = Log::new();
        let Some((first, rest)) = roots.split_first() else {
            return (self.backend.document(self.empty_quest(), Vec::new()), log);
        };

        let document = if self.backend.is_quest(first) {
            let children = rest.iter().map(|node| (*node).clone()).collect();
            self.backend.document((*first).clone(), children)
        } else {
            log.err(
                "a quest must start with a \"#\" quest header",
                Code::MISSING_QUEST,
            );
            let children = roots.iter().map(|node| (*node).clone()).collect();
            self.backend.document(self.empty_quest(), children)
        };
        (document, log)
    }

    fn to_meta(&self, block: Option<&Block<B::Node>>) -> Meta {
        let Some(block) = block.filter(|b| b.first_line().is_some_and(pattern::is_root_line))
        else {
            return Meta::new();
        };
        let mut discarded = Log::new();
        self.quest_attrs(block, &mut discarded)
            .to_pairs()
            .into_iter()
            .map(|(key, value)| (key.to_string(), value))
            .collect()
    }
}
