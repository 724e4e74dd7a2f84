//! Quest header attributes: `key: value` lines checked against a known key set.

use std::collections::BTreeMap;

use qdl::{Code, Log};

/// Raw attributes, keys lower-cased.
pub type Attributes = BTreeMap<String, String>;

/// Split `key: value` lines. Lines without a colon are reported and skipped;
/// a repeated key keeps its last value.
pub fn parse_attributes<'a>(lines: impl IntoIterator<Item = &'a str>, log: &mut Log) -> Attributes {
    let mut attrs = Attributes::new();
    for line in lines {
        match line.split_once(':') {
            Some((key, value)) => {
                attrs.insert(key.trim().to_lowercase(), value.trim().to_string());
            }
            None => log.err(
                format!("expected \"key: value\", found {:?}", line),
                Code::MALFORMED_LINE,
            ),
        }
    }
    attrs
}

/// Reads typed values out of [`Attributes`] and remembers which keys were
/// asked for, so [`AttributeNormalizer::finish`] can report the rest.
pub struct AttributeNormalizer<'a> {
    attrs: &'a Attributes,
    used: Vec<&'static str>,
    log: &'a mut Log,
}

impl<'a> AttributeNormalizer<'a> {
    pub fn new(attrs: &'a Attributes, log: &'a mut Log) -> Self {
        AttributeNormalizer {
            attrs,
            used: Vec::new(),
            log,
        }
    }

    fn extract(&mut self, key: &'static str, required: bool) -> Option<&'a str> {
        self.used.push(key);
        let value = self.attrs.get(key).map(String::as_str);
        if required && value.is_none_or(str::is_empty) {
            self.log
                .err(format!("missing: \"{}\"", key), Code::MISSING_ATTRIBUTE);
        }
        value
    }

    pub fn string(&mut self, key: &'static str, required: bool) -> Option<String> {
        self.extract(key, required).map(str::to_string)
    }

    /// Whole numbers; fractional input is truncated. Anything else is
    /// reported and read as 0.
    pub fn number(&mut self, key: &'static str, required: bool) -> Option<i64> {
        let value = self.extract(key, required)?;
        match value.trim().parse::<f64>() {
            Ok(n) if n.is_finite() => Some(n.trunc() as i64),
            _ => {
                self.log.err(
                    format!("{} should be a number, but is {:?}", key, value),
                    Code::NOT_A_NUMBER,
                );
                Some(0)
            }
        }
    }

    /// `true` in any case is true; every other value is false.
    pub fn boolean(&mut self, key: &'static str, required: bool) -> Option<bool> {
        self.extract(key, required)
            .map(|v| v.trim().eq_ignore_ascii_case("true"))
    }

    /// Report every key nobody asked for.
    pub fn finish(self) {
        for key in self.attrs.keys() {
            if !self.used.iter().any(|&used| used == key.as_str()) {
                self.log
                    .err(format!("unknown key: \"{}\"", key), Code::UNKNOWN_ATTRIBUTE);
            }
        }
    }
}

/// Normalized attributes of the `#` quest header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuestAttrs {
    pub title: String,
    pub summary: Option<String>,
    pub author: Option<String>,
    pub email: Option<String>,
    pub url: Option<String>,
    pub min_players: Option<i64>,
    pub max_players: Option<i64>,
    pub min_time_minutes: Option<i64>,
    pub max_time_minutes: Option<i64>,
    pub family_friendly: Option<bool>,
}

impl QuestAttrs {
    /// Normalize a quest header. `header_title` is the text after `#` and
    /// stands in for a missing `title:` attribute.
    pub fn normalize(header_title: &str, attrs: &Attributes, log: &mut Log) -> Self {
        let mut attrs = attrs.clone();
        let header_title = header_title.trim();
        if !header_title.is_empty() {
            attrs
                .entry("title".to_string())
                .or_insert_with(|| header_title.to_string());
        }

        let mut n = AttributeNormalizer::new(&attrs, log);
        let quest = QuestAttrs {
            title: n.string("title", true).unwrap_or_default(),
            summary: n.string("summary", false),
            author: n.string("author", false),
            email: n.string("email", false),
            url: n.string("url", false),
            min_players: n.number("minplayers", false),
            max_players: n.number("maxplayers", false),
            min_time_minutes: n.number("mintimeminutes", false),
            max_time_minutes: n.number("maxtimeminutes", false),
            family_friendly: n.boolean("familyfriendly", false),
        };
        n.finish();
        quest
    }

    /// Present attributes as `(key, value)` pairs, title first.
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![("title", self.title.clone())];
        let strings = [
            ("summary", &self.summary),
            ("author", &self.author),
            ("email", &self.email),
            ("url", &self.url),
        ];
        for (key, value) in strings {
            if let Some(value) = value {
                pairs.push((key, value.clone()));
            }
        }
        let numbers = [
            ("minplayers", self.min_players),
            ("maxplayers", self.max_players),
            ("mintimeminutes", self.min_time_minutes),
            ("maxtimeminutes", self.max_time_minutes),
        ];
        for (key, value) in numbers {
            if let Some(value) = value {
                pairs.push((key, value.to_string()));
            }
        }
        if let Some(family_friendly) = self.family_friendly {
            pairs.push(("familyfriendly", family_friendly.to_string()));
        }
        pairs
    }
}
