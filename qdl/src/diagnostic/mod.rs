mod code;

pub use code::Code;

use std::fmt;
use std::ops::Range;
use std::str::FromStr;

use codespan_reporting::diagnostic::{Diagnostic as Report, Label, Severity as ReportSeverity};
use log::debug;
use thiserror::Error;

use crate::block::BlockId;

/// How a diagnostic should be read.
///
/// `Error` is a problem in the quest script; `Internal` means the compiler
/// broke one of its own invariants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Severity {
    Info,
    Warning,
    Error,
    Internal,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
            Severity::Internal => "internal",
        }
    }

    fn report_severity(&self) -> ReportSeverity {
        match self {
            Severity::Info => ReportSeverity::Note,
            Severity::Warning => ReportSeverity::Warning,
            Severity::Error => ReportSeverity::Error,
            Severity::Internal => ReportSeverity::Bug,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown message type {0:?}")]
pub struct UnknownSeverity(pub String);

impl UnknownSeverity {
    /// The internal diagnostic standing in for a message whose type could not be read.
    pub fn to_diagnostic(&self) -> Diagnostic {
        Diagnostic {
            severity: Severity::Internal,
            code: Code::UNKNOWN_MESSAGE_TYPE,
            message: self.to_string(),
            blocks: Vec::new(),
        }
    }
}

impl FromStr for Severity {
    type Err = UnknownSeverity;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "info" => Ok(Severity::Info),
            "warning" => Ok(Severity::Warning),
            "error" => Ok(Severity::Error),
            "internal" => Ok(Severity::Internal),
            other => Err(UnknownSeverity(other.to_string())),
        }
    }
}

/// A single categorized message about the quest or the compiler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: Code,
    pub message: String,
    /// Blocks the message is about.
    pub blocks: Vec<BlockId>,
}

impl Diagnostic {
    /// Convert to a codespan-reporting diagnostic for display, labelling
    /// each of the given byte spans.
    pub fn to_report(&self, file_id: usize, spans: &[Range<usize>]) -> Report<usize> {
        let labels = spans
            .iter()
            .enumerate()
            .map(|(i, span)| {
                if i == 0 {
                    Label::primary(file_id, span.clone())
                } else {
                    Label::secondary(file_id, span.clone())
                }
            })
            .collect();
        Report::new(self.severity.report_severity())
            .with_code(self.code.to_string())
            .with_message(&self.message)
            .with_labels(labels)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]: {}", self.severity, self.code, self.message)
    }
}

/// Scoped diagnostics collector.
///
/// Each call site owns a `Log` tagged with the blocks it works on, appends
/// to it, and hands it upward where it is merged with [`Log::extend`].
/// Emission order is preserved across merges.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Log {
    blocks: Vec<BlockId>,
    messages: Vec<Diagnostic>,
}

impl Log {
    pub fn new() -> Self {
        Log::default()
    }

    /// A collector whose messages are attributed to `blocks`.
    pub fn for_blocks(blocks: impl IntoIterator<Item = BlockId>) -> Self {
        Log {
            blocks: blocks.into_iter().collect(),
            messages: Vec::new(),
        }
    }

    pub fn info(&mut self, message: impl Into<String>, code: Code) {
        self.push(Severity::Info, message.into(), code);
    }

    pub fn warn(&mut self, message: impl Into<String>, code: Code) {
        self.push(Severity::Warning, message.into(), code);
    }

    pub fn err(&mut self, message: impl Into<String>, code: Code) {
        self.push(Severity::Error, message.into(), code);
    }

    pub fn internal(&mut self, message: impl Into<String>, code: Code) {
        self.push(Severity::Internal, message.into(), code);
    }

    fn push(&mut self, severity: Severity, message: String, code: Code) {
        debug!("{}[{}] on blocks {:?}: {}", severity, code, self.blocks, message);
        self.messages.push(Diagnostic {
            severity,
            code,
            message,
            blocks: self.blocks.clone(),
        });
    }

    /// Append everything `other` collected, after what is already here.
    pub fn extend(&mut self, other: Log) {
        self.messages.extend(other.messages);
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.messages.iter()
    }

    /// Drain into the ordered message sequence.
    pub fn finalize(self) -> Vec<Diagnostic> {
        self.messages
    }
}

/// Finalized diagnostics split by severity, each bucket in emission order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Categorized {
    pub info: Vec<Diagnostic>,
    pub warning: Vec<Diagnostic>,
    pub error: Vec<Diagnostic>,
    pub internal: Vec<Diagnostic>,
}

impl Categorized {
    pub fn from_diagnostics(diagnostics: Vec<Diagnostic>) -> Self {
        let mut map = Categorized::default();
        for diagnostic in diagnostics {
            map.push(diagnostic);
        }
        map
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        match diagnostic.severity {
            Severity::Info => self.info.push(diagnostic),
            Severity::Warning => self.warning.push(diagnostic),
            Severity::Error => self.error.push(diagnostic),
            Severity::Internal => self.internal.push(diagnostic),
        }
    }

    /// File a message whose type arrives as a name, e.g. from a test
    /// expectation. Unreadable names become an internal 506 message.
    pub fn push_named(&mut self, severity: &str, code: Code, message: impl Into<String>) {
        match severity.parse::<Severity>() {
            Ok(severity) => self.push(Diagnostic {
                severity,
                code,
                message: message.into(),
                blocks: Vec::new(),
            }),
            Err(unknown) => self.internal.push(unknown.to_diagnostic()),
        }
    }

    pub fn bucket(&self, severity: Severity) -> &[Diagnostic] {
        match severity {
            Severity::Info => &self.info,
            Severity::Warning => &self.warning,
            Severity::Error => &self.error,
            Severity::Internal => &self.internal,
        }
    }

    pub fn has_errors(&self) -> bool {
        !self.error.is_empty() || !self.internal.is_empty()
    }

    pub fn len(&self) -> usize {
        self.info.len() + self.warning.len() + self.error.len() + self.internal.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All messages, bucket by bucket from `info` to `internal`.
    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.info
            .iter()
            .chain(&self.warning)
            .chain(&self.error)
            .chain(&self.internal)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn scoped_log_attributes_blocks() {
        let mut log = Log::for_blocks([2, 3]);
        log.err("missing: \"title\"", Code::MISSING_ATTRIBUTE);
        let messages = log.finalize();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].blocks, vec![2, 3]);
        assert_eq!(messages[0].to_string(), "error[424]: missing: \"title\"");
    }

    #[test]
    fn extend_preserves_emission_order() {
        let mut outer = Log::new();
        outer.info("first", Code::MISSING_ATTRIBUTE);

        let mut inner = Log::for_blocks([1]);
        inner.warn("second", Code::STRAY_CHILD);
        inner.internal("third", Code::EMPTY_BLOCK_LIST);
        outer.extend(inner);
        outer.err("fourth", Code::NOT_A_NUMBER);

        let texts: Vec<String> = outer.finalize().into_iter().map(|d| d.message).collect();
        assert_eq!(texts, vec!["first", "second", "third", "fourth"]);
    }

    #[test]
    fn categorize_splits_by_severity() {
        let mut log = Log::new();
        log.warn("w1", Code::STRAY_CHILD);
        log.err("e1", Code::MISSING_ATTRIBUTE);
        log.warn("w2", Code::UNATTACHED_BLOCK);
        log.internal("i1", Code::ANCHOR_RENDERED);

        let map = Categorized::from_diagnostics(log.finalize());
        assert!(map.info.is_empty());
        assert_eq!(
            map.warning.iter().map(|d| d.message.as_str()).collect::<Vec<_>>(),
            vec!["w1", "w2"]
        );
        assert_eq!(map.bucket(Severity::Error).len(), 1);
        assert_eq!(map.internal[0].code, Code::ANCHOR_RENDERED);
        assert_eq!(map.len(), 4);
        assert!(map.has_errors());
    }

    #[test]
    fn unknown_message_type_becomes_internal() {
        let mut map = Categorized::default();
        map.push_named("warning", Code::STRAY_CHILD, "fine");
        map.push_named("fatal", Code::STRAY_CHILD, "lost");

        assert_eq!(map.warning.len(), 1);
        assert_eq!(map.internal.len(), 1);
        assert_eq!(map.internal[0].code, Code::UNKNOWN_MESSAGE_TYPE);
        assert_eq!(map.internal[0].message, "unknown message type \"fatal\"");
    }

    #[test]
    fn severity_names_round_trip() {
        for severity in [Severity::Info, Severity::Warning, Severity::Error, Severity::Internal] {
            assert_eq!(severity.as_str().parse::<Severity>(), Ok(severity));
        }
        assert!("dbg".parse::<Severity>().is_err());
    }

    #[test]
    fn report_carries_code_and_labels() {
        let diagnostic = Diagnostic {
            severity: Severity::Internal,
            code: Code::UNSET_OUTSIDE_BASE,
            message: "found unset block outside the base indent".into(),
            blocks: vec![4],
        };
        let report = diagnostic.to_report(0, &[3..9, 12..20]);
        assert_eq!(report.severity, ReportSeverity::Bug);
        assert_eq!(report.code.as_deref(), Some("507"));
        assert_eq!(report.labels.len(), 2);
        assert_eq!(report.labels[0].range, 3..9);
    }
}
