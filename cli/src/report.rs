use std::ops::Range;

use codespan_reporting::files::{Files, SimpleFiles};
use codespan_reporting::term;
use codespan_reporting::term::termcolor::{ColorChoice, StandardStream};

use qdl::{BlockList, Categorized, Diagnostic, Severity};

/// Writes diagnostics to stderr with the quest source underneath.
pub struct Reporter {
    files: SimpleFiles<String, String>,
    file_id: usize,
    writer: StandardStream,
    config: term::Config,
    show_internal: bool,
}

impl Reporter {
    pub fn new(name: &str, source: &str, no_color: bool, show_internal: bool) -> Self {
        let color_choice = if no_color {
            ColorChoice::Never
        } else {
            ColorChoice::Auto
        };
        let mut files = SimpleFiles::new();
        let file_id = files.add(name.to_string(), source.to_string());
        Reporter {
            files,
            file_id,
            writer: StandardStream::stderr(color_choice),
            config: term::Config::default(),
            show_internal,
        }
    }

    /// Emit every diagnostic worth showing and return how many were shown.
    pub fn emit_all<V>(&self, blocks: &BlockList<V>, diagnostics: &Categorized) -> usize {
        let mut shown = 0;
        for diagnostic in diagnostics.iter() {
            if diagnostic.severity == Severity::Internal && !self.show_internal {
                continue;
            }
            self.emit(blocks, diagnostic);
            shown += 1;
        }
        shown
    }

    pub fn emit<V>(&self, blocks: &BlockList<V>, diagnostic: &Diagnostic) {
        let spans = block_spans(&self.files, self.file_id, blocks, diagnostic);
        let report = diagnostic.to_report(self.file_id, &spans);
        let _ = term::emit_to_write_style(
            &mut self.writer.lock(),
            &self.config,
            &self.files,
            &report,
        );
    }
}

/// Byte range of every block the diagnostic names, covering the block's
/// whole lines.
pub fn block_spans<V>(
    files: &SimpleFiles<String, String>,
    file_id: usize,
    blocks: &BlockList<V>,
    diagnostic: &Diagnostic,
) -> Vec<Range<usize>> {
    diagnostic
        .blocks
        .iter()
        .filter_map(|&id| blocks.get(id))
        .filter_map(|block| {
            let first = block.start_line();
            let last = first + block.line_count().saturating_sub(1);
            let start = files.line_range(file_id, first).ok()?.start;
            let end = files.line_range(file_id, last).ok()?.end;
            Some(start..end)
        })
        .collect()
}

/// One line such as `2 errors, 1 warning`.
pub fn summary(diagnostics: &Categorized, show_internal: bool) -> String {
    let mut counts = vec![
        plural(diagnostics.error.len(), "error"),
        plural(diagnostics.warning.len(), "warning"),
    ];
    if show_internal && !diagnostics.internal.is_empty() {
        counts.push(plural(diagnostics.internal.len(), "internal error"));
    }
    counts.join(", ")
}

fn plural(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("1 {}", noun)
    } else {
        format!("{} {}s", count, noun)
    }
}
