use crate::block::Block;
use crate::pattern;

/// Columns a tab counts for when measuring indentation.
const TAB_WIDTH: usize = 2;
/// Columns per nesting level.
const INDENT_WIDTH: usize = 2;

struct PendingBlock {
    indent: usize,
    start_line: usize,
    lines: Vec<String>,
}

pub(super) fn tokenize<V>(source: &str) -> Vec<Block<V>> {
    let mut blocks = Vec::new();
    let mut current: Option<PendingBlock> = None;

    for (line_no, raw) in source.lines().enumerate() {
        let line = raw.trim_end();
        if line.is_empty() {
            flush(&mut current, &mut blocks);
            continue;
        }

        let indent = indent_of(line);
        let text = line.trim_start();

        if let Some(pending) = current
            .as_mut()
            .filter(|p| p.indent == indent && !pattern::is_header_line(text))
        {
            pending.lines.push(text.to_string());
            continue;
        }

        flush(&mut current, &mut blocks);
        current = Some(PendingBlock {
            indent,
            start_line: line_no,
            lines: vec![text.to_string()],
        });
    }

    flush(&mut current, &mut blocks);
    blocks
}

fn flush<V>(current: &mut Option<PendingBlock>, blocks: &mut Vec<Block<V>>) {
    if let Some(pending) = current.take() {
        blocks.push(Block::new(pending.indent, pending.lines, pending.start_line));
    }
}

fn indent_of(line: &str) -> usize {
    let width: usize = line
        .chars()
        .take_while(|c| c.is_whitespace())
        .map(|c| if c == '\t' { TAB_WIDTH } else { 1 })
        .sum();
    width / INDENT_WIDTH
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indent_counts_levels_of_two_columns() {
        assert_eq!(indent_of("text"), 0);
        assert_eq!(indent_of(" text"), 0);
        assert_eq!(indent_of("  text"), 1);
        assert_eq!(indent_of("     text"), 2);
        assert_eq!(indent_of("\t\ttext"), 2);
    }

    #[test]
    fn empty_source_has_no_blocks() {
        assert!(tokenize::<()>("").is_empty());
        assert!(tokenize::<()>("\n   \n\t\n").is_empty());
    }
}
