//! Text-position resolution: maps a diagnostic's 1-based line/column back
//! onto a character span of the original text, and builds display snippets
//! around it. The selection path and the snippet path share the same
//! boundary logic so highlighted text and displayed context never disagree.

use serde::{Deserialize, Serialize};

/// Characters that terminate a word span, besides whitespace.
const BOUNDARY_CHARS: &[char] = &[
    '、', '。', '，', '．', '！', '？', '!', '?', ',', '.', '　',
];

/// Ellipsis marker prepended/appended to truncated snippet context.
pub const ELLIPSIS: &str = "…";

/// Default number of context characters on each side of a snippet.
pub const DEFAULT_CONTEXT_LEN: usize = 20;

/// A line-indexed view of a document, rebuilt from the current text on
/// every lint pass.
#[derive(Debug, Clone)]
pub struct Document<'a> {
    lines: Vec<&'a str>,
}

impl<'a> Document<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            lines: text.split('\n').collect(),
        }
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Line text by 1-based line number.
    pub fn line(&self, line: usize) -> Option<&'a str> {
        if line == 0 {
            return None;
        }
        self.lines.get(line - 1).copied()
    }
}

/// A contiguous character range. `offset` is absolute within the document
/// (counting one separator character per preceding line); `length` is at
/// least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub offset: usize,
    pub length: usize,
}

/// Three-part display snippet around a resolved span.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snippet {
    pub before: String,
    pub error_text: String,
    pub after: String,
}

/// Resolves a 1-based (line, column) to the span of the word starting there.
///
/// The span runs from the column to the first boundary character or end of
/// line; if the first character is itself a boundary, the span still covers
/// that one character so a highlight is never empty. Returns `None` when the
/// line is out of range — callers treat that as "no highlight available".
pub fn resolve_word_span(document: &Document<'_>, line: usize, column: usize) -> Option<Span> {
    let line_text = document.line(line)?;
    if column == 0 {
        return None;
    }

    // Absolute character offset: preceding lines plus one separator each.
    let mut offset = 0;
    for preceding in 1..line {
        offset += document.line(preceding).map_or(0, |l| l.chars().count()) + 1;
    }
    let start = column - 1;
    offset += start;

    let mut length = 0;
    for ch in line_text.chars().skip(start) {
        if is_boundary(ch) {
            break;
        }
        length += 1;
    }
    Some(Span {
        offset,
        length: length.max(1),
    })
}

/// Builds a before/match/after snippet for a diagnostic position, taking up
/// to `context_len` characters on each side within the line and marking
/// truncation with [`ELLIPSIS`]. Stripping the markers from
/// `before + error_text + after` yields a contiguous substring of the line.
pub fn extract_context(
    document: &Document<'_>,
    line: usize,
    column: usize,
    context_len: usize,
) -> Option<Snippet> {
    let span = resolve_word_span(document, line, column)?;
    let chars: Vec<char> = document.line(line)?.chars().collect();
    let start = (column - 1).min(chars.len());
    let end = (start + span.length).min(chars.len());

    let before_start = start.saturating_sub(context_len);
    let mut before: String = chars[before_start..start].iter().collect();
    if before_start > 0 {
        before.insert_str(0, ELLIPSIS);
    }

    let error_text: String = chars[start..end].iter().collect();

    let after_end = (end + context_len).min(chars.len());
    let mut after: String = chars[end..after_end].iter().collect();
    if after_end < chars.len() {
        after.push_str(ELLIPSIS);
    }

    Some(Snippet {
        before,
        error_text,
        after,
    })
}

fn is_boundary(ch: char) -> bool {
    ch.is_whitespace() || BOUNDARY_CHARS.contains(&ch)
}
