// SPDX-License-Identifier: Apache-2.0 OR MIT
//! Offset to line/column conversion for a single document.

use serde::{Deserialize, Serialize};

/// Position inside a document: 1-based line, 0-based column counted in chars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Location {
    pub line: usize,
    pub column: usize,
}

impl Location {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

/// Cached line starts of a document, built once per document.
#[derive(Debug, Clone)]
pub struct SourceIndex {
    text: String,
    line_starts: Vec<usize>,
}

impl SourceIndex {
    pub fn new(text: &str) -> Self {
        let mut line_starts = vec![0];
        let mut chars = text.char_indices().peekable();
        while let Some((idx, ch)) = chars.next() {
            match ch {
                '\r' => {
                    if let Some((next_idx, '\n')) = chars.peek().copied() {
                        chars.next();
                        line_starts.push(next_idx + 1);
                    } else {
                        line_starts.push(idx + 1);
                    }
                }
                '\n' | '\u{2028}' | '\u{2029}' => line_starts.push(idx + ch.len_utf8()),
                _ => {}
            }
        }
        Self {
            text: text.to_string(),
            line_starts,
        }
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Converts a byte offset to a location. Offsets past the end are clamped
    /// to the document length, which maps to the final line.
    pub fn location(&self, offset: usize) -> Location {
        let offset = offset.min(self.text.len());
        let line = self.line_starts.partition_point(|&start| start <= offset);
        let line_start = self.line_starts[line - 1];
        let column = self.text[line_start..]
            .char_indices()
            .take_while(|(idx, _)| line_start + idx < offset)
            .count();
        Location::new(line, column)
    }

    /// Converts a location back to a byte offset, clamping the column to the
    /// end of its line.
    pub fn offset(&self, location: Location) -> usize {
        let line = location.line.clamp(1, self.line_starts.len());
        let line_start = self.line_starts[line - 1];
        let line_end = self
            .line_starts
            .get(line)
            .copied()
            .unwrap_or(self.text.len());
        self.text[line_start..line_end]
            .char_indices()
            .nth(location.column)
            .map_or(line_end, |(idx, _)| line_start + idx)
    }

    pub fn line_start(&self, line: usize) -> Option<usize> {
        line.checked_sub(1)
            .and_then(|idx| self.line_starts.get(idx))
            .copied()
    }
}

/// Returns `true` for the characters treated as line terminators.
pub fn is_line_terminator(ch: char) -> bool {
    matches!(ch, '\n' | '\r' | '\u{2028}' | '\u{2029}')
}
